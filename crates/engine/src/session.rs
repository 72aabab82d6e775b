//! Fill-session state machine.
//!
//! A session owns the immutable form, the answer store, the current
//! position, and the per-question validation error map. All transitions
//! go through `advance` and `back`; recording an answer never moves the
//! cursor. Validation failures block only the forward transition, and
//! answers survive every navigation, including branches that skip past
//! the steps they were entered on.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::assemble::{assemble, generate_response_id};
use crate::navigate::{resolve_next, NavTarget, Position};
use crate::store::{AnswerStore, AnswerValue};
use crate::types::{FinalScreen, Form, FormError, Question, Response, SubQuestion, WelcomeScreen};
use crate::validate::{validate_step, ValidationErrorKind};

/// Where the session cursor sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Welcome,
    Question { index: usize, sub_index: usize },
    Final { final_id: String },
    Completed,
}

/// Result of an `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Moved to a new step.
    Advanced,
    /// Validation blocked the move; errors are on the session.
    ValidationFailed,
    /// The session finished and produced its response payload.
    Submitted(Response),
    /// Nothing to do (already completed).
    NoOp,
}

/// Borrowed view of the step the respondent currently sees.
#[derive(Debug, Clone, PartialEq)]
pub enum StepView<'a> {
    Welcome(&'a WelcomeScreen),
    Question {
        question: &'a Question,
        index: usize,
    },
    /// One sub-question of a group, shown alone.
    GroupSub {
        group: &'a Question,
        sub: &'a SubQuestion,
        index: usize,
        sub_index: usize,
    },
    Final(&'a FinalScreen),
    Completed,
}

/// One in-flight fill of a form.
#[derive(Debug, Clone)]
pub struct Session {
    form: Form,
    answers: AnswerStore,
    state: SessionState,
    errors: BTreeMap<String, ValidationErrorKind>,
}

impl Session {
    /// Start a session: welcome screen when the form has one, otherwise
    /// the first question. A form with no questions opens on its default
    /// final screen, or, lacking one, one advance away from an empty
    /// submission.
    pub fn new(form: Form) -> Session {
        let state = if form.welcome.is_some() {
            SessionState::Welcome
        } else {
            opening_state(&form)
        };
        Session {
            form,
            answers: AnswerStore::new(),
            state,
            errors: BTreeMap::new(),
        }
    }

    /// Parse a form document and start a session on it.
    pub fn from_json(doc: &serde_json::Value) -> Result<Session, FormError> {
        Ok(Session::new(Form::from_json(doc)?))
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    /// Validation errors currently blocking `advance`, keyed by question id.
    pub fn validation_errors(&self) -> &BTreeMap<String, ValidationErrorKind> {
        &self.errors
    }

    /// Record an answer. Clears any standing error on that question so a
    /// correction is re-checked fresh on the next advance.
    pub fn record_answer(&mut self, question_id: &str, value: AnswerValue) {
        self.errors.remove(question_id);
        self.answers.record(question_id, value);
    }

    /// Advance one step: validate the current step, then resolve where to
    /// go. Advancing from a final screen submits.
    pub fn advance(&mut self) -> AdvanceOutcome {
        match self.state.clone() {
            SessionState::Welcome => {
                self.state = opening_state(&self.form);
                tracing::debug!(state = ?self.state, "left welcome screen");
                AdvanceOutcome::Advanced
            }
            SessionState::Question { index, sub_index } => {
                let Some(question) = self.form.questions.get(index) else {
                    return self.finish();
                };
                let issues = validate_step(question, sub_index, &self.answers);
                if !issues.is_empty() {
                    for issue in issues {
                        self.errors.insert(issue.question_id, issue.kind);
                    }
                    return AdvanceOutcome::ValidationFailed;
                }
                clear_step_errors(&mut self.errors, question, sub_index);

                let target =
                    resolve_next(&self.form, &self.answers, Position::new(index, sub_index));
                tracing::debug!(index, sub_index, ?target, "advancing");
                match target {
                    NavTarget::NextSubQuestion => {
                        self.state = SessionState::Question {
                            index,
                            sub_index: sub_index + 1,
                        };
                        AdvanceOutcome::Advanced
                    }
                    NavTarget::NextLinear => {
                        self.state = SessionState::Question {
                            index: index + 1,
                            sub_index: 0,
                        };
                        AdvanceOutcome::Advanced
                    }
                    NavTarget::GoToQuestion(target_index) => {
                        self.state = SessionState::Question {
                            index: target_index,
                            sub_index: 0,
                        };
                        AdvanceOutcome::Advanced
                    }
                    NavTarget::GoToFinal(final_id) => {
                        self.state = SessionState::Final { final_id };
                        AdvanceOutcome::Advanced
                    }
                    NavTarget::Submit => self.finish(),
                }
            }
            SessionState::Final { .. } => self.finish(),
            SessionState::Completed => AdvanceOutcome::NoOp,
        }
    }

    /// Step backward structurally (previous definition position, not the
    /// navigation history). Answers and errors are untouched. Returns
    /// whether the cursor moved.
    pub fn back(&mut self) -> bool {
        let SessionState::Question { index, sub_index } = self.state else {
            return false;
        };
        if sub_index > 0 {
            self.state = SessionState::Question {
                index,
                sub_index: sub_index - 1,
            };
            return true;
        }
        if index > 0 {
            let prev = &self.form.questions[index - 1];
            // Re-entering a group from behind lands on its last
            // sub-question.
            let sub_index = match prev.sub_questions() {
                Some(subs) if is_group(prev) => subs.len() - 1,
                _ => 0,
            };
            self.state = SessionState::Question {
                index: index - 1,
                sub_index,
            };
            return true;
        }
        if self.form.welcome.is_some() {
            self.state = SessionState::Welcome;
            return true;
        }
        false
    }

    /// What the respondent currently sees.
    pub fn current_step(&self) -> StepView<'_> {
        match &self.state {
            SessionState::Welcome => match &self.form.welcome {
                Some(welcome) => StepView::Welcome(welcome),
                None => StepView::Completed,
            },
            SessionState::Question { index, sub_index } => {
                let Some(question) = self.form.questions.get(*index) else {
                    return StepView::Completed;
                };
                match question.sub_questions() {
                    Some(subs) if is_group(question) => match subs.get(*sub_index) {
                        Some(sub) => StepView::GroupSub {
                            group: question,
                            sub,
                            index: *index,
                            sub_index: *sub_index,
                        },
                        None => StepView::Completed,
                    },
                    _ => StepView::Question {
                        question,
                        index: *index,
                    },
                }
            }
            SessionState::Final { final_id } => match self.form.final_screen(final_id) {
                Some(screen) => StepView::Final(screen),
                None => StepView::Completed,
            },
            SessionState::Completed => StepView::Completed,
        }
    }

    /// Fraction of steps strictly before the cursor, in [0, 1]. Counts
    /// each group/multiquestion sub-question as its own step.
    pub fn progress(&self) -> f64 {
        let total = self.form.step_count();
        if total == 0 {
            return 1.0;
        }
        let done = match &self.state {
            SessionState::Welcome => 0,
            SessionState::Question { index, sub_index } => {
                let before: usize = self
                    .form
                    .questions
                    .iter()
                    .take(*index)
                    .map(Question::step_span)
                    .sum();
                before + sub_index
            }
            SessionState::Final { .. } | SessionState::Completed => total,
        };
        done as f64 / total as f64
    }

    fn finish(&mut self) -> AdvanceOutcome {
        let response = assemble(
            &self.form,
            &self.answers,
            generate_response_id(),
            OffsetDateTime::now_utc(),
        );
        tracing::debug!(response_id = %response.id, answers = response.answers.len(), "session submitted");
        self.state = SessionState::Completed;
        AdvanceOutcome::Submitted(response)
    }
}

/// First step of a form with no welcome screen (or after leaving it).
/// A form with no questions opens on its default final screen; lacking
/// one it opens on an out-of-range question position, from which the
/// next `advance` submits. `Completed` is only ever reached through
/// submission, so every session can produce a response.
fn opening_state(form: &Form) -> SessionState {
    if form.questions.is_empty() {
        if let Some(screen) = form.default_final() {
            return SessionState::Final {
                final_id: screen.id.clone(),
            };
        }
    }
    SessionState::Question {
        index: 0,
        sub_index: 0,
    }
}

fn is_group(question: &Question) -> bool {
    matches!(question.kind, crate::types::QuestionKind::Group { .. })
}

/// Drop stale errors belonging to the step that just validated clean.
/// Free function so the error map borrow stays disjoint from the form.
fn clear_step_errors(
    errors: &mut BTreeMap<String, ValidationErrorKind>,
    question: &Question,
    sub_index: usize,
) {
    match question.sub_questions() {
        Some(subs) if is_group(question) => {
            if let Some(sub) = subs.get(sub_index) {
                errors.remove(&sub.id);
            }
        }
        Some(subs) => {
            for sub in subs {
                errors.remove(&sub.id);
            }
        }
        None => {
            errors.remove(&question.id);
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
