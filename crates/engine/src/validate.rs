//! Single-step answer validation.
//!
//! Pure checks against the answer store; the session controller owns the
//! per-question error state. A multiquestion block validates every
//! sub-question and surfaces all failures at once, each tagged with its
//! own sub-question id. A group validates only the sub-question currently
//! displayed, because groups are navigated one sub-question at a time.

use std::sync::OnceLock;

use regex::Regex;

use crate::store::AnswerStore;
use crate::types::{Question, QuestionKind, SubQuestion, SubQuestionKind};

/// Local validation failures; they block only the `advance` transition
/// for their own question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("this field is required")]
    RequiredFieldEmpty,
    #[error("invalid email address")]
    InvalidEmailFormat,
}

/// One failure, tagged with the question (or sub-question) that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub question_id: String,
    pub kind: ValidationErrorKind,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern")
    })
}

/// Validate the step at `(question, sub_index)`. `sub_index` is only
/// meaningful for groups; plain questions and multiquestion blocks
/// ignore it.
pub fn validate_step(
    question: &Question,
    sub_index: usize,
    answers: &AnswerStore,
) -> Vec<ValidationIssue> {
    match &question.kind {
        QuestionKind::Group { questions } => questions
            .get(sub_index)
            .and_then(|sub| check_sub(sub, answers))
            .into_iter()
            .collect(),
        QuestionKind::Multi { questions } => questions
            .iter()
            .filter_map(|sub| check_sub(sub, answers))
            .collect(),
        kind => check_leaf(
            &question.id,
            question.required,
            matches!(kind, QuestionKind::Email),
            answers,
        )
        .into_iter()
        .collect(),
    }
}

fn check_sub(sub: &SubQuestion, answers: &AnswerStore) -> Option<ValidationIssue> {
    check_leaf(
        &sub.id,
        sub.required,
        matches!(sub.kind, SubQuestionKind::Email),
        answers,
    )
}

fn check_leaf(
    question_id: &str,
    required: bool,
    is_email: bool,
    answers: &AnswerStore,
) -> Option<ValidationIssue> {
    let empty = !answers.has_value(question_id);
    if required && empty {
        return Some(ValidationIssue {
            question_id: question_id.to_string(),
            kind: ValidationErrorKind::RequiredFieldEmpty,
        });
    }
    if is_email && !empty && !email_pattern().is_match(&answers.text_of(question_id)) {
        return Some(ValidationIssue {
            question_id: question_id.to_string(),
            kind: ValidationErrorKind::InvalidEmailFormat,
        });
    }
    None
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
