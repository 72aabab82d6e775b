//! Form model types and JSON document parsing.
//!
//! The engine consumes a fully materialized form document (the JSON shape
//! the editor persists) and never mutates it during a fill session. The
//! original document uses string discriminants for question types, rule
//! types, operators, and actions; here each is a closed enum so an
//! unhandled case is a compile error, not a silent default branch.
//!
//! Nesting is one level deep by construction: a `SubQuestion` has a
//! `SubQuestionKind` with no container variants, so a group inside a
//! group is unrepresentable. Parsing such a document fails with
//! `FormError::NestedContainer`.

use serde::{Deserialize, Serialize};

use crate::store::AnswerValue;

/// Sentinel `jumpTo` target meaning "end the form".
pub const END_FORM: &str = "end_form";

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors raised while parsing a form document.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The document does not match the expected JSON shape.
    #[error("malformed form document: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A question declares a type outside the closed vocabulary.
    #[error("unknown question type '{kind}' on question '{question_id}'")]
    UnknownQuestionType { question_id: String, kind: String },
    /// A group/multiquestion block nests another container.
    #[error("question '{question_id}' nests a container inside container '{parent_id}'")]
    NestedContainer {
        question_id: String,
        parent_id: String,
    },
    /// A multiple-choice question carries no options.
    #[error("multiple-choice question '{question_id}' has no options")]
    MissingOptions { question_id: String },
    /// A group/multiquestion block carries no sub-questions.
    #[error("container question '{question_id}' has no sub-questions")]
    EmptyContainer { question_id: String },
    /// A workflow rule declares a type outside {if, always}.
    #[error("unknown rule type '{kind}' on rule '{rule_id}'")]
    UnknownRuleType { rule_id: String, kind: String },
    /// A condition declares an operator outside the closed vocabulary.
    #[error("unknown condition operator '{operator}' in rule '{rule_id}'")]
    UnknownOperator { rule_id: String, operator: String },
    /// A condition declares a logical connective outside {AND, OR}.
    #[error("unknown logical operator '{operator}' in rule '{rule_id}'")]
    UnknownLogicalOperator { rule_id: String, operator: String },
}

// ──────────────────────────────────────────────
// Form structure
// ──────────────────────────────────────────────

/// A complete form definition, immutable during a fill session.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Top-level questions in definition order (sorted by `order` on parse).
    pub questions: Vec<Question>,
    pub welcome: Option<WelcomeScreen>,
    /// Final screens in order; the first is the default end-form target.
    pub finals: Vec<FinalScreen>,
    pub workflow: Workflow,
}

impl Form {
    /// Parse a form document. Questions are sorted by their `order` field,
    /// matching the order the editor persists them in.
    pub fn from_json(doc: &serde_json::Value) -> Result<Form, FormError> {
        let raw: RawForm = serde_json::from_value(doc.clone())?;
        raw.into_form()
    }

    /// Index of a top-level question by id. Sub-question ids do not
    /// resolve here; a `jumpTo` naming one dangles by design.
    pub fn question_index(&self, question_id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == question_id)
    }

    pub fn final_screen(&self, final_id: &str) -> Option<&FinalScreen> {
        self.finals.iter().find(|f| f.id == final_id)
    }

    /// The default destination when a rule or the linear flow says "end
    /// form" without naming a specific final screen.
    pub fn default_final(&self) -> Option<&FinalScreen> {
        self.finals.first()
    }

    /// Total navigation steps, counting each group/multiquestion
    /// sub-question individually.
    pub fn step_count(&self) -> usize {
        self.questions.iter().map(Question::step_span).sum()
    }
}

/// One top-level form field.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub order: i64,
    pub kind: QuestionKind,
}

impl Question {
    /// Nested sub-questions, if this is a group or multiquestion block.
    pub fn sub_questions(&self) -> Option<&[SubQuestion]> {
        match &self.kind {
            QuestionKind::Group { questions } | QuestionKind::Multi { questions } => {
                Some(questions)
            }
            _ => None,
        }
    }

    /// Number of navigation steps this question contributes.
    pub fn step_span(&self) -> usize {
        self.sub_questions().map_or(1, <[SubQuestion]>::len)
    }
}

/// Closed question type vocabulary. Container variants carry their
/// sub-questions; everything else is a leaf field.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    ShortText,
    LongText,
    Email,
    Number,
    Date,
    Rating,
    MultipleChoice { options: Vec<String> },
    /// Navigated one sub-question at a time.
    Group { questions: Vec<SubQuestion> },
    /// All sub-questions displayed and validated together as one step.
    Multi { questions: Vec<SubQuestion> },
}

/// A question nested inside a group/multiquestion block. Shares the flat
/// answer namespace with top-level questions. Structurally cannot contain
/// further nesting.
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuestion {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub required: bool,
    pub order: i64,
    pub kind: SubQuestionKind,
}

/// Leaf-only question types available inside a container.
#[derive(Debug, Clone, PartialEq)]
pub enum SubQuestionKind {
    ShortText,
    LongText,
    Email,
    Number,
    Date,
    Rating,
    MultipleChoice { options: Vec<String> },
}

/// Optional opening screen; its presence decides whether a session starts
/// in the welcome state.
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeScreen {
    pub title: String,
    pub description: Option<String>,
    pub button_text: Option<String>,
    pub show_button: bool,
}

/// A terminal display screen with its own title/button before submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalScreen {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub button_text: Option<String>,
    pub show_button: bool,
}

// ──────────────────────────────────────────────
// Workflow
// ──────────────────────────────────────────────

/// Ordered rule list; evaluated top-to-bottom, first match wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workflow {
    pub rules: Vec<WorkflowRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRule {
    pub id: String,
    pub kind: RuleKind,
    pub conditions: Vec<Condition>,
    pub actions: Vec<RuleAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Matches when the condition fold evaluates true.
    If,
    /// Matches unconditionally.
    Always,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub question_id: String,
    pub operator: ConditionOperator,
    pub value: String,
    /// Connective applied against the running accumulator, left to right.
    /// Defaults to AND when unset. Ignored on the first condition.
    pub logical: Option<LogicalOperator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Rule actions; only `JumpTo` and `EndForm` are navigational. The rest
/// are display-layer effects the resolver scans past.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleAction {
    /// Target may name a question id, a final-screen id, or `end_form`.
    JumpTo { target: String },
    EndForm,
    ShowMessage { message: String },
    Redirect { url: String },
    ShowField { target: String },
    HideField { target: String },
}

// ──────────────────────────────────────────────
// Response payload
// ──────────────────────────────────────────────

/// One recorded answer in the submitted payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
}

/// The terminal artifact of a fill session, handed to the persistence
/// collaborator. Serialized camelCase to match the stored document shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: String,
    pub form_id: String,
    /// RFC 3339 UTC timestamp.
    pub submitted_at: String,
    /// Answers in form-definition order, absent/empty values omitted.
    pub answers: Vec<Answer>,
}

// ──────────────────────────────────────────────
// Raw document shapes
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawForm {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    questions: Vec<RawQuestion>,
    #[serde(default)]
    welcome: Option<RawWelcome>,
    #[serde(default)]
    finals: Vec<RawFinal>,
    #[serde(default)]
    workflow: Option<RawWorkflow>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    order: i64,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    questions: Option<Vec<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWelcome {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    button_text: Option<String>,
    #[serde(default = "default_true")]
    show_button: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFinal {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    button_text: Option<String>,
    #[serde(default = "default_true")]
    show_button: bool,
}

#[derive(Debug, Deserialize)]
struct RawWorkflow {
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    conditions: Vec<RawCondition>,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    question_id: String,
    operator: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    logical_operator: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    target_question_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn default_true() -> bool {
    true
}

// ──────────────────────────────────────────────
// Raw -> model conversion
// ──────────────────────────────────────────────

impl RawForm {
    fn into_form(self) -> Result<Form, FormError> {
        let mut raw_questions = self.questions;
        raw_questions.sort_by_key(|q| q.order);

        let questions = raw_questions
            .into_iter()
            .map(RawQuestion::into_question)
            .collect::<Result<Vec<_>, _>>()?;

        let workflow = match self.workflow {
            Some(raw) => raw.into_workflow()?,
            None => Workflow::default(),
        };

        Ok(Form {
            id: self.id,
            title: self.title,
            description: self.description,
            questions,
            welcome: self.welcome.map(|w| WelcomeScreen {
                title: w.title,
                description: w.description,
                button_text: w.button_text,
                show_button: w.show_button,
            }),
            finals: self
                .finals
                .into_iter()
                .map(|f| FinalScreen {
                    id: f.id,
                    title: f.title,
                    description: f.description,
                    button_text: f.button_text,
                    show_button: f.show_button,
                })
                .collect(),
            workflow,
        })
    }
}

impl RawQuestion {
    fn into_question(self) -> Result<Question, FormError> {
        let kind = match self.kind.as_str() {
            "question-group" => QuestionKind::Group {
                questions: convert_subs(&self.id, self.questions)?,
            },
            "multiquestion" => QuestionKind::Multi {
                questions: convert_subs(&self.id, self.questions)?,
            },
            other => leaf_kind(&self.id, other, self.options)?.into(),
        };
        Ok(Question {
            id: self.id,
            title: self.title,
            description: self.description,
            required: self.required,
            order: self.order,
            kind,
        })
    }
}

fn convert_subs(
    parent_id: &str,
    raw: Option<Vec<RawQuestion>>,
) -> Result<Vec<SubQuestion>, FormError> {
    let mut raw = raw.unwrap_or_default();
    if raw.is_empty() {
        return Err(FormError::EmptyContainer {
            question_id: parent_id.to_string(),
        });
    }
    raw.sort_by_key(|q| q.order);
    raw.into_iter()
        .map(|sub| {
            if matches!(sub.kind.as_str(), "question-group" | "multiquestion") {
                return Err(FormError::NestedContainer {
                    question_id: sub.id,
                    parent_id: parent_id.to_string(),
                });
            }
            let kind = leaf_kind(&sub.id, &sub.kind, sub.options)?;
            Ok(SubQuestion {
                id: sub.id,
                title: sub.title,
                description: sub.description,
                required: sub.required,
                order: sub.order,
                kind,
            })
        })
        .collect()
}

fn leaf_kind(
    question_id: &str,
    kind: &str,
    options: Option<Vec<String>>,
) -> Result<SubQuestionKind, FormError> {
    match kind {
        "short-text" => Ok(SubQuestionKind::ShortText),
        "long-text" => Ok(SubQuestionKind::LongText),
        "email" => Ok(SubQuestionKind::Email),
        "number" => Ok(SubQuestionKind::Number),
        "date" => Ok(SubQuestionKind::Date),
        "rating" => Ok(SubQuestionKind::Rating),
        "multiple-choice" => {
            let options = options.unwrap_or_default();
            if options.is_empty() {
                return Err(FormError::MissingOptions {
                    question_id: question_id.to_string(),
                });
            }
            Ok(SubQuestionKind::MultipleChoice { options })
        }
        other => Err(FormError::UnknownQuestionType {
            question_id: question_id.to_string(),
            kind: other.to_string(),
        }),
    }
}

impl From<SubQuestionKind> for QuestionKind {
    fn from(kind: SubQuestionKind) -> QuestionKind {
        match kind {
            SubQuestionKind::ShortText => QuestionKind::ShortText,
            SubQuestionKind::LongText => QuestionKind::LongText,
            SubQuestionKind::Email => QuestionKind::Email,
            SubQuestionKind::Number => QuestionKind::Number,
            SubQuestionKind::Date => QuestionKind::Date,
            SubQuestionKind::Rating => QuestionKind::Rating,
            SubQuestionKind::MultipleChoice { options } => {
                QuestionKind::MultipleChoice { options }
            }
        }
    }
}

impl RawWorkflow {
    fn into_workflow(self) -> Result<Workflow, FormError> {
        let rules = self
            .rules
            .into_iter()
            .map(RawRule::into_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Workflow { rules })
    }
}

impl RawRule {
    fn into_rule(self) -> Result<WorkflowRule, FormError> {
        let kind = match self.kind.as_str() {
            "if" => RuleKind::If,
            "always" => RuleKind::Always,
            other => {
                return Err(FormError::UnknownRuleType {
                    rule_id: self.id,
                    kind: other.to_string(),
                })
            }
        };

        let conditions = self
            .conditions
            .into_iter()
            .map(|c| convert_condition(&self.id, c))
            .collect::<Result<Vec<_>, _>>()?;

        // Unknown action types are skipped: a malformed workflow must
        // never strand a respondent, and new display-only actions may
        // predate this engine.
        let actions = self
            .actions
            .into_iter()
            .filter_map(convert_action)
            .collect();

        Ok(WorkflowRule {
            id: self.id,
            kind,
            conditions,
            actions,
        })
    }
}

fn convert_condition(rule_id: &str, raw: RawCondition) -> Result<Condition, FormError> {
    let operator = match raw.operator.as_str() {
        "equals" => ConditionOperator::Equals,
        "not_equals" => ConditionOperator::NotEquals,
        "contains" => ConditionOperator::Contains,
        "not_contains" => ConditionOperator::NotContains,
        "greater_than" => ConditionOperator::GreaterThan,
        "less_than" => ConditionOperator::LessThan,
        other => {
            return Err(FormError::UnknownOperator {
                rule_id: rule_id.to_string(),
                operator: other.to_string(),
            })
        }
    };
    let logical = match raw.logical_operator.as_deref() {
        None => None,
        Some("AND") => Some(LogicalOperator::And),
        Some("OR") => Some(LogicalOperator::Or),
        Some(other) => {
            return Err(FormError::UnknownLogicalOperator {
                rule_id: rule_id.to_string(),
                operator: other.to_string(),
            })
        }
    };
    Ok(Condition {
        question_id: raw.question_id,
        operator,
        value: raw.value,
        logical,
    })
}

fn convert_action(raw: RawAction) -> Option<RuleAction> {
    match raw.kind.as_str() {
        "jumpTo" => Some(RuleAction::JumpTo {
            target: raw.target_question_id.unwrap_or_default(),
        }),
        "endForm" => Some(RuleAction::EndForm),
        "showMessage" => Some(RuleAction::ShowMessage {
            message: raw.message.unwrap_or_default(),
        }),
        "redirect" => Some(RuleAction::Redirect {
            url: raw.url.unwrap_or_default(),
        }),
        "showField" => Some(RuleAction::ShowField {
            target: raw.target_question_id.unwrap_or_default(),
        }),
        "hideField" => Some(RuleAction::HideField {
            target: raw.target_question_id.unwrap_or_default(),
        }),
        _ => None,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
