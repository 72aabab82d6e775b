//! Form fill engine: answer storage, validation, workflow rule
//! evaluation, navigation resolution, the session state machine, and
//! response assembly.
//!
//! The engine is deterministic and side-effect free: given a form
//! document and a sequence of `record_answer`/`advance`/`back` calls, a
//! [`Session`] always lands in the same state and produces the same
//! response payload (modulo the generated response id and timestamp).
//! Persistence and transport live in separate crates.

pub mod assemble;
pub mod lint;
pub mod navigate;
pub mod rules;
pub mod session;
pub mod store;
pub mod types;
pub mod validate;

pub use assemble::{assemble, generate_response_id};
pub use lint::{lint_form, LintFinding};
pub use navigate::{resolve_next, NavTarget, Position};
pub use rules::{eval_conditions, rule_matches};
pub use session::{AdvanceOutcome, Session, SessionState, StepView};
pub use store::{AnswerStore, AnswerValue};
pub use types::{
    Answer, Form, FormError, Question, QuestionKind, Response, SubQuestion, SubQuestionKind,
    END_FORM,
};
pub use validate::{validate_step, ValidationErrorKind, ValidationIssue};
