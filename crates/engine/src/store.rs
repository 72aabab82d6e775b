//! Answer store -- the mutable substrate every other component reads.
//!
//! Answers are keyed by question id in a single flat namespace: nested
//! sub-question ids live alongside top-level ids. Navigation never deletes
//! an answer, so values entered on steps a later branch skips past are
//! still present at assembly time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw respondent answer: free text, a number (rating/number fields),
/// or a list of selected choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Number(f64),
    Choices(Vec<String>),
}

impl AnswerValue {
    /// Whitespace-only text and empty choice lists count as empty;
    /// a number never does.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Number(_) => false,
            AnswerValue::Choices(items) => items.is_empty(),
        }
    }

    /// String coercion used by condition evaluation: numbers render
    /// without a trailing fractional zero, choice lists comma-join.
    pub fn to_text(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::Number(n) => format_number(*n),
            AnswerValue::Choices(items) => items.join(","),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> AnswerValue {
        AnswerValue::Text(s.to_string())
    }
}

impl From<f64> for AnswerValue {
    fn from(n: f64) -> AnswerValue {
        AnswerValue::Number(n)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Mutable mapping from question id to raw answer value.
#[derive(Debug, Clone, Default)]
pub struct AnswerStore {
    values: BTreeMap<String, AnswerValue>,
}

impl AnswerStore {
    pub fn new() -> AnswerStore {
        AnswerStore::default()
    }

    /// Record (or overwrite) an answer.
    pub fn record(&mut self, question_id: &str, value: AnswerValue) {
        self.values.insert(question_id.to_string(), value);
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.values.get(question_id)
    }

    /// Coerced text view; absent answers read as the empty string.
    pub fn text_of(&self, question_id: &str) -> String {
        self.values
            .get(question_id)
            .map(AnswerValue::to_text)
            .unwrap_or_default()
    }

    /// True when an answer is present and non-empty.
    pub fn has_value(&self, question_id: &str) -> bool {
        self.values.get(question_id).is_some_and(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
