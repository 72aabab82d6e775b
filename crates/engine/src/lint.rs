//! Static workflow checks.
//!
//! The runtime deliberately degrades on a broken workflow (dangling jump
//! targets fall through to linear flow) so respondents are never stranded.
//! These checks exist so form authors find those problems before anyone
//! fills the form.

use std::collections::BTreeSet;
use std::fmt;

use crate::types::{Form, RuleAction, RuleKind, END_FORM};

/// One authoring problem found in a form definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintFinding {
    /// Two questions (at any nesting level) share an id; later answers
    /// overwrite earlier ones in the flat namespace.
    DuplicateQuestionId { question_id: String },
    /// A rule condition reads a question id that exists nowhere.
    DanglingConditionRef { rule_id: String, question_id: String },
    /// A jump target names neither a top-level question, a final screen,
    /// nor the end sentinel. The runtime will skip it silently.
    DanglingJumpTarget { rule_id: String, target: String },
    /// An `if` rule with no conditions can never match.
    EmptyConditionSet { rule_id: String },
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintFinding::DuplicateQuestionId { question_id } => {
                write!(f, "duplicate question id '{question_id}'")
            }
            LintFinding::DanglingConditionRef {
                rule_id,
                question_id,
            } => write!(
                f,
                "rule '{rule_id}' reads unknown question '{question_id}'"
            ),
            LintFinding::DanglingJumpTarget { rule_id, target } => {
                write!(f, "rule '{rule_id}' jumps to unknown target '{target}'")
            }
            LintFinding::EmptyConditionSet { rule_id } => {
                write!(f, "rule '{rule_id}' has no conditions and can never match")
            }
        }
    }
}

/// Check a parsed form for authoring problems. An empty result means the
/// workflow is fully resolvable.
pub fn lint_form(form: &Form) -> Vec<LintFinding> {
    let mut findings = Vec::new();

    // Flat answer namespace: every id at every level must be unique.
    let mut seen = BTreeSet::new();
    let mut all_ids = BTreeSet::new();
    for question in &form.questions {
        note_id(&question.id, &mut seen, &mut all_ids, &mut findings);
        if let Some(subs) = question.sub_questions() {
            for sub in subs {
                note_id(&sub.id, &mut seen, &mut all_ids, &mut findings);
            }
        }
    }

    for rule in &form.workflow.rules {
        if rule.kind == RuleKind::If && rule.conditions.is_empty() {
            findings.push(LintFinding::EmptyConditionSet {
                rule_id: rule.id.clone(),
            });
        }
        for condition in &rule.conditions {
            if !all_ids.contains(condition.question_id.as_str()) {
                findings.push(LintFinding::DanglingConditionRef {
                    rule_id: rule.id.clone(),
                    question_id: condition.question_id.clone(),
                });
            }
        }
        for action in &rule.actions {
            if let RuleAction::JumpTo { target } = action {
                if !jump_target_resolves(form, target) {
                    findings.push(LintFinding::DanglingJumpTarget {
                        rule_id: rule.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
    }

    findings
}

/// Jump targets resolve against top-level question ids, final screen ids,
/// and the end sentinel. Sub-question ids do not resolve.
fn jump_target_resolves(form: &Form, target: &str) -> bool {
    target == END_FORM
        || form.question_index(target).is_some()
        || form.final_screen(target).is_some()
}

fn note_id(
    id: &str,
    seen: &mut BTreeSet<String>,
    all_ids: &mut BTreeSet<String>,
    findings: &mut Vec<LintFinding>,
) {
    if !seen.insert(id.to_string()) {
        findings.push(LintFinding::DuplicateQuestionId {
            question_id: id.to_string(),
        });
    }
    all_ids.insert(id.to_string());
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
