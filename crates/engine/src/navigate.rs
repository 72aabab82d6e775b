//! Navigation resolution -- given the current position and the answers so
//! far, decide where the session goes next.
//!
//! Three-tier precedence, in order: intra-group stepping (pure local
//! increment, rules never consulted mid-group), the workflow rule walk at
//! step boundaries, then the linear fallback. A matching rule's actions
//! are scanned in order and the first actionable navigation wins; dangling
//! targets and self-jumps are not actionable and evaluation falls through,
//! so a malformed workflow degrades to linear flow instead of stranding
//! the respondent.

use crate::rules::rule_matches;
use crate::store::AnswerStore;
use crate::types::{Form, QuestionKind, RuleAction, WorkflowRule, END_FORM};

/// Cursor over the top-level question list. `sub_index` is non-zero only
/// inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub index: usize,
    pub sub_index: usize,
}

impl Position {
    pub fn new(index: usize, sub_index: usize) -> Position {
        Position { index, sub_index }
    }
}

/// Where the session goes on a successful advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    /// Next sub-question inside the current group.
    NextSubQuestion,
    /// Next top-level question in definition order.
    NextLinear,
    /// Jump to the top-level question at this index.
    GoToQuestion(usize),
    /// Show the named final screen.
    GoToFinal(String),
    /// Assemble and submit immediately (no final screens exist).
    Submit,
}

/// Resolve the next navigation target. Always produces a target; workflow
/// problems degrade to the linear fallback rather than erroring.
pub fn resolve_next(form: &Form, answers: &AnswerStore, at: Position) -> NavTarget {
    // Mid-group: step to the next sub-question, rules not consulted.
    if let Some(question) = form.questions.get(at.index) {
        if let QuestionKind::Group { questions } = &question.kind {
            if at.sub_index + 1 < questions.len() {
                return NavTarget::NextSubQuestion;
            }
        }
    }

    // Step boundary: walk the rule list in order, first match wins.
    for rule in &form.workflow.rules {
        if !rule_matches(rule, answers) {
            continue;
        }
        if let Some(target) = first_actionable(form, rule, at.index) {
            tracing::debug!(rule = %rule.id, ?target, "workflow rule fired");
            return target;
        }
        // Matched but nothing actionable: keep walking.
    }

    if at.index + 1 >= form.questions.len() {
        end_target(form)
    } else {
        NavTarget::NextLinear
    }
}

/// Scan a matched rule's actions in order for the first navigational one.
fn first_actionable(form: &Form, rule: &WorkflowRule, current_index: usize) -> Option<NavTarget> {
    for action in &rule.actions {
        match action {
            RuleAction::JumpTo { target } => {
                if target == END_FORM {
                    return Some(end_target(form));
                }
                if form.final_screen(target).is_some() {
                    return Some(NavTarget::GoToFinal(target.clone()));
                }
                match form.question_index(target) {
                    Some(index) if index != current_index => {
                        return Some(NavTarget::GoToQuestion(index))
                    }
                    // Self-jump (would loop forever) or dangling id:
                    // not actionable, keep scanning.
                    _ => {}
                }
            }
            RuleAction::EndForm => return Some(end_target(form)),
            // Display-only actions are not navigational.
            RuleAction::ShowMessage { .. }
            | RuleAction::Redirect { .. }
            | RuleAction::ShowField { .. }
            | RuleAction::HideField { .. } => {}
        }
    }
    None
}

/// End-of-form target: the default (first) final screen when one exists,
/// otherwise immediate submission.
pub fn end_target(form: &Form) -> NavTarget {
    match form.default_final() {
        Some(screen) => NavTarget::GoToFinal(screen.id.clone()),
        None => NavTarget::Submit,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AnswerValue;
    use crate::types::Form;

    fn form(doc: serde_json::Value) -> Form {
        Form::from_json(&doc).unwrap()
    }

    fn answered(pairs: &[(&str, &str)]) -> AnswerStore {
        let mut store = AnswerStore::new();
        for (id, value) in pairs {
            store.record(id, AnswerValue::Text(value.to_string()));
        }
        store
    }

    fn three_questions_with_rules(rules: serde_json::Value) -> Form {
        form(serde_json::json!({
            "id": "f1",
            "questions": [
                { "id": "q1", "type": "short-text", "order": 0 },
                { "id": "q2", "type": "short-text", "order": 1 },
                { "id": "q3", "type": "short-text", "order": 2 }
            ],
            "finals": [{ "id": "fin1", "title": "Thanks" }],
            "workflow": { "rules": rules }
        }))
    }

    #[test]
    fn linear_fallback_without_rules() {
        let f = three_questions_with_rules(serde_json::json!([]));
        let store = AnswerStore::new();
        assert_eq!(
            resolve_next(&f, &store, Position::new(0, 0)),
            NavTarget::NextLinear
        );
        assert_eq!(
            resolve_next(&f, &store, Position::new(2, 0)),
            NavTarget::GoToFinal("fin1".to_string())
        );
    }

    #[test]
    fn last_question_without_finals_submits() {
        let f = form(serde_json::json!({
            "id": "f1",
            "questions": [{ "id": "q1", "type": "short-text" }]
        }));
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 0)),
            NavTarget::Submit
        );
    }

    #[test]
    fn jump_to_question_by_id() {
        let f = three_questions_with_rules(serde_json::json!([
            { "id": "r1", "type": "if",
              "conditions": [{ "questionId": "q1", "operator": "equals", "value": "skip" }],
              "actions": [{ "type": "jumpTo", "targetQuestionId": "q3" }] }
        ]));
        let store = answered(&[("q1", "skip")]);
        assert_eq!(
            resolve_next(&f, &store, Position::new(0, 0)),
            NavTarget::GoToQuestion(2)
        );
        // Condition not met: linear.
        let store = answered(&[("q1", "stay")]);
        assert_eq!(
            resolve_next(&f, &store, Position::new(0, 0)),
            NavTarget::NextLinear
        );
    }

    #[test]
    fn end_form_sentinel_targets_default_final() {
        let f = three_questions_with_rules(serde_json::json!([
            { "id": "r1", "type": "if",
              "conditions": [{ "questionId": "q1", "operator": "equals", "value": "done" }],
              "actions": [{ "type": "jumpTo", "targetQuestionId": "end_form" }] }
        ]));
        let store = answered(&[("q1", "done")]);
        assert_eq!(
            resolve_next(&f, &store, Position::new(0, 0)),
            NavTarget::GoToFinal("fin1".to_string())
        );
    }

    #[test]
    fn jump_to_named_final_screen() {
        let f = form(serde_json::json!({
            "id": "f1",
            "questions": [{ "id": "q1", "type": "short-text" }],
            "finals": [
                { "id": "fin1", "title": "Default" },
                { "id": "fin2", "title": "Special" }
            ],
            "workflow": { "rules": [
                { "id": "r1", "type": "always",
                  "actions": [{ "type": "jumpTo", "targetQuestionId": "fin2" }] }
            ] }
        }));
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 0)),
            NavTarget::GoToFinal("fin2".to_string())
        );
    }

    #[test]
    fn first_matching_rule_wins() {
        let f = three_questions_with_rules(serde_json::json!([
            { "id": "rule_a", "type": "if",
              "conditions": [{ "questionId": "q1", "operator": "equals", "value": "x" }],
              "actions": [{ "type": "jumpTo", "targetQuestionId": "q2" }] },
            { "id": "rule_b", "type": "if",
              "conditions": [{ "questionId": "q1", "operator": "equals", "value": "x" }],
              "actions": [{ "type": "jumpTo", "targetQuestionId": "q3" }] }
        ]));
        let store = answered(&[("q1", "x")]);
        assert_eq!(
            resolve_next(&f, &store, Position::new(0, 0)),
            NavTarget::GoToQuestion(1)
        );
    }

    #[test]
    fn self_jump_falls_through_to_next_rule() {
        let f = three_questions_with_rules(serde_json::json!([
            { "id": "loop", "type": "always",
              "actions": [{ "type": "jumpTo", "targetQuestionId": "q1" }] },
            { "id": "after", "type": "always",
              "actions": [{ "type": "jumpTo", "targetQuestionId": "q3" }] }
        ]));
        // From q1 the first rule targets q1 itself: guarded, second rule fires.
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 0)),
            NavTarget::GoToQuestion(2)
        );
        // From q2 the first rule's target is a real jump.
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(1, 0)),
            NavTarget::GoToQuestion(0)
        );
    }

    #[test]
    fn self_jump_with_no_other_rule_falls_back_to_linear() {
        let f = three_questions_with_rules(serde_json::json!([
            { "id": "loop", "type": "always",
              "actions": [{ "type": "jumpTo", "targetQuestionId": "q2" }] }
        ]));
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(1, 0)),
            NavTarget::NextLinear
        );
    }

    #[test]
    fn dangling_target_falls_through() {
        let f = three_questions_with_rules(serde_json::json!([
            { "id": "broken", "type": "always",
              "actions": [{ "type": "jumpTo", "targetQuestionId": "deleted_question" }] }
        ]));
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 0)),
            NavTarget::NextLinear
        );
    }

    #[test]
    fn display_actions_are_skipped_within_a_rule() {
        let f = three_questions_with_rules(serde_json::json!([
            { "id": "r1", "type": "always",
              "actions": [
                  { "type": "showMessage", "message": "hello" },
                  { "type": "jumpTo", "targetQuestionId": "q3" }
              ] }
        ]));
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 0)),
            NavTarget::GoToQuestion(2)
        );
    }

    #[test]
    fn end_form_action_type() {
        let f = three_questions_with_rules(serde_json::json!([
            { "id": "r1", "type": "always", "actions": [{ "type": "endForm" }] }
        ]));
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 0)),
            NavTarget::GoToFinal("fin1".to_string())
        );
    }

    #[test]
    fn mid_group_steps_locally_even_when_a_rule_matches() {
        let f = form(serde_json::json!({
            "id": "f1",
            "questions": [
                { "id": "g1", "type": "question-group", "order": 0, "questions": [
                    { "id": "g1a", "type": "short-text", "order": 0 },
                    { "id": "g1b", "type": "short-text", "order": 1 }
                ] },
                { "id": "q2", "type": "short-text", "order": 1 }
            ],
            "workflow": { "rules": [
                { "id": "r1", "type": "always", "actions": [{ "type": "endForm" }] }
            ] }
        }));
        // Sub 0 of 2: pure local step, the always-rule is not consulted.
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 0)),
            NavTarget::NextSubQuestion
        );
        // Last sub-question: leaving the group, the rule fires.
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 1)),
            NavTarget::Submit
        );
    }

    #[test]
    fn multiquestion_is_one_step_and_consults_rules_on_exit() {
        let f = form(serde_json::json!({
            "id": "f1",
            "questions": [
                { "id": "m1", "type": "multiquestion", "order": 0, "questions": [
                    { "id": "m1a", "type": "short-text", "order": 0 },
                    { "id": "m1b", "type": "short-text", "order": 1 }
                ] },
                { "id": "q2", "type": "short-text", "order": 1 },
                { "id": "q3", "type": "short-text", "order": 2 }
            ],
            "workflow": { "rules": [
                { "id": "r1", "type": "if",
                  "conditions": [{ "questionId": "m1a", "operator": "equals", "value": "jump" }],
                  "actions": [{ "type": "jumpTo", "targetQuestionId": "q3" }] }
            ] }
        }));
        let store = answered(&[("m1a", "jump")]);
        assert_eq!(
            resolve_next(&f, &store, Position::new(0, 0)),
            NavTarget::GoToQuestion(2)
        );
    }

    #[test]
    fn sub_question_jump_target_dangles() {
        // jumpTo may only name top-level questions; a sub-question id
        // falls through like any dangling reference.
        let f = form(serde_json::json!({
            "id": "f1",
            "questions": [
                { "id": "q1", "type": "short-text", "order": 0 },
                { "id": "g1", "type": "question-group", "order": 1, "questions": [
                    { "id": "g1a", "type": "short-text", "order": 0 }
                ] }
            ],
            "workflow": { "rules": [
                { "id": "r1", "type": "always",
                  "actions": [{ "type": "jumpTo", "targetQuestionId": "g1a" }] }
            ] }
        }));
        assert_eq!(
            resolve_next(&f, &AnswerStore::new(), Position::new(0, 0)),
            NavTarget::NextLinear
        );
    }
}
