//! Workflow rule condition evaluation.
//!
//! Conditions combine as a strict left-to-right fold: the first condition
//! seeds the accumulator, and each subsequent condition folds in with its
//! own connective (AND when unset). There is no operator precedence and no
//! grouping -- reordering a mixed AND/OR list changes the result, and that
//! ordering must be preserved exactly.

use crate::store::AnswerStore;
use crate::types::{Condition, ConditionOperator, LogicalOperator, RuleKind, WorkflowRule};

/// Whether `rule` matches the current answers. An `always` rule matches
/// unconditionally; an `if` rule with no conditions never matches.
pub fn rule_matches(rule: &WorkflowRule, answers: &AnswerStore) -> bool {
    match rule.kind {
        RuleKind::Always => true,
        RuleKind::If => eval_conditions(&rule.conditions, answers),
    }
}

/// Left-to-right fold over the condition list. Empty list evaluates false.
pub fn eval_conditions(conditions: &[Condition], answers: &AnswerStore) -> bool {
    let mut iter = conditions.iter();
    let first = match iter.next() {
        Some(cond) => cond,
        None => return false,
    };
    let mut acc = condition_holds(first, answers);
    for cond in iter {
        let cmp = condition_holds(cond, answers);
        acc = match cond.logical.unwrap_or(LogicalOperator::And) {
            LogicalOperator::And => acc && cmp,
            LogicalOperator::Or => acc || cmp,
        };
    }
    acc
}

/// Evaluate one condition. The stored answer (empty string when absent)
/// and the literal both coerce to strings, except the numeric operators
/// which parse both sides as floats -- a side that fails to parse makes
/// the comparison false.
fn condition_holds(cond: &Condition, answers: &AnswerStore) -> bool {
    let value = answers.text_of(&cond.question_id);
    let target = cond.value.as_str();
    match cond.operator {
        ConditionOperator::Equals => value == target,
        ConditionOperator::NotEquals => value != target,
        ConditionOperator::Contains => value.contains(target),
        ConditionOperator::NotContains => !value.contains(target),
        ConditionOperator::GreaterThan => {
            numeric_pair(&value, target).is_some_and(|(a, b)| a > b)
        }
        ConditionOperator::LessThan => {
            numeric_pair(&value, target).is_some_and(|(a, b)| a < b)
        }
    }
}

fn numeric_pair(a: &str, b: &str) -> Option<(f64, f64)> {
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AnswerValue;

    fn cond(
        question_id: &str,
        operator: ConditionOperator,
        value: &str,
        logical: Option<LogicalOperator>,
    ) -> Condition {
        Condition {
            question_id: question_id.to_string(),
            operator,
            value: value.to_string(),
            logical,
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> AnswerStore {
        let mut store = AnswerStore::new();
        for (id, value) in pairs {
            store.record(id, AnswerValue::Text(value.to_string()));
        }
        store
    }

    #[test]
    fn empty_condition_set_never_matches() {
        assert!(!eval_conditions(&[], &answers(&[("q1", "x")])));
    }

    #[test]
    fn equals_and_not_equals() {
        let store = answers(&[("q1", "yes")]);
        assert!(eval_conditions(
            &[cond("q1", ConditionOperator::Equals, "yes", None)],
            &store
        ));
        assert!(!eval_conditions(
            &[cond("q1", ConditionOperator::Equals, "no", None)],
            &store
        ));
        assert!(eval_conditions(
            &[cond("q1", ConditionOperator::NotEquals, "no", None)],
            &store
        ));
    }

    #[test]
    fn contains_is_substring() {
        let store = answers(&[("q1", "blue and green")]);
        assert!(eval_conditions(
            &[cond("q1", ConditionOperator::Contains, "and", None)],
            &store
        ));
        assert!(eval_conditions(
            &[cond("q1", ConditionOperator::NotContains, "red", None)],
            &store
        ));
    }

    #[test]
    fn absent_answer_coerces_to_empty_string() {
        let store = AnswerStore::new();
        assert!(eval_conditions(
            &[cond("missing", ConditionOperator::Equals, "", None)],
            &store
        ));
        assert!(!eval_conditions(
            &[cond("missing", ConditionOperator::Contains, "x", None)],
            &store
        ));
    }

    #[test]
    fn numeric_comparisons() {
        let store = answers(&[("age", "30")]);
        assert!(eval_conditions(
            &[cond("age", ConditionOperator::GreaterThan, "18", None)],
            &store
        ));
        assert!(!eval_conditions(
            &[cond("age", ConditionOperator::LessThan, "18", None)],
            &store
        ));
    }

    #[test]
    fn number_answers_compare_numerically() {
        let mut store = AnswerStore::new();
        store.record("rating", AnswerValue::Number(4.0));
        assert!(eval_conditions(
            &[cond("rating", ConditionOperator::GreaterThan, "3", None)],
            &store
        ));
    }

    #[test]
    fn non_numeric_side_makes_comparison_false() {
        let store = answers(&[("age", "abc")]);
        assert!(!eval_conditions(
            &[cond("age", ConditionOperator::GreaterThan, "0", None)],
            &store
        ));
        assert!(!eval_conditions(
            &[cond("age", ConditionOperator::LessThan, "1000", None)],
            &store
        ));
        // Absent answers are non-numeric too.
        assert!(!eval_conditions(
            &[cond("missing", ConditionOperator::GreaterThan, "-1", None)],
            &store
        ));
    }

    #[test]
    fn fold_is_left_to_right_without_precedence() {
        // C1 AND C2 OR C3 must evaluate as ((C1 AND C2) OR C3).
        // C1 = true, C2 = false, C3 = true -> true under left fold,
        // but C1 AND (C2 OR C3) would also be true, so pick values
        // that separate the two: C1 = false, C2 = true, C3 = true.
        // Left fold: (false AND true) OR true = true.
        // Precedence grouping false AND (true OR true) = false.
        let store = answers(&[("a", "no"), ("b", "yes"), ("c", "yes")]);
        let conditions = [
            cond("a", ConditionOperator::Equals, "yes", None),
            cond("b", ConditionOperator::Equals, "yes", Some(LogicalOperator::And)),
            cond("c", ConditionOperator::Equals, "yes", Some(LogicalOperator::Or)),
        ];
        assert!(eval_conditions(&conditions, &store));
    }

    #[test]
    fn condition_order_changes_mixed_fold_result() {
        // A OR B AND C: left fold gives ((A OR B) AND C).
        let store = answers(&[("a", "yes"), ("b", "no"), ("c", "no")]);
        let conditions = [
            cond("a", ConditionOperator::Equals, "yes", None),
            cond("b", ConditionOperator::Equals, "yes", Some(LogicalOperator::Or)),
            cond("c", ConditionOperator::Equals, "yes", Some(LogicalOperator::And)),
        ];
        assert!(!eval_conditions(&conditions, &store));
    }

    #[test]
    fn missing_connective_defaults_to_and() {
        let store = answers(&[("a", "yes"), ("b", "no")]);
        let conditions = [
            cond("a", ConditionOperator::Equals, "yes", None),
            cond("b", ConditionOperator::Equals, "yes", None),
        ];
        assert!(!eval_conditions(&conditions, &store));
    }

    #[test]
    fn always_rule_matches_with_no_conditions() {
        let rule = WorkflowRule {
            id: "r1".to_string(),
            kind: RuleKind::Always,
            conditions: vec![],
            actions: vec![],
        };
        assert!(rule_matches(&rule, &AnswerStore::new()));

        let empty_if = WorkflowRule {
            id: "r2".to_string(),
            kind: RuleKind::If,
            conditions: vec![],
            actions: vec![],
        };
        assert!(!rule_matches(&empty_if, &AnswerStore::new()));
    }
}
