//! Response assembly.
//!
//! Walks the form definition in order (sub-questions in place of their
//! container) and collects the answers that exist and are non-empty.
//! Answer-store insertion order never shows through, and answers left
//! behind on branch-skipped steps are included like any other.

use rand::Rng;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::store::AnswerStore;
use crate::types::{Answer, Form, Response};

/// Assemble the terminal response payload for a completed session.
pub fn assemble(
    form: &Form,
    answers: &AnswerStore,
    response_id: String,
    submitted_at: OffsetDateTime,
) -> Response {
    let mut collected = Vec::new();
    for question in &form.questions {
        match question.sub_questions() {
            Some(subs) => {
                for sub in subs {
                    push_answer(&mut collected, &sub.id, answers);
                }
            }
            None => push_answer(&mut collected, &question.id, answers),
        }
    }
    Response {
        id: response_id,
        form_id: form.id.clone(),
        submitted_at: submitted_at.format(&Rfc3339).unwrap_or_default(),
        answers: collected,
    }
}

fn push_answer(collected: &mut Vec<Answer>, question_id: &str, answers: &AnswerStore) {
    if let Some(value) = answers.get(question_id) {
        if !value.is_empty() {
            collected.push(Answer {
                question_id: question_id.to_string(),
                value: value.clone(),
            });
        }
    }
}

/// Nine lowercase base-36 characters, the id shape stored responses use.
pub fn generate_response_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AnswerValue;
    use time::macros::datetime;

    fn form() -> Form {
        Form::from_json(&serde_json::json!({
            "id": "f1",
            "questions": [
                { "id": "name", "type": "short-text", "order": 0 },
                { "id": "contact", "type": "question-group", "order": 1, "questions": [
                    { "id": "email", "type": "email", "order": 0 },
                    { "id": "phone", "type": "short-text", "order": 1 }
                ] },
                { "id": "rating", "type": "rating", "order": 2 }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn answers_follow_definition_order_not_entry_order() {
        let mut answers = AnswerStore::new();
        answers.record("rating", AnswerValue::Number(5.0));
        answers.record("name", "Ada".into());
        answers.record("email", "ada@example.com".into());

        let response = assemble(&form(), &answers, "id123".to_string(), datetime!(2026-08-23 12:00 UTC));
        let ids: Vec<&str> = response
            .answers
            .iter()
            .map(|a| a.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["name", "email", "rating"]);
        assert_eq!(response.form_id, "f1");
        assert_eq!(response.submitted_at, "2026-08-23T12:00:00Z");
    }

    #[test]
    fn empty_and_absent_answers_are_omitted() {
        let mut answers = AnswerStore::new();
        answers.record("name", "  ".into());
        answers.record("phone", "555".into());

        let response = assemble(&form(), &answers, "id123".to_string(), datetime!(2026-08-23 12:00 UTC));
        let ids: Vec<&str> = response
            .answers
            .iter()
            .map(|a| a.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["phone"]);
    }

    #[test]
    fn all_empty_yields_empty_answer_list() {
        let response = assemble(
            &form(),
            &AnswerStore::new(),
            "id123".to_string(),
            datetime!(2026-08-23 12:00 UTC),
        );
        assert!(response.answers.is_empty());
    }

    #[test]
    fn response_id_shape() {
        let id = generate_response_id();
        assert_eq!(id.len(), 9);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
