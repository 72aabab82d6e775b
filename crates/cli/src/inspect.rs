//! `opforms inspect` -- structural summary of a form definition.

use std::path::Path;

use opforms_engine::{Form, Question};

use crate::{load_form, OutputFormat};

pub(crate) fn cmd_inspect(path: &Path, output: OutputFormat) -> i32 {
    let Some(form) = load_form(path) else {
        return 1;
    };

    match output {
        OutputFormat::Json => println!("{}", summary(&form)),
        OutputFormat::Text => {
            println!("form: {} ({})", form.title, form.id);
            println!(
                "steps: {} ({} top-level questions)",
                form.step_count(),
                form.questions.len()
            );
            for question in &form.questions {
                print_question(question);
            }
            if !form.finals.is_empty() {
                let ids: Vec<&str> = form.finals.iter().map(|f| f.id.as_str()).collect();
                println!("finals: {}", ids.join(", "));
            }
            println!("rules: {}", form.workflow.rules.len());
        }
    }
    0
}

fn print_question(question: &Question) {
    match question.sub_questions() {
        Some(subs) => {
            println!("  {} ({} sub-questions)", question.id, subs.len());
            for sub in subs {
                println!("    {}", sub.id);
            }
        }
        None => println!("  {}", question.id),
    }
}

fn summary(form: &Form) -> serde_json::Value {
    let questions: Vec<serde_json::Value> = form
        .questions
        .iter()
        .map(|q| {
            serde_json::json!({
                "id": q.id,
                "required": q.required,
                "subQuestions": q
                    .sub_questions()
                    .map(|subs| subs.iter().map(|s| s.id.clone()).collect::<Vec<_>>()),
            })
        })
        .collect();

    serde_json::json!({
        "id": form.id,
        "title": form.title,
        "stepCount": form.step_count(),
        "questions": questions,
        "finals": form.finals.iter().map(|f| f.id.clone()).collect::<Vec<_>>(),
        "hasWelcome": form.welcome.is_some(),
        "ruleCount": form.workflow.rules.len(),
    })
}
