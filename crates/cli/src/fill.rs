//! `opforms fill` -- terminal fill session.
//!
//! Walks a form on stdin/stdout one step at a time. `:back` steps to the
//! previous definition position; an empty line leaves an optional
//! question unanswered. The submitted response prints as JSON on stdout
//! (or lands in `--out`). Running out of input before submission exits
//! non-zero.

use std::io::{self, BufRead, Write};
use std::path::Path;

use opforms_engine::{
    AdvanceOutcome, AnswerValue, Question, QuestionKind, Session, StepView, SubQuestion,
    SubQuestionKind,
};

use crate::load_form;

const BACK_COMMAND: &str = ":back";

/// What happened on one prompted step.
enum StepResult {
    /// The session advanced (or refused to); outcome attached.
    Outcome(AdvanceOutcome),
    /// The cursor stayed or moved backward; nothing to report.
    Stay,
    /// Input ran dry mid-form.
    Eof,
}

pub(crate) fn cmd_fill(path: &Path, out: Option<&Path>) -> i32 {
    let Some(form) = load_form(path) else {
        return 1;
    };
    let mut session = Session::new(form);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        match session.current_step() {
            StepView::Welcome(welcome) => {
                println!("{}", welcome.title);
                if let Some(description) = &welcome.description {
                    println!("{}", description);
                }
                let button = welcome.button_text.as_deref().unwrap_or("Start");
                print!("[{}] ", button);
                flush();
                if read_line(&mut lines).is_none() {
                    return eof_exit();
                }
                session.advance();
            }
            StepView::Question { question, .. } => {
                let is_container = question.sub_questions().is_some();
                let result = if is_container {
                    prompt_multi(&mut session, &mut lines)
                } else {
                    prompt_leaf(&mut session, &mut lines)
                };
                match result {
                    StepResult::Eof => return eof_exit(),
                    StepResult::Stay => {}
                    StepResult::Outcome(outcome) => {
                        if let Some(exit) = handle_outcome(&session, outcome, out) {
                            return exit;
                        }
                    }
                }
            }
            StepView::GroupSub { .. } => match prompt_group_sub(&mut session, &mut lines) {
                StepResult::Eof => return eof_exit(),
                StepResult::Stay => {}
                StepResult::Outcome(outcome) => {
                    if let Some(exit) = handle_outcome(&session, outcome, out) {
                        return exit;
                    }
                }
            },
            StepView::Final(screen) => {
                println!("{}", screen.title);
                if let Some(description) = &screen.description {
                    println!("{}", description);
                }
                if screen.show_button {
                    let button = screen.button_text.as_deref().unwrap_or("Submit");
                    print!("[{}] ", button);
                    flush();
                    // The form is complete; EOF here still submits.
                    read_line(&mut lines);
                }
                let outcome = session.advance();
                if let Some(exit) = handle_outcome(&session, outcome, out) {
                    return exit;
                }
            }
            StepView::Completed => {
                let outcome = session.advance();
                return handle_outcome(&session, outcome, out).unwrap_or(0);
            }
        }
    }
}

/// Plain question; multiquestion containers go through `prompt_multi`.
fn prompt_leaf(
    session: &mut Session,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> StepResult {
    let StepView::Question { question, .. } = session.current_step() else {
        return StepResult::Stay;
    };
    let prompt = leaf_prompt(question);
    let question_id = question.id.clone();
    let kind = question.kind.clone();
    let Some(input) = ask(&prompt, lines) else {
        return StepResult::Eof;
    };
    if input == BACK_COMMAND {
        session.back();
        return StepResult::Stay;
    }
    if let Some(value) = parse_leaf_input(&kind, &input) {
        session.record_answer(&question_id, value);
    }
    StepResult::Outcome(session.advance())
}

/// All sub-questions of a multiquestion block, asked in one pass.
fn prompt_multi(
    session: &mut Session,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> StepResult {
    let StepView::Question { question, .. } = session.current_step() else {
        return StepResult::Stay;
    };
    println!("{}", heading(&question.title, &question.id));
    let subs: Vec<SubQuestion> = question
        .sub_questions()
        .map(<[SubQuestion]>::to_vec)
        .unwrap_or_default();
    for sub in subs {
        let Some(input) = ask(&sub_prompt(&sub), lines) else {
            return StepResult::Eof;
        };
        if input == BACK_COMMAND {
            session.back();
            return StepResult::Stay;
        }
        if let Some(value) = parse_sub_input(&sub.kind, &input) {
            session.record_answer(&sub.id, value);
        }
    }
    StepResult::Outcome(session.advance())
}

fn prompt_group_sub(
    session: &mut Session,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> StepResult {
    let StepView::GroupSub { sub, .. } = session.current_step() else {
        return StepResult::Stay;
    };
    let prompt = sub_prompt(sub);
    let sub_id = sub.id.clone();
    let sub_kind = sub.kind.clone();
    let Some(input) = ask(&prompt, lines) else {
        return StepResult::Eof;
    };
    if input == BACK_COMMAND {
        session.back();
        return StepResult::Stay;
    }
    if let Some(value) = parse_sub_input(&sub_kind, &input) {
        session.record_answer(&sub_id, value);
    }
    StepResult::Outcome(session.advance())
}

/// Print validation errors, emit the response on submission. Returns an
/// exit code when the session is over.
fn handle_outcome(session: &Session, outcome: AdvanceOutcome, out: Option<&Path>) -> Option<i32> {
    match outcome {
        AdvanceOutcome::Advanced => None,
        AdvanceOutcome::ValidationFailed => {
            for (question_id, kind) in session.validation_errors() {
                eprintln!("{}: {}", question_id, kind);
            }
            None
        }
        AdvanceOutcome::Submitted(response) => {
            let doc = match serde_json::to_string_pretty(&response) {
                Ok(doc) => doc,
                Err(e) => {
                    eprintln!("error: cannot serialize response: {}", e);
                    return Some(1);
                }
            };
            match out {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, &doc) {
                        eprintln!("error: cannot write {}: {}", path.display(), e);
                        return Some(1);
                    }
                    eprintln!("response written to {}", path.display());
                }
                None => println!("{}", doc),
            }
            Some(0)
        }
        AdvanceOutcome::NoOp => Some(0),
    }
}

fn eof_exit() -> i32 {
    eprintln!("error: unexpected end of input before the form was submitted");
    1
}

fn leaf_prompt(question: &Question) -> String {
    let mut prompt = heading(&question.title, &question.id);
    if let QuestionKind::MultipleChoice { options } = &question.kind {
        prompt.push_str(&format!(" [{}]", options.join("/")));
    }
    if question.required {
        prompt.push_str(" (required)");
    }
    prompt
}

fn sub_prompt(sub: &SubQuestion) -> String {
    let mut prompt = heading(&sub.title, &sub.id);
    if let SubQuestionKind::MultipleChoice { options } = &sub.kind {
        prompt.push_str(&format!(" [{}]", options.join("/")));
    }
    if sub.required {
        prompt.push_str(" (required)");
    }
    prompt
}

fn heading(title: &str, id: &str) -> String {
    if title.is_empty() {
        id.to_string()
    } else {
        title.to_string()
    }
}

fn parse_leaf_input(kind: &QuestionKind, input: &str) -> Option<AnswerValue> {
    if input.is_empty() {
        return None;
    }
    Some(match kind {
        QuestionKind::Number | QuestionKind::Rating => match input.trim().parse::<f64>() {
            Ok(n) => AnswerValue::Number(n),
            Err(_) => AnswerValue::Text(input.to_string()),
        },
        QuestionKind::MultipleChoice { .. } => {
            AnswerValue::Choices(input.split(',').map(|s| s.trim().to_string()).collect())
        }
        _ => AnswerValue::Text(input.to_string()),
    })
}

fn parse_sub_input(kind: &SubQuestionKind, input: &str) -> Option<AnswerValue> {
    if input.is_empty() {
        return None;
    }
    Some(match kind {
        SubQuestionKind::Number | SubQuestionKind::Rating => match input.trim().parse::<f64>() {
            Ok(n) => AnswerValue::Number(n),
            Err(_) => AnswerValue::Text(input.to_string()),
        },
        SubQuestionKind::MultipleChoice { .. } => {
            AnswerValue::Choices(input.split(',').map(|s| s.trim().to_string()).collect())
        }
        _ => AnswerValue::Text(input.to_string()),
    })
}

/// Prompt and read one line. `None` means stdin hit EOF.
fn ask(prompt: &str, lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<String> {
    print!("{}: ", prompt);
    flush();
    read_line(lines)
}

fn read_line(lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<String> {
    lines.next()?.ok().map(|line| line.trim().to_string())
}

fn flush() {
    let _ = io::stdout().flush();
}
