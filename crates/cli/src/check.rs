//! `opforms check` -- static form definition checks.

use std::path::Path;

use opforms_engine::lint_form;

use crate::{load_form, OutputFormat};

pub(crate) fn cmd_check(path: &Path, output: OutputFormat) -> i32 {
    let Some(form) = load_form(path) else {
        return 1;
    };
    let findings = lint_form(&form);

    match output {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "formId": form.id,
                "findings": findings.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
                "ok": findings.is_empty(),
            });
            println!("{}", doc);
        }
        OutputFormat::Text => {
            if findings.is_empty() {
                println!("{}: ok", form.id);
            } else {
                for finding in &findings {
                    println!("{}: {}", form.id, finding);
                }
            }
        }
    }

    if findings.is_empty() {
        0
    } else {
        1
    }
}
