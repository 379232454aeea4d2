use anyhow::Context;
use card_core::report::MissingFieldReport;
use card_engine::FormatViolation;
use serde::Serialize;

use crate::cli::root_commands::ValidateArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::table::{TableOptions, render_table};
use crate::output::{output, render_missing, section_title};

#[derive(Debug, Serialize)]
struct ValidationResponse {
    missing: MissingFieldReport,
    format_violations: Vec<FormatViolation>,
}

/// Handle `mcard validate`.
pub fn handle(args: &ValidateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let session = ctx
        .open_session(&args.session, flags)
        .context("failed to open session")?;
    let response = ValidationResponse {
        missing: session.missing(),
        format_violations: session.format_violations(),
    };

    match flags.format {
        OutputFormat::Table => println!("{}", render_warnings(&response)),
        format => output(&response, format)?,
    }

    let strict = args.strict || ctx.config.general.strict;
    if strict && !response.missing.is_empty() {
        anyhow::bail!("{} required field(s) missing", response.missing.len());
    }
    Ok(())
}

fn render_warnings(response: &ValidationResponse) -> String {
    let mut out = render_missing(&response.missing);
    if !response.format_violations.is_empty() {
        let rows: Vec<Vec<String>> = response
            .format_violations
            .iter()
            .map(|violation| {
                vec![
                    section_title(&violation.section).to_string(),
                    violation.label.clone(),
                    violation.value.clone(),
                    violation.message.clone(),
                ]
            })
            .collect();
        out.push_str("\n\nInvalid formats\n");
        out.push_str(&render_table(
            &["section", "field", "value", "message"],
            &rows,
            TableOptions::from_env(),
        ));
    }
    out
}
