use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::LoadArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `mcard load`.
///
/// Sections that fail to load are listed in the printed report; the rest
/// are saved.
pub fn handle(args: &LoadArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.document)
        .with_context(|| format!("failed to read document {}", args.document.display()))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("document {} is not valid JSON", args.document.display()))?;

    let mut session = ctx
        .open_session(&args.session, flags)
        .context("failed to open session")?;
    let report = session.load(&document)?;
    for failure in &report.failures {
        tracing::warn!(section = %failure.section, reason = %failure.reason, "load: section skipped");
    }
    AppContext::save_session(&args.session, &session)?;
    output(&report, flags.format)
}
