use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `mcard export`.
pub fn handle(args: &ExportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    if !args.session.exists() {
        anyhow::bail!("session {} does not exist", args.session.display());
    }
    let session = ctx
        .open_session(&args.session, flags)
        .context("failed to open session")?;
    output(&session.export(), flags.format)
}
