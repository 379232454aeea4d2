use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub fn dispatch(command: &Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Export(args) => commands::export::handle(args, ctx, flags),
        Commands::Load(args) => commands::load::handle(args, ctx, flags),
        Commands::Validate(args) => commands::validate::handle(args, ctx, flags),
        Commands::Schema(args) => commands::schema::handle(args, ctx, flags),
    }
}
