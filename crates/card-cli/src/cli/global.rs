use std::path::PathBuf;

use card_core::enums::Task;
use clap::ValueEnum;

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Raw,
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub task: Option<Task>,
    pub schema: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}
