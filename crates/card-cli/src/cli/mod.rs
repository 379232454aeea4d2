use std::path::PathBuf;

use card_core::enums::Task;
use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `mcard` binary.
#[derive(Debug, Parser)]
#[command(name = "mcard", version, about = "Model card sessions: export, load, validate")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Task for the session (e.g. "Segmentation"); errors if the session
    /// already chose a different task
    #[arg(short, long, global = true)]
    pub task: Option<Task>,

    /// Schema file replacing the embedded default
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            task: self.task,
            schema: self.schema.clone(),
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}
