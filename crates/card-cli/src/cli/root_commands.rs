use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Print the structured document for a session file.
    Export(ExportArgs),
    /// Load a structured document into a session file.
    Load(LoadArgs),
    /// Report required fields still missing and answers with a bad format.
    Validate(ValidateArgs),
    /// List schema fields that apply to the active task.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    /// Session file (flat store JSON).
    pub session: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct LoadArgs {
    /// Structured document to load.
    pub document: PathBuf,

    /// Session file to update; created when it does not exist.
    #[arg(short, long)]
    pub session: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct ValidateArgs {
    /// Session file (flat store JSON).
    pub session: PathBuf,

    /// Exit non-zero when any required field is missing.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Only list fields of this section.
    #[arg(long)]
    pub section: Option<String>,
}
