//! CLI argument definitions (clap derive).

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// docforge - dependency-ordered LLM documentation pipeline
#[derive(Parser, Debug)]
#[command(name = "docforge")]
#[command(about = "Generate a chain of project documents with an LLM and keep versioned snapshots")]
#[command(long_about = r#"
docforge turns a short project description into a chain of planning documents.
Each stage sees the documents of the stages it depends on:

  brainstorm → requirement_confirm → prd → workflow → tech_stack
             → frontend / backend → dev_plan

Every completed document is saved immediately under
<output_dir>/<project>/current/, and snapshots can be taken under versions/.

EXAMPLES:
  # Generate every document for a project
  docforge generate shop --description "An online shop for handmade goods"

  # Regenerate one stage using the saved documents it depends on
  docforge generate shop --stage prd

  # Snapshot, compare and restore
  docforge versions checkpoint shop --label "first draft"
  docforge versions diff shop 20260101_120000_000 20260102_090000_000
  docforge versions revert shop 20260101_120000_000

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults.
  The config file is discovered upward from the working directory at
  .docforge/config.toml; use --config for an explicit path.
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model used for every stage without a stage override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Maximum tokens per completion
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Directory holding one prompt file per stage
    #[arg(long, global = true)]
    pub prompts_dir: Option<PathBuf>,

    /// Root directory for generated documents and versions
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Write a JSON trace of every model call
    #[arg(long, global = true)]
    pub trace: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate documents for a project
    Generate(GenerateArgs),

    /// List pipeline stages with their files and dependencies
    Stages {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage document versions
    #[command(subcommand)]
    Versions(VersionCommands),

    /// Show the effective configuration and where each value came from
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Project name; also the directory name under the output root
    pub project: Option<String>,

    /// Project description
    #[arg(short, long)]
    pub description: Option<String>,

    /// JSON file with project information (`name`, `description`, extra keys)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Extra project metadata as key=value (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,

    /// Generate only this stage, using saved documents for its dependencies
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Take a version snapshot after generation succeeds
    #[arg(long)]
    pub checkpoint: bool,

    /// Label for the snapshot taken with --checkpoint
    #[arg(long, requires = "checkpoint")]
    pub label: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum VersionCommands {
    /// List the versions of a project
    List {
        project: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Snapshot the current documents as a new version
    Checkpoint {
        project: String,

        /// Version id to use instead of the current timestamp
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Show a version's metadata and documents
    Show {
        project: String,
        version: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two versions
    Diff {
        project: String,
        from: String,
        to: String,
    },

    /// Restore a version's documents into current/
    Revert { project: String, version: String },

    /// Print the project's version history
    Report {
        project: String,

        #[arg(long, value_enum, default_value_t = ReportFormatArg::Markdown)]
        format: ReportFormatArg,
    },

    /// Copy a version's documents and details into a directory
    Export {
        project: String,
        version: String,
        target: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormatArg {
    Markdown,
    Text,
}
