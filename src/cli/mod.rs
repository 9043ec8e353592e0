//! Command-line interface for docforge
//!
//! - `args`: clap argument definitions
//! - `run`: entry point and dispatch
//! - `commands`: command implementations

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands, GenerateArgs, VersionCommands};
pub use run::run;
