//! CLI entry point and dispatch.
//!
//! `run()` parses arguments, sets up logging, discovers configuration,
//! dispatches to a command and reports any error. It does all the printing;
//! `main` only turns the returned code into a process exit.

use clap::Parser;

use docforge_config::{CliArgs, Config};
use docforge_utils::error::{ConfigError, DocforgeError};
use docforge_utils::exit_codes::ExitCode;
use docforge_utils::logging::init_tracing;
use docforge_utils::redaction::redact_error_message;

use super::args::{Cli, Commands};
use super::commands;

/// Run the CLI with the process arguments.
///
/// Returns `Err(code)` after the error has been printed to stderr.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: logging disabled: {e}");
    }

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        model: cli.model.clone(),
        temperature: cli.temperature,
        max_tokens: cli.max_tokens,
        base_url: cli.base_url.clone(),
        prompts_dir: cli.prompts_dir.clone(),
        output_dir: cli.output_dir.clone(),
        trace: cli.trace,
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => {
            let err = config_error(err);
            eprintln!("{}", err.display_for_user());
            return Err(err.to_exit_code());
        }
    };

    let result = match cli.command {
        Commands::Generate(args) => commands::execute_generate_command(args, &config),
        Commands::Stages { json } => commands::execute_stages_command(json),
        Commands::Versions(command) => commands::execute_versions_command(command, &config),
        Commands::Config { json } => commands::execute_config_command(json, &config),
    };

    if let Err(err) = result {
        eprintln!("{}", err.display_for_user());
        if cli.verbose {
            eprintln!("  ↳ {}", redact_error_message(&format!("{err:?}")));
        }
        return Err(err.to_exit_code());
    }

    Ok(())
}

/// Keep a typed `ConfigError` when discovery produced one.
fn config_error(err: anyhow::Error) -> DocforgeError {
    match err.downcast::<ConfigError>() {
        Ok(config_err) => DocforgeError::Config(config_err),
        Err(other) => DocforgeError::Config(ConfigError::DiscoveryFailed {
            reason: format!("{other:#}"),
        }),
    }
}
