//! Structured logging setup and stage-level log helpers.
//!
//! Every event emitted here carries `project` and `stage` fields so a run can
//! be followed with `RUST_LOG=docforge=debug`.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_error_message;

/// Returns true only if stderr is a terminal and `NO_COLOR` is unset.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise verbose mode logs docforge crates at
/// debug and closes spans with timing; the default is info.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("docforge=debug,info")
            } else {
                EnvFilter::try_new("docforge=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_color())
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .compact();

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                layer
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.with_target(false))
            .try_init()?;
    }

    Ok(())
}

/// Span covering one stage's generation.
pub fn stage_span(project: &str, stage: &str) -> tracing::Span {
    span!(
        Level::INFO,
        "stage",
        project = %project,
        stage = %stage,
    )
}

pub fn log_stage_start(project: &str, stage: &str, position: usize, total: usize) {
    info!(
        project = %project,
        stage = %stage,
        position = position + 1,
        total = total,
        "Generating document"
    );
}

pub fn log_stage_complete(project: &str, stage: &str, duration_ms: u128, bytes: usize) {
    info!(
        project = %project,
        stage = %stage,
        duration_ms = %duration_ms,
        bytes = bytes,
        "Document generated"
    );
}

/// Error text is redacted before it reaches the subscriber.
pub fn log_stage_error(project: &str, stage: &str, error: &str, duration_ms: u128) {
    let sanitized = redact_error_message(error);
    error!(
        project = %project,
        stage = %stage,
        duration_ms = %duration_ms,
        error = %sanitized,
        "Document generation failed"
    );
}
