//! Structured logging for tsa-core.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for batch jobs
//!
//! stdout is reserved for command payloads (scored tables, reports);
//! all log output goes to stderr.

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Stage};

use std::io::IsTerminal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter for `config`.
///
/// `RUST_LOG` directives win when present; otherwise every tsa crate logs at
/// the configured level and everything else is silenced.
fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = LevelFilter::from(config.level);
        EnvFilter::new(format!(
            "tsa_core={level},tsa_config={level},tsa_math={level}"
        ))
    })
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. A second call
/// (as happens across tests) is ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config);

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    };
    // already installed
    let _ = result;
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    // first 12 hex chars are plenty for correlation
    format!("run-{}", &uuid.simple().to_string()[..12])
}

/// Emit a structured event with the run id, event name and stage attached.
///
/// ```ignore
/// log_event!(INFO, run_id, event_names::TABLE_LOADED, Stage::Load, "table loaded", rows = 120);
/// ```
#[macro_export]
macro_rules! log_event {
    (INFO, $run_id:expr, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(run_id = %$run_id, event = $event, stage = %$stage, $($key = $val,)* "{}", $msg)
    };
    (DEBUG, $run_id:expr, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(run_id = %$run_id, event = $event, stage = %$stage, $($key = $val,)* "{}", $msg)
    };
    (WARN, $run_id:expr, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(run_id = %$run_id, event = $event, stage = %$stage, $($key = $val,)* "{}", $msg)
    };
    (ERROR, $run_id:expr, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(run_id = %$run_id, event = $event, stage = %$stage, $($key = $val,)* "{}", $msg)
    };
}
