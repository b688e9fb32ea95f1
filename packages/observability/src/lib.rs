//! # Observability
//!
//! Centralized logging layer for the logsync agent.
//!
//! Components are **log producers** only. The binary calls
//! [`init_with_config`] once at startup and every crate uses the standard
//! `tracing` macros. Nothing below the binary knows where logs end up.
//!
//! ## Output
//!
//! Every event is written as one JSON object per line to a central file
//! (`~/.logsync/logs/agent.jsonl` unless overridden), which makes the stream
//! easy to follow:
//!
//! - `tail -f ~/.logsync/logs/agent.jsonl | jq`
//! - `jq 'select(.fields.file == "20230101_5.log")' agent.jsonl`
//!
//! A compact human-readable copy can additionally be sent to stderr for
//! foreground runs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "logsync-agent".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! })?;
//! ```

mod file_sink;
mod json_layer;

use std::io;
use std::path::PathBuf;

pub use file_sink::CentralLogWriter;
pub use json_layer::LogEntry;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "logsync-agent").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.logsync/logs/agent.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// Returns the path of the JSONL file the events are written to. Fails if
/// that file cannot be created; calling it twice in one process is a no-op
/// for the second call.
pub fn init_with_config(config: LogConfig) -> io::Result<PathBuf> {
    file_sink::init_subscriber(&config)
}
