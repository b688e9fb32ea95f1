//! Logging initialization for the agent.
//!
//! All components log through `tracing`; this wires the central JSONL sink
//! (`~/.logsync/logs/agent.jsonl` unless overridden) plus a stderr copy.

use std::io;
use std::path::PathBuf;

/// Initialize the logging system for the agent.
///
/// `RUST_LOG` still wins over `level` when set. Returns the path of the JSONL
/// log file.
///
/// ```ignore
/// init_logging("info", None)?;
/// tracing::info!("agent started");
/// ```
pub fn init_logging(level: &str, log_path: Option<PathBuf>) -> io::Result<PathBuf> {
    let default_level = parse_level(level)
        .map(|level| level.to_string().to_ascii_lowercase())
        .unwrap_or_else(|| crate::DEFAULT_LOG_LEVEL.to_string());

    observability::init_with_config(observability::LogConfig {
        service_name: "logsync-agent".into(),
        default_level,
        log_path,
        also_stderr: true,
    })
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}
