//! File system paths for the agent.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name under the home directory used when no base dir is given.
const DEFAULT_BASE_DIR_NAME: &str = ".logsync";

/// Manages file system paths for the agent.
///
/// Everything the agent owns lives under one base directory:
///
/// ```text
/// <base_dir>/
/// ├── config.json
/// ├── last_file_id          cursor: name of the last fully processed file
/// ├── agent.pid
/// ├── keys/<publicKeyId>/Private.key
/// └── logs/agent.jsonl
/// ```
///
/// Downloaded content and quarantined files go to the configured
/// `process_dir`, which is usually elsewhere.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Create a Paths instance rooted at `~/.logsync`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(DEFAULT_BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (`<base>/config.json`).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the cursor file path (`<base>/last_file_id`).
    pub fn cursor_file(&self) -> PathBuf {
        self.base_dir.join("last_file_id")
    }

    /// Get the PID file path (`<base>/agent.pid`).
    pub fn pid_file(&self) -> PathBuf {
        self.base_dir.join("agent.pid")
    }

    /// Get the key repository root (`<base>/keys`).
    pub fn keys_dir(&self) -> PathBuf {
        self.base_dir.join("keys")
    }

    /// Get the logs directory (`<base>/logs`).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the agent log file path (`<base>/logs/agent.jsonl`).
    pub fn agent_log_file(&self) -> PathBuf {
        self.logs_dir().join("agent.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
