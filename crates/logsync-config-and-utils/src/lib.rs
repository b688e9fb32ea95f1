//! Core types, configuration, and utilities for the logsync agent.

mod config;
mod error;
mod failure;
mod logging;
mod paths;

pub use config::{
    AgentConfig, RawConfig, Secret, SftpSettings, SyncTiming, SyslogSettings,
    DEFAULT_LOG_LEVEL, DEFAULT_SFTP_PORT, DEFAULT_SYSLOG_PORT,
};
pub use error::{CoreError, CoreResult};
pub use failure::FailureKind;
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
