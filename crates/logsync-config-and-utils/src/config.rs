//! Configuration management for the agent.
//!
//! The config file is deserialized into a permissive [`RawConfig`] and then
//! validated exactly once into an immutable [`AgentConfig`]. Components only
//! ever see the validated form.

use crate::{parse_level, CoreError, CoreResult, Paths};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default syslog TCP port.
pub const DEFAULT_SYSLOG_PORT: u16 = 514;
/// Default SFTP port.
pub const DEFAULT_SFTP_PORT: u16 = 22;

/// A string that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The underlying value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Fixed delays and budgets of the fetch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTiming {
    /// Pause between two full iterations of the outer loop.
    pub loop_interval: Duration,
    /// Pause between two attempts at the same file.
    pub retry_wait: Duration,
    /// Extra pause after a 404 for a file that is not generated yet.
    pub miss_backoff: Duration,
    /// Download attempts per file per loop iteration.
    pub max_attempts: u32,
    /// Not-yet-generated 404s tolerated before resyncing to the oldest file.
    pub max_consecutive_misses: u32,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for SyncTiming {
    fn default() -> Self {
        Self {
            loop_interval: Duration::from_secs(3),
            retry_wait: Duration::from_secs(3),
            miss_backoff: Duration::from_secs(10),
            max_attempts: 4,
            max_consecutive_misses: 3,
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl SyncTiming {
    /// Timing with every delay set to zero, for tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            loop_interval: Duration::ZERO,
            retry_wait: Duration::ZERO,
            miss_backoff: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Syslog forwarding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogSettings {
    /// Candidate hosts; one is picked per file.
    pub addresses: Vec<String>,
    pub port: u16,
}

/// SFTP forwarding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SftpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret,
    pub remote_dir: String,
}

/// Validated, immutable agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// API id used as the Basic auth user name.
    pub api_id: String,
    /// API key used as the Basic auth password.
    pub api_key: Secret,
    /// Remote store location; always ends with `/`.
    pub base_url: Url,
    /// HTTP(S) proxy address, when proxying is enabled.
    pub proxy: Option<String>,
    /// PEM bundle to trust in addition to the built-in roots.
    pub custom_ca: Option<PathBuf>,
    /// Append decrypted content to `process_dir/<file>`.
    pub local_save: bool,
    /// Local output directory; also hosts the `fail/` quarantine directory.
    pub process_dir: PathBuf,
    /// Syslog forwarding, when enabled.
    pub syslog: Option<SyslogSettings>,
    /// SFTP forwarding, when enabled.
    pub sftp: Option<SftpSettings>,
    pub log_level: String,
    pub timing: SyncTiming,
}

impl AgentConfig {
    /// Load and validate `config.json` from the agent's base directory.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        Self::load_from_file(&paths.config_file())
    }

    /// Load and validate a specific config file.
    ///
    /// `LOGSYNC_LOG_LEVEL` overrides the file's `log_level`.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let mut raw: RawConfig = serde_json::from_str(&content)?;
        if let Ok(level) = std::env::var("LOGSYNC_LOG_LEVEL") {
            raw.log_level = Some(level);
        }
        raw.validate()
    }

    /// Quarantine directory for files that failed decryption or delivery.
    pub fn quarantine_dir(&self) -> PathBuf {
        self.process_dir.join("fail")
    }

    /// Short human-readable list of enabled sinks.
    pub fn enabled_sinks(&self) -> Vec<&'static str> {
        let mut sinks = Vec::new();
        if self.syslog.is_some() {
            sinks.push("syslog");
        }
        if self.local_save {
            sinks.push("local");
        }
        if self.sftp.is_some() {
            sinks.push("sftp");
        }
        sinks
    }
}

/// Config file contents as written by the operator, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub api_id: String,
    pub api_key: Secret,
    pub base_url: String,
    pub process_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub proxy: RawProxy,
    pub custom_ca: RawCustomCa,
    pub local_save: RawLocalSave,
    pub syslog: RawSyslog,
    pub sftp: RawSftp,
    pub timing: RawTiming,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawProxy {
    pub enabled: bool,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawCustomCa {
    pub enabled: bool,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawLocalSave {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSyslog {
    pub enabled: bool,
    /// Host names; entries may also be comma-separated lists.
    pub addresses: Vec<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSftp {
    pub enabled: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub remote_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawTiming {
    pub loop_interval_secs: Option<u64>,
    pub retry_wait_secs: Option<u64>,
    pub miss_backoff_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub max_consecutive_misses: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

fn required(value: Option<String>, field: &str) -> CoreResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::Config(format!("{field} is required")))
}

impl RawConfig {
    /// Validate every field and build the immutable configuration.
    pub fn validate(self) -> CoreResult<AgentConfig> {
        let api_id = required(Some(self.api_id), "api_id")?;
        if self.api_key.expose().trim().is_empty() {
            return Err(CoreError::Config("api_key is required".to_string()));
        }

        let base_url = parse_base_url(&required(Some(self.base_url), "base_url")?)?;

        let process_dir = self
            .process_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| CoreError::Config("process_dir is required".to_string()))?;

        let log_level = match self.log_level {
            Some(level) => parse_level(&level)
                .map(|parsed| parsed.to_string().to_ascii_lowercase())
                .ok_or_else(|| {
                    CoreError::Config(format!(
                        "log_level must be one of trace, debug, info, warn, error (got {level:?})"
                    ))
                })?,
            None => DEFAULT_LOG_LEVEL.to_string(),
        };

        let proxy = if self.proxy.enabled {
            let address = required(self.proxy.address, "proxy.address")?;
            Url::parse(&address).map_err(|e| {
                CoreError::Config(format!("proxy.address is not a valid URL: {e}"))
            })?;
            Some(address)
        } else {
            None
        };

        let custom_ca = if self.custom_ca.enabled {
            let path = self
                .custom_ca
                .path
                .ok_or_else(|| CoreError::Config("custom_ca.path is required".to_string()))?;
            if !path.is_file() {
                return Err(CoreError::Config(format!(
                    "custom_ca.path does not exist: {}",
                    path.display()
                )));
            }
            Some(path)
        } else {
            None
        };

        let syslog = if self.syslog.enabled {
            let addresses: Vec<String> = self
                .syslog
                .addresses
                .iter()
                .flat_map(|entry| entry.split(','))
                .map(|host| host.trim().to_string())
                .filter(|host| !host.is_empty())
                .collect();
            if addresses.is_empty() {
                return Err(CoreError::Config(
                    "syslog.addresses must list at least one host".to_string(),
                ));
            }
            Some(SyslogSettings {
                addresses,
                port: self.syslog.port.unwrap_or(DEFAULT_SYSLOG_PORT),
            })
        } else {
            None
        };

        let sftp = if self.sftp.enabled {
            let password = self
                .sftp
                .password
                .filter(|p| !p.is_empty())
                .ok_or_else(|| CoreError::Config("sftp.password is required".to_string()))?;
            Some(SftpSettings {
                host: required(self.sftp.host, "sftp.host")?,
                port: self.sftp.port.unwrap_or(DEFAULT_SFTP_PORT),
                username: required(self.sftp.username, "sftp.username")?,
                password,
                remote_dir: required(self.sftp.remote_dir, "sftp.remote_dir")?,
            })
        } else {
            None
        };

        Ok(AgentConfig {
            api_id,
            api_key: self.api_key,
            base_url,
            proxy,
            custom_ca,
            local_save: self.local_save.enabled,
            process_dir,
            syslog,
            sftp,
            log_level,
            timing: self.timing.resolve()?,
        })
    }
}

impl RawTiming {
    fn resolve(self) -> CoreResult<SyncTiming> {
        let defaults = SyncTiming::default();
        let secs = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_secs).unwrap_or(fallback)
        };
        let timing = SyncTiming {
            loop_interval: secs(self.loop_interval_secs, defaults.loop_interval),
            retry_wait: secs(self.retry_wait_secs, defaults.retry_wait),
            miss_backoff: secs(self.miss_backoff_secs, defaults.miss_backoff),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            max_consecutive_misses: self
                .max_consecutive_misses
                .unwrap_or(defaults.max_consecutive_misses),
            request_timeout: secs(self.request_timeout_secs, defaults.request_timeout),
        };
        if timing.max_attempts == 0 {
            return Err(CoreError::Config(
                "timing.max_attempts must be at least 1".to_string(),
            ));
        }
        if timing.request_timeout.is_zero() {
            return Err(CoreError::Config(
                "timing.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(timing)
    }
}

/// Parse the remote store URL, forcing a trailing `/` so file names can be
/// joined onto it.
fn parse_base_url(raw: &str) -> CoreResult<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CoreError::Config(format!(
            "base_url must use http or https (got {other})"
        ))),
    }
}
