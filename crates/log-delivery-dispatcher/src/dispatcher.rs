//! Fan-out of one decrypted file to the configured sinks.

use crate::{
    append_local, gzip_file, DeliveryError, DeliveryResult, EndpointSelector, RandomSelector,
    SftpUploader, SyslogTransport, TcpSyslogTransport,
};
use log_envelope_crypto::DecryptedContent;
use logsync_config_and_utils::{AgentConfig, SftpSettings, SyslogSettings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sync_cursor_store::FileId;
use tracing::{debug, error, info, warn};

/// Which steps run, and where.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub syslog: Option<SyslogSettings>,
    pub local_save: bool,
    pub process_dir: PathBuf,
    pub sftp: Option<SftpSettings>,
}

impl DispatchSettings {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            syslog: config.syslog.clone(),
            local_save: config.local_save,
            process_dir: config.process_dir.clone(),
            sftp: config.sftp.clone(),
        }
    }
}

/// Result of a single delivery step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Disabled,
    Done,
    Skipped(String),
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// Per-step outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub syslog: StepOutcome,
    pub local: StepOutcome,
    pub sftp: StepOutcome,
    pub compress: StepOutcome,
}

impl DeliveryReport {
    fn new() -> Self {
        Self {
            syslog: StepOutcome::Disabled,
            local: StepOutcome::Disabled,
            sftp: StepOutcome::Disabled,
            compress: StepOutcome::Disabled,
        }
    }

    /// Failures that make the whole file count as undelivered. SFTP upload
    /// and compression failures are reported but never counted here.
    fn mandatory_failures(&self) -> Vec<String> {
        [("syslog", &self.syslog), ("local", &self.local)]
            .into_iter()
            .filter_map(|(step, outcome)| match outcome {
                StepOutcome::Failed(reason) => Some(format!("{step}: {reason}")),
                _ => None,
            })
            .collect()
    }
}

/// Delivers decrypted content to syslog, local disk and SFTP.
pub struct Dispatcher {
    settings: DispatchSettings,
    selector: Arc<dyn EndpointSelector>,
    syslog: Arc<dyn SyslogTransport>,
    sftp: Option<Arc<dyn SftpUploader>>,
}

impl Dispatcher {
    /// Dispatcher with the default random selector and TCP syslog transport.
    pub fn new(settings: DispatchSettings, sftp: Option<Arc<dyn SftpUploader>>) -> Self {
        Self {
            settings,
            selector: Arc::new(RandomSelector),
            syslog: Arc::new(TcpSyslogTransport::default()),
            sftp,
        }
    }

    pub fn with_selector(mut self, selector: Arc<dyn EndpointSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_syslog_transport(mut self, syslog: Arc<dyn SyslogTransport>) -> Self {
        self.syslog = syslog;
        self
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Local copy of a delivered file (`<process_dir>/<file name>`).
    pub fn local_path(&self, id: &FileId) -> PathBuf {
        self.settings.process_dir.join(id.file_name())
    }

    /// Run every enabled step. A failing step never prevents the others.
    ///
    /// Returns an error when syslog or local persistence failed.
    pub async fn dispatch(
        &self,
        id: &FileId,
        content: &DecryptedContent,
    ) -> DeliveryResult<DeliveryReport> {
        let mut report = DeliveryReport::new();

        if let Some(syslog) = &self.settings.syslog {
            report.syslog = self.send_syslog(id, syslog, content).await;
        }

        let local_path = self.local_path(id);
        if self.settings.local_save {
            report.local = match append_local(&local_path, content.as_bytes()) {
                Ok(()) => {
                    debug!(file = %id, path = %local_path.display(), "Saved locally");
                    StepOutcome::Done
                }
                Err(e) => {
                    error!(file = %id, path = %local_path.display(), error = %e, "Local save failed");
                    StepOutcome::Failed(e.to_string())
                }
            };
        }
        let persisted = report.local == StepOutcome::Done;

        if let Some(sftp) = &self.settings.sftp {
            report.sftp = if persisted {
                self.upload(id, sftp, &local_path).await
            } else {
                warn!(file = %id, "SFTP enabled but nothing was saved locally, skipping upload");
                StepOutcome::Skipped("no local copy".to_string())
            };
        }

        if persisted {
            report.compress = compress(id, &local_path).await;
        }

        let failures = report.mandatory_failures();
        if failures.is_empty() {
            Ok(report)
        } else {
            Err(DeliveryError::Failed(failures))
        }
    }

    async fn send_syslog(
        &self,
        id: &FileId,
        syslog: &SyslogSettings,
        content: &DecryptedContent,
    ) -> StepOutcome {
        let Some(host) = self.selector.select(&syslog.addresses) else {
            error!(file = %id, "No syslog endpoint available");
            return StepOutcome::Failed("no syslog endpoint".to_string());
        };

        let lines: Vec<String> = content.lines().collect();
        match self.syslog.send_lines(host, syslog.port, &lines).await {
            Ok(()) => {
                info!(file = %id, host, port = syslog.port, messages = lines.len(), "Sent to syslog");
                StepOutcome::Done
            }
            Err(e) => {
                error!(file = %id, host, port = syslog.port, error = %e, "Syslog delivery failed");
                StepOutcome::Failed(e.to_string())
            }
        }
    }

    async fn upload(&self, id: &FileId, sftp: &SftpSettings, local_path: &Path) -> StepOutcome {
        let Some(uploader) = &self.sftp else {
            warn!(file = %id, "SFTP enabled without an uploader, skipping upload");
            return StepOutcome::Skipped("no uploader".to_string());
        };

        let remote_path = format!("{}/{}", sftp.remote_dir.trim_end_matches('/'), id.file_name());
        match uploader.upload(local_path, &remote_path).await {
            Ok(()) => {
                info!(file = %id, host = %sftp.host, remote_path = %remote_path, "Uploaded over SFTP");
                StepOutcome::Done
            }
            Err(e) => {
                // Upload failures leave the file counted as delivered.
                error!(file = %id, host = %sftp.host, error = %e, "SFTP upload failed");
                StepOutcome::Failed(e.to_string())
            }
        }
    }
}

async fn compress(id: &FileId, local_path: &Path) -> StepOutcome {
    let path = local_path.to_path_buf();
    match tokio::task::spawn_blocking(move || gzip_file(&path)).await {
        Ok(Ok(gz_path)) => {
            debug!(file = %id, path = %gz_path.display(), "Compressed local copy");
            StepOutcome::Done
        }
        Ok(Err(e)) => {
            error!(file = %id, error = %e, "Compression failed");
            StepOutcome::Failed(e.to_string())
        }
        Err(e) => {
            error!(file = %id, error = %e, "Compression task failed");
            StepOutcome::Failed(e.to_string())
        }
    }
}
