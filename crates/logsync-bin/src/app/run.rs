//! Foreground agent run.

use super::lifecycle::{PidFile, SignalSupervisor};
use log_delivery_dispatcher::{default_sftp_uploader, DispatchSettings, Dispatcher, Quarantine};
use log_envelope_crypto::{DecryptPipeline, DirectoryKeyRepository};
use log_sync_engine::{CancellationToken, SyncEngine};
use logsync_config_and_utils::{AgentConfig, Paths, DEFAULT_LOG_LEVEL};
use remote_log_store::HttpLogStore;
use std::sync::Arc;
use sync_cursor_store::CursorStore;
use tracing::{error, info};

/// Level for `init_logging`. `RUST_LOG` is applied later by the filter and
/// wins over all of these.
pub fn effective_log_level(env: Option<&str>, cli: Option<&str>, config: &str) -> String {
    [env, cli, Some(config)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|level| !level.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string()
}

/// Build every component from `config` and run the engine until a signal
/// or a fatal error.
pub async fn run_agent(config: AgentConfig, paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    let sftp = match &config.sftp {
        Some(settings) => Some(default_sftp_uploader(settings, config.timing.request_timeout)?),
        None => None,
    };
    let source = Arc::new(HttpLogStore::from_config(&config)?);

    info!(
        base_url = %source.base_url(),
        proxy = config.proxy.is_some(),
        custom_ca = config.custom_ca.is_some(),
        sinks = ?config.enabled_sinks(),
        process_dir = %config.process_dir.display(),
        "Configuration loaded"
    );

    let dispatcher = Dispatcher::new(DispatchSettings::from_config(&config), sftp);
    let pipeline = DecryptPipeline::new(Arc::new(DirectoryKeyRepository::new(paths.keys_dir())));
    let cancel = CancellationToken::new();
    let mut engine = SyncEngine::new(
        source,
        CursorStore::new(paths.cursor_file()),
        pipeline,
        dispatcher,
        Quarantine::new(config.quarantine_dir()),
        config.timing,
        cancel.clone(),
    );

    // Removed on drop.
    let pid_file = PidFile::create(paths.pid_file())?;
    info!(pid = pid_file.pid(), pid_file = %pid_file.path().display(), "logsync agent starting");

    let supervisor = SignalSupervisor::spawn(cancel)?;
    let result = engine.run().await;
    supervisor.shutdown();
    drop(pid_file);

    match result {
        Ok(()) => {
            info!("logsync agent stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, kind = %e.kind(), "logsync agent exiting on fatal error");
            Err(e.into())
        }
    }
}
