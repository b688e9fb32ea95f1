//! PID file management and signal supervision.

use log_sync_engine::CancellationToken;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors from lifecycle management.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PID file error: {0}")]
    PidFile(String),
}

/// Write the current process PID to the given path.
pub fn write_pid_file(pid_path: &Path) -> Result<u32, LifecycleError> {
    let pid = std::process::id();
    std::fs::write(pid_path, pid.to_string())?;
    Ok(pid)
}

/// Read a PID from the given file.
pub fn read_pid_file(pid_path: &Path) -> Result<Option<u32>, LifecycleError> {
    if !pid_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(pid_path)?;
    let pid = content
        .trim()
        .parse::<u32>()
        .map_err(|e| LifecycleError::PidFile(format!("Invalid PID: {}", e)))?;
    Ok(Some(pid))
}

/// Remove the PID file if it exists.
pub fn cleanup_pid_file(pid_path: &Path) -> Result<(), LifecycleError> {
    if pid_path.exists() {
        std::fs::remove_file(pid_path)?;
    }
    Ok(())
}

/// PID file that exists for as long as the guard lives.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    pid: u32,
}

impl PidFile {
    /// Write the current PID to `path`.
    pub fn create(path: PathBuf) -> Result<Self, LifecycleError> {
        let pid = write_pid_file(&path)?;
        Ok(Self { path, pid })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = cleanup_pid_file(&self.path) {
            error!(error = %e, pid_file = %self.path.display(), "Failed to remove PID file");
        }
    }
}

/// OS thread that turns SIGINT/SIGTERM into engine cancellation.
pub struct SignalSupervisor {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalSupervisor {
    /// The first signal cancels `cancel`; a second one exits immediately.
    pub fn spawn(cancel: CancellationToken) -> Result<Self, LifecycleError> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        let handle = signals.handle();

        let thread = std::thread::Builder::new()
            .name("logsync-signals".into())
            .spawn(move || {
                for signal in signals.forever() {
                    if cancel.is_cancelled() {
                        warn!(signal, "Second shutdown signal, exiting now");
                        std::process::exit(1);
                    }
                    info!(signal, "Received shutdown signal, finishing current file");
                    cancel.cancel();
                }
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }

    /// Stop listening and join the thread.
    pub fn shutdown(mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
