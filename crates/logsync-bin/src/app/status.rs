//! `status` and `check-config` output.

use super::lifecycle::read_pid_file;
use logsync_config_and_utils::{AgentConfig, Paths};
use std::path::Path;
use sync_cursor_store::CursorStore;

/// Print the persisted cursor, remote store and enabled sinks.
pub fn print_status(config: &AgentConfig, paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let cursor = CursorStore::new(paths.cursor_file()).get()?;
    let pid = read_pid_file(&paths.pid_file())?;

    match pid {
        Some(pid) => println!("Agent is running (PID {})", pid),
        None => println!("Agent is not running"),
    }
    println!(
        "  Cursor:  {}",
        cursor
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none (next run bootstraps from the index)".to_string())
    );
    println!("  Remote:  {}", config.base_url);
    println!("  Sinks:   {}", sinks_label(config));
    println!("  Process: {}", config.process_dir.display());
    Ok(())
}

/// Print the result of loading `config_path`. Loading already validated it.
pub fn print_config_check(
    config: &AgentConfig,
    config_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(sftp) = &config.sftp {
        log_delivery_dispatcher::default_sftp_uploader(sftp, config.timing.request_timeout)?;
    }
    println!("Config OK: {}", config_path.display());
    println!("  Remote:  {}", config.base_url);
    println!("  Sinks:   {}", sinks_label(config));
    Ok(())
}

fn sinks_label(config: &AgentConfig) -> String {
    let sinks = config.enabled_sinks();
    if sinks.is_empty() {
        "none".to_string()
    } else {
        sinks.join(", ")
    }
}
