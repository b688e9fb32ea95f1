//! logsync agent - pulls encrypted log files from the remote store and
//! forwards them to syslog, local disk and SFTP.

mod app;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use logsync_config_and_utils::{init_logging, AgentConfig, Paths};

/// logsync agent command-line interface.
#[derive(Parser, Debug)]
#[command(name = "logsync-agent")]
#[command(about = "Sequential log file synchronisation agent")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base directory for runtime files (config, keys, cursor, logs). Defaults to ~/.logsync
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Config file to use instead of <base-dir>/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the agent in the foreground
    Run,
    /// Show the cursor, remote store and enabled sinks
    Status,
    /// Load and validate the config, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = match &cli.config {
        Some(path) => AgentConfig::load_from_file(path)?,
        None => AgentConfig::load(&paths)?,
    };
    let config_path = cli.config.unwrap_or_else(|| paths.config_file());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let level = app::effective_log_level(
                std::env::var("LOGSYNC_LOG_LEVEL").ok().as_deref(),
                cli.log_level.as_deref(),
                &config.log_level,
            );
            paths.ensure_dirs()?;
            init_logging(&level, Some(paths.agent_log_file()))?;
            app::run_agent(config, paths).await?;
        }
        Commands::Status => app::print_status(&config, &paths)?,
        Commands::CheckConfig => app::print_config_check(&config, &config_path)?,
    }

    Ok(())
}
