//! Pusher - send test push notifications to iOS simulators
//!
//! This is the binary entry point. All logic lives in the workspace crates.

mod headless;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use pusher_app::config;
use tracing::info;

/// Pusher - send test push notifications to iOS simulators
#[derive(Parser, Debug)]
#[command(name = "pusher")]
#[command(about = "Send test push notifications to iOS simulators", long_about = None)]
struct Args {
    /// Config file (default: <config dir>/pusher/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// File holding the initial push payload
    #[arg(long, value_name = "FILE")]
    payload: Option<PathBuf>,

    /// Wait for a `start` command instead of starting immediately
    #[arg(long)]
    no_start: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    pusher_core::logging::init().wrap_err("failed to initialize logging")?;

    let mut settings = config::load_settings(args.config.as_deref());
    if args.no_start {
        settings.engine.auto_start = false;
    }

    let payload = match &args.payload {
        Some(path) => config::load_payload_file(path)
            .wrap_err_with(|| format!("failed to load payload from {}", path.display()))?,
        None => settings.payload.initial_payload(),
    };

    info!(
        "Log file: {}",
        pusher_core::logging::get_current_log_file().display()
    );

    headless::runner::run_headless(settings, payload).await?;
    Ok(())
}
