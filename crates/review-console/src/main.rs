use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use review_console::{ConsoleConfig, ReviewApp};

/// Clinician console for reviewing model predictions.
#[derive(Debug, Parser)]
#[command(name = "review-console", version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base URL of the prediction backend (overrides configuration).
    #[arg(long)]
    api_base: Option<String>,

    /// Log in as this user before probing, using the configured directory.
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Password for `--username`.
    #[arg(long)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::from_file(path)?,
        None => ConsoleConfig::default(),
    };
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }

    info!(
        api_base = %config.api_base,
        page_size = config.page_size,
        "review console starting"
    );

    let mut app = ReviewApp::new(config)?;

    match app.ping().await {
        Ok(()) => info!("backend reachable"),
        Err(e) => warn!("backend not reachable: {e}"),
    }

    if let (Some(username), Some(password)) = (cli.username.as_deref(), cli.password.as_deref()) {
        if app.login(username, password) {
            info!(user = username, "logged in");
            app.refresh_roster().await;
            match app.roster().total {
                Some(total) => info!(
                    total,
                    rows = app.roster().patients.len(),
                    "roster reachable"
                ),
                None => warn!("roster unavailable; check the backend and try again"),
            }
        } else {
            warn!(user = username, "credential check failed");
        }
    }

    Ok(())
}
