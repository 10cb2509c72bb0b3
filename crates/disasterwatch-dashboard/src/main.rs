//! Terminal dashboard for DisasterWatch live disaster alerts.
//!
//! `disasterwatch` (or `disasterwatch watch`) shows the alert feed: it loads
//! the current snapshot, applies alerts pushed over Socket.IO as they
//! arrive, recentres on each new event and rings the bell for high-severity
//! ones. The other subcommands manage the stored session and run the admin
//! actions of the web dashboard from the command line.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Load `disasterwatch.yaml` (defaults when missing), then apply
//!    environment and command line overrides
//! 3. Initialize structured logging (tracing, to stderr)
//! 4. Load the stored session
//! 5. Run the requested command

mod admin;
mod cli;
mod commands;
mod error;
mod terminal;
mod watch;

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;
use disasterwatch_client::ApiClient;
use disasterwatch_core::{DashboardConfig, FileSessionStore, SessionContext};
use disasterwatch_types::{EventId, SeverityFilter, UserId};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, UsersAction};
use crate::error::DashboardError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the command fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    info!(
        config_file = %cli.config.display(),
        config_found = cli.config.exists(),
        backend = %config.backend.url,
        theme = %config.theme,
        session_dir = %config.session.dir,
        "disasterwatch starting"
    );

    let session = SessionContext::load(Arc::new(FileSessionStore::new(config.session.dir.clone())));
    let command = cli.command.unwrap_or(Command::Watch {
        filter: SeverityFilter::All,
        mute: false,
    });
    run(command, &config, session).await?;
    Ok(())
}

async fn run(
    command: Command,
    config: &DashboardConfig,
    session: SessionContext,
) -> Result<(), DashboardError> {
    match command {
        Command::Watch { filter, mute } => watch::run(config, session, filter, mute).await,
        Command::Login { email, password } => {
            admin::login(&client(config)?, &session, &email, password).await
        }
        Command::Signup {
            fullname,
            email,
            password,
        } => admin::signup(&client(config)?, &fullname, &email, password).await,
        Command::Logout => admin::logout(&session),
        Command::Whoami => {
            admin::whoami(&session);
            Ok(())
        }
        Command::Users { action } => {
            let client = client(config)?;
            match action {
                UsersAction::List => admin::list_users(&client, &session).await,
                UsersAction::Ban { id, yes } => {
                    admin::ban_user(&client, &session, &UserId::from(id), yes).await
                }
                UsersAction::Promote { id } => {
                    admin::promote_user(&client, &session, &UserId::from(id)).await
                }
            }
        }
        Command::Delete { id, yes } => {
            admin::delete_alert(&client(config)?, &session, &EventId::from(id), yes).await
        }
        Command::Export { path, filter } => {
            admin::export(&client(config)?, &session, &path, filter).await
        }
    }
}

fn client(config: &DashboardConfig) -> Result<ApiClient, DashboardError> {
    Ok(ApiClient::from_config(&config.backend)?)
}

/// Load the config file if present, then apply environment and command
/// line overrides, in that order.
fn load_config(cli: &Cli) -> Result<DashboardConfig, DashboardError> {
    let mut config = DashboardConfig::load(&cli.config)?;
    if let Some(url) = &cli.backend_url {
        config.backend.url.clone_from(url);
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    Ok(config)
}
