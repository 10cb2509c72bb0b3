//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use disasterwatch_core::Theme;
use disasterwatch_types::SeverityFilter;

/// Live disaster alert dashboard.
#[derive(Debug, Parser)]
#[command(name = "disasterwatch", version, about)]
pub struct Cli {
    /// YAML configuration file. Missing file means defaults.
    #[arg(long, short, global = true, default_value = "disasterwatch.yaml")]
    pub config: PathBuf,

    /// Backend base URL, overriding the config file and environment.
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Map theme, overriding the config file and environment.
    #[arg(long, global = true)]
    pub theme: Option<Theme>,

    /// Command to run; `watch` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream live alerts (default).
    Watch {
        /// Initial severity filter: all, high, medium or low.
        #[arg(long, default_value = "all")]
        filter: SeverityFilter,

        /// Start with audible alerts muted.
        #[arg(long)]
        mute: bool,
    },

    /// Sign in and store the session.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,

        /// Account password.
        #[arg(long, env = "DISASTERWATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account.
    Signup {
        /// Display name.
        #[arg(long)]
        fullname: String,

        /// Account email.
        #[arg(long)]
        email: String,

        /// Account password.
        #[arg(long, env = "DISASTERWATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session.
    Logout,

    /// Show the stored session.
    Whoami,

    /// Manage registered users (admin).
    Users {
        /// User administration action.
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Delete one alert (admin).
    Delete {
        /// Alert id.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Write a situation report (admin). `.json` writes JSON, anything
    /// else plain text.
    Export {
        /// Destination file.
        path: PathBuf,

        /// Severity filter applied to the listed events.
        #[arg(long, default_value = "all")]
        filter: SeverityFilter,
    },
}

/// `users` subcommands.
#[derive(Debug, Subcommand)]
pub enum UsersAction {
    /// List registered users.
    List,

    /// Delete a user account.
    Ban {
        /// User id.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Grant the admin role.
    Promote {
        /// User id.
        id: String,
    },
}
