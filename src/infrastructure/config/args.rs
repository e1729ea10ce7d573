use super::app_config::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "stockwire",
    version,
    about = "Authenticated API access and live notifications for the stockwire backend",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Backend base URL.
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Connect to the notification stream.
    #[arg(long, global = true)]
    pub notifications: Option<bool>,

    /// Consecutive stream failures before giving up.
    #[arg(long, global = true)]
    pub max_reconnect_attempts: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Log in and store the credential.
    Login {
        /// Account email.
        #[arg(long, env = "STOCKWIRE_EMAIL")]
        email: String,

        /// Account password.
        #[arg(long, env = "STOCKWIRE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Keep the credential for this session only.
        #[arg(long)]
        no_persist: bool,
    },
    /// Forget the stored credential.
    Logout,
    /// Show the stored credential.
    Status,
    /// Send an authenticated GET request and print the body.
    Get {
        /// Path relative to the base URL.
        path: String,
    },
    /// Print live notifications until interrupted.
    Listen,
}
