//! Command-line interface for server-check.
//!
//! Registry edits (`new`, `remove`), `list`, and the health check itself,
//! which also runs when no subcommand is given.

mod commands;

pub use commands::{run, run_check, run_list, run_new, run_remove};

use crate::config::SettingsOverrides;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quickly check your servers' status(es).
#[derive(Parser, Debug)]
#[command(name = "server-check")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    SERVER_CHECK_TIMEOUT_SECS    Per-probe timeout in seconds (default: 5)
    SERVER_CHECK_REGISTRY_PATH   Registry file (default: ~/.server_check.json)
    NO_COLOR                     Disable coloured output
    RUST_LOG                     Log filter (default: server_check=info)
"#)]
pub struct Cli {
    /// Per-probe timeout in seconds
    #[arg(short, long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Registry file holding the server list
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add new server to server list.
    New {
        /// Server name
        name: String,
        /// Server URL
        url: String,
    },
    /// Remove server from server list.
    Remove {
        /// Server name; every entry with this name is removed
        name: String,
    },
    /// Lists added servers.
    List,
    /// Check every server in the list (default).
    Check,
}

impl Cli {
    /// The subcommand to run, `check` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Check)
    }

    pub fn overrides(&self) -> SettingsOverrides {
        let no_color = self.no_color || std::env::var_os("NO_COLOR").is_some();
        SettingsOverrides {
            timeout_secs: self.timeout,
            registry_path: self.config.clone(),
            color: no_color.then_some(false),
        }
    }
}
