use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vimctl_remote::{RemoteEditorConfig, DEFAULT_EDITOR_EXECUTABLE};

use crate::cli_types::CliReadinessStrategy;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "vimctl",
    about = "Launch, discover and drive remote editor instances",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "VIMCTL_EXECUTABLE",
        default_value = DEFAULT_EDITOR_EXECUTABLE,
        help = "Editor binary that accepts --servername/--remote-* switches."
    )]
    pub executable: String,

    #[arg(
        long,
        env = "VIMCTL_READINESS",
        value_enum,
        default_value_t = CliReadinessStrategy::InlineStream,
        help = "How `create` detects that a new instance finished starting up."
    )]
    pub readiness: CliReadinessStrategy,

    #[arg(
        long,
        env = "VIMCTL_STARTUP_TIMEOUT_MS",
        value_parser = parse_positive_u64,
        help = "Give up on `create` when the instance is not ready after this many milliseconds. Waits forever when unset."
    )]
    pub startup_timeout_ms: Option<u64>,

    #[arg(
        long,
        env = "VIMCTL_WATCH_POLL_INTERVAL_MS",
        value_parser = parse_positive_u64,
        help = "Poll the startup log at this interval instead of using file-system notifications (watched-file only)."
    )]
    pub watch_poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Launch a new instance and wait until it is ready.
    Create {
        identifier: String,
        path: Option<PathBuf>,
        #[arg(long, help = "Print the instance as JSON.")]
        json: bool,
    },
    /// List running instances with their working directories.
    List {
        #[arg(long, help = "Print instances as a JSON array.")]
        json: bool,
    },
    /// Open a file in a new tab of an instance.
    Open {
        identifier: String,
        path: PathBuf,
        #[arg(long, default_value_t = 0)]
        line: u32,
    },
    /// Evaluate an expression and print the first line of its value.
    Eval {
        identifier: String,
        expression: String,
    },
    /// Send a literal key sequence.
    Send { identifier: String, keys: String },
    /// Quit every window of an instance.
    Exit {
        identifier: String,
        #[arg(long, help = "Discard unsaved changes.")]
        force: bool,
    },
    /// Report whether the editor binary can be found.
    Doctor,
}

impl Cli {
    pub fn remote_editor_config(&self) -> RemoteEditorConfig {
        RemoteEditorConfig {
            executable: self.executable.clone(),
            readiness: self.readiness.into(),
            startup_timeout_ms: self.startup_timeout_ms,
            watch_poll_interval_ms: self.watch_poll_interval_ms,
        }
    }
}
