//! Remote command invocations against the editor's server switches.
//!
//! Each invocation spawns one short-lived child and resolves once. Exit status
//! is never turned into an error; a non-zero status is logged and the call
//! still succeeds.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::config::RemoteEditorConfig;
use crate::error::{VimRemoteError, VimRemoteResult};

/// Keys that close every window and quit, prompting on unsaved changes.
pub const QUIT_ALL_KEYS: &str = ":qa<CR>";
/// Keys that close every window and quit, discarding unsaved changes.
pub const FORCE_QUIT_ALL_KEYS: &str = ":qa!<CR>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    Open {
        server: String,
        path: PathBuf,
        line: u32,
    },
    Expr {
        server: String,
        expression: String,
    },
    SendKeys {
        server: String,
        keys: String,
    },
    Exit {
        server: String,
        force: bool,
    },
    ServerList,
}

impl RemoteCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Expr { .. } => "expr",
            Self::SendKeys { .. } => "send_keys",
            Self::Exit { .. } => "exit",
            Self::ServerList => "list",
        }
    }

    pub fn server(&self) -> Option<&str> {
        match self {
            Self::Open { server, .. }
            | Self::Expr { server, .. }
            | Self::SendKeys { server, .. }
            | Self::Exit { server, .. } => Some(server.as_str()),
            Self::ServerList => None,
        }
    }

    /// Positional arguments passed to the editor binary.
    pub fn arguments(&self) -> Vec<String> {
        match self {
            Self::Open { server, path, line } => vec![
                "--servername".to_string(),
                server.clone(),
                "--remote-tab".to_string(),
                format!("+{line}"),
                path.display().to_string(),
            ],
            Self::Expr { server, expression } => vec![
                "--servername".to_string(),
                server.clone(),
                "--remote-expr".to_string(),
                expression.clone(),
            ],
            Self::SendKeys { server, keys } => vec![
                "--servername".to_string(),
                server.clone(),
                "--remote-send".to_string(),
                keys.clone(),
            ],
            Self::Exit { server, force } => {
                let keys = if *force {
                    FORCE_QUIT_ALL_KEYS
                } else {
                    QUIT_ALL_KEYS
                };
                vec![
                    "--servername".to_string(),
                    server.clone(),
                    "--remote-send".to_string(),
                    keys.to_string(),
                ]
            }
            Self::ServerList => vec!["--serverlist".to_string()],
        }
    }

    fn captures_stdout(&self) -> bool {
        matches!(self, Self::Expr { .. } | Self::ServerList)
    }
}

/// Spawns the configured editor binary for remote commands.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    config: Arc<RemoteEditorConfig>,
}

impl CommandExecutor {
    pub fn new(config: Arc<RemoteEditorConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RemoteEditorConfig {
        &self.config
    }

    pub fn executable(&self) -> &str {
        self.config.executable.trim()
    }

    /// Runs `command` and returns the captured stdout.
    ///
    /// Stdout is only captured for `expr` and `list`; other kinds return an
    /// empty string once the child has exited.
    pub async fn execute(&self, command: &RemoteCommand) -> VimRemoteResult<String> {
        let executable = self.executable();
        let mut process = Command::new(executable);
        process.args(command.arguments());
        process.stdin(Stdio::null());
        process.stderr(Stdio::piped());
        if command.captures_stdout() {
            process.stdout(Stdio::piped());
        } else {
            process.stdout(Stdio::null());
        }

        let child = spawn_with_text_file_busy_retry(&mut process, executable).await?;
        let output = child.wait_with_output().await.map_err(|error| {
            VimRemoteError::io(format!("failed to collect '{}' output", command.kind()), error)
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let status = output
                .status
                .code()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "signal".to_string());
            tracing::warn!(
                command = command.kind(),
                server = command.server().unwrap_or_default(),
                status = %status,
                stderr = %summarize_stderr(&stderr),
                "remote command exited unsuccessfully"
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        tracing::debug!(
            command = command.kind(),
            server = command.server().unwrap_or_default(),
            stdout_bytes = stdout.len(),
            "remote command completed"
        );
        Ok(stdout)
    }

    /// Evaluates `expression` and keeps only the first line of its output.
    pub async fn evaluate(&self, server: &str, expression: &str) -> VimRemoteResult<String> {
        let stdout = self
            .execute(&RemoteCommand::Expr {
                server: server.to_string(),
                expression: expression.to_string(),
            })
            .await?;
        Ok(first_line(&stdout).to_string())
    }

    /// Lists raw server identifiers in the order the editor reports them.
    pub async fn server_list(&self) -> VimRemoteResult<Vec<String>> {
        let stdout = self.execute(&RemoteCommand::ServerList).await?;
        Ok(split_server_list(&stdout))
    }
}

/// Spawns `command`, retrying only while the binary is reported busy for
/// writing. That happens when a freshly written script is still held open by
/// a concurrent fork.
pub(crate) async fn spawn_with_text_file_busy_retry(
    command: &mut Command,
    executable: &str,
) -> VimRemoteResult<Child> {
    const MAX_TEXT_FILE_BUSY_RETRIES: u32 = 5;
    const TEXT_FILE_BUSY_ERRNO: i32 = 26;
    let mut attempt = 0;
    loop {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(error)
                if error.raw_os_error() == Some(TEXT_FILE_BUSY_ERRNO)
                    && attempt < MAX_TEXT_FILE_BUSY_RETRIES =>
            {
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
            Err(source) => {
                return Err(VimRemoteError::Spawn {
                    executable: executable.to_string(),
                    source,
                })
            }
        }
    }
}

pub(crate) fn first_line(output: &str) -> &str {
    output.split('\n').next().unwrap_or_default()
}

pub(crate) fn split_server_list(output: &str) -> Vec<String> {
    output
        .split('\n')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn summarize_stderr(stderr: &str) -> String {
    const MAX_CHARS: usize = 240;
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return "no error output".to_string();
    }
    if trimmed.chars().count() <= MAX_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().take(MAX_CHARS).collect::<String>() + "..."
}
