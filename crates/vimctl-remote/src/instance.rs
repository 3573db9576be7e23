//! Handles addressing one running instance by its server identifier.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::command::{CommandExecutor, RemoteCommand};
use crate::error::VimRemoteResult;

/// Caller-owned proxy for one running editor instance.
///
/// Dropping a handle never terminates the instance; use [`InstanceHandle::exit`].
#[derive(Debug, Clone, Serialize)]
pub struct InstanceHandle {
    identifier: String,
    working_directory: Option<String>,
    target_path: Option<PathBuf>,
    #[serde(skip)]
    executor: CommandExecutor,
}

impl InstanceHandle {
    pub fn new(identifier: impl Into<String>, executor: CommandExecutor) -> Self {
        Self {
            identifier: identifier.into(),
            working_directory: None,
            target_path: None,
            executor,
        }
    }

    pub(crate) fn with_target_path(mut self, target_path: PathBuf) -> Self {
        self.target_path = Some(target_path);
        self
    }

    pub(crate) fn set_working_directory(&mut self, working_directory: String) {
        self.working_directory = Some(working_directory);
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Working directory resolved through `getcwd()`, if enrichment ran.
    pub fn working_directory(&self) -> Option<&str> {
        self.working_directory.as_deref()
    }

    /// Path the instance was launched with, if any.
    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref()
    }

    /// Opens `path` in a new tab at line 0.
    pub async fn open(&self, path: impl AsRef<Path>) -> VimRemoteResult<()> {
        self.open_at_line(path, 0).await
    }

    pub async fn open_at_line(&self, path: impl AsRef<Path>, line: u32) -> VimRemoteResult<()> {
        self.executor
            .execute(&RemoteCommand::Open {
                server: self.identifier.clone(),
                path: path.as_ref().to_path_buf(),
                line,
            })
            .await
            .map(|_| ())
    }

    /// Evaluates an expression and returns the first line of its value.
    pub async fn evaluate(&self, expression: &str) -> VimRemoteResult<String> {
        self.executor.evaluate(&self.identifier, expression).await
    }

    pub async fn send_keys(&self, keys: &str) -> VimRemoteResult<()> {
        self.executor
            .execute(&RemoteCommand::SendKeys {
                server: self.identifier.clone(),
                keys: keys.to_string(),
            })
            .await
            .map(|_| ())
    }

    /// Closes every buffer and quits; `force` discards unsaved changes.
    pub async fn exit(&self, force: bool) -> VimRemoteResult<()> {
        self.executor
            .execute(&RemoteCommand::Exit {
                server: self.identifier.clone(),
                force,
            })
            .await
            .map(|_| ())
    }
}
