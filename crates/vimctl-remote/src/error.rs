use std::io;

use thiserror::Error;

/// Errors surfaced by remote editor operations.
///
/// Every async operation in this crate resolves exactly once with either its
/// value or one of these variants. A remote command that exits non-zero is not
/// an error; its status is only logged.
#[derive(Debug, Error)]
pub enum VimRemoteError {
    #[error("invalid remote editor config: {0}")]
    InvalidConfig(String),
    #[error("server identifier must be non-empty")]
    MissingIdentifier,
    #[error("failed to spawn editor '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: io::Error,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to watch startup log: {0}")]
    Watch(#[from] notify::Error),
    #[error("startup output of '{identifier}' closed before the instance reported ready")]
    StartupStreamClosed { identifier: String },
    #[error("startup log watch for '{identifier}' ended before the instance reported ready")]
    WatchClosed { identifier: String },
    #[error("instance '{identifier}' did not report ready within {timeout_ms}ms")]
    StartupTimeout { identifier: String, timeout_ms: u64 },
}

impl VimRemoteError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True when the editor binary itself could not be started.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

pub type VimRemoteResult<T> = Result<T, VimRemoteError>;
