//! Remote editor configuration and validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{VimRemoteError, VimRemoteResult};

pub const DEFAULT_EDITOR_EXECUTABLE: &str = "vim";

/// How a freshly spawned instance reports that startup has finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessStrategy {
    /// Startup timing is written to the child's stdout and scanned as it arrives.
    #[default]
    InlineStream,
    /// Startup timing is written to a private temporary file that is watched.
    WatchedFile,
}

impl ReadinessStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InlineStream => "inline-stream",
            Self::WatchedFile => "watched-file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteEditorConfig {
    pub executable: String,
    pub readiness: ReadinessStrategy,
    /// Upper bound on waiting for the startup sentinel. `None` waits forever.
    pub startup_timeout_ms: Option<u64>,
    /// Poll the startup log at this interval instead of using OS notifications.
    pub watch_poll_interval_ms: Option<u64>,
}

impl Default for RemoteEditorConfig {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EDITOR_EXECUTABLE.to_string(),
            readiness: ReadinessStrategy::default(),
            startup_timeout_ms: None,
            watch_poll_interval_ms: None,
        }
    }
}

impl RemoteEditorConfig {
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_readiness(mut self, readiness: ReadinessStrategy) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_startup_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.startup_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_watch_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.watch_poll_interval_ms = Some(interval_ms);
        self
    }

    pub fn startup_timeout(&self) -> Option<Duration> {
        self.startup_timeout_ms.map(Duration::from_millis)
    }

    pub fn watch_poll_interval(&self) -> Option<Duration> {
        self.watch_poll_interval_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> VimRemoteResult<()> {
        if self.executable.trim().is_empty() {
            return Err(VimRemoteError::InvalidConfig(
                "editor executable is empty".to_string(),
            ));
        }
        if self.startup_timeout_ms == Some(0) {
            return Err(VimRemoteError::InvalidConfig(
                "startup timeout must be greater than 0ms".to_string(),
            ));
        }
        if self.watch_poll_interval_ms == Some(0) {
            return Err(VimRemoteError::InvalidConfig(
                "watch poll interval must be greater than 0ms".to_string(),
            ));
        }
        Ok(())
    }
}
