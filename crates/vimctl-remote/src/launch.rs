//! Instance creation: spawn, wait for the startup sentinel, then build a handle.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::command::{spawn_with_text_file_busy_retry, CommandExecutor};
use crate::config::ReadinessStrategy;
use crate::error::{VimRemoteError, VimRemoteResult};
use crate::instance::InstanceHandle;
use crate::readiness::{ReadinessSource, WatchedStartupLog, INLINE_STARTUP_TARGET};
use crate::registry::enrich;

/// A spawned instance that has not reported ready yet.
#[derive(Debug)]
pub(crate) struct PendingLaunch {
    identifier: String,
    source: ReadinessSource,
    child: Child,
}

impl PendingLaunch {
    pub(crate) async fn spawn(
        executor: &CommandExecutor,
        identifier: &str,
        target_path: Option<&Path>,
    ) -> VimRemoteResult<Self> {
        let config = executor.config();
        let watched = match config.readiness {
            ReadinessStrategy::WatchedFile => {
                Some(WatchedStartupLog::install(config.watch_poll_interval())?)
            }
            ReadinessStrategy::InlineStream => None,
        };
        Self::spawn_observing(executor, identifier, target_path, watched).await
    }

    /// Spawns the editor with its startup timing sent to `watched`, or to its
    /// own stdout when there is no watched log.
    ///
    /// The watched log is dropped, and so removed, when the spawn fails.
    async fn spawn_observing(
        executor: &CommandExecutor,
        identifier: &str,
        target_path: Option<&Path>,
        watched: Option<WatchedStartupLog>,
    ) -> VimRemoteResult<Self> {
        let startup_target = watched
            .as_ref()
            .map(|log| log.path().as_os_str().to_os_string())
            .unwrap_or_else(|| OsString::from(INLINE_STARTUP_TARGET));

        let executable = executor.executable();
        let mut launcher = std::process::Command::new(executable);
        launcher.arg("--servername").arg(identifier);
        launcher.arg("--startuptime").arg(&startup_target);
        if let Some(path) = target_path {
            launcher.arg(path);
        }
        launcher.stdin(Stdio::null());
        launcher.stderr(Stdio::null());
        if watched.is_some() {
            launcher.stdout(Stdio::null());
        } else {
            launcher.stdout(Stdio::piped());
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            launcher.process_group(0);
        }
        let mut command = Command::from(launcher);

        let mut child = spawn_with_text_file_busy_retry(&mut command, executable).await?;
        let source = match watched {
            Some(log) => ReadinessSource::watched(log),
            None => ReadinessSource::inline(child.stdout.take().ok_or_else(|| {
                VimRemoteError::io(
                    format!("startup output of '{identifier}' was not captured"),
                    io::Error::from(io::ErrorKind::BrokenPipe),
                )
            })?),
        };
        tracing::debug!(
            server = identifier,
            pid = child.id().unwrap_or_default(),
            readiness = source.kind(),
            "spawned editor instance"
        );

        Ok(Self {
            identifier: identifier.to_string(),
            source,
            child,
        })
    }

    /// Waits for the startup sentinel, bounded by `startup_timeout` when set.
    ///
    /// Whatever the outcome, the source is released afterwards: stdout keeps
    /// being drained and a watched log is removed. The instance itself keeps
    /// running, even after a timeout.
    pub(crate) async fn wait_ready(self, startup_timeout: Option<Duration>) -> VimRemoteResult<()> {
        let Self {
            identifier,
            mut source,
            child,
        } = self;
        let outcome = match startup_timeout {
            Some(timeout) => tokio::time::timeout(timeout, source.wait_for_sentinel(&identifier))
                .await
                .unwrap_or_else(|_| {
                    Err(VimRemoteError::StartupTimeout {
                        identifier: identifier.clone(),
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    })
                }),
            None => source.wait_for_sentinel(&identifier).await,
        };
        source.release();
        drop(child);

        match &outcome {
            Ok(()) => tracing::debug!(server = %identifier, "editor instance reported ready"),
            Err(error) => {
                tracing::warn!(server = %identifier, error = %error, "editor instance never reported ready")
            }
        }
        outcome
    }
}

/// Launches an instance named `identifier` and returns once it is ready.
///
/// With a `target_path` the handle records that path and no working
/// directory is resolved. Without one the handle is enriched via `getcwd()`.
pub(crate) async fn create_instance(
    executor: &CommandExecutor,
    identifier: &str,
    target_path: Option<&Path>,
) -> VimRemoteResult<InstanceHandle> {
    if identifier.trim().is_empty() {
        return Err(VimRemoteError::MissingIdentifier);
    }
    let target_path = target_path.filter(|path| !path.as_os_str().is_empty());

    let launch = PendingLaunch::spawn(executor, identifier, target_path).await?;
    launch.wait_ready(executor.config().startup_timeout()).await?;

    match target_path {
        Some(path) => Ok(InstanceHandle::new(identifier, executor.clone())
            .with_target_path(PathBuf::from(path))),
        None => enrich(executor, identifier).await,
    }
}
