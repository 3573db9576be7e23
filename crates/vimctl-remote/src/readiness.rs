//! Startup readiness detection for freshly spawned editor instances.
//!
//! An instance reports that it finished initializing by writing
//! [`STARTUP_SENTINEL`] into its startup-timing output. That output arrives
//! either on the child's stdout or in a private temporary file, and both
//! sources feed the same [`SentinelLatch`], so only the first observation is
//! ever acted on.

use std::path::Path;
use std::time::Duration;

use notify::event::{AccessKind, AccessMode};
use notify::{EventKind, RecursiveMode, Watcher};
use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::process::ChildStdout;
use tokio::sync::mpsc;

use crate::error::{VimRemoteError, VimRemoteResult};

/// Marker written as the final line of the editor's startup timing report.
pub const STARTUP_SENTINEL: &str = "--- VIM STARTED ---";

/// Target passed to `--startuptime` when timing is scanned from stdout.
pub(crate) const INLINE_STARTUP_TARGET: &str = "/dev/stdout";

const STREAM_READ_CHUNK_BYTES: usize = 4096;

/// Fires once on the first sentinel observation and ignores everything after.
#[derive(Debug, Default)]
pub struct SentinelLatch {
    carry: Vec<u8>,
    fired: bool,
}

impl SentinelLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Feeds the next chunk of a continuous stream.
    ///
    /// The sentinel may straddle chunk boundaries. Returns `true` only for the
    /// call that completes the first occurrence.
    pub fn observe_chunk(&mut self, chunk: &[u8]) -> bool {
        if self.fired {
            return false;
        }
        self.carry.extend_from_slice(chunk);
        if contains_sentinel(&self.carry) {
            self.fire();
            return true;
        }
        let keep = STARTUP_SENTINEL.len() - 1;
        if self.carry.len() > keep {
            let excess = self.carry.len() - keep;
            self.carry.drain(..excess);
        }
        false
    }

    /// Checks a complete snapshot of accumulated output, such as a re-read file.
    pub fn observe_snapshot(&mut self, contents: &[u8]) -> bool {
        if self.fired || !contains_sentinel(contents) {
            return false;
        }
        self.fire();
        true
    }

    fn fire(&mut self) {
        self.fired = true;
        self.carry = Vec::new();
    }
}

fn contains_sentinel(haystack: &[u8]) -> bool {
    haystack
        .windows(STARTUP_SENTINEL.len())
        .any(|window| window == STARTUP_SENTINEL.as_bytes())
}

/// Private zero-length file that receives an instance's startup timing.
///
/// Owned by exactly one launch and removed when dropped.
#[derive(Debug)]
pub struct StartupLog {
    file: NamedTempFile,
}

impl StartupLog {
    pub fn create() -> VimRemoteResult<Self> {
        let file = tempfile::Builder::new()
            .prefix("vimctl-startup-")
            .suffix(".log")
            .tempfile()
            .map_err(|error| VimRemoteError::io("failed to create startup log", error))?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Reads of the log show up as access events; only writes can add the sentinel.
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Access(_) => false,
        _ => true,
    }
}

/// A startup log together with the change watch installed on it.
pub(crate) struct WatchedStartupLog {
    log: StartupLog,
    _watcher: Box<dyn Watcher + Send>,
    changes: mpsc::UnboundedReceiver<()>,
}

impl WatchedStartupLog {
    /// Creates the log and installs the watch before anything can write to it.
    pub(crate) fn install(poll_interval: Option<Duration>) -> VimRemoteResult<Self> {
        let log = StartupLog::create()?;
        let (sender, changes) = mpsc::unbounded_channel();
        let handler = move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                if is_content_change(&event.kind) {
                    let _ = sender.send(());
                }
            }
            Err(error) => tracing::warn!(error = %error, "startup log watch reported an error"),
        };

        let mut watcher: Box<dyn Watcher + Send> = match poll_interval {
            Some(interval) => {
                let config = notify::Config::default()
                    .with_poll_interval(interval)
                    .with_compare_contents(true);
                Box::new(notify::PollWatcher::new(handler, config)?)
            }
            None => Box::new(notify::recommended_watcher(handler)?),
        };
        watcher.watch(log.path(), RecursiveMode::NonRecursive)?;

        Ok(Self {
            log,
            _watcher: watcher,
            changes,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        self.log.path()
    }

    /// Waits for the next change notification, folding any burst into one.
    async fn next_change(&mut self) -> Option<()> {
        let change = self.changes.recv().await;
        while self.changes.try_recv().is_ok() {}
        change
    }
}

impl std::fmt::Debug for WatchedStartupLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchedStartupLog")
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum StartupChannel {
    InlineStream(ChildStdout),
    WatchedFile(WatchedStartupLog),
}

/// Where a pending launch's startup timing is observed.
///
/// The latch lives with the source, so waiting again never reports a second
/// readiness for the same launch.
#[derive(Debug)]
pub(crate) struct ReadinessSource {
    channel: StartupChannel,
    latch: SentinelLatch,
}

impl ReadinessSource {
    pub(crate) fn inline(stdout: ChildStdout) -> Self {
        Self {
            channel: StartupChannel::InlineStream(stdout),
            latch: SentinelLatch::new(),
        }
    }

    pub(crate) fn watched(log: WatchedStartupLog) -> Self {
        Self {
            channel: StartupChannel::WatchedFile(log),
            latch: SentinelLatch::new(),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self.channel {
            StartupChannel::InlineStream(_) => "inline-stream",
            StartupChannel::WatchedFile(_) => "watched-file",
        }
    }

    /// Resolves `Ok` on the first sentinel, or an error when the source ends
    /// without one.
    ///
    /// Only borrows the source: dropping this future on a timeout leaves the
    /// stream or watch in place for [`ReadinessSource::release`].
    pub(crate) async fn wait_for_sentinel(&mut self, identifier: &str) -> VimRemoteResult<()> {
        let latch = &mut self.latch;
        match &mut self.channel {
            StartupChannel::InlineStream(stdout) => {
                let mut buffer = [0_u8; STREAM_READ_CHUNK_BYTES];
                loop {
                    let read = stdout.read(&mut buffer).await.map_err(|error| {
                        VimRemoteError::io(
                            format!("failed to read startup output of '{identifier}'"),
                            error,
                        )
                    })?;
                    if read == 0 {
                        return Err(VimRemoteError::StartupStreamClosed {
                            identifier: identifier.to_string(),
                        });
                    }
                    if latch.observe_chunk(&buffer[..read]) {
                        return Ok(());
                    }
                }
            }
            StartupChannel::WatchedFile(watched) => loop {
                let contents = tokio::fs::read(watched.path()).await.map_err(|error| {
                    VimRemoteError::io(
                        format!("failed to read startup log {}", watched.path().display()),
                        error,
                    )
                })?;
                if latch.observe_snapshot(&contents) {
                    return Ok(());
                }
                if watched.next_change().await.is_none() {
                    return Err(VimRemoteError::WatchClosed {
                        identifier: identifier.to_string(),
                    });
                }
            },
        }
    }

    /// Stops observing startup output.
    ///
    /// An inline stream keeps being drained in the background so the instance
    /// never blocks or dies writing to it. A watched log loses its watch and
    /// is removed.
    pub(crate) fn release(self) {
        match self.channel {
            StartupChannel::InlineStream(stdout) => release_stream(stdout),
            StartupChannel::WatchedFile(watched) => drop(watched),
        }
    }
}

/// Keeps draining the rest of the instance's stdout without anyone waiting on it.
fn release_stream(mut stdout: ChildStdout) {
    tokio::spawn(async move {
        let _ = tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await;
    });
}
