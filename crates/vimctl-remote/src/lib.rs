//! Remote control of external editor instances through their server switches.
//!
//! Launches named instances and waits for their startup sentinel, discovers
//! running servers, and issues open/expr/send/exit commands against them.

mod client;
mod command;
mod config;
mod error;
mod executable;
mod instance;
mod launch;
mod readiness;
mod registry;
#[cfg(test)]
mod testing;

pub use client::RemoteEditor;
pub use command::{CommandExecutor, RemoteCommand, FORCE_QUIT_ALL_KEYS, QUIT_ALL_KEYS};
pub use config::{ReadinessStrategy, RemoteEditorConfig, DEFAULT_EDITOR_EXECUTABLE};
pub use error::{VimRemoteError, VimRemoteResult};
pub use executable::{is_executable_available, resolve_executable};
pub use instance::InstanceHandle;
pub use readiness::{SentinelLatch, StartupLog, STARTUP_SENTINEL};
pub use registry::{enrich, list_instances, WORKING_DIRECTORY_EXPR};
