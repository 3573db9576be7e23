//! Top-level client tying configuration, launch and discovery together.

use std::path::Path;
use std::sync::Arc;

use crate::command::CommandExecutor;
use crate::config::RemoteEditorConfig;
use crate::error::{VimRemoteError, VimRemoteResult};
use crate::instance::InstanceHandle;
use crate::launch::create_instance;
use crate::registry::{enrich, list_instances};

/// Entry point for launching, discovering and addressing editor instances.
#[derive(Debug, Clone)]
pub struct RemoteEditor {
    executor: CommandExecutor,
}

impl RemoteEditor {
    pub fn new(config: RemoteEditorConfig) -> VimRemoteResult<Self> {
        config.validate()?;
        Ok(Self {
            executor: CommandExecutor::new(Arc::new(config)),
        })
    }

    pub fn config(&self) -> &RemoteEditorConfig {
        self.executor.config()
    }

    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Spawns a new instance and resolves once it has finished starting up.
    pub async fn create_instance(
        &self,
        identifier: &str,
        target_path: Option<&Path>,
    ) -> VimRemoteResult<InstanceHandle> {
        create_instance(&self.executor, identifier, target_path).await
    }

    pub async fn list_instances(&self) -> VimRemoteResult<Vec<InstanceHandle>> {
        list_instances(&self.executor).await
    }

    /// Handle for an already running server, without resolving anything.
    pub fn instance(&self, identifier: &str) -> VimRemoteResult<InstanceHandle> {
        if identifier.trim().is_empty() {
            return Err(VimRemoteError::MissingIdentifier);
        }
        Ok(InstanceHandle::new(identifier, self.executor.clone()))
    }

    pub async fn enrich(&self, identifier: &str) -> VimRemoteResult<InstanceHandle> {
        if identifier.trim().is_empty() {
            return Err(VimRemoteError::MissingIdentifier);
        }
        enrich(&self.executor, identifier).await
    }
}
