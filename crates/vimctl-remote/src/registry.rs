//! Discovery and working-directory enrichment of running instances.

use futures_util::future::try_join_all;

use crate::command::CommandExecutor;
use crate::error::VimRemoteResult;
use crate::instance::InstanceHandle;

pub const WORKING_DIRECTORY_EXPR: &str = "getcwd()";

/// Builds a handle for `identifier` with its working directory resolved.
pub async fn enrich(executor: &CommandExecutor, identifier: &str) -> VimRemoteResult<InstanceHandle> {
    let mut handle = InstanceHandle::new(identifier, executor.clone());
    let working_directory = handle.evaluate(WORKING_DIRECTORY_EXPR).await?;
    tracing::debug!(
        server = identifier,
        working_directory = %working_directory,
        "resolved instance working directory"
    );
    handle.set_working_directory(working_directory);
    Ok(handle)
}

/// Lists running instances and enriches them concurrently.
///
/// A single failed enrichment fails the whole listing. Identifiers come back
/// as the editor registered them, which may be uppercased.
pub async fn list_instances(executor: &CommandExecutor) -> VimRemoteResult<Vec<InstanceHandle>> {
    let identifiers = executor.server_list().await?;
    let handles = try_join_all(
        identifiers
            .iter()
            .map(|identifier| enrich(executor, identifier)),
    )
    .await?;
    tracing::debug!(instances = handles.len(), "listed running instances");
    Ok(handles)
}
