//! TaskService trait — the interface to the remote execution platform

use async_trait::async_trait;
use super::models::{ResultEntry, TaskHandle, TaskSpec, TaskStatus};
use super::RemoteResult;

/// Remote execution service for federated analysis tasks.
///
/// Implemented by:
/// - `HttpTaskService` — talks to the platform's REST API
/// - in-memory fakes in tests
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Open an authenticated session. Called before every submission.
    async fn authenticate(&self) -> RemoteResult<()>;

    /// Create a task and return its handle
    async fn submit(&self, spec: &TaskSpec) -> RemoteResult<TaskHandle>;

    /// Completion status of a task
    async fn status(&self, handle: &TaskHandle) -> RemoteResult<TaskStatus>;

    /// Result entries of a task, one per executing organization
    async fn fetch_result(&self, handle: &TaskHandle) -> RemoteResult<Vec<ResultEntry>>;
}
