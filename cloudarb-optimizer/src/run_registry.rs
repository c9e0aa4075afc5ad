//! Async run registry backing `SubmitOptimization`/`GetOptimization`: a
//! solve can be kicked off and polled later instead of awaited inline.

use std::sync::Arc;

use cloudarb_types::{Allocation, CloudArbError};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Opaque handle to a submitted optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of one submitted run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunState {
    /// Queued but not yet picked up by a solver task.
    Pending,
    /// A solver task is actively working the run.
    Running,
    /// The run finished, successfully or not.
    Completed(Result<Allocation, CloudArbError>),
}

/// In-memory registry of submitted runs. Entries are never evicted here;
/// callers that want bounded memory should periodically drop old
/// `Completed` entries via `remove`.
#[derive(Default)]
pub struct RunRegistry {
    runs: RwLock<std::collections::HashMap<RunId, RunState>>,
}

impl RunRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new run in `Pending` state and return its id.
    pub async fn submit(&self) -> RunId {
        let id = RunId::new();
        self.runs.write().await.insert(id, RunState::Pending);
        id
    }

    /// Mark a run as actively running.
    pub async fn mark_running(&self, id: RunId) {
        if let Some(state) = self.runs.write().await.get_mut(&id) {
            *state = RunState::Running;
        }
    }

    /// Record the final result of a run.
    pub async fn complete(&self, id: RunId, result: Result<Allocation, CloudArbError>) {
        self.runs.write().await.insert(id, RunState::Completed(result));
    }

    /// Look up the current state of a run.
    pub async fn get(&self, id: RunId) -> Result<RunState, CloudArbError> {
        self.runs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| CloudArbError::UnknownRun(id.to_string()))
    }

    /// Drop a completed run's state, freeing its memory.
    pub async fn remove(&self, id: RunId) {
        self.runs.write().await.remove(&id);
    }
}

impl Clone for RunState {
    fn clone(&self) -> Self {
        match self {
            Self::Pending => Self::Pending,
            Self::Running => Self::Running,
            Self::Completed(r) => Self::Completed(r.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_run_id_is_an_error() {
        let registry = RunRegistry::new();
        let bogus = RunId::new();
        assert!(registry.get(bogus).await.is_err());
    }

    #[tokio::test]
    async fn submitted_run_transitions_through_states() {
        let registry = RunRegistry::new();
        let id = registry.submit().await;
        assert!(matches!(registry.get(id).await.unwrap(), RunState::Pending));

        registry.mark_running(id).await;
        assert!(matches!(registry.get(id).await.unwrap(), RunState::Running));

        registry.complete(id, Err(CloudArbError::solver_failure("boom"))).await;
        assert!(matches!(registry.get(id).await.unwrap(), RunState::Completed(Err(_))));
    }
}
