//! Pipeline that runs an [`ExecutionBackend`] on a tokio task

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::AbortHandle;

use super::{ExecutionBackend, ExecutionHandle, ExecutionPipeline, ExecutionRequest};
use crate::event::{EventSink, WorkspaceEvent};

/// Spawns one task per submission and forwards its result to the workspace
///
/// Must be used from within a tokio runtime. Cancelling aborts the task,
/// which drops (and so kills) any child process it owns.
pub struct TaskPipeline {
    backend: Arc<dyn ExecutionBackend>,
    sink: EventSink,
    tasks: Arc<Mutex<HashMap<ExecutionHandle, AbortHandle>>>,
}

impl TaskPipeline {
    /// Create a pipeline running `backend` and delivering into `sink`
    pub fn new(backend: Arc<dyn ExecutionBackend>, sink: EventSink) -> Self {
        Self {
            backend,
            sink,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of runs that have not delivered yet
    pub fn in_flight(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl ExecutionPipeline for TaskPipeline {
    fn submit(&self, request: ExecutionRequest) -> ExecutionHandle {
        let handle = ExecutionHandle::new();
        let backend = Arc::clone(&self.backend);
        let sink = self.sink.clone();
        let tasks = Arc::clone(&self.tasks);

        tracing::info!(%handle, language = %request.language_id, backend = backend.name(), "Submitting run");

        let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let task = tokio::spawn(async move {
            let result = backend.execute(&request).await;
            if let Ok(mut tasks) = tasks.lock() {
                tasks.remove(&handle);
            }
            if sink
                .send(WorkspaceEvent::ExecutionCompleted { handle, result })
                .is_err()
            {
                tracing::debug!(%handle, "Event receiver dropped, run result discarded");
            }
        });
        guard.insert(handle, task.abort_handle());

        handle
    }

    fn cancel(&self, handle: &ExecutionHandle) {
        let task = self.tasks.lock().ok().and_then(|mut t| t.remove(handle));
        if let Some(task) = task {
            task.abort();
            tracing::info!(%handle, "Cancelled run");
        }
    }

    fn name(&self) -> &'static str {
        self.backend.name()
    }
}

impl Drop for TaskPipeline {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            for (_, task) in tasks.drain() {
                task.abort();
            }
        }
    }
}
