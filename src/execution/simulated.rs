//! Deterministic stand-in for a real runner
//!
//! Every run succeeds after a fixed latency and prints a canned payload
//! that depends only on the language.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ExecutionBackend, ExecutionHandle, ExecutionPipeline, ExecutionRequest, ExecutionResult};
use crate::event::WorkspaceEvent;
use crate::scheduler::{deadline_after, Scheduler, TimerId};

/// Canned output for `language_id`
///
/// # Examples
///
/// ```
/// use codechat::execution::simulated_output;
///
/// let out = simulated_output("python");
/// assert!(out.contains("Language: python"));
/// assert!(out.ends_with("Hello World"));
/// ```
pub fn simulated_output(language_id: &str) -> String {
    let payload = match language_id {
        "javascript" | "typescript" | "python" => "Hello World",
        _ => "Hello World\n\nExecution time: 0.042s\nMemory: 2.1 MB",
    };
    format!(
        "✓ Code executed successfully!\n\nLanguage: {}\nOutput:\n{}",
        language_id, payload
    )
}

/// Pipeline that schedules the canned result on the injected scheduler
///
/// With a [`ManualScheduler`](crate::scheduler::ManualScheduler) the result
/// only appears once the test advances the virtual clock past the latency.
/// Cancelling a run removes its timer from the scheduler.
pub struct SimulatedPipeline {
    scheduler: Arc<dyn Scheduler>,
    latency: Duration,
    timers: Mutex<HashMap<ExecutionHandle, (TimerId, DateTime<Utc>)>>,
}

impl SimulatedPipeline {
    /// Create a pipeline delivering results `latency` after submission
    pub fn new(scheduler: Arc<dyn Scheduler>, latency: Duration) -> Self {
        Self {
            scheduler,
            latency,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Number of runs whose result has not been delivered or cancelled
    pub fn in_flight(&self) -> usize {
        let now = self.scheduler.now();
        self.timers
            .lock()
            .map(|t| t.values().filter(|(_, due)| *due > now).count())
            .unwrap_or(0)
    }
}

impl ExecutionPipeline for SimulatedPipeline {
    fn submit(&self, request: ExecutionRequest) -> ExecutionHandle {
        let handle = ExecutionHandle::new();
        let now = self.scheduler.now();
        let completed_at = deadline_after(now, self.latency);
        let result = ExecutionResult::success(
            request.language_id.as_str(),
            simulated_output(&request.language_id),
            completed_at,
        );

        tracing::debug!(%handle, language = %request.language_id, "Scheduling simulated run");
        let timer = self.scheduler.schedule(
            self.latency,
            WorkspaceEvent::ExecutionCompleted { handle, result },
        );

        let mut timers = self.timers.lock().unwrap_or_else(|e| e.into_inner());
        // Entries past their due time have already fired.
        timers.retain(|_, (_, due)| *due > now);
        timers.insert(handle, (timer, completed_at));
        handle
    }

    fn cancel(&self, handle: &ExecutionHandle) {
        let entry = self.timers.lock().ok().and_then(|mut t| t.remove(handle));
        match entry {
            Some((timer, _)) if self.scheduler.cancel(timer) => {
                tracing::debug!(%handle, "Cancelled simulated run");
            }
            _ => tracing::debug!(%handle, "Simulated run already delivered"),
        }
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Backend flavour of the simulator, for use with [`TaskPipeline`](super::TaskPipeline)
/// and one-shot runs
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    latency: Duration,
}

impl SimulatedBackend {
    /// Create a backend that answers after `latency`
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl ExecutionBackend for SimulatedBackend {
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        tokio::time::sleep(self.latency).await;
        ExecutionResult::success(
            request.language_id.as_str(),
            simulated_output(&request.language_id),
            Utc::now(),
        )
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
