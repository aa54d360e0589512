//! Execution pipeline
//!
//! Turns an [`ExecutionRequest`] (language + code) into exactly one
//! [`ExecutionResult`], delivered later as
//! [`WorkspaceEvent::ExecutionCompleted`](crate::event::WorkspaceEvent).
//!
//! Two pipelines are provided:
//!
//! - [`SimulatedPipeline`]: deterministic canned output after a fixed
//!   latency, driven by the injected [`Scheduler`](crate::scheduler::Scheduler)
//! - [`TaskPipeline`]: runs an [`ExecutionBackend`] on a tokio task, used
//!   with [`ProcessBackend`] to invoke real interpreters and compilers
//!
//! Failures never cross the pipeline boundary as errors; they are folded
//! into the result's [`ExecutionStatus`].

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::CodeChatError;

pub mod process;
pub mod simulated;
pub mod task;

pub use process::ProcessBackend;
pub use simulated::{simulated_output, SimulatedBackend, SimulatedPipeline};
pub use task::TaskPipeline;

/// A request to run one code buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Catalog id of the buffer's language
    pub language_id: String,
    /// Source text to execute
    pub code: String,
    /// When the run was requested
    pub submitted_at: DateTime<Utc>,
}

impl ExecutionRequest {
    /// Create a request stamped with `submitted_at`
    pub fn new(
        language_id: impl Into<String>,
        code: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            language_id: language_id.into(),
            code: code.into(),
            submitted_at,
        }
    }
}

/// Why a run did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The compile step rejected the source
    Compile,
    /// The program exited unsuccessfully
    Runtime,
    /// No runner could be started for the language
    Unavailable,
}

/// Outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "kind")]
pub enum ExecutionStatus {
    /// Program ran to completion
    Success,
    /// Program failed; `output_text` explains why
    Failure(FailureKind),
    /// Program exceeded the configured deadline
    Timeout,
}

impl ExecutionStatus {
    /// Whether the run succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure(FailureKind::Compile) => write!(f, "compile error"),
            Self::Failure(FailureKind::Runtime) => write!(f, "runtime error"),
            Self::Failure(FailureKind::Unavailable) => write!(f, "runner unavailable"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// The single result delivered for a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Outcome of the run
    pub status: ExecutionStatus,
    /// Human readable output (program output or failure description)
    pub output_text: String,
    /// Language the request was made for
    pub language_id: String,
    /// When the result was produced
    pub completed_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// Successful result
    pub fn success(
        language_id: impl Into<String>,
        output_text: impl Into<String>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: ExecutionStatus::Success,
            output_text: output_text.into(),
            language_id: language_id.into(),
            completed_at,
        }
    }

    /// Fold an execution error into a result
    ///
    /// `CompileError`, `RuntimeError` and `Timeout` map to their statuses;
    /// anything else means the runner was unavailable.
    pub fn from_error(
        language_id: impl Into<String>,
        error: &anyhow::Error,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let (status, output_text) = match error.downcast_ref::<CodeChatError>() {
            Some(CodeChatError::CompileError(out)) => {
                (ExecutionStatus::Failure(FailureKind::Compile), out.clone())
            }
            Some(CodeChatError::RuntimeError(out)) => {
                (ExecutionStatus::Failure(FailureKind::Runtime), out.clone())
            }
            Some(err @ CodeChatError::Timeout { .. }) => (ExecutionStatus::Timeout, err.to_string()),
            _ => (
                ExecutionStatus::Failure(FailureKind::Unavailable),
                format!("{:#}", error),
            ),
        };

        Self {
            status,
            output_text,
            language_id: language_id.into(),
            completed_at,
        }
    }
}

/// Opaque identity of a submitted run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExecutionHandle(Ulid);

impl ExecutionHandle {
    /// Allocate a fresh, unique handle
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ExecutionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts run requests and eventually delivers one result per handle
pub trait ExecutionPipeline: Send + Sync {
    /// Start a run; returns immediately
    fn submit(&self, request: ExecutionRequest) -> ExecutionHandle;

    /// Best-effort cancellation; the result may still arrive and must then
    /// be discarded by the caller
    fn cancel(&self, handle: &ExecutionHandle);

    /// Short name used in logs and status output
    fn name(&self) -> &'static str;
}

/// Something that can actually run code
///
/// Implementations must never fail past this boundary: every outcome is an
/// [`ExecutionResult`].
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Run the request to completion
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult;

    /// Short name used in logs and status output
    fn name(&self) -> &'static str;
}
