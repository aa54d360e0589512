//! Deferred events delivered back to the workspace
//!
//! Anything that completes later than the intent that caused it (an
//! execution result, a simulated chat reply, a presence update) arrives as a
//! [`WorkspaceEvent`] and is applied on the thread that owns the sessions.

use tokio::sync::mpsc;

use crate::chat::MessageId;
use crate::execution::{ExecutionHandle, ExecutionResult};

/// Event produced by a timer, the execution pipeline or a presence feed
#[derive(Debug, Clone, PartialEq)]
pub enum WorkspaceEvent {
    /// A submitted run finished
    ExecutionCompleted {
        /// Handle returned by the pipeline at submit time
        handle: ExecutionHandle,
        /// The single result for that handle
        result: ExecutionResult,
    },

    /// The simulated peer answers an outgoing message
    PeerReply {
        /// Outgoing message the reply belongs to
        in_reply_to: MessageId,
    },

    /// External presence feed reported a new online count
    PresenceChanged {
        /// Number of users currently online
        online: u32,
    },
}

/// Sending half used by schedulers and pipelines to deliver events
pub type EventSink = mpsc::UnboundedSender<WorkspaceEvent>;

/// Receiving half drained by the workspace owner
pub type EventStream = mpsc::UnboundedReceiver<WorkspaceEvent>;

/// Create a connected sink/stream pair
pub fn event_channel() -> (EventSink, EventStream) {
    mpsc::unbounded_channel()
}
