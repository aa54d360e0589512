//! Chat session
//!
//! Append-only message history with a simulated peer that answers every
//! outgoing message after a fixed delay, plus a presence counter.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::ChatConfig;
use crate::error::{CodeChatError, Result};
use crate::event::WorkspaceEvent;
use crate::scheduler::Scheduler;

/// Unique, monotonically increasing message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a message was sent by the local user or received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Sent by the local user
    Outgoing,
    /// Received from a peer
    Incoming,
}

/// A chat message; never edited once appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Identity of the message
    pub id: MessageId,
    /// Message body, non-empty after trimming
    pub text: String,
    /// Display name of the sender
    pub sender: String,
    /// When the message was appended
    pub sent_at: DateTime<Utc>,
    /// Outgoing or incoming
    pub direction: Direction,
    /// Outgoing message this one answers, for simulated replies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<MessageId>,
}

/// Observable state of a [`ChatSession`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatSnapshot {
    /// History in send/receive order
    pub messages: Vec<ChatMessage>,
    /// Number of users online
    pub online_count: u32,
    /// Outgoing messages still awaiting their reply
    pub pending_replies: Vec<MessageId>,
}

/// Message history, simulated replies and presence for one workspace
pub struct ChatSession {
    scheduler: Arc<dyn Scheduler>,
    user_name: String,
    peer_name: String,
    reply_text: String,
    reply_delay: Duration,
    history: Vec<ChatMessage>,
    online_count: u32,
    pending_replies: BTreeSet<MessageId>,
    next_id: u64,
    snapshot_tx: watch::Sender<ChatSnapshot>,
}

impl ChatSession {
    /// Create a session, optionally seeded with the welcome exchange
    pub fn new(config: &ChatConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        let (snapshot_tx, _) = watch::channel(ChatSnapshot::default());
        let mut session = Self {
            scheduler,
            user_name: config.user_name.clone(),
            peer_name: config.peer_name.clone(),
            reply_text: config.reply_text.clone(),
            reply_delay: config.reply_delay(),
            history: Vec::new(),
            online_count: config.online_count,
            pending_replies: BTreeSet::new(),
            next_id: 1,
            snapshot_tx,
        };

        if config.seed_history {
            session.seed();
        }
        session.publish();
        session
    }

    fn seed(&mut self) {
        let now = self.scheduler.now();
        let welcome = ChatMessage {
            id: self.allocate_id(),
            text: "Hey! Welcome to the coding workspace 👋".to_string(),
            sender: self.peer_name.clone(),
            sent_at: now - chrono::Duration::minutes(5),
            direction: Direction::Incoming,
            in_reply_to: None,
        };
        let ready = ChatMessage {
            id: self.allocate_id(),
            text: "Ready to code together?".to_string(),
            sender: self.user_name.clone(),
            sent_at: now - chrono::Duration::minutes(4),
            direction: Direction::Outgoing,
            in_reply_to: None,
        };
        self.history.push(welcome);
        self.history.push(ready);
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Timestamp for a new message, never earlier than the last one
    fn stamp(&self) -> DateTime<Utc> {
        let now = self.scheduler.now();
        match self.history.last() {
            Some(last) if last.sent_at > now => last.sent_at,
            _ => now,
        }
    }

    /// Append an outgoing message and schedule the peer's reply
    ///
    /// # Errors
    ///
    /// Returns `CodeChatError::EmptyMessage` if `text` is blank; nothing is
    /// appended in that case.
    pub fn send(&mut self, text: &str) -> Result<MessageId> {
        if text.trim().is_empty() {
            return Err(CodeChatError::EmptyMessage.into());
        }

        let id = self.allocate_id();
        let message = ChatMessage {
            id,
            text: text.to_string(),
            sender: self.user_name.clone(),
            sent_at: self.stamp(),
            direction: Direction::Outgoing,
            in_reply_to: None,
        };
        self.history.push(message);
        self.pending_replies.insert(id);

        self.scheduler
            .schedule(self.reply_delay, WorkspaceEvent::PeerReply { in_reply_to: id });
        tracing::debug!(message_id = %id, "Message sent, reply scheduled");

        self.publish();
        Ok(id)
    }

    /// Append the simulated reply to `in_reply_to`
    ///
    /// Returns the id of the appended reply, or `None` if no reply was
    /// pending for that message.
    pub fn deliver_reply(&mut self, in_reply_to: MessageId) -> Option<MessageId> {
        if !self.pending_replies.remove(&in_reply_to) {
            tracing::debug!(message_id = %in_reply_to, "Ignoring reply for unknown message");
            return None;
        }

        let id = self.allocate_id();
        let reply = ChatMessage {
            id,
            text: self.reply_text.clone(),
            sender: self.peer_name.clone(),
            sent_at: self.stamp(),
            direction: Direction::Incoming,
            in_reply_to: Some(in_reply_to),
        };
        self.history.push(reply);

        self.publish();
        Some(id)
    }

    /// Number of users online
    pub fn presence(&self) -> u32 {
        self.online_count
    }

    /// Apply a presence update from an external feed
    pub fn update_presence(&mut self, online: u32) {
        if self.online_count != online {
            tracing::debug!(from = self.online_count, to = online, "Presence changed");
            self.online_count = online;
            self.publish();
        }
    }

    /// Messages in send/receive order
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Outgoing messages still waiting for their reply
    pub fn pending_replies(&self) -> impl Iterator<Item = &MessageId> {
        self.pending_replies.iter()
    }

    /// Current observable state
    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.history.clone(),
            online_count: self.online_count,
            pending_replies: self.pending_replies.iter().copied().collect(),
        }
    }

    /// Receive a new snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
