//! CodeChat - single-user code and chat workspace
//!
//! This library provides the core of the CodeChat workspace: a code editor
//! session with language selection and asynchronous execution, a chat
//! session with a simulated peer, and the persistence and scheduling they
//! share.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `catalog`: Supported languages and their default snippets
//! - `editor`: Selected language, buffer, persistence and the run slot
//! - `execution`: Execution pipelines (simulated, task-backed, process)
//! - `chat`: Message history, simulated replies and presence
//! - `workspace`: Intent-driven facade over editor, chat and theme
//! - `scheduler`: Real and virtual-clock timers for deferred events
//! - `storage`: Key-value persistence (sled or in-memory)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use codechat::event::event_channel;
//! use codechat::execution::SimulatedPipeline;
//! use codechat::scheduler::{Scheduler, TokioScheduler};
//! use codechat::storage::MemoryStore;
//! use codechat::workspace::Intent;
//! use codechat::{Config, Workspace};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let (sink, mut events) = event_channel();
//!     let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(sink));
//!     let pipeline = Arc::new(SimulatedPipeline::new(
//!         Arc::clone(&scheduler),
//!         Duration::from_millis(1500),
//!     ));
//!     let mut workspace =
//!         Workspace::open(&config, Arc::new(MemoryStore::new()), scheduler, pipeline);
//!
//!     workspace.apply(Intent::Run);
//!     if let Some(event) = events.recv().await {
//!         workspace.handle_event(event);
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod event;
pub mod execution;
pub mod scheduler;
pub mod storage;
pub mod workspace;

// Re-export commonly used types
pub use config::Config;
pub use error::{CodeChatError, Result};
pub use workspace::{Intent, Notice, Workspace};

#[cfg(test)]
pub mod test_utils;
