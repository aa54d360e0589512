/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `shell`     - Interactive workspace (editor + chat)
- `languages` - Print the language catalog
- `run`       - Execute one buffer and print the result

It also wires configuration to the store and execution pipeline the
handlers share.
*/

use std::sync::Arc;

use crate::config::{BackendKind, Config, StorageConfig};
use crate::error::Result;
use crate::event::EventSink;
use crate::execution::{
    ExecutionBackend, ExecutionPipeline, ProcessBackend, SimulatedBackend, SimulatedPipeline,
    TaskPipeline,
};
use crate::scheduler::Scheduler;
use crate::storage::{KeyValueStore, MemoryStore, SledStore};

// Special commands parser for the workspace prompt
pub mod special_commands;

// Interactive workspace
pub mod shell;

// Language catalog listing
pub mod languages;

// One-shot execution
pub mod run;

/// Open the key-value store described by `storage`
///
/// # Errors
///
/// Returns `CodeChatError::Storage` if the on-disk store cannot be opened
pub fn open_store(storage: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    if storage.ephemeral {
        tracing::info!("Using in-memory store; state will not be saved");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = match &storage.path {
        Some(path) => SledStore::open(path)?,
        None => SledStore::open_default()?,
    };
    tracing::info!("Using store at {}", store.path().display());
    Ok(Arc::new(store))
}

/// Backend for one-shot runs
pub fn build_backend(config: &Config) -> Arc<dyn ExecutionBackend> {
    match config.execution.backend {
        BackendKind::Simulated => Arc::new(SimulatedBackend::new(config.execution.latency())),
        BackendKind::Process => Arc::new(ProcessBackend::from_config(&config.execution)),
    }
}

/// Pipeline for the interactive workspace
///
/// The simulator runs on `scheduler`; the process backend runs on tokio
/// tasks and reports through `sink`.
pub fn build_pipeline(
    config: &Config,
    scheduler: Arc<dyn Scheduler>,
    sink: EventSink,
) -> Arc<dyn ExecutionPipeline> {
    match config.execution.backend {
        BackendKind::Simulated => Arc::new(SimulatedPipeline::new(
            scheduler,
            config.execution.latency(),
        )),
        BackendKind::Process => Arc::new(TaskPipeline::new(build_backend(config), sink)),
    }
}
