//! Editor session
//!
//! Owns the selected language, the code buffer and the single in-flight
//! run slot. Every buffer or language change is written through to the
//! key-value store.
//!
//! Results of runs that were submitted before the most recent
//! [`select_language`](EditorSession::select_language) or
//! [`reset`](EditorSession::reset) are stale: the session remembers the
//! generation a run was submitted under and drops any completion whose
//! generation no longer matches.

use std::sync::Arc;

use tokio::sync::watch;

use crate::catalog::{LanguageCatalog, LanguageOption};
use crate::config::PersistenceMode;
use crate::error::{CodeChatError, Result};
use crate::execution::{ExecutionHandle, ExecutionPipeline, ExecutionRequest, ExecutionResult};
use crate::scheduler::Scheduler;
use crate::storage::{saved_code_key, KeyValueStore, SAVED_CODE_KEY, SELECTED_LANGUAGE_KEY};

/// A run that has been submitted and not yet completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightRun {
    /// Handle returned by the pipeline
    pub handle: ExecutionHandle,
    /// Session generation at submit time
    pub generation: u64,
    /// The request that was submitted
    pub request: ExecutionRequest,
}

/// Observable state of an [`EditorSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSnapshot {
    /// Selected language id
    pub language_id: String,
    /// Current buffer
    pub buffer: String,
    /// Whether a run is in flight
    pub running: bool,
    /// Result of the last applied run
    pub last_result: Option<ExecutionResult>,
    /// Current generation
    pub generation: u64,
}

/// Language, buffer and execution state of the workspace editor
pub struct EditorSession {
    catalog: Arc<LanguageCatalog>,
    store: Arc<dyn KeyValueStore>,
    pipeline: Arc<dyn ExecutionPipeline>,
    clock: Arc<dyn Scheduler>,
    persistence: PersistenceMode,
    language_id: String,
    buffer: String,
    generation: u64,
    in_flight: Option<InFlightRun>,
    last_result: Option<ExecutionResult>,
    snapshot_tx: watch::Sender<EditorSnapshot>,
}

impl EditorSession {
    /// Open the session, restoring language and buffer from the store
    ///
    /// A missing or unknown stored language falls back to the first catalog
    /// entry.
    pub fn open(
        catalog: Arc<LanguageCatalog>,
        store: Arc<dyn KeyValueStore>,
        pipeline: Arc<dyn ExecutionPipeline>,
        clock: Arc<dyn Scheduler>,
        persistence: PersistenceMode,
    ) -> Self {
        let stored = read_logged(store.as_ref(), SELECTED_LANGUAGE_KEY);
        let language = match stored.as_deref() {
            Some(id) => match catalog.lookup(id) {
                Ok(lang) => lang.clone(),
                Err(_) => {
                    tracing::warn!(language = %id, "Stored language is not in the catalog, using default");
                    catalog.first().clone()
                }
            },
            None => catalog.first().clone(),
        };

        let initial = EditorSnapshot {
            language_id: language.id.to_string(),
            buffer: language.default_code.to_string(),
            running: false,
            last_result: None,
            generation: 0,
        };
        let (snapshot_tx, _) = watch::channel(initial);

        let mut session = Self {
            catalog,
            store,
            pipeline,
            clock,
            persistence,
            language_id: language.id.to_string(),
            buffer: language.default_code.to_string(),
            generation: 0,
            in_flight: None,
            last_result: None,
            snapshot_tx,
        };

        if let Some(code) = session.persisted_override(language.id) {
            session.buffer = code;
        }
        tracing::info!(language = %session.language_id, "Editor session restored");

        session.publish();
        session
    }

    fn persisted_override(&self, language_id: &str) -> Option<String> {
        saved_buffer(self.store.as_ref(), self.persistence, language_id)
    }

    fn persist(&self) {
        let code_key = match self.persistence {
            PersistenceMode::PerLanguage => saved_code_key(&self.language_id),
            PersistenceMode::Global => SAVED_CODE_KEY.to_string(),
        };

        let written = self
            .store
            .set(SELECTED_LANGUAGE_KEY, &self.language_id)
            .and_then(|_| self.store.set(&code_key, &self.buffer));
        if let Err(e) = written {
            tracing::error!("Failed to persist editor state: {:#}", e);
        }
    }

    /// Invalidate outstanding work: bump the generation, drop the result
    /// and abandon any in-flight run
    fn invalidate(&mut self) {
        self.generation += 1;
        self.last_result = None;
        if let Some(run) = self.in_flight.take() {
            tracing::debug!(handle = %run.handle, "Abandoning in-flight run");
            self.pipeline.cancel(&run.handle);
        }
    }

    /// Switch to another catalog language
    ///
    /// The buffer becomes the persisted override for that language, or its
    /// catalog default.
    ///
    /// # Errors
    ///
    /// Returns `CodeChatError::UnknownLanguage` if `id` is not in the
    /// catalog; the session is unchanged in that case.
    pub fn select_language(&mut self, id: &str) -> Result<&LanguageOption> {
        let language = self.catalog.lookup(id)?.clone();

        let buffer = self
            .persisted_override(language.id)
            .unwrap_or_else(|| language.default_code.to_string());

        self.language_id = language.id.to_string();
        self.buffer = buffer;
        self.invalidate();
        self.persist();

        tracing::info!(language = %self.language_id, "Language selected");
        self.publish();
        self.catalog.lookup(id)
    }

    /// Replace the buffer of the selected language
    pub fn edit_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.persist();
        self.publish();
    }

    /// Restore the catalog default for the selected language
    pub fn reset(&mut self) {
        self.buffer = self.current_language().default_code.to_string();
        self.invalidate();
        self.persist();

        tracing::info!(language = %self.language_id, "Buffer reset");
        self.publish();
    }

    /// Submit the buffer to the execution pipeline
    ///
    /// Returns as soon as the request is submitted; the result arrives
    /// through [`complete_run`](Self::complete_run).
    ///
    /// # Errors
    ///
    /// Returns `CodeChatError::AlreadyRunning` if a run is in flight.
    pub fn run(&mut self) -> Result<ExecutionHandle> {
        if self.in_flight.is_some() {
            return Err(CodeChatError::AlreadyRunning.into());
        }

        let request = ExecutionRequest::new(
            self.language_id.as_str(),
            self.buffer.as_str(),
            self.clock.now(),
        );
        let handle = self.pipeline.submit(request.clone());
        tracing::info!(%handle, language = %self.language_id, pipeline = self.pipeline.name(), "Run submitted");

        self.in_flight = Some(InFlightRun {
            handle,
            generation: self.generation,
            request,
        });
        self.publish();
        Ok(handle)
    }

    /// Apply a delivered result
    ///
    /// Returns `false` and leaves the session untouched when the result is
    /// stale: the handle is not the in-flight one, or the session has been
    /// reset or switched language since submission.
    pub fn complete_run(&mut self, handle: ExecutionHandle, result: ExecutionResult) -> bool {
        let current = match &self.in_flight {
            Some(run) if run.handle == handle && run.generation == self.generation => true,
            _ => false,
        };
        if !current {
            tracing::debug!(%handle, "Discarding stale execution result");
            return false;
        }

        tracing::info!(%handle, status = %result.status, "Run completed");
        self.in_flight = None;
        self.last_result = Some(result);
        self.publish();
        true
    }

    /// Cancel any in-flight run
    pub fn shutdown(&mut self) {
        if let Some(run) = self.in_flight.take() {
            self.pipeline.cancel(&run.handle);
            self.publish();
        }
    }

    /// Selected language
    pub fn current_language(&self) -> &LanguageOption {
        // language_id only ever holds ids resolved through the catalog
        self.catalog
            .lookup(&self.language_id)
            .unwrap_or_else(|_| self.catalog.first())
    }

    /// Selected language id
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Current buffer
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether a run is in flight
    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The in-flight run, if any
    pub fn in_flight(&self) -> Option<&InFlightRun> {
        self.in_flight.as_ref()
    }

    /// Result of the last applied run
    pub fn last_result(&self) -> Option<&ExecutionResult> {
        self.last_result.as_ref()
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Name of the pipeline runs are submitted to
    pub fn pipeline_name(&self) -> &'static str {
        self.pipeline.name()
    }

    /// Current observable state
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            language_id: self.language_id.clone(),
            buffer: self.buffer.clone(),
            running: self.in_flight.is_some(),
            last_result: self.last_result.clone(),
            generation: self.generation,
        }
    }

    /// Receive a new snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<EditorSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

/// Saved buffer for exactly `language_id`, if one exists
pub fn saved_buffer(
    store: &dyn KeyValueStore,
    persistence: PersistenceMode,
    language_id: &str,
) -> Option<String> {
    match persistence {
        PersistenceMode::PerLanguage => read_logged(store, &saved_code_key(language_id)),
        PersistenceMode::Global => {
            // The single slot belongs to whichever language was stored
            // alongside it.
            let owner = read_logged(store, SELECTED_LANGUAGE_KEY)?;
            if owner == language_id {
                read_logged(store, SAVED_CODE_KEY)
            } else {
                None
            }
        }
    }
}

fn read_logged(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(key, "Failed to read from store: {:#}", e);
            None
        }
    }
}
