//! Test utilities for CodeChat
//!
//! This module provides common test utilities including temporary directory
//! management, test file creation, assertion helpers and a workspace wired
//! to a virtual clock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::config::Config;
use crate::error::Result;
use crate::execution::SimulatedPipeline;
use crate::scheduler::{ManualScheduler, Scheduler};
use crate::storage::MemoryStore;
use crate::workspace::{Notice, Workspace};

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A workspace on a virtual clock with an in-memory store
pub struct TestWorkspace {
    /// The workspace under test
    pub workspace: Workspace,
    /// Clock driving runs and replies
    pub scheduler: ManualScheduler,
    /// Backing store, inspectable after intents
    pub store: Arc<MemoryStore>,
}

impl TestWorkspace {
    /// Workspace with default configuration
    pub fn new() -> Self {
        Self::with_config(&Config::default(), Arc::new(MemoryStore::new()))
    }

    /// Workspace over a given configuration and store
    pub fn with_config(config: &Config, store: Arc<MemoryStore>) -> Self {
        let scheduler = ManualScheduler::new();
        let clock: Arc<dyn Scheduler> = Arc::new(scheduler.clone());
        let pipeline = Arc::new(SimulatedPipeline::new(
            Arc::clone(&clock),
            config.execution.latency(),
        ));
        let workspace = Workspace::open(config, store.clone(), clock, pipeline);
        Self {
            workspace,
            scheduler,
            store,
        }
    }

    /// Move the clock forward and apply every event that fires
    ///
    /// Returns the notices produced along the way.
    pub fn advance(&mut self, by: Duration) -> Vec<Notice> {
        self.scheduler
            .advance(by)
            .into_iter()
            .filter_map(|event| self.workspace.handle_event(event))
            .collect()
    }

    /// Fire pending events one at a time until none remain
    ///
    /// Returns the notices produced along the way.
    pub fn settle(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Some(event) = self.scheduler.fire_next() {
            notices.extend(self.workspace.handle_event(event));
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodeChatError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(CodeChatError::Config("test error message".into()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<()> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    fn test_workspace_advance_applies_events() {
        let mut tw = TestWorkspace::new();
        tw.workspace.apply(crate::workspace::Intent::Run);
        let notices = tw.advance(Duration::from_millis(1500));
        assert_eq!(notices.len(), 1);
        assert!(tw.workspace.editor().last_result().is_some());
    }

    #[test]
    fn test_workspace_settle_drains_queue() {
        let mut tw = TestWorkspace::new();
        tw.workspace.apply(crate::workspace::Intent::Run);
        tw.workspace
            .apply(crate::workspace::Intent::SendMessage("hi".into()));

        let notices = tw.settle();
        assert_eq!(notices.len(), 1);
        assert_eq!(tw.scheduler.pending(), 0);
        assert!(!tw.workspace.editor().is_running());
        assert!(tw.workspace.chat().pending_replies().next().is_none());
    }
}
