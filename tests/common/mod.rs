use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use codechat::config::Config;
use codechat::execution::SimulatedPipeline;
use codechat::scheduler::{ManualScheduler, Scheduler};
use codechat::storage::{KeyValueStore, SledStore};
use codechat::workspace::Notice;
use codechat::Workspace;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_store() -> (SledStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("workspace.db");
    let store = SledStore::open(db_path).expect("failed to open sled store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Workspace on a virtual clock with the simulated pipeline
#[allow(dead_code)]
pub fn manual_workspace(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
) -> (Workspace, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let clock: Arc<dyn Scheduler> = Arc::new(scheduler.clone());
    let pipeline = Arc::new(SimulatedPipeline::new(
        Arc::clone(&clock),
        config.execution.latency(),
    ));
    let workspace = Workspace::open(config, store, clock, pipeline);
    (workspace, scheduler)
}

/// Advance the clock and apply the events that fire
#[allow(dead_code)]
pub fn advance(
    workspace: &mut Workspace,
    scheduler: &ManualScheduler,
    by: Duration,
) -> Vec<Notice> {
    scheduler
        .advance(by)
        .into_iter()
        .filter_map(|event| workspace.handle_event(event))
        .collect()
}
