//! Integration tests for configuration files driving a workspace

mod common;

use std::sync::Arc;
use std::time::Duration;

use codechat::cli::Cli;
use codechat::config::{Config, PersistenceMode};
use codechat::storage::{KeyValueStore, MemoryStore};
use codechat::workspace::Intent;

use common::{advance, manual_workspace, temp_config_file};

#[test]
fn test_config_file_settings_reach_the_workspace() {
    let (_dir, path) = temp_config_file(
        r#"
editor:
  persistence: global
execution:
  latency_ms: 200
chat:
  reply_delay_ms: 50
  peer_name: Sam
"#,
    );

    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.editor.persistence, PersistenceMode::Global);

    let store = Arc::new(MemoryStore::new());
    let (mut ws, scheduler) = manual_workspace(&config, store.clone());

    ws.apply(Intent::Run);
    let notices = advance(&mut ws, &scheduler, Duration::from_millis(200));
    assert_eq!(notices.len(), 1);

    ws.apply(Intent::SendMessage("ping".into()));
    advance(&mut ws, &scheduler, Duration::from_millis(50));
    let last = ws.chat().history().last().unwrap();
    assert_eq!(last.sender, "Sam");

    ws.apply(Intent::EditBuffer("// global slot".into()));
    assert_eq!(store.get("savedCode").unwrap().as_deref(), Some("// global slot"));
}

#[test]
fn test_config_file_with_out_of_range_delay_is_rejected() {
    let (_dir, path) = temp_config_file("execution:\n  latency_ms: 10000000000000000\n");

    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("execution.latency_ms"));
}
