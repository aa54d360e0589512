//! Integration tests for the workspace running real processes
//!
//! The `python` language is mapped to `sh` so the tests only depend on a
//! POSIX shell.

#![cfg(unix)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use codechat::config::{CommandSpec, Config, RunnerConfig};
use codechat::event::{event_channel, EventStream};
use codechat::execution::{ExecutionStatus, FailureKind, ProcessBackend, TaskPipeline};
use codechat::scheduler::{Scheduler, TokioScheduler};
use codechat::storage::MemoryStore;
use codechat::workspace::{Intent, Notice, NoticeLevel};
use codechat::Workspace;

fn shell_backend(timeout: Duration) -> ProcessBackend {
    let mut runners = BTreeMap::new();
    runners.insert(
        "python".to_string(),
        RunnerConfig {
            file_name: "main.sh".to_string(),
            compile: None,
            run: CommandSpec {
                program: "sh".to_string(),
                args: vec!["{file}".to_string()],
            },
        },
    );
    ProcessBackend::new(runners, timeout, 4096)
}

fn open(timeout: Duration) -> (Workspace, EventStream) {
    let (sink, events) = event_channel();
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(sink.clone()));
    let pipeline = Arc::new(TaskPipeline::new(Arc::new(shell_backend(timeout)), sink));
    let ws = Workspace::open(
        &Config::default(),
        Arc::new(MemoryStore::new()),
        scheduler,
        pipeline,
    );
    (ws, events)
}

async fn next_notice(ws: &mut Workspace, events: &mut EventStream) -> Option<Notice> {
    let event = tokio::time::timeout(Duration::from_secs(20), events.recv())
        .await
        .expect("timed out waiting for workspace event")
        .expect("event channel closed");
    ws.handle_event(event)
}

#[tokio::test]
async fn test_process_run_reports_stdout() {
    let (mut ws, mut events) = open(Duration::from_secs(10));
    ws.apply(Intent::SelectLanguage("python".into()));
    ws.apply(Intent::EditBuffer("echo from-shell".into()));
    assert_eq!(ws.apply(Intent::Run), None);

    let notice = next_notice(&mut ws, &mut events).await.unwrap();
    assert_eq!(notice.title, "Execution Complete");
    let result = ws.editor().last_result().unwrap();
    assert_eq!(result.status, ExecutionStatus::Success);
    assert!(result.output_text.contains("from-shell"));
}

#[tokio::test]
async fn test_process_failure_becomes_error_notice() {
    let (mut ws, mut events) = open(Duration::from_secs(10));
    ws.apply(Intent::SelectLanguage("python".into()));
    ws.apply(Intent::EditBuffer("echo nope >&2\nexit 2".into()));
    ws.apply(Intent::Run);

    let notice = next_notice(&mut ws, &mut events).await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.title, "Execution Failed");
    assert_eq!(
        ws.editor().last_result().unwrap().status,
        ExecutionStatus::Failure(FailureKind::Runtime)
    );
}

#[tokio::test]
async fn test_process_timeout() {
    let (mut ws, mut events) = open(Duration::from_millis(300));
    ws.apply(Intent::SelectLanguage("python".into()));
    ws.apply(Intent::EditBuffer("sleep 5".into()));
    ws.apply(Intent::Run);

    let notice = next_notice(&mut ws, &mut events).await.unwrap();
    assert_eq!(notice.title, "Execution Timed Out");
    assert_eq!(
        ws.editor().last_result().unwrap().status,
        ExecutionStatus::Timeout
    );
}

#[tokio::test]
async fn test_language_without_runner_is_unavailable() {
    let (mut ws, mut events) = open(Duration::from_secs(10));
    ws.apply(Intent::SelectLanguage("swift".into()));
    ws.apply(Intent::Run);

    let notice = next_notice(&mut ws, &mut events).await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(
        ws.editor().last_result().unwrap().status,
        ExecutionStatus::Failure(FailureKind::Unavailable)
    );
}
