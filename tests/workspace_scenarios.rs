//! End-to-end workspace scenarios on a virtual clock
//!
//! Drives the workspace through intents only and checks what a user would
//! observe: buffers, results, notices and chat history.

mod common;

use std::sync::Arc;
use std::time::Duration;

use codechat::chat::Direction;
use codechat::config::{Config, PersistenceMode};
use codechat::execution::simulated_output;
use codechat::storage::MemoryStore;
use codechat::workspace::{Intent, NoticeLevel};

use common::{advance, manual_workspace};

#[test]
fn test_run_python_default_snippet() {
    let (mut ws, scheduler) = manual_workspace(&Config::default(), Arc::new(MemoryStore::new()));

    ws.apply(Intent::SelectLanguage("python".into()));
    assert_eq!(ws.apply(Intent::Run), None);

    // Nothing arrives before the latency has passed.
    assert!(advance(&mut ws, &scheduler, Duration::from_millis(1499)).is_empty());
    assert!(ws.editor().is_running());

    let notices = advance(&mut ws, &scheduler, Duration::from_millis(1));
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Execution Complete");

    let result = ws.editor().last_result().unwrap();
    assert_eq!(result.output_text, simulated_output("python"));
    assert!(result.output_text.ends_with("Output:\nHello World"));
}

#[test]
fn test_compiled_languages_report_time_and_memory() {
    let (mut ws, scheduler) = manual_workspace(&Config::default(), Arc::new(MemoryStore::new()));

    ws.apply(Intent::SelectLanguage("go".into()));
    ws.apply(Intent::Run);
    advance(&mut ws, &scheduler, Duration::from_secs(2));

    let output = &ws.editor().last_result().unwrap().output_text;
    assert!(output.contains("Language: go"));
    assert!(output.contains("Execution time: 0.042s"));
    assert!(output.contains("Memory: 2.1 MB"));
}

#[test]
fn test_switching_language_mid_run_drops_stale_result() {
    let (mut ws, scheduler) = manual_workspace(&Config::default(), Arc::new(MemoryStore::new()));

    ws.apply(Intent::Run);
    advance(&mut ws, &scheduler, Duration::from_millis(700));
    ws.apply(Intent::SelectLanguage("java".into()));

    let notices = advance(&mut ws, &scheduler, Duration::from_secs(5));
    assert!(notices.is_empty());
    assert!(ws.editor().last_result().is_none());
    assert_eq!(ws.editor().language_id(), "java");
}

#[test]
fn test_abandoned_runs_leave_no_timers_behind() {
    let (mut ws, scheduler) = manual_workspace(&Config::default(), Arc::new(MemoryStore::new()));

    ws.apply(Intent::Run);
    ws.apply(Intent::Reset);
    ws.apply(Intent::Run);
    ws.apply(Intent::SelectLanguage("go".into()));
    ws.apply(Intent::Run);
    ws.apply(Intent::Reset);

    assert_eq!(scheduler.pending(), 0);
    assert!(advance(&mut ws, &scheduler, Duration::from_secs(5)).is_empty());
    assert!(ws.editor().last_result().is_none());
}

#[test]
fn test_second_run_rejected_while_first_in_flight() {
    let (mut ws, scheduler) = manual_workspace(&Config::default(), Arc::new(MemoryStore::new()));

    assert_eq!(ws.apply(Intent::Run), None);
    let notice = ws.apply(Intent::Run).unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.title, "Already Running");

    // Exactly one completion arrives.
    assert_eq!(advance(&mut ws, &scheduler, Duration::from_secs(5)).len(), 1);
}

#[test]
fn test_chat_conversation_with_simulated_peer() {
    let (mut ws, scheduler) = manual_workspace(&Config::default(), Arc::new(MemoryStore::new()));
    let seeded = ws.chat().history().len();
    assert_eq!(seeded, 2);

    ws.apply(Intent::SendMessage("first".into()));
    advance(&mut ws, &scheduler, Duration::from_millis(500));
    ws.apply(Intent::SendMessage("second".into()));
    advance(&mut ws, &scheduler, Duration::from_millis(900));

    let history = ws.chat().history();
    let texts: Vec<_> = history[seeded..].iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "first",
            "second",
            "That's a great point! Let me check the code...",
        ]
    );

    advance(&mut ws, &scheduler, Duration::from_millis(100));
    let history = ws.chat().history();
    assert_eq!(history.len(), seeded + 4);
    assert_eq!(history.last().unwrap().direction, Direction::Incoming);
    assert_eq!(history.last().unwrap().sender, "Alex");
    assert!(ws.chat().pending_replies().next().is_none());
}

#[test]
fn test_empty_message_is_rejected() {
    let (mut ws, scheduler) = manual_workspace(&Config::default(), Arc::new(MemoryStore::new()));
    let before = ws.chat().history().len();

    let notice = ws.apply(Intent::SendMessage(" \t\n".into())).unwrap();
    assert_eq!(notice.title, "Empty Message");

    advance(&mut ws, &scheduler, Duration::from_secs(5));
    assert_eq!(ws.chat().history().len(), before);
}

#[test]
fn test_persistence_modes_differ_on_language_round_trip() {
    let mut per_language = Config::default();
    per_language.editor.persistence = PersistenceMode::PerLanguage;
    let mut global = Config::default();
    global.editor.persistence = PersistenceMode::Global;

    let mut buffers = Vec::new();
    for config in [per_language, global] {
        let (mut ws, _) = manual_workspace(&config, Arc::new(MemoryStore::new()));
        ws.apply(Intent::SelectLanguage("python".into()));
        ws.apply(Intent::EditBuffer("print(1+1)".into()));
        ws.apply(Intent::SelectLanguage("javascript".into()));
        ws.apply(Intent::SelectLanguage("python".into()));
        buffers.push(ws.editor().buffer().to_string());
    }

    assert_eq!(buffers[0], "print(1+1)");
    assert_eq!(buffers[1], "print('Hello World')");
}
