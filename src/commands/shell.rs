//! Interactive workspace
//!
//! Line editing runs on a dedicated thread with `rustyline`; lines arrive
//! over a channel and the main task selects between them, workspace events
//! and session snapshots. Everything that mutates the workspace happens on
//! the main task.

use std::path::Path;
use std::sync::Arc;

use colored::{ColoredString, Colorize};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;

use crate::chat::{ChatMessage, Direction};
use crate::commands::languages::list_languages;
use crate::commands::run::print_result;
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::commands::{build_pipeline, open_store};
use crate::config::Config;
use crate::error::Result;
use crate::event::event_channel;
use crate::execution::ExecutionResult;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::workspace::{Intent, Notice, NoticeLevel, Theme, Workspace};

/// What the loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading
    Continue,
    /// Leave the workspace
    Exit,
}

/// Start the interactive workspace
///
/// # Errors
///
/// Returns an error if the store cannot be opened
pub async fn run_shell(config: Config) -> Result<()> {
    tracing::info!("Starting interactive workspace");

    let store = open_store(&config.storage)?;
    let (sink, mut events) = event_channel();
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::new(sink.clone()));
    let pipeline = build_pipeline(&config, Arc::clone(&scheduler), sink);
    let mut workspace = Workspace::open(&config, store, scheduler, pipeline);

    let mut chat_rx = workspace.chat().subscribe();
    let mut editor_rx = workspace.editor().subscribe();
    chat_rx.mark_unchanged();
    editor_rx.mark_unchanged();

    print_welcome_banner(&workspace);
    let mut shown_messages = workspace.chat().history().len();
    let mut shown_result: Option<ExecutionResult> = workspace.editor().last_result().cloned();

    let (line_tx, mut lines) = mpsc::unbounded_channel::<String>();
    let (prompt_tx, prompt_rx) = mpsc::unbounded_channel::<String>();
    let initial_prompt = format_prompt(&workspace);
    let reader = std::thread::spawn(move || read_lines(initial_prompt, prompt_rx, line_tx));

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                if handle_line(&mut workspace, &line) == Flow::Exit {
                    break;
                }
                // Unblocks the reader for the next line.
                let _ = prompt_tx.send(format_prompt(&workspace));
            }
            Some(event) = events.recv() => {
                tracing::debug!(?event, "Workspace event");
                if let Some(notice) = workspace.handle_event(event) {
                    print_notice(&notice);
                }
            }
            Ok(()) = chat_rx.changed() => {
                let snapshot = chat_rx.borrow_and_update().clone();
                for message in snapshot.messages.iter().skip(shown_messages) {
                    println!("{}", format_message(message, workspace.theme()));
                }
                shown_messages = snapshot.messages.len();
            }
            Ok(()) = editor_rx.changed() => {
                let snapshot = editor_rx.borrow_and_update().clone();
                if snapshot.last_result != shown_result {
                    if let Some(result) = &snapshot.last_result {
                        print_result(result);
                    }
                    shown_result = snapshot.last_result;
                }
            }
        }
    }

    drop(prompt_tx);
    workspace.shutdown();
    match reader.join() {
        Ok(Err(e)) => tracing::warn!("Line reader stopped with error: {:#}", e),
        Err(_) => tracing::error!("Line reader panicked"),
        Ok(Ok(())) => {}
    }

    println!("Goodbye!");
    Ok(())
}

/// Read lines until exit, forwarding each one and waiting for the next prompt
fn read_lines(
    mut prompt: String,
    mut prompts: mpsc::UnboundedReceiver<String>,
    lines: mpsc::UnboundedSender<String>,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let exit = matches!(parse_special_command(trimmed), Ok(SpecialCommand::Exit));
                if lines.send(line).is_err() || exit {
                    break;
                }
                match prompts.blocking_recv() {
                    Some(next) => prompt = next,
                    None => break,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Readline error: {}", e);
                break;
            }
        }
    }
    Ok(())
}

/// Apply one line of input to the workspace
pub fn handle_line(workspace: &mut Workspace, line: &str) -> Flow {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Flow::Continue;
    }

    let command = match parse_special_command(trimmed) {
        Ok(command) => command,
        Err(e) => {
            println!("{}\n", e.to_string().red());
            return Flow::Continue;
        }
    };

    let notice = match command {
        SpecialCommand::SelectLanguage(id) => {
            let notice = workspace.apply(Intent::SelectLanguage(id));
            if notice.is_none() {
                let lang = workspace.editor().current_language();
                println!("Switched to {}\n", accent(workspace.theme(), lang.display_name));
                print_code(workspace);
            }
            notice
        }
        SpecialCommand::Edit(text) => {
            let notice = workspace.apply(Intent::EditBuffer(text));
            println!("Buffer updated ({} lines)\n", workspace.editor().buffer().lines().count());
            notice
        }
        SpecialCommand::Load(path) => load_file(workspace, &path),
        SpecialCommand::Run => {
            let notice = workspace.apply(Intent::Run);
            if notice.is_none() {
                println!(
                    "{}",
                    format!("Running {}...", workspace.editor().language_id()).dimmed()
                );
            }
            notice
        }
        SpecialCommand::Reset => workspace.apply(Intent::Reset),
        SpecialCommand::ToggleTheme => {
            let notice = workspace.apply(Intent::ToggleTheme);
            println!("Theme: {}\n", accent(workspace.theme(), workspace.theme().as_str()));
            notice
        }
        SpecialCommand::ListLanguages => {
            if let Err(e) = list_languages(workspace.catalog(), false) {
                tracing::error!("Failed to list languages: {:#}", e);
            }
            None
        }
        SpecialCommand::ShowCode => {
            print_code(workspace);
            None
        }
        SpecialCommand::History => {
            for message in workspace.chat().history() {
                println!("{}", format_message(message, workspace.theme()));
            }
            println!();
            None
        }
        SpecialCommand::Who => {
            println!("{} online\n", workspace.chat().presence());
            None
        }
        SpecialCommand::ShowStatus => {
            print_status_display(workspace);
            None
        }
        SpecialCommand::Help => {
            print_help();
            None
        }
        SpecialCommand::Exit => return Flow::Exit,
        SpecialCommand::None => workspace.apply(Intent::SendMessage(line.to_string())),
    };

    if let Some(notice) = notice {
        print_notice(&notice);
    }
    Flow::Continue
}

fn load_file(workspace: &mut Workspace, path: &Path) -> Option<Notice> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let notice = workspace.apply(Intent::EditBuffer(text));
            println!("Loaded {}\n", path.display());
            notice
        }
        Err(e) => Some(Notice::error(
            "Load Failed",
            format!("{}: {}", path.display(), e),
        )),
    }
}

fn accent(theme: Theme, text: &str) -> ColoredString {
    match theme {
        Theme::Dark => text.cyan().bold(),
        Theme::Light => text.blue().bold(),
    }
}

/// Prompt showing the selected language
pub fn format_prompt(workspace: &Workspace) -> String {
    let tag = format!("[{}]", workspace.editor().language_id());
    format!("{} >>> ", accent(workspace.theme(), &tag))
}

/// One chat line: time, sender and text
pub fn format_message(message: &ChatMessage, theme: Theme) -> String {
    let time = message
        .sent_at
        .with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string();
    let sender = match message.direction {
        Direction::Outgoing => accent(theme, &message.sender),
        Direction::Incoming => message.sender.as_str().magenta().bold(),
    };
    format!("{} {}: {}", time.dimmed(), sender, message.text)
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => println!("{} {}", notice.title.green().bold(), notice.description),
        NoticeLevel::Error => println!("{} {}", notice.title.red().bold(), notice.description),
    }
    println!();
}

fn print_code(workspace: &Workspace) {
    for (i, line) in workspace.editor().buffer().lines().enumerate() {
        println!("{} {}", format!("{:>3}", i + 1).dimmed(), line);
    }
    println!();
}

fn print_welcome_banner(workspace: &Workspace) {
    let theme = workspace.theme();
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║              CodeChat Workspace - Welcome!                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!(
        "Language: {}    Theme: {}    Online: {}\n",
        accent(theme, workspace.editor().current_language().display_name),
        theme,
        workspace.chat().presence()
    );
    for message in workspace.chat().history() {
        println!("{}", format_message(message, theme));
    }
    println!("\nType '/help' for available commands, 'exit' to quit\n");
}

fn print_status_display(workspace: &Workspace) {
    let editor = workspace.editor();
    let theme = workspace.theme();

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                   CodeChat Session Status                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!(
        "Language:        {} ({})",
        accent(theme, editor.current_language().display_name),
        editor.language_id()
    );
    println!("Buffer:          {} lines", editor.buffer().lines().count());
    println!("Pipeline:        {}", editor.pipeline_name());
    println!(
        "Run State:       {}",
        if editor.is_running() { "running" } else { "idle" }
    );
    if let Some(result) = editor.last_result() {
        println!("Last Result:     {}", result.status);
    }
    println!("Theme:           {}", theme);
    println!("Messages:        {}", workspace.chat().history().len());
    println!("Online:          {}", workspace.chat().presence());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_file, temp_dir, TestWorkspace};
    use std::time::Duration;

    #[test]
    fn test_plain_text_is_sent_as_chat() {
        let mut tw = TestWorkspace::new();
        let ws = &mut tw.workspace;
        let before = ws.chat().history().len();
        assert_eq!(handle_line(ws, "looks good"), Flow::Continue);
        assert_eq!(ws.chat().history().len(), before + 1);
        assert_eq!(ws.chat().history().last().unwrap().text, "looks good");
    }

    #[test]
    fn test_editor_commands_drive_workspace() {
        let mut tw = TestWorkspace::new();
        handle_line(&mut tw.workspace, "/lang python");
        assert_eq!(tw.workspace.editor().language_id(), "python");

        handle_line(&mut tw.workspace, r"/edit x = 1\nprint(x)");
        assert_eq!(tw.workspace.editor().buffer(), "x = 1\nprint(x)");

        handle_line(&mut tw.workspace, "/run");
        assert!(tw.workspace.editor().is_running());
        tw.advance(Duration::from_millis(1500));
        assert!(tw.workspace.editor().last_result().is_some());

        handle_line(&mut tw.workspace, "/reset");
        assert_eq!(tw.workspace.editor().buffer(), "print('Hello World')");
    }

    #[test]
    fn test_load_replaces_buffer() {
        let mut tw = TestWorkspace::new();
        let dir = temp_dir();
        let path = create_test_file(&dir, "main.js", "console.log(42);");

        handle_line(&mut tw.workspace, &format!("/load {}", path.display()));
        assert_eq!(tw.workspace.editor().buffer(), "console.log(42);");
    }

    #[test]
    fn test_load_missing_file_keeps_buffer() {
        let mut tw = TestWorkspace::new();
        let before = tw.workspace.editor().buffer().to_string();
        let notice = load_file(&mut tw.workspace, Path::new("/definitely/not/here.js")).unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(tw.workspace.editor().buffer(), before);
    }

    #[test]
    fn test_theme_command_toggles() {
        let mut tw = TestWorkspace::new();
        handle_line(&mut tw.workspace, "/theme");
        assert_eq!(tw.workspace.theme(), Theme::Light);
        assert_eq!(tw.store.entries()["theme"], "light");
    }

    #[test]
    fn test_bad_command_does_not_touch_state() {
        let mut tw = TestWorkspace::new();
        let before = tw.workspace.chat().history().len();
        assert_eq!(handle_line(&mut tw.workspace, "/nope"), Flow::Continue);
        assert_eq!(tw.workspace.chat().history().len(), before);
    }

    #[test]
    fn test_exit() {
        let mut tw = TestWorkspace::new();
        assert_eq!(handle_line(&mut tw.workspace, "/exit"), Flow::Exit);
        assert_eq!(handle_line(&mut tw.workspace, "/quit"), Flow::Exit);
    }

    #[test]
    fn test_bare_quit_is_sent_as_chat() {
        let mut tw = TestWorkspace::new();
        let before = tw.workspace.chat().history().len();
        assert_eq!(handle_line(&mut tw.workspace, "quit"), Flow::Continue);

        let history = tw.workspace.chat().history();
        assert_eq!(history.len(), before + 1);
        assert_eq!(history[before].text, "quit");
    }

    #[test]
    fn test_format_message_includes_sender_and_text() {
        colored::control::set_override(false);
        let tw = TestWorkspace::new();
        let first = &tw.workspace.chat().history()[0];
        let line = format_message(first, Theme::Dark);
        assert!(line.contains("Alex: Hey! Welcome to the coding workspace"));
    }
}
