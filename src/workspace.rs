//! Workspace composition
//!
//! [`Workspace`] owns the editor and chat sessions plus the theme flag.
//! Front ends translate user input into [`Intent`]s and feed deferred
//! [`WorkspaceEvent`]s back through [`Workspace::handle_event`]; both return
//! an optional [`Notice`] to show the user. No error is fatal.

use std::fmt;
use std::sync::Arc;

use crate::catalog::LanguageCatalog;
use crate::chat::ChatSession;
use crate::config::Config;
use crate::editor::EditorSession;
use crate::error::{error_kind, Result};
use crate::event::WorkspaceEvent;
use crate::execution::{ExecutionPipeline, ExecutionStatus};
use crate::scheduler::Scheduler;
use crate::storage::{KeyValueStore, THEME_KEY};

/// Colour scheme of the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Dark background (default)
    #[default]
    Dark,
    /// Light background
    Light,
}

impl Theme {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    /// Parse the stored representation
    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user action forwarded by a front end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Switch the editor language
    SelectLanguage(String),
    /// Replace the editor buffer
    EditBuffer(String),
    /// Restore the default snippet
    Reset,
    /// Execute the buffer
    Run,
    /// Flip between dark and light
    ToggleTheme,
    /// Post a chat message
    SendMessage(String),
}

/// Severity of a [`Notice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Confirmation of something that happened
    Info,
    /// Something failed
    Error,
}

/// Short user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Headline
    pub title: String,
    /// One line of detail
    pub description: String,
}

impl Notice {
    /// Informational notice
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Error notice
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    /// Error notice for any workspace error
    pub fn from_error(err: &anyhow::Error) -> Self {
        match error_kind(err) {
            Some(kind) => Self::error(kind.title(), kind.to_string()),
            None => Self::error("Error", format!("{:#}", err)),
        }
    }
}

/// Editor, chat and theme behind a single intent-driven facade
pub struct Workspace {
    catalog: Arc<LanguageCatalog>,
    store: Arc<dyn KeyValueStore>,
    editor: EditorSession,
    chat: ChatSession,
    theme: Theme,
}

impl Workspace {
    /// Open a workspace over the given store, scheduler and pipeline
    ///
    /// Restores the theme and editor state from `store`.
    pub fn open(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        scheduler: Arc<dyn Scheduler>,
        pipeline: Arc<dyn ExecutionPipeline>,
    ) -> Self {
        let catalog = Arc::new(LanguageCatalog::builtin());

        let theme = match store.get(THEME_KEY) {
            Ok(Some(value)) => Theme::parse_str(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Unrecognised stored theme, using default");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::error!("Failed to read theme: {:#}", e);
                Theme::default()
            }
        };

        let editor = EditorSession::open(
            Arc::clone(&catalog),
            Arc::clone(&store),
            pipeline,
            Arc::clone(&scheduler),
            config.editor.persistence,
        );
        let chat = ChatSession::new(&config.chat, scheduler);

        tracing::info!(theme = %theme, persistence = ?config.editor.persistence, "Workspace opened");

        Self {
            catalog,
            store,
            editor,
            chat,
            theme,
        }
    }

    /// Apply one user intent
    ///
    /// Returns a notice when the intent has something to report, including
    /// every error.
    pub fn apply(&mut self, intent: Intent) -> Option<Notice> {
        tracing::debug!(?intent, "Applying intent");
        match self.try_apply(intent) {
            Ok(notice) => notice,
            Err(e) => {
                tracing::info!("Intent rejected: {:#}", e);
                Some(Notice::from_error(&e))
            }
        }
    }

    fn try_apply(&mut self, intent: Intent) -> Result<Option<Notice>> {
        match intent {
            Intent::SelectLanguage(id) => {
                self.editor.select_language(&id)?;
                Ok(None)
            }
            Intent::EditBuffer(text) => {
                self.editor.edit_buffer(text);
                Ok(None)
            }
            Intent::Reset => {
                self.editor.reset();
                Ok(Some(Notice::info(
                    "Code Reset",
                    "Editor has been reset to default code.",
                )))
            }
            Intent::Run => {
                self.editor.run()?;
                Ok(None)
            }
            Intent::ToggleTheme => {
                self.toggle_theme();
                Ok(None)
            }
            Intent::SendMessage(text) => {
                self.chat.send(&text)?;
                Ok(None)
            }
        }
    }

    /// Apply a deferred event
    pub fn handle_event(&mut self, event: WorkspaceEvent) -> Option<Notice> {
        match event {
            WorkspaceEvent::ExecutionCompleted { handle, result } => {
                let status = result.status;
                let output = result.output_text.clone();
                if !self.editor.complete_run(handle, result) {
                    return None;
                }
                Some(match status {
                    ExecutionStatus::Success => {
                        Notice::info("Execution Complete", "Your code ran successfully!")
                    }
                    ExecutionStatus::Timeout => Notice::error("Execution Timed Out", output),
                    ExecutionStatus::Failure(_) => Notice::error(
                        "Execution Failed",
                        output.lines().next().unwrap_or_default().to_string(),
                    ),
                })
            }
            WorkspaceEvent::PeerReply { in_reply_to } => {
                self.chat.deliver_reply(in_reply_to);
                None
            }
            WorkspaceEvent::PresenceChanged { online } => {
                self.chat.update_presence(online);
                None
            }
        }
    }

    /// Current theme
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip the theme and persist it
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(e) = self.store.set(THEME_KEY, self.theme.as_str()) {
            tracing::error!("Failed to persist theme: {:#}", e);
        }
        tracing::info!(theme = %self.theme, "Theme toggled");
        self.theme
    }

    /// Cancel outstanding work before the process exits
    pub fn shutdown(&mut self) {
        self.editor.shutdown();
        tracing::info!("Workspace shut down");
    }

    /// The language catalog
    pub fn catalog(&self) -> &LanguageCatalog {
        &self.catalog
    }

    /// The editor session
    pub fn editor(&self) -> &EditorSession {
        &self.editor
    }

    /// The chat session
    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }
}
