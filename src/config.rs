//! Configuration management for CodeChat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CodeChatError, Result};

/// Main configuration structure for CodeChat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Editor session behavior
    #[serde(default)]
    pub editor: EditorConfig,
    /// Execution pipeline settings
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Chat session settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Key-value store settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// How saved code is keyed in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    /// One saved buffer per language (`savedCode.<id>`)
    #[default]
    PerLanguage,
    /// A single `savedCode` slot owned by the last selected language
    Global,
}

impl PersistenceMode {
    /// Parse a persistence mode from a string
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "per_language" | "per-language" => Ok(Self::PerLanguage),
            "global" => Ok(Self::Global),
            other => Err(format!("Unknown persistence mode: {}", other)),
        }
    }
}

/// Editor session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Persistence keying for saved code
    #[serde(default)]
    pub persistence: PersistenceMode,
}

/// Which execution backend runs code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Deterministic canned output
    #[default]
    Simulated,
    /// Local toolchains configured under `runners`
    Process,
}

impl BackendKind {
    /// Parse a backend kind from a string
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "simulated" => Ok(Self::Simulated),
            "process" => Ok(Self::Process),
            other => Err(format!("Unknown execution backend: {}", other)),
        }
    }
}

/// A program plus arguments; `{file}` and `{dir}` are expanded at run time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to invoke
    pub program: String,
    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// How the process backend runs one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Name of the source file written into the scratch directory
    pub file_name: String,
    /// Optional compile step run before `run`
    #[serde(default)]
    pub compile: Option<CommandSpec>,
    /// Command that executes the program
    pub run: CommandSpec,
}

fn default_runners() -> BTreeMap<String, RunnerConfig> {
    let mut runners = BTreeMap::new();
    runners.insert(
        "javascript".to_string(),
        RunnerConfig {
            file_name: "main.js".to_string(),
            compile: None,
            run: CommandSpec::new("node", &["{file}"]),
        },
    );
    runners.insert(
        "python".to_string(),
        RunnerConfig {
            file_name: "main.py".to_string(),
            compile: None,
            run: CommandSpec::new("python3", &["{file}"]),
        },
    );
    runners.insert(
        "c".to_string(),
        RunnerConfig {
            file_name: "main.c".to_string(),
            compile: Some(CommandSpec::new("cc", &["{file}", "-o", "{dir}/main"])),
            run: CommandSpec::new("{dir}/main", &[]),
        },
    );
    runners.insert(
        "cpp".to_string(),
        RunnerConfig {
            file_name: "main.cpp".to_string(),
            compile: Some(CommandSpec::new("c++", &["{file}", "-o", "{dir}/main"])),
            run: CommandSpec::new("{dir}/main", &[]),
        },
    );
    runners.insert(
        "go".to_string(),
        RunnerConfig {
            file_name: "main.go".to_string(),
            compile: None,
            run: CommandSpec::new("go", &["run", "{file}"]),
        },
    );
    runners.insert(
        "java".to_string(),
        RunnerConfig {
            file_name: "Main.java".to_string(),
            compile: None,
            run: CommandSpec::new("java", &["{file}"]),
        },
    );
    runners
}

/// Execution pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Backend that runs code
    #[serde(default)]
    pub backend: BackendKind,

    /// Latency of the simulated backend (milliseconds)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Deadline for a single run of the process backend (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Maximum bytes of program output kept in a result
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Per-language toolchains for the process backend
    #[serde(default = "default_runners")]
    pub runners: BTreeMap<String, RunnerConfig>,
}

/// Upper bound for simulated latency and reply delay (one hour)
pub const MAX_DELAY_MS: u64 = 60 * 60 * 1000;

/// Upper bound for a single process run (one day)
pub const MAX_TIMEOUT_SECONDS: u64 = 24 * 60 * 60;

fn default_latency_ms() -> u64 {
    1500
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_max_output_bytes() -> usize {
    64 * 1024
}

impl ExecutionConfig {
    /// Simulated latency as a [`Duration`]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            latency_ms: default_latency_ms(),
            timeout_seconds: default_timeout_seconds(),
            max_output_bytes: default_max_output_bytes(),
            runners: default_runners(),
        }
    }
}

/// Chat session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Sender name of outgoing messages
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Sender name of the simulated peer
    #[serde(default = "default_peer_name")]
    pub peer_name: String,

    /// Text of every simulated reply
    #[serde(default = "default_reply_text")]
    pub reply_text: String,

    /// Delay before the simulated reply (milliseconds)
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    /// Initial presence count
    #[serde(default = "default_online_count")]
    pub online_count: u32,

    /// Start the history with the welcome exchange
    #[serde(default = "default_seed_history")]
    pub seed_history: bool,
}

fn default_user_name() -> String {
    "You".to_string()
}

fn default_peer_name() -> String {
    "Alex".to_string()
}

fn default_reply_text() -> String {
    "That's a great point! Let me check the code...".to_string()
}

fn default_reply_delay_ms() -> u64 {
    1000
}

fn default_online_count() -> u32 {
    3
}

fn default_seed_history() -> bool {
    true
}

impl ChatConfig {
    /// Reply delay as a [`Duration`]
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            peer_name: default_peer_name(),
            reply_text: default_reply_text(),
            reply_delay_ms: default_reply_delay_ms(),
            online_count: default_online_count(),
            seed_history: default_seed_history(),
        }
    }
}

/// Key-value store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database location; the user data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Keep state in memory only
    #[serde(default)]
    pub ephemeral: bool,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CodeChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CodeChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(mode) = std::env::var("CODECHAT_PERSISTENCE") {
            match PersistenceMode::parse_str(&mode) {
                Ok(v) => self.editor.persistence = v,
                Err(e) => tracing::warn!("Invalid CODECHAT_PERSISTENCE: {}", e),
            }
        }

        if let Ok(backend) = std::env::var("CODECHAT_EXECUTION_BACKEND") {
            match BackendKind::parse_str(&backend) {
                Ok(v) => self.execution.backend = v,
                Err(e) => tracing::warn!("Invalid CODECHAT_EXECUTION_BACKEND: {}", e),
            }
        }

        if let Ok(latency) = std::env::var("CODECHAT_EXECUTION_LATENCY_MS") {
            if let Ok(value) = latency.parse() {
                self.execution.latency_ms = value;
            } else {
                tracing::warn!("Invalid CODECHAT_EXECUTION_LATENCY_MS: {}", latency);
            }
        }

        if let Ok(timeout) = std::env::var("CODECHAT_EXECUTION_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.execution.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CODECHAT_EXECUTION_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(delay) = std::env::var("CODECHAT_REPLY_DELAY_MS") {
            if let Ok(value) = delay.parse() {
                self.chat.reply_delay_ms = value;
            } else {
                tracing::warn!("Invalid CODECHAT_REPLY_DELAY_MS: {}", delay);
            }
        }

        if let Ok(online) = std::env::var("CODECHAT_ONLINE_COUNT") {
            if let Ok(value) = online.parse() {
                self.chat.online_count = value;
            } else {
                tracing::warn!("Invalid CODECHAT_ONLINE_COUNT: {}", online);
            }
        }

        if let Ok(name) = std::env::var("CODECHAT_USER_NAME") {
            self.chat.user_name = name;
        }

        if let Ok(name) = std::env::var("CODECHAT_PEER_NAME") {
            self.chat.peer_name = name;
        }

        if let Ok(path) = std::env::var("CODECHAT_STORAGE_PATH") {
            tracing::debug!(path = %path, "Env override: CODECHAT_STORAGE_PATH");
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(path) = &cli.storage_path {
            tracing::info!("Using storage override from CLI: {}", path.display());
            self.storage.path = Some(path.clone());
        }
        if cli.ephemeral {
            self.storage.ephemeral = true;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `CodeChatError::Config` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.execution.latency_ms == 0 {
            return Err(CodeChatError::Config(
                "execution.latency_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.execution.latency_ms > MAX_DELAY_MS {
            return Err(CodeChatError::Config(format!(
                "execution.latency_ms cannot exceed {}",
                MAX_DELAY_MS
            ))
            .into());
        }

        if self.execution.timeout_seconds == 0 {
            return Err(CodeChatError::Config(
                "execution.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.execution.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(CodeChatError::Config(format!(
                "execution.timeout_seconds cannot exceed {}",
                MAX_TIMEOUT_SECONDS
            ))
            .into());
        }

        if self.execution.max_output_bytes == 0 {
            return Err(CodeChatError::Config(
                "execution.max_output_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        for (language, runner) in &self.execution.runners {
            let compile_empty = runner
                .compile
                .as_ref()
                .is_some_and(|c| c.program.trim().is_empty());
            if runner.run.program.trim().is_empty() || compile_empty {
                return Err(CodeChatError::Config(format!(
                    "execution.runners.{} has an empty program",
                    language
                ))
                .into());
            }
            if runner.file_name.trim().is_empty() {
                return Err(CodeChatError::Config(format!(
                    "execution.runners.{}.file_name cannot be empty",
                    language
                ))
                .into());
            }
        }

        if self.chat.reply_delay_ms == 0 {
            return Err(CodeChatError::Config(
                "chat.reply_delay_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.chat.reply_delay_ms > MAX_DELAY_MS {
            return Err(CodeChatError::Config(format!(
                "chat.reply_delay_ms cannot exceed {}",
                MAX_DELAY_MS
            ))
            .into());
        }

        if self.chat.user_name.trim().is_empty() || self.chat.peer_name.trim().is_empty() {
            return Err(
                CodeChatError::Config("chat sender names cannot be empty".to_string()).into(),
            );
        }

        if self.chat.reply_text.trim().is_empty() {
            return Err(
                CodeChatError::Config("chat.reply_text cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}
