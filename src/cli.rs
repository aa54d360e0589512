//! Command-line interface definition for CodeChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the interactive workspace, the language list and
//! one-shot runs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CodeChat - code and chat workspace in the terminal
///
/// Edit and run snippets in a catalog of languages while chatting in the
/// same session.
#[derive(Parser, Debug, Clone)]
#[command(name = "codechat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the key-value store location
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Keep workspace state in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for CodeChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the interactive workspace
    Start,

    /// List supported languages
    Languages {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Execute a file (or the saved buffer) once and print the result
    Run {
        /// Catalog id of the language
        #[arg(short, long)]
        language: String,

        /// Source file; the language's saved buffer or default snippet when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            ephemeral: false,
            command: Commands::Start,
        }
    }
}
