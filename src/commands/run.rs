//! One-shot execution
//!
//! Runs a file, or the language's saved buffer, through the configured
//! backend and prints the result without opening the workspace.

use std::path::Path;

use chrono::Utc;
use colored::Colorize;

use crate::catalog::LanguageCatalog;
use crate::commands::{build_backend, open_store};
use crate::config::Config;
use crate::editor::saved_buffer;
use crate::error::{CodeChatError, Result};
use crate::execution::{ExecutionRequest, ExecutionResult};

/// Resolve the source to run
///
/// Reads `file` when given; otherwise the saved buffer for `language_id`,
/// falling back to its default snippet.
///
/// # Errors
///
/// Returns `CodeChatError::UnknownLanguage` for a language outside the
/// catalog and `CodeChatError::Io` if the file cannot be read.
pub fn resolve_source(config: &Config, language_id: &str, file: Option<&Path>) -> Result<String> {
    let catalog = LanguageCatalog::builtin();
    let language = catalog.lookup(language_id)?;

    if let Some(path) = file {
        tracing::debug!("Reading source from {}", path.display());
        return Ok(std::fs::read_to_string(path).map_err(CodeChatError::Io)?);
    }

    let store = open_store(&config.storage)?;
    Ok(
        saved_buffer(store.as_ref(), config.editor.persistence, language.id)
            .unwrap_or_else(|| language.default_code.to_string()),
    )
}

/// Execute once and print the result
///
/// # Errors
///
/// Returns an error if the source cannot be resolved or JSON output fails.
/// Failed runs are reported in the returned result, not as errors.
pub async fn run_once(
    config: &Config,
    language_id: &str,
    file: Option<&Path>,
    json: bool,
) -> Result<ExecutionResult> {
    let code = resolve_source(config, language_id, file)?;
    let backend = build_backend(config);
    tracing::info!(language = language_id, backend = backend.name(), "Running once");

    let request = ExecutionRequest::new(language_id, code, Utc::now());
    let result = backend.execute(&request).await;

    if json {
        let out = serde_json::to_string_pretty(&result).map_err(CodeChatError::Serialization)?;
        println!("{}", out);
    } else {
        print_result(&result);
    }
    Ok(result)
}

/// Render a result for the terminal
pub fn print_result(result: &ExecutionResult) {
    let header = format!("[{}] {}", result.language_id, result.status);
    if result.status.is_success() {
        println!("{}", header.green().bold());
    } else {
        println!("{}", header.red().bold());
    }
    println!("{}\n", result.output_text);
}
