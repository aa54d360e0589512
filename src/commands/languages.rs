//! Language catalog listing

use prettytable::{cell, row, Table};

use crate::catalog::LanguageCatalog;
use crate::error::{CodeChatError, Result};

/// Print the catalog as a table, or as JSON when `json` is set
///
/// # Errors
///
/// Returns `CodeChatError::Serialization` if JSON output fails
pub fn list_languages(catalog: &LanguageCatalog, json: bool) -> Result<()> {
    tracing::debug!("languages::list_languages json: {}", json);

    if json {
        println!("{}", languages_json(catalog)?);
    } else {
        println!("\nSupported languages:\n");
        languages_table(catalog).printstd();
        println!();
    }
    Ok(())
}

/// Pretty JSON array of the catalog entries
pub fn languages_json(catalog: &LanguageCatalog) -> Result<String> {
    Ok(serde_json::to_string_pretty(catalog.list()).map_err(CodeChatError::Serialization)?)
}

fn languages_table(catalog: &LanguageCatalog) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Id", "Name", "Default Code"]);

    for lang in catalog.list() {
        let first_line = lang.default_code.lines().next().unwrap_or_default();
        let preview = if lang.default_code.contains('\n') {
            format!("{} ...", first_line)
        } else {
            first_line.to_string()
        };
        table.add_row(row![lang.id, lang.display_name, preview]);
    }
    table
}
