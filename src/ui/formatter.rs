//! Pure formatting functions for UI output.
//!
//! Rendering of the variable set is side-effect free and returns strings.
//! `display_error` prints failures with `console` styling.

use crate::error::{GitVersionError, Result};
use crate::variables::VersionVariables;
use console::style;

/// Prefix of every dotenv variable name
pub const DOTENV_PREFIX: &str = "GitVersion_";

/// Format and print an error message in red on stderr.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Pretty-printed JSON object of all variables
pub fn format_json(variables: &VersionVariables) -> Result<String> {
    serde_json::to_string_pretty(variables)
        .map_err(|e| GitVersionError::version(format!("Cannot serialize variables: {}", e)))
}

/// One `GitVersion_<Name>=<value>` line per variable
pub fn format_dotenv(variables: &VersionVariables) -> String {
    variables
        .iter()
        .map(|(name, value)| format!("{}{}={}\n", DOTENV_PREFIX, name, dotenv_value(value)))
        .collect()
}

fn dotenv_value(value: &str) -> String {
    if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '#' || c == '"') {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Aligned two-column table, names bold
pub fn format_table(variables: &VersionVariables) -> String {
    let width = variables.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in variables.iter() {
        out.push_str(&format!(
            "{}  {}\n",
            style(format!("{:<width$}", name, width = width)).bold(),
            style(value).green()
        ));
    }
    out
}
