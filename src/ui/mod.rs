//! User interface module - output selection and terminal formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Choosing and emitting the requested output

pub mod formatter;

pub use formatter::{display_error, format_dotenv, format_json, format_table};

use crate::error::{GitVersionError, Result};
use crate::variables::VersionVariables;
use clap::ValueEnum;

/// How the variable set is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Dotenv,
    Table,
}

/// Render the variables in the chosen format
pub fn render(variables: &VersionVariables, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => format_json(variables).map(|json| json + "\n"),
        OutputFormat::Dotenv => Ok(format_dotenv(variables)),
        OutputFormat::Table => Ok(format_table(variables)),
    }
}

/// Value of a single variable
///
/// # Errors
/// Names the variable when it does not exist.
pub fn render_variable(variables: &VersionVariables, name: &str) -> Result<String> {
    variables
        .get(name)
        .map(|value| format!("{}\n", value))
        .ok_or_else(|| GitVersionError::config(format!("Unknown variable '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_variable() {
        let vars = VersionVariables::default();
        let err = render_variable(&vars, "Nope").unwrap_err();
        assert!(err.to_string().contains("Unknown variable 'Nope'"));
    }

    #[test]
    fn test_empty_set_renders() {
        let vars = VersionVariables::default();
        assert_eq!(render(&vars, OutputFormat::Json).unwrap(), "{}\n");
        assert_eq!(render(&vars, OutputFormat::Dotenv).unwrap(), "");
    }
}
