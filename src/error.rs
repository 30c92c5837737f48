use thiserror::Error;

/// Unified error type for version calculation
#[derive(Error, Debug)]
pub enum GitVersionError {
    #[error("Repository access error: {0}")]
    RepositoryAccess(String),

    #[error("No base version found: {diagnostics}")]
    NoBaseVersionFound { diagnostics: String },

    #[error("Invalid branch configuration: {0}")]
    InvalidBranchConfiguration(String),

    #[error("Invalid format template '{template}': unknown placeholder '{{{placeholder}}}'")]
    InvalidFormatTemplate {
        template: String,
        placeholder: String,
    },

    #[error("Cyclic source branch reference: {}", chain.join(" -> "))]
    CyclicSourceBranch { chain: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in gitversion
pub type Result<T> = std::result::Result<T, GitVersionError>;

impl From<git2::Error> for GitVersionError {
    fn from(err: git2::Error) -> Self {
        GitVersionError::RepositoryAccess(err.message().to_string())
    }
}

impl GitVersionError {
    /// Create a repository access error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        GitVersionError::RepositoryAccess(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GitVersionError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        GitVersionError::Version(msg.into())
    }

    /// Create a branch configuration error with context
    pub fn branch_config(msg: impl Into<String>) -> Self {
        GitVersionError::InvalidBranchConfiguration(msg.into())
    }

    /// Create a format template error naming the template and the offending placeholder
    pub fn format_template(template: impl Into<String>, placeholder: impl Into<String>) -> Self {
        GitVersionError::InvalidFormatTemplate {
            template: template.into(),
            placeholder: placeholder.into(),
        }
    }
}
