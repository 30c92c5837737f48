use crate::domain::version::SemanticVersion;
use crate::error::{GitVersionError, Result};
use git2::Oid;
use regex::Regex;

/// Represents a git tag resolved to the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub target: Oid,
    /// Message of an annotated tag, None for lightweight tags
    pub annotation: Option<String>,
}

impl Tag {
    /// Create a lightweight tag
    pub fn new(name: impl Into<String>, target: Oid) -> Self {
        Tag {
            name: name.into(),
            target,
            annotation: None,
        }
    }

    /// Create an annotated tag
    pub fn annotated(name: impl Into<String>, target: Oid, message: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            target,
            annotation: Some(message.into()),
        }
    }

    /// Parse the version this tag carries, if it is a version tag
    pub fn version(&self, prefix: &TagPrefix) -> Option<SemanticVersion> {
        prefix.parse_version(&self.name)
    }
}

/// Tag prefix pattern stripped before parsing a tag as a version (e.g. `[vV]?`)
#[derive(Debug, Clone)]
pub struct TagPrefix {
    pub pattern: String,
    regex: Regex,
}

impl TagPrefix {
    /// Compile a tag prefix pattern, anchored at the start of the tag name
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
            GitVersionError::config(format!("Invalid tag prefix '{}': {}", pattern, e))
        })?;
        Ok(TagPrefix { pattern, regex })
    }

    /// Strip the prefix from `name` and parse the remainder as a version
    pub fn parse_version(&self, name: &str) -> Option<SemanticVersion> {
        SemanticVersion::parse_tag(name, &self.regex)
    }
}
