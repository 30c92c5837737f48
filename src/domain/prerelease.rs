//! Pre-release qualifiers for semantic versions
//!
//! A pre-release is a textual label plus an optional number, e.g. `beta.3` or
//! `login.1`. Versions carrying a pre-release order below the equivalent release.

use crate::error::{GitVersionError, Result};
use std::fmt;
use std::str::FromStr;

/// Pre-release label with optional number
///
/// # Examples
/// - "alpha" -> PreRelease { label: "alpha", number: None }
/// - "beta.1" -> PreRelease { label: "beta", number: Some(1) }
/// - "rc.1.2" -> PreRelease { label: "rc.1", number: Some(2) }
///
/// Ordering compares the label first, then the number (`beta` < `beta.1` < `beta.2`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreRelease {
    pub label: String,
    pub number: Option<u64>,
}

impl PreRelease {
    /// Create a new pre-release
    pub fn new(label: impl Into<String>, number: Option<u64>) -> Self {
        PreRelease {
            label: label.into(),
            number,
        }
    }

    /// Parse a pre-release from its dotted form
    ///
    /// A trailing purely numeric identifier becomes the number, everything before it the label.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(GitVersionError::version("Empty pre-release identifier"));
        }

        semver::Prerelease::new(s).map_err(|e| {
            GitVersionError::version(format!("Invalid pre-release identifier '{}': {}", s, e))
        })?;

        let (label, last) = match s.rsplit_once('.') {
            Some((head, tail)) => (head, tail),
            None => ("", s),
        };

        // Numbers too large for u64 stay part of the label
        match last.parse::<u64>() {
            Ok(number) if is_numeric_identifier(last) => Ok(PreRelease::new(label, Some(number))),
            _ => Ok(PreRelease::new(s, None)),
        }
    }

    /// Increment the number
    ///
    /// If number is None, returns Some(1). Otherwise increments by 1.
    pub fn increment_number(&self) -> Result<Self> {
        let number = match self.number {
            None => 1,
            Some(n) => n.checked_add(1).ok_or_else(|| {
                GitVersionError::version(format!("Pre-release number overflow in '{}'", self))
            })?,
        };
        Ok(PreRelease {
            label: self.label.clone(),
            number: Some(number),
        })
    }

    /// Label with a leading dash, or empty when there is no label
    pub fn label_with_dash(&self) -> String {
        if self.label.is_empty() {
            String::new()
        } else {
            format!("-{}", self.label)
        }
    }
}

/// Numeric identifiers in semver carry no leading zeros
pub(crate) fn is_numeric_identifier(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'))
}

impl FromStr for PreRelease {
    type Err = GitVersionError;

    fn from_str(s: &str) -> Result<Self> {
        PreRelease::parse(s)
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.label.is_empty(), self.number) {
            (true, Some(n)) => write!(f, "{}", n),
            (true, None) => Ok(()),
            (false, Some(n)) => write!(f, "{}.{}", self.label, n),
            (false, None) => write!(f, "{}", self.label),
        }
    }
}
