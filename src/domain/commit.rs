use crate::config::{CommitMessageIncrementing, Config};
use crate::domain::version::VersionField;
use crate::error::{GitVersionError, Result};
use git2::Oid;
use regex::Regex;

/// A commit as read from the repository snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: Oid,
    /// Parent ids, first parent first; empty for a root commit
    pub parents: Vec<Oid>,
    /// Author timestamp in seconds since the epoch
    pub when: i64,
    pub message: String,
}

impl Commit {
    pub fn new(id: Oid, parents: Vec<Oid>, when: i64, message: impl Into<String>) -> Self {
        Commit {
            id,
            parents,
            when,
            message: message.into(),
        }
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn first_parent(&self) -> Option<Oid> {
        self.parents.first().copied()
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Recognises explicit increment directives such as `+semver: minor` in commit messages
#[derive(Debug, Clone)]
pub struct IncrementMarkers {
    major: Regex,
    minor: Regex,
    patch: Regex,
    none: Regex,
    mode: CommitMessageIncrementing,
}

impl IncrementMarkers {
    /// Compile the marker patterns from configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(IncrementMarkers {
            major: compile_marker("major_version_bump_message", &config.major_version_bump_message)?,
            minor: compile_marker("minor_version_bump_message", &config.minor_version_bump_message)?,
            patch: compile_marker("patch_version_bump_message", &config.patch_version_bump_message)?,
            none: compile_marker("no_bump_message", &config.no_bump_message)?,
            mode: config.commit_message_incrementing,
        })
    }

    /// Find the marker in a single message
    ///
    /// Markers are checked strongest first, so a message containing both a
    /// major and a patch directive yields Major.
    pub fn detect(&self, message: &str) -> Option<VersionField> {
        if self.major.is_match(message) {
            Some(VersionField::Major)
        } else if self.minor.is_match(message) {
            Some(VersionField::Minor)
        } else if self.patch.is_match(message) {
            Some(VersionField::Patch)
        } else if self.none.is_match(message) {
            Some(VersionField::None)
        } else {
            None
        }
    }

    /// Marker on a commit, honouring the commit-message-incrementing switch
    pub fn detect_commit(&self, commit: &Commit) -> Option<VersionField> {
        match self.mode {
            CommitMessageIncrementing::Disabled => None,
            CommitMessageIncrementing::MergeMessageOnly if !commit.is_merge() => None,
            _ => self.detect(&commit.message),
        }
    }

    /// Strongest marker found on any of the commits
    ///
    /// An explicit `none` directive counts as found, so the result
    /// distinguishes "author asked for no bump" from "no directive at all".
    pub fn strongest<'a, I>(&self, commits: I) -> Option<VersionField>
    where
        I: IntoIterator<Item = &'a Commit>,
    {
        commits
            .into_iter()
            .filter_map(|commit| {
                let marker = self.detect_commit(commit);
                if let Some(field) = marker {
                    tracing::trace!(commit = %commit.id, %field, "increment marker");
                }
                marker
            })
            .max()
    }
}

fn compile_marker(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| GitVersionError::config(format!("Invalid {} '{}': {}", name, pattern, e)))
}
