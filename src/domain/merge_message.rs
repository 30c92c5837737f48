//! Recognise merge commit messages and extract the merged branch

use crate::error::{GitVersionError, Result};
use regex::Regex;
use std::collections::BTreeMap;

/// Built-in merge message formats, tried in order before user formats
const DEFAULT_FORMATS: &[(&str, &str)] = &[
    (
        "Default",
        r"^Merge (branch|tag) '(?<SourceBranch>[^']*)'(?: into (?<TargetBranch>[^\s]*))*",
    ),
    (
        "SmartGit",
        r"^Finish (?<SourceBranch>[^\s]*)(?: into (?<TargetBranch>[^\s]*))*",
    ),
    (
        "BitBucketPull",
        r"^Merge pull request #(?<PullRequestNumber>\d+) (from|in) (?<Source>.*) from (?<SourceBranch>[^\s]*) to (?<TargetBranch>[^\s]*)",
    ),
    (
        "GitHubPull",
        r"^Merge pull request #(?<PullRequestNumber>\d+) (from|in) (?:[^\s/]+/)?(?<SourceBranch>[^\s]*)(?: into (?<TargetBranch>[^\s]*))*",
    ),
    (
        "RemoteTracking",
        r"^Merge remote-tracking branch '(?<SourceBranch>[^\s]*)'(?: into (?<TargetBranch>[^\s]*))*",
    ),
    (
        "AzureDevOps",
        r"^Merged (PR|pull request) (?<PullRequestNumber>\d+): Merge (?<SourceBranch>[^\s]*) to (?<TargetBranch>[^\s]*)",
    ),
];

/// What a recognised merge message says about the merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeMessage {
    pub format_name: String,
    pub source_branch: String,
    pub target_branch: Option<String>,
    pub pull_request_number: Option<u64>,
}

/// Compiled set of merge message formats
#[derive(Debug, Clone)]
pub struct MergeMessageParser {
    formats: Vec<(String, Regex)>,
    remotes: Vec<String>,
}

impl MergeMessageParser {
    /// Compile the built-in formats followed by the user-supplied ones
    pub fn new(custom: &BTreeMap<String, String>) -> Result<Self> {
        let mut formats = Vec::with_capacity(DEFAULT_FORMATS.len() + custom.len());
        for (name, pattern) in DEFAULT_FORMATS {
            formats.push((name.to_string(), compile(name, pattern)?));
        }
        for (name, pattern) in custom {
            formats.push((name.clone(), compile(name, pattern)?));
        }
        Ok(MergeMessageParser {
            formats,
            remotes: vec!["origin".to_string()],
        })
    }

    /// Parse a commit message, returning None when no format recognises it
    pub fn parse(&self, message: &str) -> Option<MergeMessage> {
        let summary = message.lines().next().unwrap_or("");
        self.formats.iter().find_map(|(name, regex)| {
            let captures = regex.captures(summary)?;
            let source = captures.name("SourceBranch")?.as_str();
            if source.is_empty() {
                return None;
            }
            Some(MergeMessage {
                format_name: name.clone(),
                source_branch: crate::domain::branch::friendly_name(source, &self.remotes),
                target_branch: captures
                    .name("TargetBranch")
                    .map(|m| m.as_str().to_string())
                    .filter(|s| !s.is_empty()),
                pull_request_number: captures
                    .name("PullRequestNumber")
                    .and_then(|m| m.as_str().parse().ok()),
            })
        })
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        GitVersionError::config(format!("Invalid merge message format '{}': {}", name, e))
    })
}
