//! Branch classification against the configured rule set
//!
//! Rules are compiled once, ordered by descending priority, and the first
//! regex match wins. The `unknown` rule is never part of the ordered list; it
//! is the fallback every name resolves to when nothing else matches.

use crate::config::{BranchRuleConfig, Config, VersioningMode, UNKNOWN_BRANCH_KEY};
use crate::domain::branch::escape_branch_name;
use crate::domain::IncrementStrategy;
use crate::error::{GitVersionError, Result};
use regex::{Captures, Regex};
use std::collections::BTreeMap;

/// Placeholder in label templates replaced by the branch display name
const BRANCH_NAME_PLACEHOLDER: &str = "BranchName";

/// Fully resolved settings for one branch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchConfiguration {
    /// Key of the rule that matched, e.g. `feature`
    pub key: String,
    pub branch_name: String,
    pub pattern: String,
    /// None for the catch-all rule, which ranks below every explicit rule
    pub priority: Option<i32>,
    pub increment: IncrementStrategy,
    pub label_template: String,
    /// Label with placeholders substituted; None when the branch carries no label
    pub label: Option<String>,
    pub source_branches: Vec<String>,
    pub is_release_branch: bool,
    pub is_mainline: bool,
    pub tracks_release_branches: bool,
    pub prevent_increment_without_commits: bool,
    pub pre_release_weight: u64,
    pub mode: VersioningMode,
}

impl BranchConfiguration {
    pub fn is_catch_all(&self) -> bool {
        self.key == UNKNOWN_BRANCH_KEY
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    key: String,
    regex: Regex,
    priority: Option<i32>,
    increment: IncrementStrategy,
    label: String,
    source_branches: Vec<String>,
    is_release_branch: bool,
    is_mainline: bool,
    tracks_release_branches: bool,
    prevent_increment_without_commits: bool,
    pre_release_weight: u64,
    mode: VersioningMode,
}

impl CompiledRule {
    fn compile(key: &str, rule: &BranchRuleConfig, global_mode: VersioningMode) -> Result<Self> {
        let pattern = rule.regex.as_deref().ok_or_else(|| {
            GitVersionError::branch_config(format!("Branch rule '{}' has no regex", key))
        })?;
        let regex = Regex::new(pattern).map_err(|e| {
            GitVersionError::branch_config(format!(
                "Branch rule '{}' has an invalid regex '{}': {}",
                key, pattern, e
            ))
        })?;

        Ok(CompiledRule {
            key: key.to_string(),
            regex,
            priority: rule.priority,
            increment: rule.increment.unwrap_or(IncrementStrategy::Inherit),
            label: rule.label.clone().unwrap_or_default(),
            source_branches: rule.source_branches.clone().unwrap_or_default(),
            is_release_branch: rule.is_release_branch.unwrap_or(false),
            is_mainline: rule.is_mainline.unwrap_or(false),
            tracks_release_branches: rule.tracks_release_branches.unwrap_or(false),
            prevent_increment_without_commits: rule
                .prevent_increment_without_commits
                .unwrap_or(false),
            pre_release_weight: rule.pre_release_weight.unwrap_or(0),
            mode: rule.mode.unwrap_or(global_mode),
        })
    }

    fn resolve(&self, branch_name: &str, captures: Option<&Captures<'_>>) -> BranchConfiguration {
        BranchConfiguration {
            key: self.key.clone(),
            branch_name: branch_name.to_string(),
            pattern: self.regex.as_str().to_string(),
            priority: self.priority,
            increment: self.increment,
            label_template: self.label.clone(),
            label: render_label(&self.label, branch_name, captures),
            source_branches: self.source_branches.clone(),
            is_release_branch: self.is_release_branch,
            is_mainline: self.is_mainline,
            tracks_release_branches: self.tracks_release_branches,
            prevent_increment_without_commits: self.prevent_increment_without_commits,
            pre_release_weight: self.pre_release_weight,
            mode: self.mode,
        }
    }
}

/// Compiled, priority-ordered branch rules
#[derive(Debug, Clone)]
pub struct BranchClassifier {
    rules: Vec<CompiledRule>,
    fallback: CompiledRule,
}

impl BranchClassifier {
    /// Compile every rule eagerly
    ///
    /// # Errors
    /// * `InvalidBranchConfiguration` - a regex does not compile, an explicit
    ///   rule has no regex or priority, two rules share a priority, or a rule
    ///   names a source branch key that does not exist
    pub fn new(config: &Config) -> Result<Self> {
        let mut rules = Vec::new();
        let mut priorities: BTreeMap<i32, &str> = BTreeMap::new();

        for (key, rule) in &config.branches {
            if key == UNKNOWN_BRANCH_KEY {
                continue;
            }
            let compiled = CompiledRule::compile(key, rule, config.mode)?;
            let priority = compiled.priority.ok_or_else(|| {
                GitVersionError::branch_config(format!("Branch rule '{}' has no priority", key))
            })?;
            if let Some(other) = priorities.insert(priority, key) {
                return Err(GitVersionError::branch_config(format!(
                    "Branch rules '{}' and '{}' share priority {}",
                    other, key, priority
                )));
            }
            rules.push(compiled);
        }

        let fallback_rule = match config.branches.get(UNKNOWN_BRANCH_KEY) {
            Some(rule) => rule.clone(),
            None => {
                let mut rule = crate::config::default_branches()
                    .remove(UNKNOWN_BRANCH_KEY)
                    .unwrap_or_default();
                if let Some(sources) = rule.source_branches.as_mut() {
                    sources.retain(|key| config.branches.contains_key(key));
                }
                rule
            }
        };
        let fallback_rule = BranchRuleConfig {
            regex: fallback_rule.regex.or_else(|| Some(".*".to_string())),
            priority: None,
            ..fallback_rule
        };
        let fallback = CompiledRule::compile(UNKNOWN_BRANCH_KEY, &fallback_rule, config.mode)?;

        for rule in rules.iter().chain(std::iter::once(&fallback)) {
            for source in &rule.source_branches {
                if !config.branches.contains_key(source) {
                    return Err(GitVersionError::branch_config(format!(
                        "Branch rule '{}' names unknown source branch '{}'",
                        rule.key, source
                    )));
                }
            }
        }

        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        tracing::debug!(
            rules = ?rules.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
            "compiled branch rules"
        );
        Ok(BranchClassifier { rules, fallback })
    }

    /// Resolve the configuration for a branch name
    ///
    /// Always returns exactly one configuration; the result depends only on
    /// the name and the rule set.
    pub fn classify(&self, branch_name: &str) -> BranchConfiguration {
        for rule in &self.rules {
            if let Some(captures) = rule.regex.captures(branch_name) {
                return rule.resolve(branch_name, Some(&captures));
            }
        }
        let captures = self.fallback.regex.captures(branch_name);
        self.fallback.resolve(branch_name, captures.as_ref())
    }

    /// Rule keys in match order, catch-all last
    pub fn keys(&self) -> Vec<&str> {
        self.rules
            .iter()
            .chain(std::iter::once(&self.fallback))
            .map(|r| r.key.as_str())
            .collect()
    }
}

/// Substitute `{Name}` placeholders in a label template
///
/// `{BranchName}` falls back to the whole branch name when the rule has no
/// such capture group. Substituted values are escaped to `[0-9A-Za-z-]`.
fn render_label(template: &str, branch_name: &str, captures: Option<&Captures<'_>>) -> Option<String> {
    let mut label = String::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        label.push_str(&rest[..open]);
        let name = &rest[open + 1..close];
        let value = captures
            .and_then(|c| c.name(name))
            .map(|m| m.as_str())
            .or_else(|| (name == BRANCH_NAME_PLACEHOLDER).then_some(branch_name))
            .unwrap_or("");
        label.push_str(&escape_branch_name(value));
        rest = &rest[close + 1..];
    }
    label.push_str(rest);

    let label = label.trim_matches('-').to_string();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}
