use crate::domain::{IncrementStrategy, SemanticVersion, TagPrefix};
use crate::error::{GitVersionError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// File name looked up in the working directory, the repository root and the user config dir
pub const CONFIG_FILE_NAME: &str = "gitversion.toml";

/// Key of the always-matching catch-all branch rule
pub const UNKNOWN_BRANCH_KEY: &str = "unknown";

/// Represents the complete configuration for version calculation.
///
/// Every component receives this value explicitly; nothing reads configuration globally.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub mode: VersioningMode,

    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    #[serde(default = "default_next_version")]
    pub next_version: String,

    #[serde(default)]
    pub commit_message_incrementing: CommitMessageIncrementing,

    #[serde(default = "default_major_version_bump_message")]
    pub major_version_bump_message: String,

    #[serde(default = "default_minor_version_bump_message")]
    pub minor_version_bump_message: String,

    #[serde(default = "default_patch_version_bump_message")]
    pub patch_version_bump_message: String,

    #[serde(default = "default_no_bump_message")]
    pub no_bump_message: String,

    #[serde(default = "default_version_in_branch_pattern")]
    pub version_in_branch_pattern: String,

    #[serde(default = "default_tag_pre_release_weight")]
    pub tag_pre_release_weight: u64,

    #[serde(default = "default_commit_date_format")]
    pub commit_date_format: String,

    /// Extra merge message recognisers, name -> regex with a `SourceBranch` group
    #[serde(default)]
    pub merge_message_formats: BTreeMap<String, String>,

    /// User output variable templates, name -> template with `{Placeholder}`s
    #[serde(default)]
    pub formats: BTreeMap<String, String>,

    #[serde(default)]
    pub branches: BTreeMap<String, BranchRuleConfig>,
}

/// How versions evolve along a branch
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VersioningMode {
    #[default]
    ContinuousDelivery,
    ContinuousDeployment,
    Mainline,
}

/// Which commits may carry increment markers
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CommitMessageIncrementing {
    #[default]
    Enabled,
    Disabled,
    MergeMessageOnly,
}

/// One branch rule as written in configuration.
///
/// Every field is optional so that a user file can override single fields of a
/// built-in rule; the classifier resolves the merged rule into a complete one.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct BranchRuleConfig {
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub increment: Option<IncrementStrategy>,
    /// Pre-release label template; may use `{BranchName}` or any named capture group
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub source_branches: Option<Vec<String>>,
    #[serde(default)]
    pub is_release_branch: Option<bool>,
    #[serde(default)]
    pub is_mainline: Option<bool>,
    #[serde(default)]
    pub tracks_release_branches: Option<bool>,
    #[serde(default)]
    pub prevent_increment_without_commits: Option<bool>,
    #[serde(default)]
    pub pre_release_weight: Option<u64>,
    #[serde(default)]
    pub mode: Option<VersioningMode>,
}

impl BranchRuleConfig {
    /// Field-wise merge: values set on `self` win over `base`
    pub fn merge_over(&self, base: &BranchRuleConfig) -> BranchRuleConfig {
        BranchRuleConfig {
            regex: self.regex.clone().or_else(|| base.regex.clone()),
            priority: self.priority.or(base.priority),
            increment: self.increment.or(base.increment),
            label: self.label.clone().or_else(|| base.label.clone()),
            source_branches: self
                .source_branches
                .clone()
                .or_else(|| base.source_branches.clone()),
            is_release_branch: self.is_release_branch.or(base.is_release_branch),
            is_mainline: self.is_mainline.or(base.is_mainline),
            tracks_release_branches: self
                .tracks_release_branches
                .or(base.tracks_release_branches),
            prevent_increment_without_commits: self
                .prevent_increment_without_commits
                .or(base.prevent_increment_without_commits),
            pre_release_weight: self.pre_release_weight.or(base.pre_release_weight),
            mode: self.mode.or(base.mode),
        }
    }
}

fn default_tag_prefix() -> String {
    "[vV]?".to_string()
}

fn default_next_version() -> String {
    "0.1.0".to_string()
}

fn default_major_version_bump_message() -> String {
    r"\+semver:\s?(breaking|major)".to_string()
}

fn default_minor_version_bump_message() -> String {
    r"\+semver:\s?(feature|minor)".to_string()
}

fn default_patch_version_bump_message() -> String {
    r"\+semver:\s?(fix|patch)".to_string()
}

fn default_no_bump_message() -> String {
    r"\+semver:\s?(none|skip)".to_string()
}

fn default_version_in_branch_pattern() -> String {
    r"(?<version>[vV]?\d+\.\d+(\.\d+)?)".to_string()
}

fn default_tag_pre_release_weight() -> u64 {
    60000
}

fn default_commit_date_format() -> String {
    "%Y-%m-%d".to_string()
}

#[allow(clippy::too_many_arguments)]
fn rule(
    regex: &str,
    priority: Option<i32>,
    increment: IncrementStrategy,
    label: &str,
    source_branches: &[&str],
    is_release_branch: bool,
    is_mainline: bool,
    tracks_release_branches: bool,
    prevent_increment_without_commits: bool,
    pre_release_weight: u64,
) -> BranchRuleConfig {
    BranchRuleConfig {
        regex: Some(regex.to_string()),
        priority,
        increment: Some(increment),
        label: Some(label.to_string()),
        source_branches: Some(source_branches.iter().map(|s| s.to_string()).collect()),
        is_release_branch: Some(is_release_branch),
        is_mainline: Some(is_mainline),
        tracks_release_branches: Some(tracks_release_branches),
        prevent_increment_without_commits: Some(prevent_increment_without_commits),
        pre_release_weight: Some(pre_release_weight),
        mode: None,
    }
}

/// Returns the built-in branch rules.
pub fn default_branches() -> BTreeMap<String, BranchRuleConfig> {
    let mut branches = BTreeMap::new();
    branches.insert(
        "main".to_string(),
        rule(
            "^master$|^main$",
            Some(100),
            IncrementStrategy::Patch,
            "",
            &[],
            false,
            true,
            false,
            true,
            55000,
        ),
    );
    branches.insert(
        "develop".to_string(),
        rule(
            "^dev(elop)?(ment)?$",
            Some(90),
            IncrementStrategy::Minor,
            "alpha",
            &["main"],
            false,
            false,
            true,
            false,
            0,
        ),
    );
    branches.insert(
        "release".to_string(),
        rule(
            "^releases?[/-](?<BranchName>.+)",
            Some(80),
            IncrementStrategy::Minor,
            "beta",
            &["develop", "main", "support"],
            true,
            false,
            false,
            true,
            30000,
        ),
    );
    branches.insert(
        "hotfix".to_string(),
        rule(
            "^hotfix(es)?[/-](?<BranchName>.+)",
            Some(70),
            IncrementStrategy::Patch,
            "beta",
            &["main", "support"],
            false,
            false,
            false,
            false,
            30000,
        ),
    );
    branches.insert(
        "support".to_string(),
        rule(
            "^support[/-](?<BranchName>.+)",
            Some(60),
            IncrementStrategy::Patch,
            "",
            &["main"],
            false,
            true,
            false,
            true,
            55000,
        ),
    );
    branches.insert(
        "pull-request".to_string(),
        rule(
            r"^(pull|pull\-requests|pr)[/-](?<Number>\d*)",
            Some(50),
            IncrementStrategy::Inherit,
            "PullRequest{Number}",
            &["develop", "main", "release", "feature", "support", "hotfix"],
            false,
            false,
            false,
            false,
            30000,
        ),
    );
    branches.insert(
        "feature".to_string(),
        rule(
            "^features?[/-](?<BranchName>.+)",
            Some(40),
            IncrementStrategy::Inherit,
            "{BranchName}",
            &["develop", "main", "release", "hotfix", "support"],
            false,
            false,
            false,
            false,
            30000,
        ),
    );
    branches.insert(
        UNKNOWN_BRANCH_KEY.to_string(),
        rule(
            "(?<BranchName>.+)",
            None,
            IncrementStrategy::Inherit,
            "{BranchName}",
            &["main", "develop", "release", "feature", "pull-request", "hotfix", "support"],
            false,
            false,
            false,
            false,
            30000,
        ),
    );
    branches
}

/// Merge user rules over the built-in ones, keyed by rule name
pub fn merge_branch_rules(
    defaults: BTreeMap<String, BranchRuleConfig>,
    overrides: BTreeMap<String, BranchRuleConfig>,
) -> BTreeMap<String, BranchRuleConfig> {
    let mut merged = defaults;
    for (key, rule) in overrides {
        let combined = match merged.get(&key) {
            Some(base) => rule.merge_over(base),
            None => rule,
        };
        merged.insert(key, combined);
    }
    merged
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: VersioningMode::default(),
            tag_prefix: default_tag_prefix(),
            next_version: default_next_version(),
            commit_message_incrementing: CommitMessageIncrementing::default(),
            major_version_bump_message: default_major_version_bump_message(),
            minor_version_bump_message: default_minor_version_bump_message(),
            patch_version_bump_message: default_patch_version_bump_message(),
            no_bump_message: default_no_bump_message(),
            version_in_branch_pattern: default_version_in_branch_pattern(),
            tag_pre_release_weight: default_tag_pre_release_weight(),
            commit_date_format: default_commit_date_format(),
            merge_message_formats: BTreeMap::new(),
            formats: BTreeMap::new(),
            branches: default_branches(),
        }
    }
}

impl Config {
    /// Parse a TOML document and merge its branch rules over the built-in rules
    pub fn from_toml_str(s: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(s)
            .map_err(|e| GitVersionError::config(format!("Cannot parse configuration: {}", e)))?;
        config.branches = merge_branch_rules(default_branches(), config.branches);
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| GitVersionError::config(format!("Cannot render configuration: {}", e)))
    }

    /// Stable fingerprint of the effective configuration, used in cache keys
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = self.to_toml_string()?;
        Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
    }

    /// The configured floor version
    pub fn next_version(&self) -> Result<SemanticVersion> {
        TagPrefix::new(default_tag_prefix())?
            .parse_version(&self.next_version)
            .map(|v| v.without_build_metadata())
            .ok_or_else(|| {
                GitVersionError::config(format!("Invalid next_version '{}'", self.next_version))
            })
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitversion.toml` in current directory
/// 3. `gitversion.toml` in the repository root
/// 4. `gitversion.toml` in the user config directory
/// 5. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>, repo_root: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_path {
        return read_config_file(path);
    }

    let mut candidates = vec![Path::new(".").join(CONFIG_FILE_NAME)];
    if let Some(root) = repo_root {
        candidates.push(root.join(CONFIG_FILE_NAME));
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join(CONFIG_FILE_NAME));
    }

    for candidate in candidates {
        if candidate.exists() {
            return read_config_file(&candidate);
        }
    }

    tracing::debug!("no configuration file found, using defaults");
    Ok(Config::default())
}

fn read_config_file(path: &Path) -> Result<Config> {
    tracing::debug!(path = %path.display(), "loading configuration");
    let content = fs::read_to_string(path).map_err(|e| {
        GitVersionError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    Config::from_toml_str(&content)
}
