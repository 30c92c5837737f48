//! Output variables
//!
//! Flattens a [VersionResult] into the named string variables consumers read,
//! then renders the user templates from `[formats]` on top of them. A template
//! may name built-in variables and other user formats; a format naming itself
//! reads the built-in value it replaces.

use crate::config::Config;
use crate::domain::branch::escape_branch_name;
use crate::engine::VersionResult;
use crate::error::{GitVersionError, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"));

const SHORT_SHA_LEN: usize = 7;

/// Named output variables, sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct VersionVariables {
    values: BTreeMap<String, String>,
}

impl VersionVariables {
    /// Build the variable set for a calculation result
    ///
    /// # Errors
    /// * `InvalidFormatTemplate` - a user template names an unknown variable
    /// * `Config` - user templates reference each other in a cycle, or the
    ///   commit date format is not a valid strftime string
    pub fn from_result(result: &VersionResult, config: &Config) -> Result<Self> {
        let mut values = builtins(result, config)?;

        let mut formats = FormatResolver {
            builtins: &values,
            templates: &config.formats,
            rendered: BTreeMap::new(),
            in_progress: Vec::new(),
        };
        for name in config.formats.keys() {
            formats.resolve(name)?;
        }
        let rendered = formats.rendered;
        values.extend(rendered);

        Ok(VersionVariables { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Renders user formats in dependency order
struct FormatResolver<'a> {
    builtins: &'a BTreeMap<String, String>,
    templates: &'a BTreeMap<String, String>,
    rendered: BTreeMap<String, String>,
    in_progress: Vec<String>,
}

impl FormatResolver<'_> {
    fn resolve(&mut self, name: &str) -> Result<String> {
        if let Some(done) = self.rendered.get(name) {
            return Ok(done.clone());
        }
        if self.in_progress.iter().any(|pending| pending == name) {
            let mut chain = self.in_progress.clone();
            chain.push(name.to_string());
            return Err(GitVersionError::config(format!(
                "Format templates reference each other in a cycle: {}",
                chain.join(" -> ")
            )));
        }
        let templates = self.templates;
        let Some(template) = templates.get(name) else {
            return Err(GitVersionError::format_template(name, name));
        };

        self.in_progress.push(name.to_string());
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(placeholder)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let value = self.lookup(name, placeholder.as_str())?;
            out.push_str(&template[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        self.in_progress.pop();

        self.rendered.insert(name.to_string(), out.clone());
        Ok(out)
    }

    fn lookup(&mut self, format_name: &str, placeholder: &str) -> Result<String> {
        if placeholder != format_name && self.templates.contains_key(placeholder) {
            return self.resolve(placeholder);
        }
        self.builtins
            .get(placeholder)
            .cloned()
            .ok_or_else(|| GitVersionError::format_template(format_name, placeholder))
    }
}

fn builtins(result: &VersionResult, config: &Config) -> Result<BTreeMap<String, String>> {
    let version = &result.version;
    let pre = version.pre_release.as_ref();
    let commits = result.commits_since_version_source;
    let sha = result.commit.to_string();
    let escaped_branch = escape_branch_name(&result.branch.branch_name);

    let pre_release_tag = pre.map(|p| p.to_string()).unwrap_or_default();
    let semver = version.without_build_metadata().to_string();
    let full_build_metadata = format!("{}.Branch.{}.Sha.{}", commits, escaped_branch, sha);
    let weighted = match pre.and_then(|p| p.number) {
        Some(number) => number
            .checked_add(result.branch.pre_release_weight)
            .ok_or_else(|| {
                GitVersionError::version(format!(
                    "Weighted pre-release number overflows for {}",
                    version
                ))
            })?,
        None => config.tag_pre_release_weight,
    };

    let mut values = BTreeMap::new();
    let mut set = |name: &str, value: String| {
        values.insert(name.to_string(), value);
    };
    set("Major", version.major.to_string());
    set("Minor", version.minor.to_string());
    set("Patch", version.patch.to_string());
    set("MajorMinorPatch", version.major_minor_patch());
    set("PreReleaseTagWithDash", dashed(&pre_release_tag));
    set("PreReleaseTag", pre_release_tag);
    set("PreReleaseLabel", pre.map(|p| p.label.clone()).unwrap_or_default());
    set("PreReleaseLabelWithDash", pre.map(|p| p.label_with_dash()).unwrap_or_default());
    set(
        "PreReleaseNumber",
        pre.and_then(|p| p.number).map(|n| n.to_string()).unwrap_or_default(),
    );
    set("WeightedPreReleaseNumber", weighted.to_string());
    set("BuildMetaData", commits.to_string());
    set(
        "FullSemVer",
        if commits == 0 {
            semver.clone()
        } else {
            format!("{}+{}", semver, commits)
        },
    );
    set("InformationalVersion", format!("{}+{}", semver, full_build_metadata));
    set("FullBuildMetaData", full_build_metadata);
    set("SemVer", semver);
    set("BranchName", result.branch.branch_name.clone());
    set("EscapedBranchName", escaped_branch);
    set("ShortSha", sha.chars().take(SHORT_SHA_LEN).collect());
    set("Sha", sha);
    set("VersionSourceSha", result.version_source.to_string());
    set("CommitsSinceVersionSource", commits.to_string());
    set("CommitDate", commit_date(result.commit_date, &config.commit_date_format)?);
    Ok(values)
}

fn dashed(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("-{}", value)
    }
}

fn commit_date(seconds: i64, format: &str) -> Result<String> {
    let when = DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
        GitVersionError::version(format!("Commit timestamp {} is out of range", seconds))
    })?;
    let mut out = String::new();
    write!(out, "{}", when.format(format)).map_err(|_| {
        GitVersionError::config(format!("Invalid commit_date_format '{}'", format))
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::BranchClassifier;
    use crate::config::VersioningMode;
    use crate::domain::SemanticVersion;
    use git2::Oid;

    fn result(branch: &str, version: &str, commits: u64) -> VersionResult {
        let classifier = BranchClassifier::new(&Config::default()).unwrap();
        VersionResult {
            version: SemanticVersion::parse(version).unwrap(),
            branch: classifier.classify(branch),
            commit: Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap(),
            commit_date: 1_700_000_000,
            version_source: Oid::from_str("fedcba9876543210fedcba9876543210fedcba98").unwrap(),
            commits_since_version_source: commits,
            strategy: None,
            mode: VersioningMode::ContinuousDelivery,
        }
    }

    #[test]
    fn test_release_variables() {
        let vars = VersionVariables::from_result(&result("main", "1.2.3", 0), &Config::default()).unwrap();
        assert_eq!(vars.get("MajorMinorPatch"), Some("1.2.3"));
        assert_eq!(vars.get("SemVer"), Some("1.2.3"));
        assert_eq!(vars.get("FullSemVer"), Some("1.2.3"));
        assert_eq!(vars.get("PreReleaseTag"), Some(""));
        assert_eq!(vars.get("PreReleaseNumber"), Some(""));
        assert_eq!(vars.get("WeightedPreReleaseNumber"), Some("60000"));
        assert_eq!(vars.get("ShortSha"), Some("0123456"));
        assert_eq!(vars.get("CommitDate"), Some("2023-11-14"));
    }

    #[test]
    fn test_pre_release_variables() {
        let vars = VersionVariables::from_result(
            &result("feature/login", "1.3.0-login.2+4", 4),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(vars.get("PreReleaseTag"), Some("login.2"));
        assert_eq!(vars.get("PreReleaseTagWithDash"), Some("-login.2"));
        assert_eq!(vars.get("PreReleaseLabel"), Some("login"));
        assert_eq!(vars.get("PreReleaseLabelWithDash"), Some("-login"));
        assert_eq!(vars.get("PreReleaseNumber"), Some("2"));
        assert_eq!(vars.get("WeightedPreReleaseNumber"), Some("30002"));
        assert_eq!(vars.get("SemVer"), Some("1.3.0-login.2"));
        assert_eq!(vars.get("FullSemVer"), Some("1.3.0-login.2+4"));
        assert_eq!(vars.get("EscapedBranchName"), Some("feature-login"));
        assert_eq!(
            vars.get("InformationalVersion"),
            Some("1.3.0-login.2+4.Branch.feature-login.Sha.0123456789abcdef0123456789abcdef01234567")
        );
    }

    #[test]
    fn test_user_formats() {
        let mut config = Config::default();
        config
            .formats
            .insert("AssemblyVersion".to_string(), "{Major}.{Minor}.0.0".to_string());
        config.formats.insert("SemVer".to_string(), "v{MajorMinorPatch}".to_string());
        let vars = VersionVariables::from_result(&result("main", "2.5.1", 0), &config).unwrap();
        assert_eq!(vars.get("AssemblyVersion"), Some("2.5.0.0"));
        assert_eq!(vars.get("SemVer"), Some("v2.5.1"));
    }

    #[test]
    fn test_unknown_placeholder_names_the_template() {
        let mut config = Config::default();
        config.formats.insert("Nuget".to_string(), "{Bogus}".to_string());
        let err = VersionVariables::from_result(&result("main", "1.0.0", 0), &config).unwrap_err();
        match err {
            GitVersionError::InvalidFormatTemplate { template, placeholder } => {
                assert_eq!(template, "Nuget");
                assert_eq!(placeholder, "Bogus");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_any_unknown_brace_token_is_rejected() {
        for template in ["{Major}.{Pre_Release}", "{Minor2}", "{Sha:7}", "{}"] {
            let mut config = Config::default();
            config.formats.insert("Nuget".to_string(), template.to_string());
            let err = VersionVariables::from_result(&result("main", "1.0.0", 0), &config)
                .unwrap_err();
            assert!(
                matches!(err, GitVersionError::InvalidFormatTemplate { .. }),
                "{template} gave {err}"
            );
        }
    }

    #[test]
    fn test_formats_resolve_in_dependency_order() {
        let mut config = Config::default();
        config.formats.insert("Alpha".to_string(), "{Zed}-x".to_string());
        config.formats.insert("Zed".to_string(), "{Major}".to_string());
        config.formats.insert("SemVer".to_string(), "v{SemVer}".to_string());
        config.formats.insert("Tag".to_string(), "{SemVer}/{Alpha}".to_string());
        let vars = VersionVariables::from_result(&result("main", "3.1.4", 0), &config).unwrap();
        assert_eq!(vars.get("Alpha"), Some("3-x"));
        assert_eq!(vars.get("Zed"), Some("3"));
        assert_eq!(vars.get("SemVer"), Some("v3.1.4"));
        assert_eq!(vars.get("Tag"), Some("v3.1.4/3-x"));
    }

    #[test]
    fn test_format_cycle_is_rejected() {
        let mut config = Config::default();
        config.formats.insert("A".to_string(), "{B}".to_string());
        config.formats.insert("B".to_string(), "{A}".to_string());
        let err = VersionVariables::from_result(&result("main", "1.0.0", 0), &config).unwrap_err();
        assert!(matches!(err, GitVersionError::Config(_)));
        assert!(err.to_string().contains("A -> B -> A"));
    }

    #[test]
    fn test_weighted_number_overflow_is_an_error() {
        let mut vars = result("feature/login", "1.0.0-login.1", 1);
        vars.version = vars
            .version
            .core()
            .with_pre_release(crate::domain::PreRelease::new("login", Some(u64::MAX)));
        let err = VersionVariables::from_result(&vars, &Config::default()).unwrap_err();
        assert!(matches!(err, GitVersionError::Version(_)));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let vars = VersionVariables::from_result(&result("main", "1.0.0", 0), &Config::default()).unwrap();
        let json: serde_json::Value = serde_json::to_value(&vars).unwrap();
        assert_eq!(json["SemVer"], "1.0.0");
        assert_eq!(json.as_object().unwrap().len(), vars.len());
    }
}
