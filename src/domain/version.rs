use crate::domain::prerelease::{is_numeric_identifier, PreRelease};
use crate::error::{GitVersionError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Build metadata attached to a calculated version
///
/// The leading numeric identifier is the commit count since the version source,
/// anything after it is kept verbatim. Never participates in precedence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BuildMetadata {
    pub commits_since_version_source: Option<u64>,
    pub other: Option<String>,
}

impl BuildMetadata {
    /// Metadata carrying only a commit count
    pub fn with_commits(count: u64) -> Self {
        BuildMetadata {
            commits_since_version_source: Some(count),
            other: None,
        }
    }

    /// Parse the dotted identifiers after `+`
    pub fn parse(s: &str) -> Result<Self> {
        semver::BuildMetadata::new(s).map_err(|e| {
            GitVersionError::version(format!("Invalid build metadata '{}': {}", s, e))
        })?;
        if s.is_empty() {
            return Err(GitVersionError::version("Empty build metadata"));
        }

        let (first, rest) = match s.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (s, None),
        };

        if is_numeric_identifier(first) {
            if let Ok(count) = first.parse::<u64>() {
                return Ok(BuildMetadata {
                    commits_since_version_source: Some(count),
                    other: rest.map(str::to_string),
                });
            }
        }

        Ok(BuildMetadata {
            commits_since_version_source: None,
            other: Some(s.to_string()),
        })
    }
}

impl fmt::Display for BuildMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.commits_since_version_source, &self.other) {
            (Some(n), Some(other)) => write!(f, "{}.{}", n, other),
            (Some(n), None) => write!(f, "{}", n),
            (None, Some(other)) => write!(f, "{}", other),
            (None, None) => Ok(()),
        }
    }
}

/// Semantic version representation
///
/// Ordering follows semver precedence: the numeric triple, then a release
/// before any of its pre-releases is *greater*, then the pre-release itself.
/// Build metadata only breaks ties so that `Ord` stays consistent with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre_release: Option<PreRelease>,
    pub build_metadata: Option<BuildMetadata>,
}

impl SemanticVersion {
    /// Create a new release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
            pre_release: None,
            build_metadata: None,
        }
    }

    /// Builder-style pre-release setter
    pub fn with_pre_release(mut self, pre_release: PreRelease) -> Self {
        self.pre_release = Some(pre_release);
        self
    }

    /// Builder-style build metadata setter
    pub fn with_build_metadata(mut self, build_metadata: BuildMetadata) -> Self {
        self.build_metadata = Some(build_metadata);
        self
    }

    /// Parse a strict `major.minor.patch[-pre][+build]` string
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = semver::Version::parse(s).map_err(|e| {
            GitVersionError::version(format!("Invalid version format '{}': {}", s, e))
        })?;
        Self::from_semver(&parsed)
    }

    /// Parse a version out of a tag name after stripping `prefix`
    ///
    /// Accepts the loose forms `1` and `1.2`, which are padded with zeros.
    /// Returns None if the tag does not carry a version.
    pub fn parse_tag(tag: &str, prefix: &Regex) -> Option<Self> {
        let rest = match prefix.find(tag) {
            Some(m) if m.start() == 0 => &tag[m.end()..],
            _ => return None,
        };

        if let Ok(version) = Self::parse(rest) {
            return Some(version);
        }

        let captures = LOOSE_VERSION.captures(rest)?;
        let component = |i: usize| -> Option<u64> {
            match captures.get(i) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        let mut version = SemanticVersion::new(component(1)?, component(2)?, component(3)?);
        if let Some(pre) = captures.get(4) {
            version.pre_release = Some(PreRelease::parse(pre.as_str()).ok()?);
        }
        if let Some(build) = captures.get(5) {
            version.build_metadata = Some(BuildMetadata::parse(build.as_str()).ok()?);
        }
        Some(version)
    }

    fn from_semver(v: &semver::Version) -> Result<Self> {
        let pre_release = if v.pre.is_empty() {
            None
        } else {
            Some(PreRelease::parse(v.pre.as_str())?)
        };
        let build_metadata = if v.build.is_empty() {
            None
        } else {
            Some(BuildMetadata::parse(v.build.as_str())?)
        };
        Ok(SemanticVersion {
            major: v.major,
            minor: v.minor,
            patch: v.patch,
            pre_release,
            build_metadata,
        })
    }

    /// The `major.minor.patch` triple as a release version
    pub fn core(&self) -> Self {
        SemanticVersion::new(self.major, self.minor, self.patch)
    }

    /// Same version without build metadata
    pub fn without_build_metadata(&self) -> Self {
        SemanticVersion {
            build_metadata: None,
            ..self.clone()
        }
    }

    pub fn is_pre_release(&self) -> bool {
        self.pre_release.is_some()
    }

    /// `major.minor.patch`
    pub fn major_minor_patch(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// Apply an increment
    ///
    /// A numbered pre-release only advances its number; otherwise the field is
    /// bumped and every lower field reset to zero. Build metadata is dropped.
    /// Fails when the bumped component does not fit in a `u64`.
    pub fn increment(&self, field: VersionField) -> Result<Self> {
        if field == VersionField::None {
            return Ok(self.without_build_metadata());
        }

        if let Some(pre) = &self.pre_release {
            if pre.number.is_some() {
                return Ok(SemanticVersion {
                    pre_release: Some(pre.increment_number()?),
                    build_metadata: None,
                    ..self.core()
                });
            }
        }

        let bump = |component: u64| {
            component.checked_add(1).ok_or_else(|| {
                GitVersionError::version(format!("Cannot apply {} increment to {}", field, self))
            })
        };
        Ok(match field {
            VersionField::Major => SemanticVersion::new(bump(self.major)?, 0, 0),
            VersionField::Minor => SemanticVersion::new(self.major, bump(self.minor)?, 0),
            VersionField::Patch => SemanticVersion::new(self.major, self.minor, bump(self.patch)?),
            VersionField::None => self.without_build_metadata(),
        })
    }

    /// Precedence comparison ignoring build metadata
    pub fn precedence_cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

static LOOSE_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-([0-9A-Za-z][0-9A-Za-z.-]*))?(?:\+([0-9A-Za-z][0-9A-Za-z.-]*))?$",
    )
    .expect("loose version regex is valid")
});

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_cmp(other)
            .then_with(|| self.build_metadata.cmp(&other.build_metadata))
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for SemanticVersion {
    type Err = GitVersionError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre_release {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build_metadata {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

/// The version component an increment touches, ordered by strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionField {
    None,
    Patch,
    Minor,
    Major,
}

impl fmt::Display for VersionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionField::None => "none",
            VersionField::Patch => "patch",
            VersionField::Minor => "minor",
            VersionField::Major => "major",
        };
        write!(f, "{}", name)
    }
}

/// Increment mode configured on a branch rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncrementStrategy {
    None,
    Patch,
    Minor,
    Major,
    /// Take the increment of the branch this one was forked from
    Inherit,
}

impl IncrementStrategy {
    /// The concrete field, or None for `Inherit`
    pub fn as_field(&self) -> Option<VersionField> {
        match self {
            IncrementStrategy::None => Some(VersionField::None),
            IncrementStrategy::Patch => Some(VersionField::Patch),
            IncrementStrategy::Minor => Some(VersionField::Minor),
            IncrementStrategy::Major => Some(VersionField::Major),
            IncrementStrategy::Inherit => None,
        }
    }
}
