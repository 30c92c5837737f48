use crate::domain::version::SemanticVersion;
use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new("[vV]?").expect("version prefix pattern is valid"));

/// Strip ref namespaces from a branch reference
///
/// `refs/heads/main` -> `main`, `refs/remotes/origin/feature/x` -> `feature/x`,
/// `origin/develop` -> `develop` when `origin` is a known remote.
pub fn friendly_name(reference: &str, remotes: &[String]) -> String {
    if let Some(rest) = reference.strip_prefix("refs/heads/") {
        return rest.to_string();
    }
    let without_namespace = reference
        .strip_prefix("refs/remotes/")
        .unwrap_or(reference);
    for remote in remotes {
        if let Some(rest) = without_namespace.strip_prefix(&format!("{}/", remote)) {
            return rest.to_string();
        }
    }
    without_namespace.to_string()
}

/// Replace every character outside `[0-9A-Za-z-]` with `-`
pub fn escape_branch_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Extract a version carried in a branch name such as `release/1.2.0`
///
/// The name is split on `/` and each segment (last first) is tried, as is the
/// remainder after each `-` inside it. The pattern must match at the start of
/// the candidate and expose a `version` capture group.
pub fn version_from_branch_name(name: &str, pattern: &Regex) -> Option<SemanticVersion> {
    for segment in name.rsplit('/') {
        let mut candidates = vec![segment];
        candidates.extend(
            segment
                .match_indices('-')
                .map(|(i, _)| &segment[i + 1..])
                .filter(|rest| !rest.is_empty()),
        );

        for candidate in candidates {
            let Some(captures) = pattern.captures(candidate) else {
                continue;
            };
            let Some(version) = captures.name("version") else {
                continue;
            };
            if captures.get(0).map(|m| m.start()) != Some(0) {
                continue;
            }
            if let Some(parsed) = SemanticVersion::parse_tag(version.as_str(), &VERSION_PREFIX) {
                return Some(parsed.core());
            }
        }
    }
    None
}
