//! Increment calculation
//!
//! Turns the selected base version into the final version for the target:
//! walks the commits after the base, decides the increment from commit
//! markers or the branch configuration, applies it, then attaches the branch
//! label and the commit count.

use crate::classifier::BranchConfiguration;
use crate::config::VersioningMode;
use crate::domain::{BuildMetadata, PreRelease, SemanticVersion, VersionField};
use crate::error::Result;
use crate::strategies::{BaseVersionCandidate, CalculationContext};

/// How far `Inherit` follows source branches before settling on Patch
const MAX_INHERIT_DEPTH: usize = 8;

/// The version reached from a base version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementOutcome {
    pub version: SemanticVersion,
    pub commits_since_version_source: u64,
    /// The increment that was applied, None when the base was returned unchanged
    pub field: Option<VersionField>,
}

/// Apply the increment for `candidate` up to the target commit
pub fn apply(
    ctx: &CalculationContext<'_>,
    candidate: &BaseVersionCandidate,
) -> Result<IncrementOutcome> {
    let target = ctx.target.commit;

    if !candidate.should_increment && candidate.source == target && !candidate.is_pinned() {
        return Ok(IncrementOutcome {
            version: candidate.version.clone(),
            commits_since_version_source: 0,
            field: None,
        });
    }

    let path = ctx.snapshot.commits_between(Some(candidate.source), target);
    let count = path.len() as u64;

    let field = if candidate.is_pinned() {
        VersionField::None
    } else {
        match ctx.rules.markers.strongest(path.iter().copied()) {
            Some(marker) => marker,
            None if !path.is_empty() => effective_increment(ctx, ctx.branch),
            None if candidate.should_increment && !ctx.branch.prevent_increment_without_commits => {
                effective_increment(ctx, ctx.branch)
            }
            None => VersionField::None,
        }
    };

    let bumped = candidate.version.increment(field)?;
    let labelled = attach_label(bumped, ctx.branch, count);
    tracing::debug!(
        base = %candidate.version,
        %field,
        commits = count,
        version = %labelled,
        "applied increment"
    );

    Ok(IncrementOutcome {
        version: labelled.with_build_metadata(BuildMetadata::with_commits(count)),
        commits_since_version_source: count,
        field: Some(field),
    })
}

/// The concrete increment of a branch, resolving `Inherit` through its source branches
///
/// The branch forked from most recently decides; the lookup is bounded and
/// settles on Patch when nothing concrete is found.
pub fn effective_increment(ctx: &CalculationContext<'_>, branch: &BranchConfiguration) -> VersionField {
    let mut current = branch.clone();
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Some(field) = current.increment.as_field() {
            return field;
        }
        match ctx.nearest_source_fork(&current) {
            Some(fork) => {
                tracing::trace!(from = %current.branch_name, to = %fork.name, "inheriting increment");
                current = ctx.rules.classifier.classify(&fork.name);
            }
            None => break,
        }
    }
    VersionField::Patch
}

/// Attach the branch's pre-release label
///
/// Mainline branches and branches without a label keep the version as is.
/// A version already carrying the same label keeps its (already advanced)
/// number; otherwise the label starts at 1, or at the commit count in
/// continuous deployment mode.
pub fn attach_label(version: SemanticVersion, branch: &BranchConfiguration, commits: u64) -> SemanticVersion {
    let Some(label) = branch.label.as_ref().filter(|_| !branch.is_mainline) else {
        return version;
    };

    if let Some(pre) = &version.pre_release {
        if pre.label == *label && pre.number.is_some() {
            return version;
        }
    }

    let number = match branch.mode {
        VersioningMode::ContinuousDeployment => commits.max(1),
        _ => 1,
    };
    version
        .core()
        .with_pre_release(PreRelease::new(label.clone(), Some(number)))
}
