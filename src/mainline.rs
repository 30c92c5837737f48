//! Mainline replay
//!
//! In mainline mode every increment along the primary branch counts. The
//! first-parent history of the mainline is replayed oldest first from the
//! configured floor: merges of classified branches apply that branch's
//! increment once, plain commits apply their own marker, and version tags
//! re-anchor the running version. Targets off the mainline then get one
//! local increment and a pre-release label.

use crate::classifier::BranchConfiguration;
use crate::domain::{BuildMetadata, Commit, PreRelease, SemanticVersion, VersionField};
use crate::error::Result;
use crate::increment::effective_increment;
use crate::strategies::CalculationContext;
use git2::Oid;

/// Result of a replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainlineReplay {
    pub version: SemanticVersion,
    /// Last commit that anchored or changed the running version
    pub version_source: Oid,
    pub commits_since_version_source: u64,
}

struct Running {
    version: SemanticVersion,
    source: Oid,
}

/// Replay the mainline up to the target
pub fn calculate(ctx: &CalculationContext<'_>) -> Result<MainlineReplay> {
    let target = ctx.target.commit;
    let tip = mainline_tip(ctx);
    let chain = mainline_chain(ctx, tip, target);
    let fork = chain.last().map(|c| c.id).unwrap_or(target);
    let mainline_field = mainline_increment(ctx, tip);

    let mut running = Running {
        version: ctx.rules.next_version.clone(),
        source: chain.first().map(|c| c.id).unwrap_or(target),
    };

    for (index, commit) in chain.iter().enumerate() {
        if let Some(tagged) = ctx.snapshot.version_tag_on(commit.id, &ctx.rules.tag_prefix) {
            let tagged = tagged.without_build_metadata();
            if tagged >= running.version {
                tracing::trace!(commit = %commit.id, version = %tagged, "mainline anchored by tag");
                running = Running {
                    version: tagged,
                    source: commit.id,
                };
                continue;
            }
        }
        // The floor stands for the root commit itself
        if index == 0 {
            continue;
        }

        let field = if commit.is_merge() {
            merge_increment(ctx, commit, mainline_field)
        } else {
            ctx.rules.markers.detect_commit(commit)
        };
        if let Some(field) = field.filter(|f| *f != VersionField::None) {
            running.version = running.version.core().increment(field)?;
            running.source = commit.id;
            tracing::trace!(commit = %commit.id, %field, version = %running.version, "mainline increment");
        }
    }

    if fork == target {
        if running.source == target {
            if let Some(released) = released_at(ctx, target) {
                return Ok(released);
            }
        }
        return Ok(finish(ctx, running, target, None));
    }

    // Target is not on the mainline: one local increment plus a label
    if let Some(released) = released_at(ctx, target) {
        return Ok(released);
    }

    let local = ctx.snapshot.commits_between(Some(fork), target);
    let field = ctx
        .rules
        .markers
        .strongest(local.iter().copied())
        .unwrap_or_else(|| effective_increment(ctx, ctx.branch));
    running.version = running.version.core().increment(field)?;
    let number = (local.len() as u64).max(1);
    Ok(finish(ctx, running, target, Some(number)))
}

/// A version tag sitting exactly on the target is returned as released
fn released_at(ctx: &CalculationContext<'_>, target: Oid) -> Option<MainlineReplay> {
    let released = ctx.snapshot.version_tag_on(target, &ctx.rules.tag_prefix)?;
    Some(MainlineReplay {
        version: released.without_build_metadata(),
        version_source: target,
        commits_since_version_source: 0,
    })
}

fn finish(
    ctx: &CalculationContext<'_>,
    running: Running,
    target: Oid,
    label_number: Option<u64>,
) -> MainlineReplay {
    let count = if running.source == target {
        0
    } else {
        ctx.snapshot.commits_between(Some(running.source), target).len() as u64
    };

    let mut version = running.version;
    if let (Some(number), Some(label)) = (label_number, label_of(ctx.branch)) {
        version = version.core().with_pre_release(PreRelease::new(label, Some(number)));
    }

    MainlineReplay {
        version: version.with_build_metadata(BuildMetadata::with_commits(count)),
        version_source: running.source,
        commits_since_version_source: count,
    }
}

fn label_of(branch: &BranchConfiguration) -> Option<String> {
    branch.label.clone().filter(|_| !branch.is_mainline)
}

/// Tip of the mainline the target belongs to
///
/// A mainline target is its own tip. Otherwise the mainline-classified branch
/// the target forked from most recently is used, and the target itself when
/// there is none.
fn mainline_tip(ctx: &CalculationContext<'_>) -> Oid {
    let target = ctx.target.commit;
    if ctx.branch.is_mainline {
        return target;
    }
    ctx.snapshot
        .branches()
        .iter()
        .filter(|(name, _)| **name != ctx.target.branch)
        .filter(|(name, _)| ctx.rules.classifier.classify(name).is_mainline)
        .filter_map(|(_, tip)| ctx.snapshot.merge_base(*tip, target).map(|base| (*tip, base)))
        .max_by_key(|(tip, base)| (ctx.snapshot.recency(*base), *tip))
        .map(|(tip, _)| tip)
        .unwrap_or(target)
}

/// First-parent chain of the mainline, oldest first, cut at the newest commit
/// the target contains
fn mainline_chain<'s>(ctx: &CalculationContext<'s>, tip: Oid, target: Oid) -> Vec<&'s Commit> {
    let snapshot = ctx.snapshot;
    let mut chain: Vec<&Commit> = snapshot
        .ancestors(tip, true)
        .skip_while(|c| !snapshot.is_ancestor(c.id, target))
        .collect();
    chain.reverse();
    chain
}

fn mainline_increment(ctx: &CalculationContext<'_>, tip: Oid) -> VersionField {
    if ctx.branch.is_mainline {
        return ctx.branch.increment.as_field().unwrap_or(VersionField::Patch);
    }
    ctx.snapshot
        .branches()
        .iter()
        .find(|(_, oid)| **oid == tip)
        .map(|(name, _)| ctx.rules.classifier.classify(name))
        .and_then(|branch| branch.increment.as_field())
        .unwrap_or(VersionField::Patch)
}

/// Increment contributed by a merge commit on the mainline
///
/// A merged branch with an explicit rule contributes its configured increment,
/// raised by any marker in the merged commits. Anything else contributes only
/// its markers.
fn merge_increment(
    ctx: &CalculationContext<'_>,
    merge: &Commit,
    mainline_field: VersionField,
) -> Option<VersionField> {
    let merged = ctx
        .snapshot
        .commits_between(merge.first_parent(), merge.id);
    let marker = ctx.rules.markers.strongest(merged.iter().copied());

    let branch = merged_branch_name(ctx, merge).map(|name| ctx.rules.classifier.classify(&name));
    match branch {
        Some(branch) if !branch.is_catch_all() && !branch.is_mainline => {
            let configured = branch.increment.as_field().unwrap_or(mainline_field);
            tracing::trace!(merge = %merge.id, branch = %branch.branch_name, %configured, "mainline merge");
            Some(marker.map_or(configured, |m| m.max(configured)))
        }
        _ => marker,
    }
}

fn merged_branch_name(ctx: &CalculationContext<'_>, merge: &Commit) -> Option<String> {
    if let Some(parsed) = ctx.rules.merge_messages.parse(&merge.message) {
        return Some(parsed.source_branch);
    }
    let theirs = merge.parents.get(1)?;
    ctx.snapshot
        .branches()
        .iter()
        .find(|(_, tip)| *tip == theirs)
        .map(|(name, _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, VersioningMode};
    use crate::git::MockRepository;
    use crate::strategies::fixture::{Fixture, NoRecursion};

    fn mainline() -> Config {
        Config {
            mode: VersioningMode::Mainline,
            ..Config::default()
        }
    }

    fn replay(repo: &MockRepository) -> MainlineReplay {
        let fixture = Fixture::new(repo, mainline());
        calculate(&fixture.context(&NoRecursion)).unwrap()
    }

    #[test]
    fn test_every_merge_counts() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.tag("v1.0.0").unwrap();
        for name in ["feature/a", "feature/b"] {
            repo.branch(name);
            repo.commit("work");
            repo.checkout("main").unwrap();
            repo.merge(name, &format!("Merge branch '{}'", name)).unwrap();
        }
        let replayed = replay(&repo);
        assert_eq!(replayed.version.to_string(), "1.0.2+0");
        assert_eq!(replayed.commits_since_version_source, 0);
    }

    #[test]
    fn test_plain_commits_only_count_with_markers() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.tag("v1.0.0").unwrap();
        repo.commit("docs");
        repo.commit("api +semver: minor");
        repo.commit("typo");
        let replayed = replay(&repo);
        assert_eq!(replayed.version.to_string(), "1.1.0+1");
    }

    #[test]
    fn test_merge_markers_raise_branch_increment() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.tag("v1.0.0").unwrap();
        repo.branch("hotfix/crash");
        repo.commit("rework +semver: major");
        repo.checkout("main").unwrap();
        repo.merge("hotfix/crash", "Merge branch 'hotfix/crash'").unwrap();
        assert_eq!(replay(&repo).version.to_string(), "2.0.0+0");
    }

    #[test]
    fn test_tag_reanchors_replay() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.commit("feature +semver: minor");
        repo.commit("release");
        repo.tag("v3.0.0").unwrap();
        repo.commit("fix +semver: patch");
        let replayed = replay(&repo);
        assert_eq!(replayed.version.to_string(), "3.0.1+0");
    }

    #[test]
    fn test_tagged_tip_is_returned_as_released() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.tag("v1.0.0").unwrap();
        repo.commit("api +semver: minor");
        repo.tag("v1.1.0").unwrap();
        let replayed = replay(&repo);
        assert_eq!(replayed.version.to_string(), "1.1.0");
        assert_eq!(replayed.commits_since_version_source, 0);
    }

    #[test]
    fn test_floor_without_tags() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.commit("more");
        assert_eq!(replay(&repo).version.to_string(), "0.1.0+1");
    }

    #[test]
    fn test_unmerged_branch_gets_local_increment_and_label() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.tag("v1.0.0").unwrap();
        repo.commit("fix +semver: patch");
        repo.branch("feature/b");
        repo.commit("one");
        repo.commit("two");
        let replayed = replay(&repo);
        assert_eq!(replayed.version.to_string(), "1.0.2-b.2+2");
    }

    #[test]
    fn test_released_branch_commit_is_not_labelled() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.tag("v1.0.0").unwrap();
        repo.branch("release/1.1.0");
        repo.commit("stabilise");
        repo.tag("v1.1.0").unwrap();
        assert_eq!(replay(&repo).version.to_string(), "1.1.0");
    }
}
