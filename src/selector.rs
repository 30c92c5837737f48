//! Candidate selection
//!
//! Deduplicates the merged proposals, discards candidates whose source commit
//! is not an ancestor of the target, and picks the most recent one. Ties on
//! recency fall to strategy priority, then rank hint, then the higher version.

use crate::error::{GitVersionError, Result};
use crate::git::RepositorySnapshot;
use crate::strategies::{BaseVersionCandidate, StrategyReport};
use git2::Oid;
use std::cmp::{Ordering, Reverse};

/// Collapse candidates with identical (source, version, should_increment)
///
/// Expects the input sorted as [crate::strategies::propose_all] leaves it, so
/// the first duplicate kept carries the highest-priority strategy.
pub fn dedup(mut candidates: Vec<BaseVersionCandidate>) -> Vec<BaseVersionCandidate> {
    candidates.sort_by(|a, b| {
        a.source
            .cmp(&b.source)
            .then_with(|| a.version.cmp(&b.version))
            .then_with(|| a.should_increment.cmp(&b.should_increment))
            .then_with(|| a.strategy.cmp(&b.strategy))
            .then_with(|| a.rank_hint.cmp(&b.rank_hint))
    });
    candidates.dedup_by(|later, kept| {
        later.source == kept.source
            && later.version == kept.version
            && later.should_increment == kept.should_increment
    });
    candidates
}

/// Pick the winning base version for `target`
///
/// # Errors
/// * `NoBaseVersionFound` - nothing reachable was proposed; the diagnostics
///   list what every strategy returned
pub fn select(
    snapshot: &RepositorySnapshot,
    target: Oid,
    candidates: Vec<BaseVersionCandidate>,
    reports: &[StrategyReport],
) -> Result<BaseVersionCandidate> {
    let proposed = candidates.len();
    let reachable: Vec<BaseVersionCandidate> = dedup(candidates)
        .into_iter()
        .filter(|c| {
            let keep = snapshot.is_ancestor(c.source, target);
            if !keep {
                tracing::debug!(source = %c.source, version = %c.version, "discarding unreachable candidate");
            }
            keep
        })
        .collect();

    let winner = reachable
        .into_iter()
        .max_by(|a, b| compare(snapshot, a, b))
        .ok_or_else(|| {
            let mut diagnostics: Vec<String> = reports.iter().map(|r| r.to_string()).collect();
            diagnostics.push(format!("{} proposed, none reachable from {}", proposed, target));
            GitVersionError::NoBaseVersionFound {
                diagnostics: diagnostics.join("; "),
            }
        })?;

    tracing::debug!(
        strategy = %winner.strategy,
        version = %winner.version,
        source = %winner.source,
        should_increment = winner.should_increment,
        "selected base version"
    );
    Ok(winner)
}

/// Greater means preferred
fn compare(snapshot: &RepositorySnapshot, a: &BaseVersionCandidate, b: &BaseVersionCandidate) -> Ordering {
    let rank = |c: &BaseVersionCandidate| Reverse(c.rank_hint.unwrap_or(u32::MAX));
    snapshot
        .recency(a.source)
        .cmp(&snapshot.recency(b.source))
        .then_with(|| b.strategy.cmp(&a.strategy))
        .then_with(|| rank(a).cmp(&rank(b)))
        .then_with(|| a.version.cmp(&b.version))
        .then_with(|| a.should_increment.cmp(&b.should_increment))
        .then_with(|| b.source.cmp(&a.source))
}
