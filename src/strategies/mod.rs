//! Base version strategies
//!
//! Each strategy independently scans the pinned snapshot and proposes zero or
//! more base version candidates. The set is closed: [default_strategies]
//! returns every implementation, in priority order, and all of them run for
//! every calculation. Results are merged, never short-circuited.

mod branch_name;
mod configured_next;
mod merge_message;
mod source_branch;
mod tagged_commit;

pub use branch_name::VersionInBranchNameStrategy;
pub use configured_next::ConfiguredNextVersionStrategy;
pub use merge_message::MergeMessageStrategy;
pub use source_branch::SourceBranchStrategy;
pub use tagged_commit::TaggedCommitStrategy;

use crate::classifier::BranchConfiguration;
use crate::domain::SemanticVersion;
use crate::engine::{CompiledConfig, VersionResult};
use crate::error::Result;
use crate::git::{CalculationTarget, RepositorySnapshot};
use git2::Oid;
use std::fmt;
use std::sync::Arc;

/// Which strategy proposed a candidate
///
/// Declaration order is tie-break priority, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrategyKind {
    VersionInBranchName,
    TaggedCommit,
    SourceBranch,
    MergeMessage,
    ConfiguredNextVersion,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::VersionInBranchName => "VersionInBranchName",
            StrategyKind::TaggedCommit => "TaggedCommit",
            StrategyKind::SourceBranch => "SourceBranch",
            StrategyKind::MergeMessage => "MergeMessage",
            StrategyKind::ConfiguredNextVersion => "ConfiguredNextVersion",
        };
        write!(f, "{}", name)
    }
}

/// A proposed base version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseVersionCandidate {
    /// Commit the version is considered achieved at
    pub source: Oid,
    pub version: SemanticVersion,
    /// Increment even when no commits follow the source
    pub should_increment: bool,
    pub strategy: StrategyKind,
    /// Lower ranks win among otherwise equal candidates of one strategy
    pub rank_hint: Option<u32>,
}

impl BaseVersionCandidate {
    pub fn new(
        source: Oid,
        version: SemanticVersion,
        should_increment: bool,
        strategy: StrategyKind,
    ) -> Self {
        BaseVersionCandidate {
            source,
            version,
            should_increment,
            strategy,
            rank_hint: None,
        }
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank_hint = Some(rank);
        self
    }

    /// A version named by the branch itself is the release being prepared:
    /// it is labelled but never bumped
    pub fn is_pinned(&self) -> bool {
        self.strategy == StrategyKind::VersionInBranchName && !self.should_increment
    }
}

/// Resolves the version of another branch at a given commit
///
/// Implemented by the engine so that strategies can recurse into the same
/// pipeline with cycle detection.
pub trait SourceBranchResolver {
    fn resolve(&self, target: &CalculationTarget) -> Result<Arc<VersionResult>>;
}

/// Everything a strategy may read
pub struct CalculationContext<'a> {
    pub snapshot: &'a RepositorySnapshot,
    pub rules: &'a CompiledConfig,
    pub target: &'a CalculationTarget,
    pub branch: &'a BranchConfiguration,
    pub resolver: &'a dyn SourceBranchResolver,
}

/// A branch classified under one of the source keys of some configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFork {
    pub name: String,
    /// Position of the matching key in the source branch list
    pub rank: u32,
    pub tip: Oid,
    /// Merge base of the branch tip and the target commit
    pub fork: Oid,
}

impl<'a> CalculationContext<'a> {
    /// Branches matching `config`'s source keys that share history with the target
    pub fn source_forks(&self, config: &BranchConfiguration) -> Vec<SourceFork> {
        let mut forks = Vec::new();
        for (name, tip) in self.snapshot.branches() {
            if *name == self.target.branch || *name == config.branch_name {
                continue;
            }
            let classified = self.rules.classifier.classify(name);
            let Some(rank) = config
                .source_branches
                .iter()
                .position(|key| *key == classified.key)
            else {
                continue;
            };
            let Some(fork) = self.snapshot.merge_base(*tip, self.target.commit) else {
                continue;
            };
            forks.push(SourceFork {
                name: name.clone(),
                rank: rank as u32,
                tip: *tip,
                fork,
            });
        }
        forks
    }

    /// The source fork closest to the target: most recent merge base, then key order
    pub fn nearest_source_fork(&self, config: &BranchConfiguration) -> Option<SourceFork> {
        self.source_forks(config).into_iter().max_by(|a, b| {
            self.snapshot
                .recency(a.fork)
                .cmp(&self.snapshot.recency(b.fork))
                .then_with(|| b.rank.cmp(&a.rank))
                .then_with(|| b.name.cmp(&a.name))
        })
    }
}

/// Capability every base version strategy implements
pub trait VersionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Propose candidates; an empty list is a valid answer
    fn propose(&self, ctx: &CalculationContext<'_>) -> Result<Vec<BaseVersionCandidate>>;
}

/// The fixed strategy set, highest priority first
pub fn default_strategies() -> Vec<Box<dyn VersionStrategy>> {
    vec![
        Box::new(VersionInBranchNameStrategy),
        Box::new(TaggedCommitStrategy),
        Box::new(SourceBranchStrategy),
        Box::new(MergeMessageStrategy),
        Box::new(ConfiguredNextVersionStrategy),
    ]
}

/// What one strategy contributed, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyReport {
    pub kind: StrategyKind,
    pub proposed: Vec<String>,
}

impl fmt::Display for StrategyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.proposed.is_empty() {
            write!(f, "{}: nothing", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.proposed.join(", "))
        }
    }
}

/// Run every strategy and merge their proposals
///
/// The merged list is sorted so that selection does not depend on the order
/// strategies ran in.
pub fn propose_all(
    strategies: &[Box<dyn VersionStrategy>],
    ctx: &CalculationContext<'_>,
) -> Result<(Vec<BaseVersionCandidate>, Vec<StrategyReport>)> {
    let mut candidates = Vec::new();
    let mut reports = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        let proposed = strategy.propose(ctx)?;
        tracing::debug!(
            strategy = %strategy.kind(),
            branch = %ctx.target.branch,
            count = proposed.len(),
            "strategy proposed candidates"
        );
        reports.push(StrategyReport {
            kind: strategy.kind(),
            proposed: proposed
                .iter()
                .map(|c| format!("{} at {:.7}", c.version, c.source.to_string()))
                .collect(),
        });
        candidates.extend(proposed);
    }

    candidates.sort_by(|a, b| {
        a.source
            .cmp(&b.source)
            .then_with(|| a.version.cmp(&b.version))
            .then_with(|| a.should_increment.cmp(&b.should_increment))
            .then_with(|| a.strategy.cmp(&b.strategy))
            .then_with(|| a.rank_hint.cmp(&b.rank_hint))
    });
    Ok((candidates, reports))
}

#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use crate::config::Config;
    use crate::error::GitVersionError;
    use crate::git::MockRepository;

    /// Resolver for strategies that never recurse
    pub struct NoRecursion;

    impl SourceBranchResolver for NoRecursion {
        fn resolve(&self, target: &CalculationTarget) -> Result<Arc<VersionResult>> {
            Err(GitVersionError::repository(format!(
                "unexpected recursion into {}",
                target.branch
            )))
        }
    }

    pub struct Fixture {
        pub snapshot: RepositorySnapshot,
        pub rules: CompiledConfig,
        pub target: CalculationTarget,
        pub branch: BranchConfiguration,
    }

    impl Fixture {
        pub fn new(repo: &MockRepository, config: Config) -> Self {
            let snapshot = RepositorySnapshot::capture(repo).unwrap();
            let rules = CompiledConfig::new(config).unwrap();
            let target = snapshot.resolve_target(None, None).unwrap();
            let branch = rules.classifier.classify(&target.branch);
            Fixture {
                snapshot,
                rules,
                target,
                branch,
            }
        }

        pub fn context<'a>(&'a self, resolver: &'a dyn SourceBranchResolver) -> CalculationContext<'a> {
            CalculationContext {
                snapshot: &self.snapshot,
                rules: &self.rules,
                target: &self.target,
                branch: &self.branch,
                resolver,
            }
        }

        pub fn propose(&self, strategy: &dyn VersionStrategy) -> Vec<BaseVersionCandidate> {
            strategy.propose(&self.context(&NoRecursion)).unwrap()
        }
    }
}
