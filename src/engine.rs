//! Version calculation engine
//!
//! Wires the pipeline together: classify the branch, then either replay the
//! mainline or run strategies, select a base version and increment it. Every
//! result is memoized in the [ComputationCache] keyed by commit, branch and
//! configuration fingerprint.

use crate::cache::{CacheKey, ComputationCache};
use crate::classifier::{BranchClassifier, BranchConfiguration};
use crate::config::{Config, VersioningMode};
use crate::domain::{IncrementMarkers, MergeMessageParser, SemanticVersion, TagPrefix};
use crate::error::{GitVersionError, Result};
use crate::git::{CalculationTarget, RepositorySnapshot};
use crate::strategies::{
    default_strategies, propose_all, CalculationContext, SourceBranchResolver, StrategyKind,
    VersionStrategy,
};
use crate::{increment, mainline, selector};
use git2::Oid;
use regex::Regex;
use std::sync::Arc;

/// How deep source branch resolution may recurse
pub const MAX_SOURCE_DEPTH: usize = 16;

/// Configuration with every pattern compiled, built once per engine
#[derive(Debug)]
pub struct CompiledConfig {
    pub config: Config,
    pub classifier: BranchClassifier,
    pub markers: IncrementMarkers,
    pub merge_messages: MergeMessageParser,
    pub tag_prefix: TagPrefix,
    pub version_in_branch: Regex,
    pub next_version: SemanticVersion,
    pub fingerprint: String,
}

impl CompiledConfig {
    /// Compile and validate a configuration
    ///
    /// All configuration errors surface here, before any calculation runs.
    pub fn new(config: Config) -> Result<Self> {
        let classifier = BranchClassifier::new(&config)?;
        let markers = IncrementMarkers::new(&config)?;
        let merge_messages = MergeMessageParser::new(&config.merge_message_formats)?;
        let tag_prefix = TagPrefix::new(config.tag_prefix.clone())?;
        let version_in_branch = Regex::new(&config.version_in_branch_pattern).map_err(|e| {
            GitVersionError::config(format!(
                "Invalid version_in_branch_pattern '{}': {}",
                config.version_in_branch_pattern, e
            ))
        })?;
        let next_version = config.next_version()?;
        let fingerprint = config.fingerprint()?;

        Ok(CompiledConfig {
            config,
            classifier,
            markers,
            merge_messages,
            tag_prefix,
            version_in_branch,
            next_version,
            fingerprint,
        })
    }
}

/// Outcome of one calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionResult {
    /// Final version including pre-release and build metadata
    pub version: SemanticVersion,
    pub branch: BranchConfiguration,
    pub commit: Oid,
    /// Author time of the target commit, seconds since the epoch
    pub commit_date: i64,
    pub version_source: Oid,
    pub commits_since_version_source: u64,
    /// Strategy of the selected base version, None in mainline mode
    pub strategy: Option<StrategyKind>,
    pub mode: VersioningMode,
}

/// Computes versions against one pinned snapshot and one configuration
pub struct VersionEngine {
    snapshot: RepositorySnapshot,
    rules: CompiledConfig,
    strategies: Vec<Box<dyn VersionStrategy>>,
    cache: ComputationCache,
}

impl VersionEngine {
    /// Build an engine, validating the configuration eagerly
    pub fn new(snapshot: RepositorySnapshot, config: Config) -> Result<Self> {
        Ok(VersionEngine {
            snapshot,
            rules: CompiledConfig::new(config)?,
            strategies: default_strategies(),
            cache: ComputationCache::new(),
        })
    }

    pub fn snapshot(&self) -> &RepositorySnapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &Config {
        &self.rules.config
    }

    pub fn rules(&self) -> &CompiledConfig {
        &self.rules
    }

    pub fn cache(&self) -> &ComputationCache {
        &self.cache
    }

    /// Calculate the version for a branch at a commit
    pub fn calculate(&self, target: &CalculationTarget) -> Result<Arc<VersionResult>> {
        let result = self.calculate_in_chain(target, &[])?;
        tracing::info!(
            branch = %target.branch,
            commit = %target.commit,
            version = %result.version,
            "calculated version"
        );
        Ok(result)
    }

    /// Calculate the version for wherever HEAD points
    pub fn calculate_head(&self) -> Result<Arc<VersionResult>> {
        let target = self.snapshot.resolve_target(None, None)?;
        self.calculate(&target)
    }

    fn calculate_in_chain(&self, target: &CalculationTarget, chain: &[String]) -> Result<Arc<VersionResult>> {
        if chain.contains(&target.branch) || chain.len() >= MAX_SOURCE_DEPTH {
            let mut cycle = chain.to_vec();
            cycle.push(target.branch.clone());
            return Err(GitVersionError::CyclicSourceBranch { chain: cycle });
        }

        let key = CacheKey {
            commit: target.commit,
            branch: target.branch.clone(),
            fingerprint: self.rules.fingerprint.clone(),
        };
        self.cache
            .get_or_compute(key, || self.compute(target, chain))
    }

    fn compute(&self, target: &CalculationTarget, chain: &[String]) -> Result<VersionResult> {
        let commit = self.snapshot.commit(target.commit).ok_or_else(|| {
            GitVersionError::repository(format!("Commit {} is not in the snapshot", target.commit))
        })?;
        let branch = self.rules.classifier.classify(&target.branch);
        tracing::debug!(
            branch = %target.branch,
            rule = %branch.key,
            depth = chain.len(),
            "classified branch"
        );

        let mut next_chain = chain.to_vec();
        next_chain.push(target.branch.clone());
        let resolver = Resolution {
            engine: self,
            chain: next_chain,
        };
        let ctx = CalculationContext {
            snapshot: &self.snapshot,
            rules: &self.rules,
            target,
            branch: &branch,
            resolver: &resolver,
        };

        if branch.mode == VersioningMode::Mainline {
            let replay = mainline::calculate(&ctx)?;
            return Ok(VersionResult {
                version: replay.version,
                branch: branch.clone(),
                commit: target.commit,
                commit_date: commit.when,
                version_source: replay.version_source,
                commits_since_version_source: replay.commits_since_version_source,
                strategy: None,
                mode: branch.mode,
            });
        }

        let (candidates, reports) = propose_all(&self.strategies, &ctx)?;
        let selected = selector::select(&self.snapshot, target.commit, candidates, &reports)?;
        let outcome = increment::apply(&ctx, &selected)?;

        Ok(VersionResult {
            version: outcome.version,
            branch: branch.clone(),
            commit: target.commit,
            commit_date: commit.when,
            version_source: selected.source,
            commits_since_version_source: outcome.commits_since_version_source,
            strategy: Some(selected.strategy),
            mode: branch.mode,
        })
    }
}

/// Resolver handed to strategies, carrying the chain of branches being resolved
struct Resolution<'e> {
    engine: &'e VersionEngine,
    chain: Vec<String>,
}

impl SourceBranchResolver for Resolution<'_> {
    fn resolve(&self, target: &CalculationTarget) -> Result<Arc<VersionResult>> {
        self.engine.calculate_in_chain(target, &self.chain)
    }
}
