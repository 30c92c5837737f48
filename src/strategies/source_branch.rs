use super::{BaseVersionCandidate, CalculationContext, StrategyKind, VersionStrategy};
use crate::error::Result;
use crate::git::CalculationTarget;

/// Proposes the version each configured source branch had where the target forked off it
///
/// The source branch's version is computed by recursing into the full
/// pipeline at the merge base; the recursion is depth-bounded by the resolver.
pub struct SourceBranchStrategy;

impl VersionStrategy for SourceBranchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SourceBranch
    }

    fn propose(&self, ctx: &CalculationContext<'_>) -> Result<Vec<BaseVersionCandidate>> {
        let mut candidates = Vec::new();

        for fork in ctx.source_forks(ctx.branch) {
            let resolved = ctx
                .resolver
                .resolve(&CalculationTarget::new(fork.name.clone(), fork.fork))?;
            tracing::debug!(
                source = %fork.name,
                fork = %fork.fork,
                version = %resolved.version,
                "source branch version"
            );
            candidates.push(
                BaseVersionCandidate::new(fork.fork, resolved.version.core(), true, self.kind())
                    .with_rank(fork.rank),
            );
        }

        Ok(candidates)
    }
}
