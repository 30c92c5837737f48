use super::{BaseVersionCandidate, CalculationContext, StrategyKind, VersionStrategy};
use crate::domain::branch::version_from_branch_name;
use crate::error::Result;

/// Proposes versions carried by merged branch names on the first-parent history
///
/// `Merge branch 'release/1.2.0'` on the target's direct history proposes
/// `1.2.0` at the merge commit.
pub struct MergeMessageStrategy;

impl VersionStrategy for MergeMessageStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MergeMessage
    }

    fn propose(&self, ctx: &CalculationContext<'_>) -> Result<Vec<BaseVersionCandidate>> {
        let mut candidates = Vec::new();

        for commit in ctx.snapshot.ancestors(ctx.target.commit, true) {
            if !commit.is_merge() {
                continue;
            }
            let Some(merge) = ctx.rules.merge_messages.parse(&commit.message) else {
                continue;
            };
            let Some(version) =
                version_from_branch_name(&merge.source_branch, &ctx.rules.version_in_branch)
            else {
                continue;
            };
            tracing::trace!(
                commit = %commit.id,
                format = %merge.format_name,
                source = %merge.source_branch,
                "versioned merge message"
            );
            candidates.push(BaseVersionCandidate::new(commit.id, version, false, self.kind()));
        }

        Ok(candidates)
    }
}
