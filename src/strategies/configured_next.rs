use super::{BaseVersionCandidate, CalculationContext, StrategyKind, VersionStrategy};
use crate::error::Result;

/// Always proposes the configured floor version at the root of history
pub struct ConfiguredNextVersionStrategy;

impl VersionStrategy for ConfiguredNextVersionStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConfiguredNextVersion
    }

    fn propose(&self, ctx: &CalculationContext<'_>) -> Result<Vec<BaseVersionCandidate>> {
        let root = ctx.snapshot.root(ctx.target.commit);
        Ok(vec![BaseVersionCandidate::new(
            root,
            ctx.rules.next_version.clone(),
            false,
            self.kind(),
        )])
    }
}
