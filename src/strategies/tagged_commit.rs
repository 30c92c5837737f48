use super::{BaseVersionCandidate, CalculationContext, StrategyKind, VersionStrategy};
use crate::error::Result;

/// Proposes every version tag reachable from the target
pub struct TaggedCommitStrategy;

impl VersionStrategy for TaggedCommitStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TaggedCommit
    }

    fn propose(&self, ctx: &CalculationContext<'_>) -> Result<Vec<BaseVersionCandidate>> {
        let mut candidates = Vec::new();

        for tag in ctx.snapshot.tags_reachable_from(ctx.target.commit) {
            match tag.version(&ctx.rules.tag_prefix) {
                Some(version) => {
                    candidates.push(BaseVersionCandidate::new(
                        tag.target,
                        version,
                        false,
                        self.kind(),
                    ));
                }
                None if looks_versioned(&tag.name) => {
                    tracing::warn!(tag = %tag.name, "tag looks like a version but does not parse, ignored");
                }
                None => {}
            }
        }

        Ok(candidates)
    }
}

fn looks_versioned(name: &str) -> bool {
    name.contains('.') && name.chars().any(|c| c.is_ascii_digit())
}
