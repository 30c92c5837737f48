use super::{BaseVersionCandidate, CalculationContext, StrategyKind, VersionStrategy};
use crate::domain::branch::version_from_branch_name;
use crate::error::Result;

/// Proposes versions written into branch names
///
/// A release branch such as `release/1.2.0` proposes its own version at the
/// point it forked from its source branch. Branches that track release
/// branches also see every versioned release branch, to be incremented past.
pub struct VersionInBranchNameStrategy;

impl VersionStrategy for VersionInBranchNameStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::VersionInBranchName
    }

    fn propose(&self, ctx: &CalculationContext<'_>) -> Result<Vec<BaseVersionCandidate>> {
        let pattern = &ctx.rules.version_in_branch;
        let mut candidates = Vec::new();

        if ctx.branch.is_release_branch {
            if let Some(version) = version_from_branch_name(&ctx.target.branch, pattern) {
                let source = ctx
                    .nearest_source_fork(ctx.branch)
                    .map(|fork| fork.fork)
                    .unwrap_or_else(|| ctx.snapshot.root(ctx.target.commit));
                candidates.push(BaseVersionCandidate::new(source, version, false, self.kind()));
            }
        }

        if ctx.branch.tracks_release_branches {
            for (name, tip) in ctx.snapshot.branches() {
                if *name == ctx.target.branch {
                    continue;
                }
                if !ctx.rules.classifier.classify(name).is_release_branch {
                    continue;
                }
                let Some(version) = version_from_branch_name(name, pattern) else {
                    continue;
                };
                let Some(fork) = ctx.snapshot.merge_base(*tip, ctx.target.commit) else {
                    continue;
                };
                candidates.push(BaseVersionCandidate::new(fork, version, true, self.kind()));
            }
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::SemanticVersion;
    use crate::git::MockRepository;
    use crate::strategies::fixture::Fixture;

    #[test]
    fn test_release_branch_proposes_its_version_at_fork() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.branch("develop");
        let fork = repo.commit("dev work");
        repo.branch("release/1.2.0");
        repo.commit("stabilise");

        let candidates =
            Fixture::new(&repo, Config::default()).propose(&VersionInBranchNameStrategy);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source, fork);
        assert_eq!(candidates[0].version, SemanticVersion::new(1, 2, 0));
        assert!(candidates[0].is_pinned());
    }

    #[test]
    fn test_develop_tracks_release_branches() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.branch("develop");
        let fork = repo.commit("dev work");
        repo.branch("release/2.0.0");
        repo.commit("stabilise");
        repo.checkout("develop").unwrap();
        repo.commit("next feature");

        let candidates =
            Fixture::new(&repo, Config::default()).propose(&VersionInBranchNameStrategy);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].source, fork);
        assert_eq!(candidates[0].version, SemanticVersion::new(2, 0, 0));
        assert!(candidates[0].should_increment);
    }

    #[test]
    fn test_feature_branch_proposes_nothing() {
        let mut repo = MockRepository::new();
        repo.commit("initial");
        repo.branch("feature/1.0.0-notes");
        repo.commit("docs");

        let candidates =
            Fixture::new(&repo, Config::default()).propose(&VersionInBranchNameStrategy);
        assert!(candidates.is_empty());
    }
}
