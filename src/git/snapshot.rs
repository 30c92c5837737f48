//! Immutable view of the commit graph taken at engine start
//!
//! Every graph query made during a calculation is answered from this pinned
//! snapshot, so the engine never observes a moving repository.

use crate::domain::{Commit, SemanticVersion, Tag, TagPrefix};
use crate::error::{GitVersionError, Result};
use crate::git::{Head, Repository};
use git2::Oid;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

/// Name used for a detached HEAD that no branch points at
pub const NO_BRANCH: &str = "(no branch)";

/// What a calculation is asked about: a branch name and a commit on it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CalculationTarget {
    pub branch: String,
    pub commit: Oid,
}

impl CalculationTarget {
    pub fn new(branch: impl Into<String>, commit: Oid) -> Self {
        CalculationTarget {
            branch: branch.into(),
            commit,
        }
    }
}

/// Read-only commit graph with tags and branch tips
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    commits: HashMap<Oid, Commit>,
    generations: HashMap<Oid, u32>,
    branches: BTreeMap<String, Oid>,
    tags: Vec<Tag>,
    head: Head,
}

impl RepositorySnapshot {
    /// Read everything the engine needs from the backend in one pass
    pub fn capture<R: Repository + ?Sized>(repo: &R) -> Result<Self> {
        let head = repo.head()?;
        let branches = repo.branches()?;
        let tags = repo.tags()?;

        let mut tips: Vec<Oid> = vec![head.commit];
        tips.extend(branches.values().copied());
        tips.extend(tags.iter().map(|t| t.target));
        tips.sort();
        tips.dedup();

        let commits = repo.commits(&tips)?;
        tracing::debug!(
            commits = commits.len(),
            branches = branches.len(),
            tags = tags.len(),
            "captured repository snapshot"
        );
        Ok(Self::from_parts(head, branches, tags, commits))
    }

    /// Assemble a snapshot from already-read parts
    pub fn from_parts(
        head: Head,
        branches: BTreeMap<String, Oid>,
        tags: Vec<Tag>,
        commits: Vec<Commit>,
    ) -> Self {
        let commits: HashMap<Oid, Commit> = commits.into_iter().map(|c| (c.id, c)).collect();
        let generations = compute_generations(&commits);
        RepositorySnapshot {
            commits,
            generations,
            branches,
            tags,
            head,
        }
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn branches(&self) -> &BTreeMap<String, Oid> {
        &self.branches
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn commit(&self, oid: Oid) -> Option<&Commit> {
        self.commits.get(&oid)
    }

    /// Tip commit of a branch
    pub fn branch_tip(&self, name: &str) -> Option<&Commit> {
        self.branches.get(name).and_then(|oid| self.commits.get(oid))
    }

    /// Topological depth: 0 for roots, 1 + deepest parent otherwise
    pub fn generation(&self, oid: Oid) -> u32 {
        self.generations.get(&oid).copied().unwrap_or(0)
    }

    /// Ordering key for "more recent": author time, then topological depth
    pub fn recency(&self, oid: Oid) -> (i64, u32) {
        let when = self.commits.get(&oid).map(|c| c.when).unwrap_or(i64::MIN);
        (when, self.generation(oid))
    }

    /// Lazily walk the ancestors of `start`, including `start` itself
    ///
    /// With `first_parent` only the first-parent chain is followed. Otherwise
    /// all parents are visited, most recent first, each commit once.
    pub fn ancestors(&self, start: Oid, first_parent: bool) -> Ancestors<'_> {
        let mut queue = BinaryHeap::new();
        if self.commits.contains_key(&start) {
            queue.push(self.walk_key(start));
        }
        Ancestors {
            snapshot: self,
            first_parent,
            queue,
            seen: HashSet::from([start]),
        }
    }

    fn walk_key(&self, oid: Oid) -> (i64, u32, Oid) {
        let (when, generation) = self.recency(oid);
        (when, generation, oid)
    }

    /// Whether `ancestor` is reachable from `descendant` (inclusive)
    pub fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> bool {
        if ancestor == descendant {
            return self.commits.contains_key(&ancestor);
        }
        if !self.commits.contains_key(&ancestor) {
            return false;
        }
        let floor = self.generation(ancestor);
        let mut pending = vec![descendant];
        let mut seen = HashSet::new();
        while let Some(oid) = pending.pop() {
            if oid == ancestor {
                return true;
            }
            if !seen.insert(oid) || self.generation(oid) <= floor {
                continue;
            }
            if let Some(commit) = self.commits.get(&oid) {
                pending.extend(commit.parents.iter().copied());
            }
        }
        false
    }

    /// All commits reachable from `oid`, including itself
    pub fn reachable(&self, oid: Oid) -> HashSet<Oid> {
        self.ancestors(oid, false).map(|c| c.id).collect()
    }

    /// Tags pointing at `oid` or any of its ancestors
    pub fn tags_reachable_from(&self, oid: Oid) -> Vec<&Tag> {
        let reachable = self.reachable(oid);
        self.tags
            .iter()
            .filter(|tag| reachable.contains(&tag.target))
            .collect()
    }

    /// Tags on exactly this commit
    pub fn tags_on(&self, oid: Oid) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |tag| tag.target == oid)
    }

    /// Highest version tag on exactly this commit
    pub fn version_tag_on(&self, oid: Oid, prefix: &TagPrefix) -> Option<SemanticVersion> {
        self.tags_on(oid).filter_map(|tag| tag.version(prefix)).max()
    }

    /// Nearest common ancestor, None when the histories are disjoint
    pub fn merge_base(&self, a: Oid, b: Oid) -> Option<Oid> {
        if self.is_ancestor(a, b) {
            return Some(a);
        }
        if self.is_ancestor(b, a) {
            return Some(b);
        }
        let from_a = self.reachable(a);
        self.ancestors(b, false)
            .map(|c| c.id)
            .find(|oid| from_a.contains(oid))
    }

    /// Commits reachable from `target` but not from `base`, oldest first
    ///
    /// With no base this is the whole history of `target`.
    pub fn commits_between(&self, base: Option<Oid>, target: Oid) -> Vec<&Commit> {
        let excluded = base.map(|b| self.reachable(b)).unwrap_or_default();
        let mut path: Vec<&Commit> = self
            .ancestors(target, false)
            .filter(|c| !excluded.contains(&c.id))
            .collect();
        path.reverse();
        path
    }

    /// Root of the first-parent chain of `oid`
    pub fn root(&self, oid: Oid) -> Oid {
        self.ancestors(oid, true).last().map(|c| c.id).unwrap_or(oid)
    }

    /// Resolve a full or unique abbreviated commit id
    pub fn resolve_commit(&self, spec: &str) -> Result<Oid> {
        if let Ok(oid) = Oid::from_str(spec) {
            if spec.len() == 40 && self.commits.contains_key(&oid) {
                return Ok(oid);
            }
        }

        let needle = spec.to_ascii_lowercase();
        if needle.len() < 4 || !needle.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GitVersionError::repository(format!(
                "Invalid commit id '{}'",
                spec
            )));
        }

        let mut matches = self
            .commits
            .keys()
            .filter(|oid| oid.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(oid), None) => Ok(*oid),
            (Some(_), Some(_)) => Err(GitVersionError::repository(format!(
                "Ambiguous commit id '{}'",
                spec
            ))),
            (None, _) => Err(GitVersionError::repository(format!(
                "Commit '{}' not found",
                spec
            ))),
        }
    }

    /// Decide which branch and commit a calculation runs for
    ///
    /// Defaults to HEAD. A detached HEAD, or a commit given without a branch,
    /// is named after the first branch whose tip is that commit.
    pub fn resolve_target(&self, branch: Option<&str>, commit: Option<&str>) -> Result<CalculationTarget> {
        let commit = match (commit, branch) {
            (Some(spec), _) => self.resolve_commit(spec)?,
            (None, Some(name)) => self
                .branch_tip(name)
                .map(|tip| tip.id)
                .ok_or_else(|| GitVersionError::repository(format!("Branch '{}' not found", name)))?,
            (None, None) => self.head.commit,
        };

        let branch = match branch {
            Some(name) => name.to_string(),
            None => self.name_for(commit),
        };
        Ok(CalculationTarget { branch, commit })
    }

    fn name_for(&self, commit: Oid) -> String {
        if self.head.commit == commit {
            if let Some(branch) = &self.head.branch {
                return branch.clone();
            }
        }
        self.branches
            .iter()
            .find(|(_, tip)| **tip == commit)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| NO_BRANCH.to_string())
    }
}

/// Lazy ancestor walk, see [RepositorySnapshot::ancestors]
pub struct Ancestors<'a> {
    snapshot: &'a RepositorySnapshot,
    first_parent: bool,
    queue: BinaryHeap<(i64, u32, Oid)>,
    seen: HashSet<Oid>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Commit;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, _, oid) = self.queue.pop()?;
        let commit = self.snapshot.commits.get(&oid)?;
        let parents: &[Oid] = if self.first_parent {
            commit.parents.get(..1).unwrap_or(&[])
        } else {
            &commit.parents
        };
        for parent in parents {
            if self.snapshot.commits.contains_key(parent) && self.seen.insert(*parent) {
                self.queue.push(self.snapshot.walk_key(*parent));
            }
        }
        Some(commit)
    }
}

fn compute_generations(commits: &HashMap<Oid, Commit>) -> HashMap<Oid, u32> {
    let mut generations: HashMap<Oid, u32> = HashMap::with_capacity(commits.len());
    for start in commits.keys() {
        if generations.contains_key(start) {
            continue;
        }
        let mut stack = vec![*start];
        while let Some(&oid) = stack.last() {
            if generations.contains_key(&oid) {
                stack.pop();
                continue;
            }
            let parents = commits
                .get(&oid)
                .map(|c| c.parents.as_slice())
                .unwrap_or(&[]);
            let pending: Vec<Oid> = parents
                .iter()
                .copied()
                .filter(|p| commits.contains_key(p) && !generations.contains_key(p))
                .collect();
            if pending.is_empty() {
                let depth = parents
                    .iter()
                    .filter_map(|p| generations.get(p))
                    .max()
                    .map_or(0, |g| g + 1);
                generations.insert(oid, depth);
                stack.pop();
            } else {
                stack.extend(pending);
            }
        }
    }
    generations
}
