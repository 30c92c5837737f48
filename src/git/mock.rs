use crate::domain::{Commit, Tag};
use crate::error::{GitVersionError, Result};
use crate::git::{Head, Repository};
use git2::Oid;
use std::collections::BTreeMap;

/// Seconds between consecutive mock commits
const CLOCK_STEP: i64 = 60;

/// In-memory repository for building histories in tests
///
/// Mirrors a tiny subset of git porcelain: committing advances the checked-out
/// branch, `branch` creates and checks out a new branch at HEAD, `merge`
/// records a two-parent commit. Commit ids are deterministic and timestamps
/// advance by one minute per commit unless set explicitly.
pub struct MockRepository {
    commits: BTreeMap<Oid, Commit>,
    branches: BTreeMap<String, Oid>,
    tags: Vec<Tag>,
    head_branch: Option<String>,
    head_commit: Option<Oid>,
    next_id: u32,
    clock: i64,
}

impl MockRepository {
    /// Create a new empty repository with `main` checked out
    pub fn new() -> Self {
        MockRepository {
            commits: BTreeMap::new(),
            branches: BTreeMap::new(),
            tags: Vec::new(),
            head_branch: Some("main".to_string()),
            head_commit: None,
            next_id: 1,
            clock: 1_700_000_000,
        }
    }

    /// Set the timestamp the next commit will carry
    pub fn set_time(&mut self, when: i64) {
        self.clock = when;
    }

    /// Commit on top of HEAD, advancing the checked-out branch
    pub fn commit(&mut self, message: &str) -> Oid {
        let parents = self.head_commit.into_iter().collect();
        self.record(message, parents)
    }

    /// Commit with explicit parents and timestamp, leaving HEAD untouched
    pub fn commit_with_parents(&mut self, message: &str, parents: Vec<Oid>, when: i64) -> Oid {
        let id = self.next_oid();
        self.commits
            .insert(id, Commit::new(id, parents, when, message));
        id
    }

    /// Merge the tip of `branch` into HEAD with the given message
    pub fn merge(&mut self, branch: &str, message: &str) -> Result<Oid> {
        let theirs = self.branch_tip(branch)?;
        let ours = self
            .head_commit
            .ok_or_else(|| GitVersionError::repository("Cannot merge into an empty branch"))?;
        Ok(self.record(message, vec![ours, theirs]))
    }

    /// Create a branch at HEAD and check it out
    pub fn branch(&mut self, name: &str) {
        if let Some(head) = self.head_commit {
            self.branches.insert(name.to_string(), head);
        }
        self.head_branch = Some(name.to_string());
    }

    /// Point a branch at an arbitrary commit without checking it out
    pub fn set_branch(&mut self, name: &str, commit: Oid) {
        self.branches.insert(name.to_string(), commit);
    }

    /// Check out an existing branch
    pub fn checkout(&mut self, name: &str) -> Result<()> {
        let tip = self.branch_tip(name)?;
        self.head_branch = Some(name.to_string());
        self.head_commit = Some(tip);
        Ok(())
    }

    /// Detach HEAD at a commit
    pub fn detach(&mut self, commit: Oid) {
        self.head_branch = None;
        self.head_commit = Some(commit);
    }

    /// Lightweight tag at HEAD
    pub fn tag(&mut self, name: &str) -> Result<()> {
        let head = self.require_head()?;
        self.tags.push(Tag::new(name, head));
        Ok(())
    }

    /// Lightweight tag at an arbitrary commit
    pub fn tag_commit(&mut self, name: &str, commit: Oid) {
        self.tags.push(Tag::new(name, commit));
    }

    /// Annotated tag at HEAD
    pub fn annotated_tag(&mut self, name: &str, message: &str) -> Result<()> {
        let head = self.require_head()?;
        self.tags.push(Tag::annotated(name, head, message));
        Ok(())
    }

    /// Tip of the checked-out branch or the detached commit
    pub fn head_commit(&self) -> Option<Oid> {
        self.head_commit
    }

    fn branch_tip(&self, name: &str) -> Result<Oid> {
        self.branches
            .get(name)
            .copied()
            .ok_or_else(|| GitVersionError::repository(format!("Branch not found: {}", name)))
    }

    fn require_head(&self) -> Result<Oid> {
        self.head_commit
            .ok_or_else(|| GitVersionError::repository("Repository has no commits"))
    }

    fn record(&mut self, message: &str, parents: Vec<Oid>) -> Oid {
        let when = self.clock;
        self.clock += CLOCK_STEP;
        let id = self.commit_with_parents(message, parents, when);
        self.head_commit = Some(id);
        if let Some(branch) = &self.head_branch {
            self.branches.insert(branch.clone(), id);
        }
        id
    }

    fn next_oid(&mut self) -> Oid {
        let n = self.next_id;
        self.next_id += 1;
        let mut bytes = [0u8; 20];
        bytes[..4].copy_from_slice(&n.reverse_bits().to_be_bytes());
        bytes[16..].copy_from_slice(&n.to_be_bytes());
        Oid::from_bytes(&bytes).unwrap_or_else(|_| Oid::zero())
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn head(&self) -> Result<Head> {
        let commit = self.require_head()?;
        let branch = self
            .head_branch
            .clone()
            .filter(|name| self.branches.contains_key(name));
        Ok(Head { branch, commit })
    }

    fn branches(&self) -> Result<BTreeMap<String, Oid>> {
        Ok(self.branches.clone())
    }

    fn tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags.clone())
    }

    fn commits(&self, tips: &[Oid]) -> Result<Vec<Commit>> {
        let mut reachable = BTreeMap::new();
        let mut pending: Vec<Oid> = tips.to_vec();
        while let Some(oid) = pending.pop() {
            if reachable.contains_key(&oid) {
                continue;
            }
            let commit = self.commits.get(&oid).ok_or_else(|| {
                GitVersionError::repository(format!("Unknown commit {}", oid))
            })?;
            pending.extend(commit.parents.iter().copied());
            reachable.insert(oid, commit.clone());
        }
        Ok(reachable.into_values().collect())
    }
}
