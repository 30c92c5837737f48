use crate::domain::branch::friendly_name;
use crate::domain::{Commit, Tag};
use crate::error::{GitVersionError, Result};
use crate::git::Head;
use git2::{BranchType, Oid, Repository as Git2Repo};
use std::collections::BTreeMap;
use std::path::Path;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path).map_err(|e| {
            GitVersionError::repository(format!(
                "Cannot open repository at {}: {}",
                path.display(),
                e.message()
            ))
        })?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Working tree root, None for bare repositories
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn remote_names(&self) -> Result<Vec<String>> {
        let remotes = self.repo.remotes()?;
        Ok(remotes.iter().flatten().map(str::to_string).collect())
    }
}

impl super::Repository for Git2Repository {
    fn head(&self) -> Result<Head> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitVersionError::repository(format!("Cannot resolve HEAD: {}", e.message())))?;

        let commit = head.peel_to_commit()?.id();
        let branch = if head.is_branch() {
            head.shorthand().map(str::to_string)
        } else {
            None
        };

        Ok(Head { branch, commit })
    }

    fn branches(&self) -> Result<BTreeMap<String, Oid>> {
        let remotes = self.remote_names()?;
        let mut local = BTreeMap::new();
        let mut remote = BTreeMap::new();

        for entry in self.repo.branches(None)? {
            let (branch, kind) = entry?;
            let reference = branch.get();
            let Some(name) = reference.name() else {
                continue;
            };
            if name.ends_with("/HEAD") {
                continue;
            }
            let Ok(tip) = reference.peel_to_commit() else {
                continue;
            };

            let friendly = friendly_name(name, &remotes);
            match kind {
                BranchType::Local => {
                    local.insert(friendly, tip.id());
                }
                BranchType::Remote => {
                    remote.entry(friendly).or_insert(tip.id());
                }
            }
        }

        for (name, tip) in remote {
            local.entry(name).or_insert(tip);
        }
        Ok(local)
    }

    fn tags(&self) -> Result<Vec<Tag>> {
        let names = self.repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            let Ok(commit) = reference.peel_to_commit() else {
                tracing::debug!(tag = name, "tag does not point at a commit, ignored");
                continue;
            };
            let annotation = reference
                .peel_to_tag()
                .ok()
                .and_then(|tag| tag.message().map(str::to_string));

            tags.push(Tag {
                name: name.to_string(),
                target: commit.id(),
                annotation,
            });
        }

        Ok(tags)
    }

    fn commits(&self, tips: &[Oid]) -> Result<Vec<Commit>> {
        let mut revwalk = self.repo.revwalk()?;
        for tip in tips {
            revwalk.push(*tip)?;
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            commits.push(Commit::new(
                oid,
                commit.parent_ids().collect(),
                commit.author().when().seconds(),
                commit.message().unwrap_or(""),
            ));
        }

        Ok(commits)
    }
}
