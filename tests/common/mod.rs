//! Temporary git2 repositories with deterministic signatures

#![allow(dead_code)]

use git2::{Oid, Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
    clock: i64,
}

impl TestRepo {
    /// Empty repository with HEAD on an unborn `main`
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let repo = Repository::init(dir.path()).expect("Could not init git repo");
        repo.set_head("refs/heads/main")
            .expect("Could not point HEAD at main");
        TestRepo {
            dir,
            repo,
            clock: 1_700_000_000,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&mut self) -> Signature<'static> {
        self.clock += 60;
        Signature::new("Test User", "test@example.com", &Time::new(self.clock, 0))
            .expect("Could not create signature")
    }

    fn head_commit(&self) -> Option<git2::Commit<'_>> {
        self.repo.head().ok().and_then(|h| h.peel_to_commit().ok())
    }

    fn write(&mut self, message: &str, extra_parent: Option<Oid>) -> Oid {
        let sig = self.signature();
        let blob = self.repo.blob(message.as_bytes()).expect("Could not write blob");
        let mut builder = self.repo.treebuilder(None).expect("Could not create tree");
        builder
            .insert("README.md", blob, 0o100644)
            .expect("Could not add file to tree");
        let tree_id = builder.write().expect("Could not write tree");
        let tree = self.repo.find_tree(tree_id).expect("Could not find tree");

        let mut parents = Vec::new();
        if let Some(head) = self.head_commit() {
            parents.push(head);
        }
        if let Some(oid) = extra_parent {
            parents.push(self.repo.find_commit(oid).expect("Could not find parent"));
        }
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .expect("Could not create commit")
    }

    /// Commit on top of HEAD
    pub fn commit(&mut self, message: &str) -> Oid {
        self.write(message, None)
    }

    /// Merge the tip of `branch` into HEAD
    pub fn merge(&mut self, branch: &str, message: &str) -> Oid {
        let theirs = self
            .repo
            .find_branch(branch, git2::BranchType::Local)
            .expect("Could not find branch")
            .get()
            .target()
            .expect("Branch has no target");
        self.write(message, Some(theirs))
    }

    /// Create a branch at HEAD and check it out
    pub fn branch(&self, name: &str) {
        let head = self.head_commit().expect("Cannot branch from an empty repository");
        self.repo
            .branch(name, &head, false)
            .expect("Could not create branch");
        self.checkout(name);
    }

    pub fn checkout(&self, name: &str) {
        self.repo
            .set_head(&format!("refs/heads/{}", name))
            .expect("Could not check out branch");
    }

    pub fn tag(&self, name: &str) {
        let head = self.head_commit().expect("Nothing to tag");
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .expect("Could not create tag");
    }

    pub fn annotated_tag(&mut self, name: &str, message: &str) {
        let sig = self.signature();
        let head = self.head_commit().expect("Nothing to tag");
        self.repo
            .tag(name, head.as_object(), &sig, message, false)
            .expect("Could not create annotated tag");
    }
}
