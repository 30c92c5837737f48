//! Git access abstraction layer
//!
//! This module provides a trait-based abstraction over the version-control
//! backend, allowing the engine to run against real repositories and against
//! in-memory histories built for tests.
//!
//! # Overview
//!
//! The backend contract is the [Repository] trait. It is only read once: a
//! [RepositorySnapshot] captures everything the engine needs up front and all
//! graph queries during a calculation are answered from that pinned view.
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! # Usage
//!
//! ```rust,no_run
//! # use gitversion::git::{Git2Repository, RepositorySnapshot};
//! # fn example() -> gitversion::error::Result<()> {
//! let repo = Git2Repository::open(".")?;
//! let snapshot = RepositorySnapshot::capture(&repo)?;
//! let target = snapshot.resolve_target(None, None)?;
//! println!("{} at {}", target.branch, target.commit);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;
pub mod snapshot;

pub use mock::MockRepository;
pub use repository::Git2Repository;
pub use snapshot::{Ancestors, CalculationTarget, RepositorySnapshot};

use crate::domain::{Commit, Tag};
use crate::error::Result;
use git2::Oid;
use std::collections::BTreeMap;

/// Where HEAD points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    /// Branch name when HEAD is attached, None when detached
    pub branch: Option<String>,
    pub commit: Oid,
}

/// Read-only contract the engine needs from a version-control backend
///
/// ## Error Handling
///
/// Every method maps backend failures to
/// [GitVersionError::RepositoryAccess](crate::error::GitVersionError::RepositoryAccess).
/// A repository that cannot be read is fatal; the engine never retries.
pub trait Repository {
    /// Current HEAD
    ///
    /// # Returns
    /// * `Ok(Head)` - The checked-out branch (if any) and commit
    /// * `Err` - If HEAD is unborn or cannot be resolved
    fn head(&self) -> Result<Head>;

    /// All branches by friendly name with their tip commits
    ///
    /// Remote-tracking branches are included under their remote-stripped name
    /// unless a local branch with the same name exists.
    fn branches(&self) -> Result<BTreeMap<String, Oid>>;

    /// All tags, peeled to the commit they point at
    fn tags(&self) -> Result<Vec<Tag>>;

    /// Every commit reachable from any of `tips`, in no particular order
    fn commits(&self, tips: &[Oid]) -> Result<Vec<Commit>>;
}
