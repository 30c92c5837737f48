//! Domain logic - pure value types independent of git access

pub mod branch;
pub mod commit;
pub mod merge_message;
pub mod prerelease;
pub mod tag;
pub mod version;

pub use commit::{Commit, IncrementMarkers};
pub use merge_message::{MergeMessage, MergeMessageParser};
pub use prerelease::PreRelease;
pub use tag::{Tag, TagPrefix};
pub use version::{BuildMetadata, IncrementStrategy, SemanticVersion, VersionField};
