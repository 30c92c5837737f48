pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod git;
pub mod increment;
pub mod mainline;
pub mod selector;
pub mod strategies;
pub mod ui;
pub mod variables;

pub use engine::{VersionEngine, VersionResult};
pub use error::{GitVersionError, Result};
