//! Main workflow orchestration logic
//!
//! Opens the repository, loads configuration, pins a snapshot and runs the
//! engine. Kept apart from argument parsing so the workflow can be driven
//! programmatically without depending on clap.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::{load_config, Config};
use crate::engine::{VersionEngine, VersionResult};
use crate::git::{Git2Repository, RepositorySnapshot};
use crate::variables::VersionVariables;

/// Arguments for one calculation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunArgs {
    /// Directory inside the repository to version
    pub repo_path: PathBuf,

    /// Path to custom config file
    pub config_path: Option<PathBuf>,

    /// Calculate for this branch instead of HEAD's
    pub branch: Option<String>,

    /// Calculate at this commit (full or abbreviated sha)
    pub commit: Option<String>,
}

impl RunArgs {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        RunArgs {
            repo_path: repo_path.into(),
            ..RunArgs::default()
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct CalculationReport {
    pub config: Config,
    pub result: VersionResult,
    pub variables: VersionVariables,
}

/// Load the effective configuration for a repository
pub fn effective_config(args: &RunArgs) -> Result<Config> {
    let repo = Git2Repository::open(&args.repo_path)?;
    load_config(args.config_path.as_deref(), repo.workdir()).context("Failed to load configuration")
}

/// Run the whole calculation
pub fn run(args: &RunArgs) -> Result<CalculationReport> {
    let repo = Git2Repository::open(&args.repo_path)?;
    let config = load_config(args.config_path.as_deref(), repo.workdir())
        .context("Failed to load configuration")?;

    let snapshot = RepositorySnapshot::capture(&repo).context("Failed to read repository")?;
    let target = snapshot.resolve_target(args.branch.as_deref(), args.commit.as_deref())?;
    let engine = VersionEngine::new(snapshot, config.clone())?;
    let result = engine.calculate(&target)?;
    let variables = VersionVariables::from_result(&result, &config)?;

    Ok(CalculationReport {
        config,
        result: (*result).clone(),
        variables,
    })
}

/// Run the calculation and return only the output variables
pub fn calculate_variables(args: &RunArgs) -> Result<VersionVariables> {
    run(args).map(|report| report.variables)
}
