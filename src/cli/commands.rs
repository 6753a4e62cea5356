//! CLI command definitions

use clap::Args;

/// Release a new version
#[derive(Debug, Args, Clone)]
pub struct ReleaseCommand {
    /// `major`, `minor`, `patch` or an explicit semantic version
    pub version: String,

    /// Reject versions that are not greater than the current one
    #[arg(long)]
    pub strict: bool,
}

/// Publish the released version
#[derive(Debug, Args, Clone, PartialEq, Eq)]
pub struct PublishCommand {
    /// Publish the package to the npm registry
    #[arg(long)]
    pub npm: bool,
}

/// Validate the project file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
