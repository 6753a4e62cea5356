//! Command-line interface

pub mod commands;
pub mod output;

use crate::core::{Config, FailurePolicy, PipelineError, ProjectFile, TagStyle, Workflow};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{PublishCommand, ReleaseCommand, ValidateCommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Release and publish automation for npm-style projects
#[derive(Debug, Parser, Clone)]
#[command(name = "shipline")]
#[command(version)]
#[command(about = "Release and publish automation for npm-style projects", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project working directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Path to the project file (defaults to shipline.yaml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Manifest path, relative to the working directory
    #[arg(long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Name tags `<name>-<version>` instead of `<version>`
    #[arg(long, global = true)]
    pub prefix_tags: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Bump the version, commit, tag and push
    Release(ReleaseCommand),

    /// Publish the version recorded in the manifest
    Publish(PublishCommand),

    /// Validate the project file
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    pub fn working_dir(&self) -> Result<PathBuf> {
        match &self.dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to determine the current directory"),
        }
    }

    /// Load the project file named by `--config`, or discover one
    pub fn load_project(&self, working_dir: &Path) -> Result<ProjectFile> {
        match &self.config {
            Some(path) => ProjectFile::from_file(path),
            None => Ok(ProjectFile::discover(working_dir)?.unwrap_or_default()),
        }
    }

    /// Apply the global flags on top of a file-derived configuration
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(manifest) = &self.manifest {
            config = config.with_manifest_path(manifest);
        }
        if self.prefix_tags {
            config = config.with_tag_style(TagStyle::Prefixed);
        }
        config
    }

    /// Full configuration for `workflow`
    pub fn config_for(&self, workflow: Workflow) -> Result<Config> {
        let working_dir = self.working_dir()?;
        let project = self.load_project(&working_dir)?;
        Ok(self.apply_overrides(project.to_config(working_dir, workflow)))
    }
}

/// Process exit code for the outcome of a pipeline run
///
/// Validation errors always exit with 1; other failures follow `policy`.
pub fn exit_code<T>(result: &Result<T, PipelineError>, policy: FailurePolicy) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) if e.is_validation() => 1,
        Err(_) => match policy {
            FailurePolicy::Exit => 1,
            FailurePolicy::Report => 0,
        },
    }
}
