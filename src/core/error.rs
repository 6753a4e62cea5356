//! Error types shared by the release and publish pipelines

use crate::core::{manifest::ManifestError, task::Hook};
use crate::process::CommandError;
use thiserror::Error;

/// Bad or missing configuration, or an unusable version argument.
///
/// Raised before a pipeline touches the repository whenever possible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Working dir is required")]
    MissingWorkingDir,

    #[error("Working dir {0} is not a directory")]
    WorkingDirNotFound(String),

    #[error("Invalid version argument: {0}")]
    InvalidVersionArgument(String),

    #[error("Current version {0} is not a valid semantic version")]
    InvalidCurrentVersion(String),

    #[error("Version {next} is not greater than current version {current}")]
    VersionNotIncreased { current: String, next: String },

    #[error("Publish task is required (enable npm, a container image or a custom publish task)")]
    MissingPublishTarget,

    #[error("Manifest {path} has no {field} field")]
    MissingManifestField { path: String, field: &'static str },
}

/// Any failure that stops a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("{hook} task failed: {source:#}")]
    Task {
        hook: Hook,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Whether the run was rejected before any side effect
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_message_is_kept() {
        let err: PipelineError = CommandError::Failed {
            command: "git push origin master".to_string(),
            code: Some(1),
        }
        .into();
        assert_eq!(err.to_string(), "Command \"git push origin master\" returned error");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_task_error_names_the_hook() {
        let err = PipelineError::Task {
            hook: Hook::Lint,
            source: anyhow::anyhow!("eslint found 3 problems"),
        };
        assert_eq!(err.to_string(), "lint task failed: eslint found 3 problems");
    }

    #[test]
    fn test_validation_flag() {
        let err: PipelineError = ValidationError::MissingWorkingDir.into();
        assert!(err.is_validation());
    }
}
