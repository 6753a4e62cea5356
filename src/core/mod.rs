//! Core domain models for release pipelines
//!
//! This module defines configuration, the manifest and version model, hook
//! slots, and the step/pipeline state shared by both workflows.

pub mod config;
pub mod error;
pub mod logger;
pub mod manifest;
pub mod pipeline;
pub mod state;
pub mod tag;
pub mod task;
pub mod version;

pub use config::{Config, ContainerConfig, FailurePolicy, ProjectFile, RegistryConfig, Workflow};
pub use error::{PipelineError, ValidationError};
pub use logger::{ConsoleLogger, Level, Logger};
pub use manifest::{Manifest, ManifestError};
pub use pipeline::{Pipeline, Step, StepKind};
pub use state::*;
pub use tag::TagStyle;
pub use task::{Hook, Hooks, ShellTask, Task, TaskContext};
pub use version::{BumpKind, VersionArg};
