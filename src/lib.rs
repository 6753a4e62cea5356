//! shipline - release and publish automation for npm-style projects
//!
//! A release bumps the manifest version, commits, tags and pushes from the
//! main branch. A publish checks out the released tag and ships its
//! artifacts: a container image, an npm package or a custom task.

pub mod cli;
pub mod core;
pub mod execution;
pub mod process;

// Re-export commonly used types
pub use core::{
    Config, ConsoleLogger, ContainerConfig, FailurePolicy, Hook, Logger, Manifest, PipelineError,
    ProjectFile, RegistryConfig, ShellTask, TagStyle, Task, TaskContext, ValidationError,
    VersionArg,
};
pub use execution::{
    ExecutionEvent, Publication, PublishPipeline, Release, ReleasePipeline,
};
pub use process::{CommandError, CommandRunner, ShellRunner};
