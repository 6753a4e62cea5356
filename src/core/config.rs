//! Pipeline configuration
//!
//! [`Config`] is the value a pipeline runs with. It is usually produced
//! from an optional YAML project file ([`ProjectFile`]) and then adjusted
//! with the `with_*` builder methods.

use crate::core::{
    error::ValidationError,
    manifest,
    tag::TagStyle,
    task::{Hook, Hooks, ShellTask, Task},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default project file name inside the working directory
pub const DEFAULT_PROJECT_FILE: &str = "shipline.yaml";

/// What the entry point does with the process exit code after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and leave the exit code alone
    Report,
    /// Exit with status 1
    Exit,
}

impl FailurePolicy {
    pub fn from_exit_flag(exit_on_failure: bool) -> Self {
        if exit_on_failure {
            FailurePolicy::Exit
        } else {
            FailurePolicy::Report
        }
    }
}

/// Container registry to push images to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Registry host, e.g. `123456789012.dkr.ecr.us-west-1.amazonaws.com`
    pub url: String,

    /// Repository namespace inside the registry
    pub namespace: String,

    #[serde(default)]
    pub region: Option<String>,

    /// Credential profile for the registry CLI
    #[serde(default)]
    pub profile: Option<String>,
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: namespace.into(),
            region: None,
            profile: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Fully qualified `latest` image reference for `name`
    pub fn image_ref(&self, name: &str) -> String {
        format!("{}/{}/{}:latest", self.url, self.namespace, name)
    }
}

/// Container image publishing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Dockerfile override, relative to the working directory
    #[serde(default)]
    pub dockerfile: Option<PathBuf>,

    /// Registry to tag and push to; without one the image is only built
    #[serde(default)]
    pub registry: Option<RegistryConfig>,
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dockerfile(mut self, dockerfile: impl Into<PathBuf>) -> Self {
        self.dockerfile = Some(dockerfile.into());
        self
    }

    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = Some(registry);
        self
    }
}

/// Runtime configuration of a release or publish run
#[derive(Debug, Clone)]
pub struct Config {
    pub working_dir: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub main_branch: String,
    pub remote: String,
    pub tag_style: TagStyle,
    pub hooks: Hooks,
    pub container: Option<ContainerConfig>,
    pub npm: bool,
    pub strict_versions: bool,
    /// Overrides the pipeline's default failure policy
    pub failure_policy: Option<FailurePolicy>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: None,
            manifest_path: None,
            main_branch: "master".to_string(),
            remote: "origin".to_string(),
            tag_style: TagStyle::Version,
            hooks: Hooks::new(),
            container: None,
            npm: false,
            strict_versions: false,
            failure_policy: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn with_main_branch(mut self, branch: impl Into<String>) -> Self {
        self.main_branch = branch.into();
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_tag_style(mut self, style: TagStyle) -> Self {
        self.tag_style = style;
        self
    }

    pub fn with_task(mut self, hook: Hook, task: impl Task + 'static) -> Self {
        self.hooks.set(hook, Arc::new(task));
        self
    }

    pub fn with_lint_task(self, task: impl Task + 'static) -> Self {
        self.with_task(Hook::Lint, task)
    }

    pub fn with_build_task(self, task: impl Task + 'static) -> Self {
        self.with_task(Hook::Build, task)
    }

    pub fn with_container(mut self, container: ContainerConfig) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_npm(mut self, npm: bool) -> Self {
        self.npm = npm;
        self
    }

    pub fn with_strict_versions(mut self, strict: bool) -> Self {
        self.strict_versions = strict;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Check the working directory and return it
    pub fn validated_working_dir(&self) -> Result<&Path, ValidationError> {
        let dir = self
            .working_dir
            .as_deref()
            .ok_or(ValidationError::MissingWorkingDir)?;
        if !dir.is_dir() {
            return Err(ValidationError::WorkingDirNotFound(
                dir.display().to_string(),
            ));
        }
        Ok(dir)
    }

    /// Whether any publish target is configured
    pub fn has_publish_target(&self) -> bool {
        self.container.is_some() || self.npm || self.hooks.contains(Hook::Publish)
    }

    /// Resolved manifest location
    pub fn manifest_file(&self, working_dir: &Path) -> PathBuf {
        manifest::manifest_path(working_dir, self.manifest_path.as_deref())
    }
}

/// Project file as stored in `shipline.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    /// Manifest path override
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    #[serde(default)]
    pub main_branch: Option<String>,

    #[serde(default)]
    pub remote: Option<String>,

    #[serde(default)]
    pub tag_style: Option<TagStyle>,

    #[serde(default)]
    pub strict_versions: bool,

    /// Publish the package to the npm registry
    #[serde(default)]
    pub npm: bool,

    #[serde(default)]
    pub container: Option<ContainerConfig>,

    /// Shell commands for the hook slots
    #[serde(default)]
    pub tasks: TasksFile,

    #[serde(default)]
    pub release: PolicyFile,

    #[serde(default)]
    pub publish: PolicyFile,
}

/// Shell command per hook slot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TasksFile {
    #[serde(default)]
    pub lint: Option<String>,
    #[serde(default)]
    pub build: Option<String>,
    #[serde(default)]
    pub before_version_update: Option<String>,
    #[serde(default)]
    pub after_version_update: Option<String>,
    #[serde(default)]
    pub before_publish: Option<String>,
    #[serde(default)]
    pub publish: Option<String>,
    #[serde(default)]
    pub after_publish: Option<String>,
}

impl TasksFile {
    fn entries(&self) -> [(Hook, &Option<String>); 7] {
        [
            (Hook::Lint, &self.lint),
            (Hook::Build, &self.build),
            (Hook::BeforeVersionUpdate, &self.before_version_update),
            (Hook::AfterVersionUpdate, &self.after_version_update),
            (Hook::BeforePublish, &self.before_publish),
            (Hook::Publish, &self.publish),
            (Hook::AfterPublish, &self.after_publish),
        ]
    }
}

/// Per-workflow failure handling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    #[serde(default)]
    pub exit_on_failure: Option<bool>,
}

/// Which workflow a [`Config`] is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Release,
    Publish,
}

impl ProjectFile {
    /// Load a project file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid project file {}", path.display()))
    }

    /// Load `shipline.yaml` from `working_dir` if it exists
    pub fn discover(working_dir: &Path) -> Result<Option<Self>> {
        let path = working_dir.join(DEFAULT_PROJECT_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::from_file(path).map(Some)
    }

    /// Parse a project file from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is a valid, empty project file
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: ProjectFile = serde_yaml::from_str(yaml)?;
        file.validate()?;
        Ok(file)
    }

    /// Validate the project file
    pub fn validate(&self) -> Result<()> {
        for (hook, command) in self.tasks.entries() {
            if let Some(command) = command {
                if command.trim().is_empty() {
                    anyhow::bail!("Task '{}' has an empty command", hook);
                }
            }
        }

        if let Some(branch) = &self.main_branch {
            if branch.trim().is_empty() {
                anyhow::bail!("main_branch must not be empty");
            }
        }

        if let Some(registry) = self.container.as_ref().and_then(|c| c.registry.as_ref()) {
            if registry.url.trim().is_empty() || registry.namespace.trim().is_empty() {
                anyhow::bail!("container.registry needs both url and namespace");
            }
        }

        Ok(())
    }

    /// Number of configured task commands
    pub fn task_count(&self) -> usize {
        self.tasks.entries().iter().filter(|(_, c)| c.is_some()).count()
    }

    /// Turn the file into a runtime configuration for `workflow`
    pub fn to_config(&self, working_dir: impl Into<PathBuf>, workflow: Workflow) -> Config {
        let mut config = Config::new()
            .with_working_dir(working_dir)
            .with_npm(self.npm)
            .with_strict_versions(self.strict_versions);

        if let Some(manifest) = &self.manifest {
            config = config.with_manifest_path(manifest);
        }
        if let Some(branch) = &self.main_branch {
            config = config.with_main_branch(branch);
        }
        if let Some(remote) = &self.remote {
            config = config.with_remote(remote);
        }
        if let Some(style) = self.tag_style {
            config = config.with_tag_style(style);
        }
        if let Some(container) = &self.container {
            config = config.with_container(container.clone());
        }
        for (hook, command) in self.tasks.entries() {
            if let Some(command) = command {
                config = config.with_task(hook, ShellTask::new(command.clone()));
            }
        }

        let policy = match workflow {
            Workflow::Release => &self.release,
            Workflow::Publish => &self.publish,
        };
        if let Some(exit) = policy.exit_on_failure {
            config = config.with_failure_policy(FailurePolicy::from_exit_flag(exit));
        }

        config
    }
}
