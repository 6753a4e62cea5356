//! Caller-supplied pipeline tasks (hooks)
//!
//! Each pipeline has a fixed set of optional slots. A slot that is empty is
//! planned as a skipped step; a filled slot runs its [`Task`] at a fixed
//! point of the pipeline.

use crate::core::logger::Logger;
use crate::process::CommandRunner;
use async_trait::async_trait;
use semver::Version;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Named hook slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Lint,
    Build,
    BeforeVersionUpdate,
    AfterVersionUpdate,
    BeforePublish,
    Publish,
    AfterPublish,
}

impl Hook {
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::Lint => "lint",
            Hook::Build => "build",
            Hook::BeforeVersionUpdate => "before_version_update",
            Hook::AfterVersionUpdate => "after_version_update",
            Hook::BeforePublish => "before_publish",
            Hook::Publish => "publish",
            Hook::AfterPublish => "after_publish",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a task gets to work with
#[derive(Clone)]
pub struct TaskContext {
    pub working_dir: PathBuf,
    /// Project name from the manifest, when known
    pub name: Option<String>,
    /// Version being released or published; `None` for the release lint
    pub version: Option<Version>,
    pub runner: Arc<dyn CommandRunner>,
    pub logger: Arc<dyn Logger>,
}

impl TaskContext {
    /// Run a shell command in the working directory
    pub async fn exec(&self, command: &str) -> anyhow::Result<()> {
        self.runner.execute(command, &self.working_dir).await?;
        Ok(())
    }

    /// Template variables available to shell tasks
    pub fn variables(&self) -> HashMap<String, String> {
        let mut variables = HashMap::new();
        variables.insert(
            "working_dir".to_string(),
            self.working_dir.display().to_string(),
        );
        if let Some(name) = &self.name {
            variables.insert("name".to_string(), name.clone());
        }
        if let Some(version) = &self.version {
            variables.insert("version".to_string(), version.to_string());
        }
        variables
    }
}

/// An optional pipeline step supplied by the caller
#[async_trait]
pub trait Task: Send + Sync {
    async fn run(&self, ctx: TaskContext) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> Task for F
where
    F: Fn(TaskContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, ctx: TaskContext) -> anyhow::Result<()> {
        (self)(ctx).await
    }
}

/// Task that runs a shell command template
///
/// Placeholders in the form `{{ name }}` are replaced with the values of
/// [`TaskContext::variables`] before the command is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellTask {
    command: String,
}

impl ShellTask {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Render the command with variable substitution
    pub fn render(&self, variables: &HashMap<String, String>) -> String {
        let mut command = self.command.clone();
        for (key, value) in variables {
            let placeholder = format!("{{{{ {} }}}}", key);
            command = command.replace(&placeholder, value);
        }
        command
    }
}

#[async_trait]
impl Task for ShellTask {
    async fn run(&self, ctx: TaskContext) -> anyhow::Result<()> {
        let command = self.render(&ctx.variables());
        ctx.exec(&command).await
    }
}

/// Hook slots of one pipeline configuration
#[derive(Clone, Default)]
pub struct Hooks {
    tasks: HashMap<Hook, Arc<dyn Task>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, hook: Hook, task: Arc<dyn Task>) {
        self.tasks.insert(hook, task);
    }

    pub fn get(&self, hook: Hook) -> Option<Arc<dyn Task>> {
        self.tasks.get(&hook).cloned()
    }

    pub fn contains(&self, hook: Hook) -> bool {
        self.tasks.contains_key(&hook)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut configured: Vec<&str> = self.tasks.keys().map(|h| h.as_str()).collect();
        configured.sort_unstable();
        f.debug_struct("Hooks").field("configured", &configured).finish()
    }
}
