//! State shared by the release and publish step executors

use crate::core::{Config, ConsoleLogger, Hook, Logger, PipelineError, TaskContext};
use crate::execution::{commands, EventHandler, ExecutionEngine, ExecutionEvent};
use crate::process::{CommandRunner, ShellRunner};
use semver::Version;
use std::path::PathBuf;
use std::sync::Arc;

/// Collaborators a pipeline runs with
#[derive(Clone)]
pub struct Runtime {
    logger: Arc<dyn Logger>,
    runner: Option<Arc<dyn CommandRunner>>,
    event_handlers: Vec<EventHandler>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            logger: Arc::new(ConsoleLogger::default()),
            runner: None,
            event_handlers: Vec::new(),
        }
    }
}

impl Runtime {
    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = logger;
    }

    pub fn set_runner(&mut self, runner: Arc<dyn CommandRunner>) {
        self.runner = Some(runner);
    }

    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        self.logger.clone()
    }

    /// The configured runner, or a shell runner logging to our logger
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        match &self.runner {
            Some(runner) => runner.clone(),
            None => Arc::new(ShellRunner::new(self.logger.clone())),
        }
    }

    pub fn engine(&self) -> ExecutionEngine {
        ExecutionEngine::new(self.logger.clone()).with_event_handlers(self.event_handlers.clone())
    }
}

/// Working directory plus collaborators for one run
pub(crate) struct RunContext<'a> {
    pub config: &'a Config,
    pub working_dir: PathBuf,
    pub runner: Arc<dyn CommandRunner>,
    pub logger: Arc<dyn Logger>,
}

impl<'a> RunContext<'a> {
    pub fn new(config: &'a Config, working_dir: PathBuf, runtime: &Runtime) -> Self {
        Self {
            config,
            working_dir,
            runner: runtime.runner(),
            logger: runtime.logger(),
        }
    }

    pub fn info(&self, text: &str) {
        self.logger.info(text);
    }

    pub async fn exec(&self, command: &str) -> Result<(), PipelineError> {
        self.runner.execute(command, &self.working_dir).await?;
        Ok(())
    }

    /// Run the task in `hook`; a missing task is a no-op
    pub async fn run_hook(
        &self,
        hook: Hook,
        name: Option<&str>,
        version: Option<&Version>,
    ) -> Result<(), PipelineError> {
        let Some(task) = self.config.hooks.get(hook) else {
            return Ok(());
        };
        let ctx = TaskContext {
            working_dir: self.working_dir.clone(),
            name: name.map(str::to_string),
            version: version.cloned(),
            runner: self.runner.clone(),
            logger: self.logger.clone(),
        };
        task.run(ctx)
            .await
            .map_err(|source| PipelineError::Task { hook, source })
    }

    pub async fn checkout_main(&self) -> Result<(), PipelineError> {
        self.info(&format!("Checking out {} branch...", self.config.main_branch));
        self.exec(&commands::git_checkout(&self.config.main_branch))
            .await
    }
}
