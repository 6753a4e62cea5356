//! Release workflow: bump the manifest version, commit, tag and push

use crate::core::{
    tag, version, Config, FailurePolicy, Hook, Logger, Manifest, Pipeline, PipelineError,
    ValidationError, VersionArg,
};
use crate::execution::{
    commands,
    context::{RunContext, Runtime},
    ExecutionEvent, StepExecutor,
};
use crate::process::CommandRunner;
use async_trait::async_trait;
use semver::Version;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Steps of the release workflow, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    CheckoutMain,
    SyncMain,
    Lint,
    BeforeVersionUpdate,
    UpdateVersion,
    AfterVersionUpdate,
    Build,
    Commit,
    Push,
    Tag,
    PushTag,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            ReleaseStep::CheckoutMain => "checkout-main",
            ReleaseStep::SyncMain => "sync-main",
            ReleaseStep::Lint => "lint",
            ReleaseStep::BeforeVersionUpdate => "before-version-update",
            ReleaseStep::UpdateVersion => "update-version",
            ReleaseStep::AfterVersionUpdate => "after-version-update",
            ReleaseStep::Build => "build",
            ReleaseStep::Commit => "commit",
            ReleaseStep::Push => "push",
            ReleaseStep::Tag => "tag",
            ReleaseStep::PushTag => "push-tag",
        };
        f.write_str(id)
    }
}

/// Outcome of a successful release
#[derive(Debug, Clone)]
pub struct Release {
    pub version: Version,
    pub tag: String,
    pub pipeline: Pipeline<ReleaseStep>,
}

/// Release orchestrator
pub struct ReleasePipeline {
    config: Config,
    runtime: Runtime,
}

impl ReleasePipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            runtime: Runtime::default(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.runtime.set_logger(logger);
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runtime.set_runner(runner);
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.runtime.add_event_handler(handler);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Exit behavior after a failed release; reporting only by default
    pub fn failure_policy(&self) -> FailurePolicy {
        self.config.failure_policy.unwrap_or(FailurePolicy::Report)
    }

    /// The steps a run will go through
    pub fn plan(&self) -> Pipeline<ReleaseStep> {
        let hooks = &self.config.hooks;
        let mut pipeline = Pipeline::new("release");
        pipeline.push(ReleaseStep::CheckoutMain);
        pipeline.push(ReleaseStep::SyncMain);
        pipeline.push_if(ReleaseStep::Lint, hooks.contains(Hook::Lint), "no lint task");
        pipeline.push_if(
            ReleaseStep::BeforeVersionUpdate,
            hooks.contains(Hook::BeforeVersionUpdate),
            "no before_version_update task",
        );
        pipeline.push(ReleaseStep::UpdateVersion);
        pipeline.push_if(
            ReleaseStep::AfterVersionUpdate,
            hooks.contains(Hook::AfterVersionUpdate),
            "no after_version_update task",
        );
        pipeline.push_if(ReleaseStep::Build, hooks.contains(Hook::Build), "no build task");
        pipeline.push(ReleaseStep::Commit);
        pipeline.push(ReleaseStep::Push);
        pipeline.push(ReleaseStep::Tag);
        pipeline.push(ReleaseStep::PushTag);
        pipeline
    }

    fn validate(&self, version_arg: &str) -> Result<(PathBuf, VersionArg), ValidationError> {
        let working_dir = self.config.validated_working_dir()?.to_path_buf();
        let arg = version_arg.parse::<VersionArg>()?;
        Ok((working_dir, arg))
    }

    /// Release the next version described by `version_arg`
    ///
    /// `version_arg` is `major`, `minor`, `patch` or an explicit version.
    /// Validation errors are returned before anything is executed; any
    /// later failure checks out the main branch again before returning.
    pub async fn run(&self, version_arg: &str) -> Result<Release, PipelineError> {
        let logger = self.runtime.logger();
        let (working_dir, arg) = self.validate(version_arg).map_err(|e| {
            logger.error(&e.to_string());
            PipelineError::from(e)
        })?;

        let manifest_path = self.config.manifest_file(&working_dir);
        let mut run = ReleaseRun {
            ctx: RunContext::new(&self.config, working_dir, &self.runtime),
            manifest_path,
            arg,
            planned: None,
        };

        let mut pipeline = self.plan();
        self.runtime.engine().execute(&mut pipeline, &mut run).await?;

        let planned = run.planned().await?;
        logger.info(&format!("Version {} released with success!", planned.version));
        Ok(Release {
            version: planned.version,
            tag: planned.tag,
            pipeline,
        })
    }
}

/// Version and tag a run is releasing
#[derive(Debug, Clone)]
struct Planned {
    name: Option<String>,
    version: Version,
    tag: String,
}

struct ReleaseRun<'a> {
    ctx: RunContext<'a>,
    manifest_path: PathBuf,
    arg: VersionArg,
    planned: Option<Planned>,
}

impl ReleaseRun<'_> {
    /// Resolve the next version on first use, from a fresh manifest read
    async fn planned(&mut self) -> Result<Planned, PipelineError> {
        if let Some(planned) = &self.planned {
            return Ok(planned.clone());
        }

        let manifest = Manifest::read(&self.manifest_path).await?;
        let path = self.manifest_path.display().to_string();
        let current = manifest
            .version()
            .ok_or_else(|| ValidationError::MissingManifestField {
                path: path.clone(),
                field: "version",
            })?;

        let next = self.arg.resolve(current)?;
        if self.ctx.config.strict_versions {
            version::ensure_forward(current, &next)?;
        }
        let tag = self
            .ctx
            .config
            .tag_style
            .tag_name(manifest.name(), &next, &path)?;

        let planned = Planned {
            name: manifest.name().map(str::to_string),
            version: next,
            tag,
        };
        self.planned = Some(planned.clone());
        Ok(planned)
    }

    async fn update_version(&mut self) -> Result<(), PipelineError> {
        let planned = self.planned().await?;
        self.ctx.info("Updating version...");

        let mut manifest = Manifest::read(&self.manifest_path).await?;
        self.ctx.info(&format!(
            "  Current version is {}",
            manifest.version().unwrap_or("unknown")
        ));
        self.ctx.info(&format!("  Next version is {}", planned.version));
        manifest.set_version(planned.version.to_string());
        manifest.write(&self.manifest_path).await?;

        self.ctx.exec(commands::NPM_INSTALL).await
    }

    async fn run_versioned_hook(&mut self, hook: Hook) -> Result<(), PipelineError> {
        let planned = self.planned().await?;
        self.ctx
            .run_hook(hook, planned.name.as_deref(), Some(&planned.version))
            .await
    }
}

#[async_trait]
impl<'a> StepExecutor for ReleaseRun<'a> {
    type Step = ReleaseStep;

    async fn execute(&mut self, step: ReleaseStep) -> Result<(), PipelineError> {
        let branch = self.ctx.config.main_branch.clone();
        let remote = self.ctx.config.remote.clone();

        match step {
            ReleaseStep::CheckoutMain => self.ctx.checkout_main().await,
            ReleaseStep::SyncMain => {
                self.ctx.info(&format!("Updating {} branch...", branch));
                self.ctx.exec(&commands::git_pull(&remote, &branch)).await
            }
            ReleaseStep::Lint => {
                self.ctx.info("Linting project...");
                self.ctx.run_hook(Hook::Lint, None, None).await
            }
            ReleaseStep::BeforeVersionUpdate => {
                self.run_versioned_hook(Hook::BeforeVersionUpdate).await
            }
            ReleaseStep::UpdateVersion => self.update_version().await,
            ReleaseStep::AfterVersionUpdate => {
                self.run_versioned_hook(Hook::AfterVersionUpdate).await
            }
            ReleaseStep::Build => {
                self.ctx.info("Building project...");
                self.run_versioned_hook(Hook::Build).await
            }
            ReleaseStep::Commit => {
                let planned = self.planned().await?;
                self.ctx
                    .info(&format!("Releasing version {} to remote...", planned.version));
                self.ctx.info("Committing files...");
                self.ctx.exec(commands::GIT_ADD_ALL).await?;
                self.ctx
                    .exec(&commands::git_commit(&tag::release_message(&planned.tag)))
                    .await
            }
            ReleaseStep::Push => {
                self.ctx.info("Pushing files to remote...");
                self.ctx.exec(&commands::git_push(&remote, &branch)).await
            }
            ReleaseStep::Tag => {
                let planned = self.planned().await?;
                self.ctx.info(&format!("Creating tag {}...", planned.tag));
                self.ctx.exec(&commands::git_tag(&planned.tag)).await
            }
            ReleaseStep::PushTag => {
                self.ctx.info("Pushing tag to remote...");
                self.ctx.exec(commands::GIT_PUSH_TAGS).await
            }
        }
    }

    async fn rollback(&mut self) -> Result<(), PipelineError> {
        self.ctx.checkout_main().await
    }
}
