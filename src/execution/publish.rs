//! Publish workflow: check out a released tag and push its artifacts

use crate::core::{
    Config, ContainerConfig, FailurePolicy, Hook, Logger, Manifest, Pipeline, PipelineError,
    ValidationError,
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
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    CheckoutTag,
    Lint,
    Build,
    BuildImage,
    TagImage,
    BeforePublish,
    PushImage,
    PublishPackage,
    Publish,
    AfterPublish,
    CheckoutMain,
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            PublishStep::CheckoutTag => "checkout-tag",
            PublishStep::Lint => "lint",
            PublishStep::Build => "build",
            PublishStep::BuildImage => "build-image",
            PublishStep::TagImage => "tag-image",
            PublishStep::BeforePublish => "before-publish",
            PublishStep::PushImage => "push-image",
            PublishStep::PublishPackage => "publish-package",
            PublishStep::Publish => "publish",
            PublishStep::AfterPublish => "after-publish",
            PublishStep::CheckoutMain => "checkout-main",
        };
        f.write_str(id)
    }
}

/// Outcome of a successful publish
#[derive(Debug, Clone)]
pub struct Publication {
    pub name: String,
    pub version: Version,
    pub tag: String,
    pub pipeline: Pipeline<PublishStep>,
}

/// Publish orchestrator
pub struct PublishPipeline {
    config: Config,
    runtime: Runtime,
}

impl PublishPipeline {
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

    /// Exit behavior after a failed publish; exits with 1 by default
    pub fn failure_policy(&self) -> FailurePolicy {
        self.config.failure_policy.unwrap_or(FailurePolicy::Exit)
    }

    pub fn plan(&self) -> Pipeline<PublishStep> {
        let hooks = &self.config.hooks;
        let container = self.config.container.as_ref();
        let registry = container.is_some_and(|c| c.registry.is_some());

        let mut pipeline = Pipeline::new("publish");
        pipeline.push(PublishStep::CheckoutTag);
        pipeline.push_if(PublishStep::Lint, hooks.contains(Hook::Lint), "no lint task");
        pipeline.push_if(PublishStep::Build, hooks.contains(Hook::Build), "no build task");
        pipeline.push_if(PublishStep::BuildImage, container.is_some(), "no container image");
        pipeline.push_if(PublishStep::TagImage, registry, "no container registry");
        pipeline.push_if(
            PublishStep::BeforePublish,
            hooks.contains(Hook::BeforePublish),
            "no before_publish task",
        );
        pipeline.push_if(PublishStep::PushImage, registry, "no container registry");
        pipeline.push_if(PublishStep::PublishPackage, self.config.npm, "npm publishing disabled");
        pipeline.push_if(
            PublishStep::Publish,
            hooks.contains(Hook::Publish),
            "no publish task",
        );
        pipeline.push_if(
            PublishStep::AfterPublish,
            hooks.contains(Hook::AfterPublish),
            "no after_publish task",
        );
        pipeline.push(PublishStep::CheckoutMain);
        pipeline
    }

    fn validate(&self) -> Result<PathBuf, ValidationError> {
        let working_dir = self.config.validated_working_dir()?.to_path_buf();
        if !self.config.has_publish_target() {
            return Err(ValidationError::MissingPublishTarget);
        }
        Ok(working_dir)
    }

    /// Read name and version of the release being published
    async fn read_release(&self, working_dir: &Path) -> Result<Target, PipelineError> {
        let path = self.config.manifest_file(working_dir);
        let manifest = Manifest::read(&path).await?;
        let display = path.display().to_string();
        let missing = |field| ValidationError::MissingManifestField {
            path: display.clone(),
            field,
        };

        let name = manifest.name().ok_or_else(|| missing("name"))?.to_string();
        let current = manifest.version().ok_or_else(|| missing("version"))?;
        let version = Version::parse(current)
            .map_err(|_| ValidationError::InvalidCurrentVersion(current.to_string()))?;
        let tag = self
            .config
            .tag_style
            .tag_name(Some(&name), &version, &display)?;

        Ok(Target { name, version, tag })
    }

    /// Publish the version currently recorded in the manifest
    ///
    /// Nothing is executed when validation or the manifest read fails. A
    /// failure after the tag checkout returns to the main branch once.
    pub async fn run(&self) -> Result<Publication, PipelineError> {
        let logger = self.runtime.logger();
        let working_dir = self.validate().map_err(|e| {
            logger.error(&e.to_string());
            PipelineError::from(e)
        })?;
        let target = self.read_release(&working_dir).await.map_err(|e| {
            logger.error(&e.to_string());
            e
        })?;

        logger.info(&format!("Publishing version {}...", target.version));

        let mut run = PublishRun {
            ctx: RunContext::new(&self.config, working_dir, &self.runtime),
            target: &target,
        };
        let mut pipeline = self.plan();
        self.runtime.engine().execute(&mut pipeline, &mut run).await?;
        drop(run);

        logger.info(&format!("Version {} published with success!", target.version));
        Ok(Publication {
            name: target.name,
            version: target.version,
            tag: target.tag,
            pipeline,
        })
    }
}

struct Target {
    name: String,
    version: Version,
    tag: String,
}

struct PublishRun<'a> {
    ctx: RunContext<'a>,
    target: &'a Target,
}

impl PublishRun<'_> {
    fn container(&self) -> Option<&ContainerConfig> {
        self.ctx.config.container.as_ref()
    }

    async fn run_hook(&self, hook: Hook) -> Result<(), PipelineError> {
        self.ctx
            .run_hook(hook, Some(&self.target.name), Some(&self.target.version))
            .await
    }

    async fn build_image(&self) -> Result<(), PipelineError> {
        let dockerfile = self
            .container()
            .and_then(|c| c.dockerfile.as_deref())
            .map(|path| self.ctx.working_dir.join(path));

        self.ctx.info("Building image...");
        self.ctx
            .exec(&commands::docker_build(&self.target.name, dockerfile.as_deref()))
            .await
    }

    async fn tag_image(&self) -> Result<(), PipelineError> {
        let Some(registry) = self.container().and_then(|c| c.registry.as_ref()) else {
            return Ok(());
        };
        self.ctx.info("Tagging image...");
        let image = registry.image_ref(&self.target.name);
        self.ctx
            .exec(&commands::docker_tag(&self.target.name, &image))
            .await
    }

    async fn push_image(&self) -> Result<(), PipelineError> {
        let Some(registry) = self.container().and_then(|c| c.registry.as_ref()) else {
            return Ok(());
        };
        self.ctx.info("Signing in to the container registry...");
        self.ctx.exec(&commands::registry_login(registry)).await?;
        self.ctx.info("Pushing image to the container registry...");
        self.ctx
            .exec(&commands::docker_push(&registry.image_ref(&self.target.name)))
            .await
    }
}

#[async_trait]
impl<'a> StepExecutor for PublishRun<'a> {
    type Step = PublishStep;

    async fn execute(&mut self, step: PublishStep) -> Result<(), PipelineError> {
        match step {
            PublishStep::CheckoutTag => {
                self.ctx
                    .info(&format!("Checking out the tag {}...", self.target.tag));
                self.ctx.exec(&commands::git_checkout(&self.target.tag)).await
            }
            PublishStep::Lint => {
                self.ctx.info("Linting project...");
                self.run_hook(Hook::Lint).await
            }
            PublishStep::Build => {
                self.ctx.info("Building project...");
                self.run_hook(Hook::Build).await
            }
            PublishStep::BuildImage => self.build_image().await,
            PublishStep::TagImage => self.tag_image().await,
            PublishStep::BeforePublish => self.run_hook(Hook::BeforePublish).await,
            PublishStep::PushImage => self.push_image().await,
            PublishStep::PublishPackage => {
                self.ctx.info("Publishing to npm...");
                self.ctx.exec(commands::NPM_PUBLISH).await
            }
            PublishStep::Publish => self.run_hook(Hook::Publish).await,
            PublishStep::AfterPublish => self.run_hook(Hook::AfterPublish).await,
            PublishStep::CheckoutMain => self.ctx.checkout_main().await,
        }
    }

    async fn rollback(&mut self) -> Result<(), PipelineError> {
        self.ctx.checkout_main().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RegistryConfig, ShellTask};

    #[test]
    fn test_plan_for_npm_only() {
        let config = Config::new().with_working_dir("/tmp").with_npm(true);
        let pipeline = PublishPipeline::new(config).plan();

        assert_eq!(
            pipeline.runnable(),
            vec![
                PublishStep::CheckoutTag,
                PublishStep::PublishPackage,
                PublishStep::CheckoutMain,
            ]
        );
        assert_eq!(pipeline.steps.len(), 11);
    }

    #[test]
    fn test_plan_for_container_with_registry() {
        let container = ContainerConfig::new().with_registry(RegistryConfig::new("reg.example.com", "ns"));
        let config = Config::new()
            .with_working_dir("/tmp")
            .with_container(container)
            .with_task(Hook::AfterPublish, ShellTask::new("./notify.sh"));
        let pipeline = PublishPipeline::new(config).plan();

        assert_eq!(
            pipeline.runnable(),
            vec![
                PublishStep::CheckoutTag,
                PublishStep::BuildImage,
                PublishStep::TagImage,
                PublishStep::PushImage,
                PublishStep::AfterPublish,
                PublishStep::CheckoutMain,
            ]
        );
    }

    #[test]
    fn test_plan_for_image_without_registry() {
        let config = Config::new()
            .with_working_dir("/tmp")
            .with_container(ContainerConfig::new());
        let runnable = PublishPipeline::new(config).plan().runnable();

        assert!(runnable.contains(&PublishStep::BuildImage));
        assert!(!runnable.contains(&PublishStep::TagImage));
        assert!(!runnable.contains(&PublishStep::PushImage));
    }

    #[test]
    fn test_default_failure_policy_exits() {
        let pipeline = PublishPipeline::new(Config::new());
        assert_eq!(pipeline.failure_policy(), FailurePolicy::Exit);
    }

    #[tokio::test]
    async fn test_missing_target_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Arc::new(crate::core::ConsoleLogger::new(false));
        let pipeline = PublishPipeline::new(Config::new().with_working_dir(dir.path())).with_logger(logger);

        let err = pipeline.run().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            ValidationError::MissingPublishTarget.to_string()
        );
    }
}
