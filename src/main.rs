use anyhow::{Context, Result};
use shipline::cli::commands::{PublishCommand, ReleaseCommand, ValidateCommand};
use shipline::cli::output::*;
use shipline::cli::{exit_code, Cli, Command};
use shipline::core::{ConsoleLogger, Logger, Manifest, Pipeline, StepKind, Workflow};
use shipline::execution::{ExecutionEvent, PublishPipeline, ReleasePipeline};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let code = match &cli.command {
        Command::Release(cmd) => release(&cli, cmd).await?,
        Command::Publish(cmd) => publish(&cli, cmd).await?,
        Command::Validate(cmd) => validate(&cli, cmd).await?,
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn logger(cli: &Cli) -> Arc<dyn Logger> {
    Arc::new(ConsoleLogger::new(!cli.no_color))
}

fn print_event(event: &ExecutionEvent) {
    if let Some(line) = format_execution_event(event) {
        println!("{}", line);
    }
}

fn print_steps<S: StepKind>(pipeline: &Pipeline<S>) {
    println!("{}", format_progress(&pipeline.state));
    for step in &pipeline.steps {
        println!(
            "  {:<24} {}",
            style(step.kind.to_string()).cyan(),
            format_step_state(&step.state)
        );
    }
}

async fn release(cli: &Cli, cmd: &ReleaseCommand) -> Result<i32> {
    let mut config = cli.config_for(Workflow::Release)?;
    if cmd.strict {
        config = config.with_strict_versions(true);
    }

    let mut pipeline = ReleasePipeline::new(config).with_logger(logger(cli));
    pipeline.add_event_handler(print_event);

    let result = pipeline.run(&cmd.version).await;
    if let Ok(release) = &result {
        if cli.verbose {
            print_steps(&release.pipeline);
        }
    }

    Ok(exit_code(&result, pipeline.failure_policy()))
}

async fn publish(cli: &Cli, cmd: &PublishCommand) -> Result<i32> {
    let mut config = cli.config_for(Workflow::Publish)?;
    if cmd.npm {
        config = config.with_npm(true);
    }

    let mut pipeline = PublishPipeline::new(config).with_logger(logger(cli));
    pipeline.add_event_handler(print_event);

    let result = pipeline.run().await;
    if let Ok(publication) = &result {
        if cli.verbose {
            print_steps(&publication.pipeline);
        }
    }

    Ok(exit_code(&result, pipeline.failure_policy()))
}

async fn validate(cli: &Cli, cmd: &ValidateCommand) -> Result<i32> {
    println!("{} Validating project...", INFO);

    let working_dir = cli.working_dir()?;
    let project = match cli.load_project(&working_dir) {
        Ok(project) => project,
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            return Ok(1);
        }
    };

    let config = cli.apply_overrides(project.to_config(&working_dir, Workflow::Publish));
    if let Err(e) = config.validated_working_dir() {
        println!("{} Validation failed:", CROSS);
        println!("  {}", style(e).red());
        return Ok(1);
    }

    println!("{} Project configuration is valid!", CHECK);
    println!("  Working dir: {}", style(working_dir.display()).bold());
    println!(
        "  Main branch: {} on {}",
        style(&config.main_branch).cyan(),
        style(&config.remote).cyan()
    );
    println!("  Tags: {}", style(format_tag_style(config.tag_style)).cyan());
    println!("  Tasks: {}", style(project.task_count()).cyan());

    let mut targets = Vec::new();
    if config.container.is_some() {
        targets.push("container");
    }
    if config.npm {
        targets.push("npm");
    }
    if config.hooks.contains(shipline::Hook::Publish) {
        targets.push("custom");
    }
    if targets.is_empty() {
        println!("  {} No publish target configured", WARN);
    } else {
        println!("  Publish targets: {}", style(targets.join(", ")).cyan());
    }

    let manifest_path = config.manifest_file(&working_dir);
    match Manifest::read(&manifest_path).await {
        Ok(manifest) => println!(
            "  Manifest: {} {}",
            style(manifest.name().unwrap_or("<unnamed>")).bold(),
            style(manifest.version().unwrap_or("<no version>")).dim()
        ),
        Err(e) => println!("  {} {}", WARN, e),
    }

    if cmd.json {
        let json = serde_json::to_string_pretty(&project)?;
        println!("\n{}", json);
    }

    Ok(0)
}
