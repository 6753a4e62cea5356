//! CLI output formatting

use crate::core::{ExecutionStatus, PipelineState, StepState, TagStyle};
use crate::execution::ExecutionEvent;
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
        ExecutionStatus::RolledBack => style("ROLLED BACK").yellow().to_string(),
    }
}

/// Format how far a pipeline got, counting skipped steps as done
pub fn format_progress(state: &PipelineState) -> String {
    format!(
        "{} Progress: {} ({}/{} completed, {} skipped)",
        INFO,
        style(format!("{:.0}%", state.progress() * 100.0)).cyan(),
        state.completed_steps,
        state.total_steps,
        state.skipped_steps
    )
}

pub fn format_tag_style(tag_style: TagStyle) -> &'static str {
    match tag_style {
        TagStyle::Version => "<version>",
        TagStyle::Prefixed => "<name>-<version>",
    }
}

/// Format an execution event for display
///
/// Step progress is already reported through the logger, so only events
/// the logger does not cover produce a line.
pub fn format_execution_event(event: &ExecutionEvent) -> Option<String> {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
        } => Some(format!(
            "{} Starting {} ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(&execution_id.to_string()[..8]).dim()
        )),
        ExecutionEvent::StepSkipped { step, reason } => Some(format!(
            "  {} {}",
            style(format!("skip {}:", step)).dim(),
            style(reason).dim()
        )),
        ExecutionEvent::RollbackStarted => Some(format!("{} Rolling back...", WARN)),
        ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
        } => {
            let icon = match status {
                ExecutionStatus::Completed => CHECK,
                _ => CROSS,
            };
            Some(format!(
                "{} Pipeline ({}) {}",
                icon,
                style(&execution_id.to_string()[..8]).dim(),
                format_status(*status)
            ))
        }
        ExecutionEvent::StepStarted { .. }
        | ExecutionEvent::StepCompleted { .. }
        | ExecutionEvent::StepFailed { .. }
        | ExecutionEvent::RollbackFinished { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_skipped_steps_are_reported() {
        let line = format_execution_event(&ExecutionEvent::StepSkipped {
            step: "lint".to_string(),
            reason: "no lint task".to_string(),
        })
        .unwrap();

        assert!(line.contains("lint"));
        assert!(line.contains("no lint task"));
    }

    #[test]
    fn test_logged_events_are_silent() {
        let event = ExecutionEvent::StepFailed {
            step: "push".to_string(),
            error: "Command \"git push origin master\" returned error".to_string(),
        };
        assert!(format_execution_event(&event).is_none());
        assert!(format_execution_event(&ExecutionEvent::StepStarted { step: "push".to_string() }).is_none());
    }

    #[test]
    fn test_progress_counts_skipped_steps() {
        let mut state = PipelineState::new();
        state.start(4);
        state.completed_steps = 2;
        state.skipped_steps = 1;

        let line = format_progress(&state);
        assert!(line.contains("75%"), "unexpected: {}", line);
        assert!(line.contains("(2/4 completed, 1 skipped)"));
    }

    #[test]
    fn test_completion_shows_status() {
        let line = format_execution_event(&ExecutionEvent::PipelineCompleted {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::RolledBack,
        })
        .unwrap();

        assert!(line.contains("ROLLED BACK"));
    }
}
