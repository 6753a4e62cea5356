//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall pipeline execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Pipeline has not started
    Pending,
    /// Pipeline is currently running
    Running,
    /// Pipeline completed successfully
    Completed,
    /// A step failed and no rollback has happened yet
    Failed,
    /// A step failed and the main branch was checked out again
    RolledBack,
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    /// Step has not run yet
    Pending,
    /// Step is currently running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Step completed successfully
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step failed and stopped the pipeline
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Step was not configured for this run
    Skipped {
        reason: String,
    },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Completed { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }
}

/// Overall pipeline state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of steps
    pub total_steps: usize,

    /// Number of completed steps
    pub completed_steps: usize,

    /// Number of skipped steps
    pub skipped_steps: usize,
}

impl PipelineState {
    /// Create a new pipeline state
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
            completed_steps: 0,
            skipped_steps: 0,
        }
    }

    /// Mark pipeline as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Mark pipeline as completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark pipeline as failed
    pub fn fail(&mut self) {
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Record a successful rollback after a failure
    pub fn roll_back(&mut self) {
        self.status = ExecutionStatus::RolledBack;
    }

    /// Calculate progress percentage (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        (self.completed_steps + self.skipped_steps) as f64 / self.total_steps as f64
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_state_is_terminal() {
        assert!(!StepState::Pending.is_terminal());
        assert!(!StepState::Running {
            started_at: Utc::now()
        }
        .is_terminal());
        assert!(StepState::Completed {
            started_at: Utc::now(),
            completed_at: Utc::now()
        }
        .is_terminal());
        assert!(StepState::Failed {
            error: "test".to_string(),
            started_at: Utc::now(),
            failed_at: Utc::now()
        }
        .is_terminal());
        assert!(StepState::Skipped {
            reason: "test".to_string()
        }
        .is_terminal());
    }

    #[test]
    fn test_pipeline_progress() {
        let mut state = PipelineState::new();
        state.start(10);
        assert_eq!(state.progress(), 0.0);

        state.completed_steps = 3;
        state.skipped_steps = 2;
        assert_eq!(state.progress(), 0.5);

        state.completed_steps = 8;
        assert_eq!(state.progress(), 1.0);
    }

    #[test]
    fn test_failure_then_rollback() {
        let mut state = PipelineState::new();
        state.start(3);
        state.fail();
        assert_eq!(state.status, ExecutionStatus::Failed);
        assert!(state.completed_at.is_some());

        state.roll_back();
        assert_eq!(state.status, ExecutionStatus::RolledBack);
    }
}
