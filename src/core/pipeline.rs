//! Pipeline domain model
//!
//! A pipeline is a fixed, ordered list of steps. Steps whose hook is not
//! configured are planned as skipped rather than left out, so a run report
//! always shows the whole workflow.

use crate::core::state::{PipelineState, StepState};
use std::fmt;

/// Identifies one step of a workflow
pub trait StepKind: Copy + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> StepKind for T where T: Copy + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// A single planned step
#[derive(Debug, Clone)]
pub struct Step<S> {
    pub kind: S,
    /// Runtime state
    pub state: StepState,
}

/// An ordered workflow of steps
#[derive(Debug, Clone)]
pub struct Pipeline<S> {
    /// Pipeline name
    pub name: String,

    /// Steps in execution order
    pub steps: Vec<Step<S>>,

    /// Execution state
    pub state: PipelineState,
}

impl<S: StepKind> Pipeline<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            state: PipelineState::new(),
        }
    }

    /// Append a step that will run
    pub fn push(&mut self, kind: S) {
        self.steps.push(Step {
            kind,
            state: StepState::Pending,
        });
    }

    /// Append a step that will be skipped
    pub fn push_skipped(&mut self, kind: S, reason: impl Into<String>) {
        self.steps.push(Step {
            kind,
            state: StepState::Skipped {
                reason: reason.into(),
            },
        });
    }

    /// Append `kind` as runnable when `enabled`, skipped otherwise
    pub fn push_if(&mut self, kind: S, enabled: bool, reason: &str) {
        if enabled {
            self.push(kind);
        } else {
            self.push_skipped(kind, reason);
        }
    }

    /// Get a step by kind
    pub fn step(&self, kind: S) -> Option<&Step<S>> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    /// Steps that will run, in order
    pub fn runnable(&self) -> Vec<S> {
        self.steps
            .iter()
            .filter(|s| !matches!(s.state, StepState::Skipped { .. }))
            .map(|s| s.kind)
            .collect()
    }

    /// Steps that completed, in order
    pub fn completed(&self) -> Vec<S> {
        self.steps
            .iter()
            .filter(|s| matches!(s.state, StepState::Completed { .. }))
            .map(|s| s.kind)
            .collect()
    }

    /// The step that stopped the pipeline, if any
    pub fn failed_step(&self) -> Option<&Step<S>> {
        self.steps
            .iter()
            .find(|s| matches!(s.state, StepState::Failed { .. }))
    }

    /// Check if pipeline is complete
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }
}
