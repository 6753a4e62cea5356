//! Main execution engine - drives a planned pipeline to completion or rollback

use crate::core::{ExecutionStatus, Logger, Pipeline, PipelineError, StepKind, StepState};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
    },
    StepStarted {
        step: String,
    },
    StepCompleted {
        step: String,
    },
    StepSkipped {
        step: String,
        reason: String,
    },
    StepFailed {
        step: String,
        error: String,
    },
    RollbackStarted,
    RollbackFinished {
        error: Option<String>,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&ExecutionEvent) + Send + Sync>;

/// Runs the steps of one workflow
///
/// The engine owns ordering, state bookkeeping and the failure policy; the
/// executor owns what each step does.
#[async_trait]
pub trait StepExecutor: Send {
    type Step: StepKind;

    /// Perform one step
    async fn execute(&mut self, step: Self::Step) -> Result<(), PipelineError>;

    /// Best-effort recovery after a failed step
    async fn rollback(&mut self) -> Result<(), PipelineError>;
}

/// Main pipeline execution engine
pub struct ExecutionEngine {
    logger: Arc<dyn Logger>,
    event_handlers: Vec<EventHandler>,
}

impl ExecutionEngine {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    pub fn with_event_handlers(mut self, handlers: impl IntoIterator<Item = EventHandler>) -> Self {
        self.event_handlers.extend(handlers);
        self
    }

    /// Emit an event to all handlers
    fn emit(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Execute the entire pipeline, one step at a time
    ///
    /// The first failing step stops the run: the error is logged, the
    /// executor's rollback runs exactly once, and the step's error is
    /// returned. A rollback failure is logged and otherwise ignored.
    pub async fn execute<X>(
        &self,
        pipeline: &mut Pipeline<X::Step>,
        executor: &mut X,
    ) -> Result<(), PipelineError>
    where
        X: StepExecutor,
    {
        let execution_id = pipeline.state.execution_id;
        info!("Starting pipeline execution: {} ({})", pipeline.name, execution_id);
        self.emit(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
        });

        pipeline.state.start(pipeline.steps.len());

        for index in 0..pipeline.steps.len() {
            let kind = pipeline.steps[index].kind;

            if let StepState::Skipped { reason } = &pipeline.steps[index].state {
                debug!("Skipping step {}: {}", kind, reason);
                pipeline.state.skipped_steps += 1;
                self.emit(ExecutionEvent::StepSkipped {
                    step: kind.to_string(),
                    reason: reason.clone(),
                });
                continue;
            }

            let started_at = Utc::now();
            pipeline.steps[index].state = StepState::Running { started_at };
            self.emit(ExecutionEvent::StepStarted {
                step: kind.to_string(),
            });

            match executor.execute(kind).await {
                Ok(()) => {
                    pipeline.steps[index].state = StepState::Completed {
                        started_at,
                        completed_at: Utc::now(),
                    };
                    pipeline.state.completed_steps += 1;
                    self.emit(ExecutionEvent::StepCompleted {
                        step: kind.to_string(),
                    });
                }
                Err(error) => {
                    let message = error.to_string();
                    pipeline.steps[index].state = StepState::Failed {
                        error: message.clone(),
                        started_at,
                        failed_at: Utc::now(),
                    };
                    pipeline.state.fail();

                    self.logger.error(&message);
                    self.emit(ExecutionEvent::StepFailed {
                        step: kind.to_string(),
                        error: message,
                    });

                    self.roll_back(pipeline, executor).await;

                    self.emit(ExecutionEvent::PipelineCompleted {
                        execution_id,
                        status: pipeline.state.status,
                    });
                    return Err(error);
                }
            }
        }

        pipeline.state.complete();
        info!("Pipeline execution finished: {}", pipeline.name);
        self.emit(ExecutionEvent::PipelineCompleted {
            execution_id,
            status: ExecutionStatus::Completed,
        });

        Ok(())
    }

    async fn roll_back<X>(&self, pipeline: &mut Pipeline<X::Step>, executor: &mut X)
    where
        X: StepExecutor,
    {
        warn!("Rolling back pipeline {}", pipeline.name);
        self.emit(ExecutionEvent::RollbackStarted);

        match executor.rollback().await {
            Ok(()) => {
                pipeline.state.roll_back();
                self.emit(ExecutionEvent::RollbackFinished { error: None });
            }
            Err(error) => {
                let message = format!("Rollback failed: {}", error);
                self.logger.error(&message);
                self.emit(ExecutionEvent::RollbackFinished {
                    error: Some(error.to_string()),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Level, ValidationError};
    use crate::process::CommandError;
    use std::fmt;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Demo {
        First,
        Second,
        Third,
    }

    impl fmt::Display for Demo {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let id = match self {
                Demo::First => "first",
                Demo::Second => "second",
                Demo::Third => "third",
            };
            f.write_str(id)
        }
    }

    #[derive(Default)]
    struct Recorder {
        ran: Vec<Demo>,
        rollbacks: usize,
        fail_on: Option<Demo>,
        fail_rollback: bool,
    }

    #[async_trait]
    impl StepExecutor for Recorder {
        type Step = Demo;

        async fn execute(&mut self, step: Demo) -> Result<(), PipelineError> {
            self.ran.push(step);
            if self.fail_on == Some(step) {
                return Err(CommandError::Failed {
                    command: format!("run {}", step),
                    code: Some(1),
                }
                .into());
            }
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), PipelineError> {
            self.rollbacks += 1;
            if self.fail_rollback {
                return Err(ValidationError::MissingWorkingDir.into());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Errors(Mutex<Vec<String>>);

    impl Logger for Errors {
        fn write(&self, level: Level, text: &str, _plain: bool) {
            if level == Level::Error {
                self.0.lock().unwrap().push(text.to_string());
            }
        }
    }

    fn demo_pipeline() -> Pipeline<Demo> {
        let mut pipeline = Pipeline::new("demo");
        pipeline.push(Demo::First);
        pipeline.push_skipped(Demo::Second, "not configured");
        pipeline.push(Demo::Third);
        pipeline
    }

    #[tokio::test]
    async fn test_runs_steps_in_order_and_skips() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut engine = ExecutionEngine::new(Arc::new(Errors::default()));
        engine.add_event_handler(move |e| sink.lock().unwrap().push(e.clone()));

        let mut pipeline = demo_pipeline();
        let mut executor = Recorder::default();
        engine.execute(&mut pipeline, &mut executor).await.unwrap();

        assert_eq!(executor.ran, vec![Demo::First, Demo::Third]);
        assert_eq!(executor.rollbacks, 0);
        assert_eq!(pipeline.state.status, ExecutionStatus::Completed);
        assert_eq!(pipeline.state.progress(), 1.0);
        assert!(pipeline.is_complete());

        let events = events.lock().unwrap();
        assert!(events.contains(&ExecutionEvent::StepSkipped {
            step: "second".to_string(),
            reason: "not configured".to_string(),
        }));
        assert!(!events.contains(&ExecutionEvent::RollbackStarted));
    }

    #[tokio::test]
    async fn test_failure_stops_and_rolls_back_once() {
        let logger = Arc::new(Errors::default());
        let engine = ExecutionEngine::new(logger.clone());

        let mut pipeline = demo_pipeline();
        let mut executor = Recorder {
            fail_on: Some(Demo::First),
            ..Default::default()
        };
        let result = engine.execute(&mut pipeline, &mut executor).await;

        assert!(matches!(result, Err(PipelineError::Command(_))));
        assert_eq!(executor.ran, vec![Demo::First]);
        assert_eq!(executor.rollbacks, 1);
        assert_eq!(pipeline.state.status, ExecutionStatus::RolledBack);
        assert_eq!(pipeline.failed_step().unwrap().kind, Demo::First);
        assert!(matches!(pipeline.step(Demo::Third).unwrap().state, StepState::Pending));
        assert_eq!(
            *logger.0.lock().unwrap(),
            vec!["Command \"run first\" returned error"]
        );
    }

    #[tokio::test]
    async fn test_rollback_failure_is_logged_not_escalated() {
        let logger = Arc::new(Errors::default());
        let engine = ExecutionEngine::new(logger.clone());

        let mut pipeline = demo_pipeline();
        let mut executor = Recorder {
            fail_on: Some(Demo::Third),
            fail_rollback: true,
            ..Default::default()
        };
        let result = engine.execute(&mut pipeline, &mut executor).await;

        // The original step error is what the caller sees
        assert!(matches!(result, Err(PipelineError::Command(_))));
        assert_eq!(executor.rollbacks, 1);
        assert_eq!(pipeline.state.status, ExecutionStatus::Failed);

        let errors = logger.0.lock().unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[1].starts_with("Rollback failed:"));
    }
}
