//! Pipeline execution: the generic engine and the two workflows built on it

pub mod commands;
pub mod context;
pub mod engine;
pub mod publish;
pub mod release;

pub use context::Runtime;
pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent, StepExecutor};
pub use publish::{Publication, PublishPipeline, PublishStep};
pub use release::{Release, ReleasePipeline, ReleaseStep};
