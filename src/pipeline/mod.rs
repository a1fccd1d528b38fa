//! Concurrent scan pipeline
//!
//! Producers classify and extract, consumers check liveness. Both stages
//! are fed through bounded queues with a counted shutdown barrier.

pub mod coordinator;

// Re-export commonly used items
pub use coordinator::{Coordinator, PipelineState, PipelineSummary, WorkerSplit};
