//! Weighted multi-stage pipelines over job-backed operations.
//!
//! - [`Pipeline`] -- runs optional [`PipelineStage`]s in order and folds
//!   their progress into one percentage.
//! - [`RecordPublisher`] -- turns pipeline events into a subscribable
//!   [`OperationRecord`](sparsify_core::record::OperationRecord).
//! - [`PipelineController`] -- the `start` / `cancel_and_discard` surface
//!   a UI drives.
//! - [`observer`] -- optional event feed injected into a pipeline.

pub mod composer;
pub mod controller;
pub mod observer;
pub mod publisher;
pub mod stage;

pub use composer::{Pipeline, PipelineError};
pub use controller::PipelineController;
pub use observer::{EventFeed, PipelineEvent, PipelineObserver, TracingObserver};
pub use publisher::RecordPublisher;
pub use stage::{PipelineStage, StageOutput, StageWindow};
