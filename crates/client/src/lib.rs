//! Sparsify job service client.
//!
//! Provides the [`service::JobService`] contract and its HTTP
//! implementation, the [`poller`] that tracks one job to a terminal state,
//! the [`operation::Orchestrator`] that creates a job-backed entity and
//! follows it to completion, and the best-effort [`discard`] helper used
//! when a caller abandons an entity.
//!
//! The `testing` feature adds `testing::InMemoryJobService`, a scripted
//! in-memory service for downstream tests.

pub mod api;
pub mod config;
pub mod discard;
pub mod operation;
pub mod poller;
pub mod service;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::SparsifyApi;
pub use config::ClientConfig;
pub use discard::cancel_and_discard;
pub use operation::Orchestrator;
pub use poller::{PollConfig, PollOutcome, Poller};
pub use service::{Created, JobService};
