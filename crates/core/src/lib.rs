//! Core domain types for the Sparsify job orchestration client.
//!
//! Everything in this crate is pure data and pure functions: job status
//! values, raw progress payloads and their normalization, closed job and
//! entity kinds, the externally observed [`record::OperationRecord`], and
//! the error taxonomy shared by the client and pipeline crates.

pub mod error;
pub mod job;
pub mod kinds;
pub mod progress;
pub mod record;
pub mod types;
