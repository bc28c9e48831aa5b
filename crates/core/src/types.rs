/// Server-assigned identifier of an asynchronous job.
pub type JobId = String;

/// Identifier of the project that owns every job-backed entity.
pub type ProjectId = String;

/// Identifier of a job-backed entity (profile, benchmark, optimization).
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
