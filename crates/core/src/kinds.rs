//! Closed job and entity kinds.
//!
//! Every long-running operation the client can start is a [`JobKind`];
//! each one produces exactly one job-backed [`EntityKind`]. Entities are
//! addressed by an [`EntityRef`] and carried around as an [`Entity`]
//! holding the server's JSON body.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::job::JobHandle;
use crate::types::{EntityId, JobId, ProjectId};

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// A server-side resource that is backed by an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// The project's model (one per project).
    Model,
    /// A performance profile.
    PerfProfile,
    /// A loss (sensitivity) profile.
    LossProfile,
    /// A benchmark run.
    Benchmark,
    /// An optimization config.
    Optimization,
}

impl EntityKind {
    /// Key of the JSON envelope the service wraps this entity in.
    pub fn envelope_key(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::PerfProfile | Self::LossProfile => "profile",
            Self::Benchmark => "benchmark",
            Self::Optimization => "optim",
        }
    }

    /// Name of the field holding the entity's id inside its body.
    pub fn id_field(self) -> &'static str {
        match self {
            Self::Model => "model_id",
            Self::PerfProfile | Self::LossProfile => "profile_id",
            Self::Benchmark => "benchmark_id",
            Self::Optimization => "optim_id",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::PerfProfile => "perf_profile",
            Self::LossProfile => "loss_profile",
            Self::Benchmark => "benchmark",
            Self::Optimization => "optimization",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// JobKind
// ---------------------------------------------------------------------------

/// A long-running operation the client can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ModelUpload,
    ModelAnalysis,
    PerfProfile,
    LossProfile,
    Benchmark,
    Optimization,
}

impl JobKind {
    /// The entity kind this operation creates.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            Self::ModelUpload | Self::ModelAnalysis => EntityKind::Model,
            Self::PerfProfile => EntityKind::PerfProfile,
            Self::LossProfile => EntityKind::LossProfile,
            Self::Benchmark => EntityKind::Benchmark,
            Self::Optimization => EntityKind::Optimization,
        }
    }

    /// Human-readable progress label shown while the job runs.
    pub fn label(self) -> &'static str {
        match self {
            Self::ModelUpload => "Uploading Model",
            Self::ModelAnalysis => "Analyzing Model",
            Self::PerfProfile => "Profiling Performance",
            Self::LossProfile => "Profiling Loss",
            Self::Benchmark => "Running Benchmark",
            Self::Optimization => "Creating Optimization",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModelUpload => "model_upload",
            Self::ModelAnalysis => "model_analysis",
            Self::PerfProfile => "perf_profile",
            Self::LossProfile => "loss_profile",
            Self::Benchmark => "benchmark",
            Self::Optimization => "optimization",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Address of a job-backed entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub project_id: ProjectId,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, project_id: impl Into<ProjectId>, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            project_id: project_id.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (project {})", self.kind, self.id, self.project_id)
    }
}

/// A job-backed entity together with the body the service returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub reference: EntityRef,
    pub body: serde_json::Value,
}

impl Entity {
    /// Build an entity from a raw body, reading its id from the kind's
    /// id field.
    ///
    /// The model is a per-project singleton, so a model body without a
    /// `model_id` falls back to the project id. Every other kind must
    /// carry its id; `None` is returned otherwise.
    pub fn from_body(
        kind: EntityKind,
        project_id: impl Into<ProjectId>,
        body: serde_json::Value,
    ) -> Option<Self> {
        let project_id = project_id.into();
        let id = match body.get(kind.id_field()).and_then(|v| v.as_str()) {
            Some(id) => id.to_string(),
            None if kind == EntityKind::Model => project_id.clone(),
            None => return None,
        };

        Some(Self {
            reference: EntityRef {
                kind,
                project_id,
                id,
            },
            body,
        })
    }

    /// Id of the job backing this entity, if the body references one.
    pub fn job_id(&self) -> Option<JobId> {
        self.body
            .get("job_id")
            .and_then(|v| v.as_str())
            .or_else(|| {
                self.body
                    .get("job")
                    .and_then(|job| job.get("job_id"))
                    .and_then(|v| v.as_str())
            })
            .map(str::to_string)
    }

    /// The job snapshot embedded in the body, if any.
    pub fn embedded_job(&self) -> Option<JobHandle> {
        let job = self.body.get("job")?;
        serde_json::from_value(job.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// CreateParams
// ---------------------------------------------------------------------------

/// Parameters for starting a job-backed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
    pub kind: JobKind,
    pub project_id: ProjectId,
    /// Request body forwarded verbatim to the service.
    pub body: serde_json::Value,
}

impl CreateParams {
    /// Create parameters with an empty JSON object body.
    pub fn new(kind: JobKind, project_id: impl Into<ProjectId>) -> Self {
        Self {
            kind,
            project_id: project_id.into(),
            body: serde_json::Value::Object(Default::default()),
        }
    }

    /// Set the request body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = body;
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
