//! REST API client for the Sparsify job service.
//!
//! Wraps the job, creation and entity endpoints using [`reqwest`] and
//! implements [`JobService`] on top of them.

use async_trait::async_trait;
use serde::Deserialize;
use sparsify_core::error::ServiceError;
use sparsify_core::job::JobHandle;
use sparsify_core::kinds::{CreateParams, Entity, EntityKind, EntityRef, JobKind};

use crate::config::ClientConfig;
use crate::service::{Created, JobService};

/// HTTP client for one Sparsify server.
pub struct SparsifyApi {
    client: reqwest::Client,
    api_url: String,
}

/// Envelope returned by the job endpoints.
#[derive(Debug, Deserialize)]
struct JobEnvelope {
    job: JobHandle,
}

impl SparsifyApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL including the API prefix, e.g.
    ///   `http://host:5543/api`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Translate a non-success response into [`ServiceError::Server`],
    /// pulling the message out of the JSON error body when there is one.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ServiceError::Server {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body.
    async fn parse_json(response: reqwest::Response) -> Result<serde_json::Value, ServiceError> {
        let response = Self::ensure_success(response).await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn parse_job(response: reqwest::Response) -> Result<JobHandle, ServiceError> {
        let body = Self::parse_json(response).await?;
        let envelope: JobEnvelope =
            serde_json::from_value(body).map_err(|e| ServiceError::Decode(e.to_string()))?;
        Ok(envelope.job)
    }
}

#[async_trait]
impl JobService for SparsifyApi {
    async fn create_operation(&self, params: &CreateParams) -> Result<Created, ServiceError> {
        let response = self
            .client
            .post(self.url(&create_path(params.kind, &params.project_id)))
            .json(&params.body)
            .send()
            .await
            .map_err(transport)?;

        let mut body = Self::parse_json(response).await?;
        let kind = params.kind.entity_kind();
        let entity = take_entity(&mut body, kind, &params.project_id)?;
        let job = body
            .get_mut("job")
            .map(serde_json::Value::take)
            .ok_or_else(|| ServiceError::Decode("response is missing the `job` field".into()))?;
        let job: JobHandle =
            serde_json::from_value(job).map_err(|e| ServiceError::Decode(e.to_string()))?;

        tracing::info!(
            kind = %params.kind,
            project_id = %params.project_id,
            entity_id = %entity.reference.id,
            job_id = %job.job_id,
            "Operation created",
        );

        Ok(Created { entity, job })
    }

    async fn get_job(&self, job_id: &str) -> Result<JobHandle, ServiceError> {
        let response = self
            .client
            .get(self.url(&format!("/jobs/{job_id}")))
            .send()
            .await
            .map_err(transport)?;

        Self::parse_job(response).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<JobHandle, ServiceError> {
        let response = self
            .client
            .post(self.url(&format!("/jobs/{job_id}/cancel")))
            .send()
            .await
            .map_err(transport)?;

        Self::parse_job(response).await
    }

    async fn get_entity(&self, entity: &EntityRef) -> Result<Entity, ServiceError> {
        let response = self
            .client
            .get(self.url(&entity_path(entity)))
            .send()
            .await
            .map_err(transport)?;

        let mut body = Self::parse_json(response).await?;
        take_entity(&mut body, entity.kind, &entity.project_id)
    }

    async fn delete_entity(&self, entity: &EntityRef) -> Result<(), ServiceError> {
        let response = self
            .client
            .delete(self.url(&entity_path(entity)))
            .send()
            .await
            .map_err(transport)?;

        Self::ensure_success(response).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Collection segment under `/projects/{project_id}` for an entity kind.
fn collection(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Model => "model",
        EntityKind::PerfProfile => "perf-profiles",
        EntityKind::LossProfile => "loss-profiles",
        EntityKind::Benchmark => "benchmarks",
        EntityKind::Optimization => "optim",
    }
}

/// Path of the creation endpoint for a job kind.
pub fn create_path(kind: JobKind, project_id: &str) -> String {
    match kind {
        JobKind::ModelUpload => format!("/projects/{project_id}/model/upload-from-path"),
        JobKind::ModelAnalysis => format!("/projects/{project_id}/model/analysis"),
        _ => format!(
            "/projects/{project_id}/{}",
            collection(kind.entity_kind())
        ),
    }
}

/// Path of an entity's resource. The model is a per-project singleton and
/// has no id segment.
pub fn entity_path(entity: &EntityRef) -> String {
    match entity.kind {
        EntityKind::Model => format!("/projects/{}/model", entity.project_id),
        kind => format!(
            "/projects/{}/{}/{}",
            entity.project_id,
            collection(kind),
            entity.id
        ),
    }
}

// ---------------------------------------------------------------------------
// Decoding helpers
// ---------------------------------------------------------------------------

fn transport(e: reqwest::Error) -> ServiceError {
    ServiceError::Transport(e.to_string())
}

/// Pull an entity out of its kind-specific envelope.
fn take_entity(
    body: &mut serde_json::Value,
    kind: EntityKind,
    project_id: &str,
) -> Result<Entity, ServiceError> {
    let key = kind.envelope_key();
    let inner = body
        .get_mut(key)
        .map(serde_json::Value::take)
        .ok_or_else(|| ServiceError::Decode(format!("response is missing the `{key}` field")))?;

    Entity::from_body(kind, project_id, inner).ok_or_else(|| {
        ServiceError::Decode(format!("{kind} is missing its `{}` field", kind.id_field()))
    })
}

/// Extract the server-supplied message from an error body.
///
/// Looks for `error_message`, then `message`, then `error`; falls back to
/// the raw body when it is not JSON or carries none of them.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["error_message", "message", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_paths_per_kind() {
        assert_eq!(
            create_path(JobKind::ModelUpload, "p1"),
            "/projects/p1/model/upload-from-path"
        );
        assert_eq!(
            create_path(JobKind::ModelAnalysis, "p1"),
            "/projects/p1/model/analysis"
        );
        assert_eq!(create_path(JobKind::PerfProfile, "p1"), "/projects/p1/perf-profiles");
        assert_eq!(create_path(JobKind::LossProfile, "p1"), "/projects/p1/loss-profiles");
        assert_eq!(create_path(JobKind::Benchmark, "p1"), "/projects/p1/benchmarks");
        assert_eq!(create_path(JobKind::Optimization, "p1"), "/projects/p1/optim");
    }

    #[test]
    fn entity_paths() {
        let profile = EntityRef::new(EntityKind::PerfProfile, "p1", "pp1");
        assert_eq!(entity_path(&profile), "/projects/p1/perf-profiles/pp1");

        let model = EntityRef::new(EntityKind::Model, "p1", "m1");
        assert_eq!(entity_path(&model), "/projects/p1/model");
    }

    #[test]
    fn error_message_prefers_error_message_field() {
        let body = r#"{"error_code": 400, "error_message": "bad project", "error_type": "ValidationError"}"#;
        assert_eq!(error_message(body), "bad project");
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
        assert_eq!(error_message(r#"{"detail": 1}"#), r#"{"detail": 1}"#);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let api = SparsifyApi::new("http://localhost:5543/api/");
        assert_eq!(api.api_url(), "http://localhost:5543/api");
    }

    #[test]
    fn envelope_is_unwrapped() {
        let mut body = serde_json::json!({"benchmark": {"benchmark_id": "b1"}});
        let entity = take_entity(&mut body, EntityKind::Benchmark, "p1").unwrap();
        assert_eq!(entity.reference.id, "b1");
    }

    #[test]
    fn missing_envelope_is_a_decode_error() {
        let mut body = serde_json::json!({"profile": {"profile_id": "x"}});
        let err = take_entity(&mut body, EntityKind::Optimization, "p1").unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }
}
