//! Worker configuration.

use sparsify_client::config::{ClientConfig, ConfigError};
use sparsify_core::kinds::{CreateParams, JobKind};
use sparsify_core::types::ProjectId;
use sparsify_pipeline::PipelineStage;

/// Batch size used for performance profiles unless overridden.
const DEFAULT_PERF_BATCH_SIZE: u32 = 1;

/// Everything the worker needs to profile one project.
///
/// | Env Var           | Required | Default |
/// |-------------------|----------|---------|
/// | `PROJECT_ID`      | yes      | --      |
/// | `PROFILE_LOSS`    | no       | `true`  |
/// | `PROFILE_PERF`    | no       | `true`  |
/// | `LOSS_WEIGHT`     | no       | `1`     |
/// | `PERF_WEIGHT`     | no       | `1`     |
/// | `PERF_BATCH_SIZE` | no       | `1`     |
/// | `PERF_CORE_COUNT` | no       | --      |
///
/// Client variables are documented on [`ClientConfig::from_env`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub client: ClientConfig,
    pub project_id: ProjectId,
    pub profile_loss: bool,
    pub profile_perf: bool,
    pub loss_weight: f64,
    pub perf_weight: f64,
    pub perf_batch_size: u32,
    pub perf_core_count: Option<u32>,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, WorkerConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, WorkerConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client = ClientConfig::from_lookup(&lookup)?;

        let project_id = lookup("PROJECT_ID")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(WorkerConfigError::Missing("PROJECT_ID"))?;

        Ok(Self {
            client,
            project_id,
            profile_loss: parse_or(&lookup, "PROFILE_LOSS", true, parse_bool)?,
            profile_perf: parse_or(&lookup, "PROFILE_PERF", true, parse_bool)?,
            loss_weight: parse_or(&lookup, "LOSS_WEIGHT", 1.0, |v| v.parse().ok())?,
            perf_weight: parse_or(&lookup, "PERF_WEIGHT", 1.0, |v| v.parse().ok())?,
            perf_batch_size: parse_or(&lookup, "PERF_BATCH_SIZE", DEFAULT_PERF_BATCH_SIZE, |v| {
                v.parse().ok()
            })?,
            perf_core_count: match lookup("PERF_CORE_COUNT") {
                Some(raw) => Some(raw.trim().parse().map_err(|_| WorkerConfigError::Invalid {
                    var: "PERF_CORE_COUNT",
                    value: raw.clone(),
                })?),
                None => None,
            },
        })
    }

    /// The loss-then-performance profiling pipeline for this project.
    pub fn stages(&self) -> Vec<PipelineStage> {
        let loss = CreateParams::new(JobKind::LossProfile, self.project_id.as_str());

        let mut perf_body = serde_json::json!({ "batch_size": self.perf_batch_size });
        if let Some(core_count) = self.perf_core_count {
            perf_body["core_count"] = core_count.into();
        }
        let perf = CreateParams::new(JobKind::PerfProfile, self.project_id.as_str())
            .with_body(perf_body);

        vec![
            PipelineStage::new(loss)
                .enabled(self.profile_loss)
                .with_weight(self.loss_weight),
            PipelineStage::new(perf)
                .enabled(self.profile_perf)
                .with_weight(self.perf_weight),
        ]
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<F, T, P>(
    lookup: &F,
    var: &'static str,
    default: T,
    parse: P,
) -> Result<T, WorkerConfigError>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    match lookup(var) {
        Some(raw) => parse(raw.trim()).ok_or(WorkerConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value: '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error(transparent)]
    Client(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn project_id_is_required() {
        let err = WorkerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.to_string(), "PROJECT_ID environment variable is required");
    }

    #[test]
    fn defaults_enable_both_profiles() {
        let config = WorkerConfig::from_lookup(lookup(&[("PROJECT_ID", "p1")])).unwrap();
        assert!(config.profile_loss && config.profile_perf);

        let stages = config.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].params.kind, JobKind::LossProfile);
        assert_eq!(stages[1].params.kind, JobKind::PerfProfile);
        assert_eq!(stages[1].params.body, serde_json::json!({"batch_size": 1}));
    }

    #[test]
    fn flags_and_weights_are_parsed() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("PROJECT_ID", "p1"),
            ("PROFILE_LOSS", "false"),
            ("PERF_WEIGHT", "3"),
            ("PERF_CORE_COUNT", "8"),
        ]))
        .unwrap();

        let stages = config.stages();
        assert!(!stages[0].enabled);
        assert_eq!(stages[1].weight, 3.0);
        assert_eq!(stages[1].params.body["core_count"], 8);
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let err = WorkerConfig::from_lookup(lookup(&[("PROJECT_ID", "p1"), ("PROFILE_PERF", "maybe")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "PROFILE_PERF has an invalid value: 'maybe'");
    }

    #[test]
    fn client_errors_pass_through() {
        let err = WorkerConfig::from_lookup(lookup(&[("PROJECT_ID", "p1"), ("POLL_INTERVAL_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, WorkerConfigError::Client(_)));
    }
}
