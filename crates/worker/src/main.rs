//! `sparsify-worker` -- profile one project from the command line.
//!
//! Runs the loss and performance profiling pipeline against a Sparsify
//! server, logging the pipeline record as it changes. Ctrl-C cancels the
//! running jobs and deletes the profiles created so far.
//!
//! See [`config::WorkerConfig`] for the environment variables.

mod config;

use std::sync::Arc;

use anyhow::Context;
use sparsify_client::SparsifyApi;
use sparsify_pipeline::{Pipeline, PipelineController, TracingObserver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::WorkerConfig;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "sparsify_worker=info,sparsify_client=info,sparsify_pipeline=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().context("Failed to load worker configuration")?;

    tracing::info!(
        api_url = %config.client.api_url,
        project_id = %config.project_id,
        profile_loss = config.profile_loss,
        profile_perf = config.profile_perf,
        "Starting sparsify-worker",
    );

    let service = Arc::new(SparsifyApi::from_config(&config.client));
    let pipeline = Pipeline::new(service)
        .with_poll_config(config.client.poll_config())
        .with_observer(Arc::new(TracingObserver));
    let controller = PipelineController::new(Arc::new(pipeline));

    let mut records = controller.subscribe();
    let reporter = tokio::spawn(async move {
        while records.changed().await.is_ok() {
            let record = records.borrow_and_update().clone();
            tracing::info!(
                status = ?record.status,
                stage = ?record.progress_stage,
                percent = ?record.progress_value,
                error = ?record.error,
                "Record updated",
            );
        }
    });

    controller.start(config.stages()).await;

    let outcome = tokio::select! {
        result = controller.wait() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    let result = match outcome {
        Some(result) => result,
        None => {
            tracing::warn!("Interrupted, discarding created profiles");
            controller
                .cancel_and_discard()
                .await
                .context("Failed to discard created profiles")?;
            reporter.abort();
            return Ok(());
        }
    };

    reporter.abort();
    let outputs = result.context("Profiling pipeline failed")?;

    tracing::info!(
        outputs = %serde_json::to_string(&outputs)?,
        "Profiling complete",
    );

    Ok(())
}
