//! Pipeline stages and their progress windows.
//!
//! Each enabled stage owns a slice of the pipeline's 0-100 range sized by
//! its weight relative to the other enabled stages. A stage's own
//! percentage is rescaled into that slice by [`StageWindow::scale`].

use serde::{Deserialize, Serialize};
use sparsify_core::kinds::{CreateParams, Entity};

/// One optional operation in a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStage {
    /// Label reported as the record's `progress_stage`.
    pub name: String,
    /// Disabled stages are skipped without emitting any event.
    pub enabled: bool,
    /// Relative share of the pipeline's progress range.
    pub weight: f64,
    pub params: CreateParams,
}

impl PipelineStage {
    /// An enabled stage of weight 1, named after its job kind.
    pub fn new(params: CreateParams) -> Self {
        Self {
            name: params.kind.label().to_string(),
            enabled: true,
            weight: 1.0,
            params,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// An entity produced by one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub stage: String,
    pub entity: Entity,
}

/// The slice of the pipeline's percentage range allotted to one stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageWindow {
    /// Pipeline percentage at which the stage starts.
    pub start: f64,
    /// Width of the stage's slice, in pipeline percentage points.
    pub span: f64,
}

impl StageWindow {
    /// Rescale a stage percentage into the pipeline range. Unknown
    /// progress stays unknown.
    pub fn scale(&self, stage_pct: Option<f64>) -> Option<f64> {
        stage_pct.map(|p| self.start + p * self.span / 100.0)
    }
}

/// Compute windows for the enabled stages, in order.
///
/// Returns the index of each enabled stage alongside its window. With
/// equal weights the k-th of M enabled stages starts at `(k-1)/M*100`
/// and spans `100/M`.
pub fn plan_windows(stages: &[PipelineStage]) -> Vec<(usize, StageWindow)> {
    let total: f64 = stages
        .iter()
        .filter(|s| s.enabled)
        .map(|s| s.weight)
        .sum();

    let mut start = 0.0;
    stages
        .iter()
        .enumerate()
        .filter(|(_, s)| s.enabled)
        .map(|(index, stage)| {
            let span = stage.weight / total * 100.0;
            let window = StageWindow { start, span };
            start += span;
            (index, window)
        })
        .collect()
}
