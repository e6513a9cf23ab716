use serde::Serialize;
use tracing::info;

use stratum_model::Model;

use crate::encoder::encode_slice;
use crate::error::TranspileError;
use crate::formula::Formula;
use crate::merge;
use crate::propositions::{MergedSliceTranslation, ModelTranslation};

/// Options for a transpilation run.
#[derive(Debug, Clone)]
pub struct TranspileOptions {
    /// Prefix of the per-slice selector namespaces used when merging.
    pub selector_prefix: String,
    /// Ad hoc restriction formulas appended to every slice's propositions.
    pub restrictions: Vec<Formula>,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            selector_prefix: "SL".to_string(),
            restrictions: Vec::new(),
        }
    }
}

/// Aggregate counters over a finished translation.
#[derive(Debug, Clone, Serialize)]
pub struct TranspileStats {
    pub slice_count: usize,
    pub proposition_count: usize,
    pub variable_count: usize,
    pub unknown_feature_count: usize,
}

/// Encode every slice set of a model, in model order.
///
/// Each slice is encoded independently from its own state, so callers that
/// need parallelism can instead call [`crate::encoder::encode_slice`] per
/// slice and collect results in model order; proposition indices within a
/// slice are part of the observable contract either way.
pub fn transpile_model(
    model: &Model,
    options: &TranspileOptions,
) -> Result<ModelTranslation, TranspileError> {
    let mut slices = Vec::with_capacity(model.slice_sets.len());
    for (index, slice_set) in model.slice_sets.iter().enumerate() {
        slices.push(encode_slice(slice_set, index, &options.restrictions)?);
    }
    let translation = ModelTranslation { slices };
    let stats = stats(&translation);
    info!(
        slices = stats.slice_count,
        propositions = stats.proposition_count,
        variables = stats.variable_count,
        "transpiled model"
    );
    Ok(translation)
}

/// Merge a model's per-slice translations into one global formula.
pub fn merge_slices(
    translation: &ModelTranslation,
    options: &TranspileOptions,
) -> MergedSliceTranslation {
    merge::merge(translation, &options.selector_prefix)
}

/// Counters for logging and reporting.
pub fn stats(translation: &ModelTranslation) -> TranspileStats {
    TranspileStats {
        slice_count: translation.slices.len(),
        proposition_count: translation.slices.iter().map(|s| s.propositions.len()).sum(),
        variable_count: translation
            .slices
            .iter()
            .map(|s| s.known_variables.len())
            .sum(),
        unknown_feature_count: translation
            .slices
            .iter()
            .map(|s| s.unknown_features.len())
            .sum(),
    }
}
