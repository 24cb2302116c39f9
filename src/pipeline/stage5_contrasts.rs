use crate::config::ComparisonConfig;
use crate::model::design::{Design, DesignError};
use crate::model::emmeans::{
    ContrastValue, EstimatedMean, TreatmentContrast, estimated_marginal_means,
    treatment_contrasts,
};
use crate::model::lmm::FittedModel;

#[derive(Debug)]
pub struct Stage5Output {
    pub emmeans: Vec<EstimatedMean>,
    pub contrasts: Vec<TreatmentContrast>,
}

/// Estimated marginal means for every observed cell plus the active-vs-placebo
/// contrast table over the full visit × subgroup grid.
pub fn run_stage5(
    design: &Design,
    fit: &FittedModel,
    comparison: &ComparisonConfig,
) -> Result<Stage5Output, DesignError> {
    let emmeans = estimated_marginal_means(design, fit);
    let contrasts = treatment_contrasts(design, fit, comparison)?;

    let estimable = contrasts
        .iter()
        .filter(|c| !matches!(c.value, ContrastValue::NotEstimable))
        .count();
    tracing::info!(
        contrasts = contrasts.len(),
        estimable,
        "contrast table computed"
    );

    Ok(Stage5Output { emmeans, contrasts })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_contrasts.rs"]
mod tests;
