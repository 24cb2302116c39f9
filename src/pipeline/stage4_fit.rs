use thiserror::Error;

use crate::config::ComparisonConfig;
use crate::model::design::{Design, DesignError, DesignRecord, build_design};
use crate::model::lmm::{FittedModel, ModelError, fit_reml};
use crate::pipeline::stage3_change::DerivedObservation;

#[derive(Debug, Error)]
pub enum Stage4Error {
    #[error(transparent)]
    Design(#[from] DesignError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug)]
pub struct Stage4Output {
    pub design: Design,
    pub fit: FittedModel,
}

/// Build the treatment × visit × subgroup design with the baseline covariate
/// and fit the mixed model by REML.
pub fn run_stage4(
    derived: &[DerivedObservation],
    comparison: &ComparisonConfig,
) -> Result<Stage4Output, Stage4Error> {
    let records: Vec<DesignRecord> = derived
        .iter()
        .map(|d| DesignRecord {
            subject: d.observation.subject.clone(),
            visit: d.observation.visit.clone(),
            nominal_time_hr: d.observation.nominal_time_hr,
            treatment: d.observation.treatment.clone(),
            subgroup: d.observation.subgroup,
            baseline: d.baseline,
            value: d.observation.value,
        })
        .collect();

    let design = build_design(&records, &comparison.placebo_arm)?;
    if design.treatment_index(&comparison.active_arm).is_none() {
        return Err(DesignError::UnknownArm(comparison.active_arm.clone()).into());
    }

    tracing::info!(
        observations = design.n_observations(),
        subjects = design.n_subjects(),
        fixed_effects = design.n_fixed_effects(),
        visits = design.visits.len(),
        random_slope = design.with_slope,
        "design built"
    );

    let fit = fit_reml(&design)?;
    Ok(Stage4Output { design, fit })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_fit.rs"]
mod tests;
