use ndarray::Array1;

use crate::config::ComparisonConfig;
use crate::input::Subgroup;
use crate::model::design::{Design, DesignError};
use crate::model::lmm::FittedModel;

/// Model-predicted average response for one treatment × visit × subgroup
/// cell, with the baseline covariate held at its grand mean.
#[derive(Debug, Clone)]
pub struct EstimatedMean {
    pub visit: String,
    pub treatment: String,
    pub subgroup: Subgroup,
    pub estimate: f64,
    pub se: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContrastValue {
    Estimable {
        estimate: f64,
        se: f64,
        lower: f64,
        upper: f64,
    },
    /// The active or placebo cell has no observations. A gap in the design,
    /// not an error, and distinct from a zero effect.
    NotEstimable,
}

/// Active-vs-placebo difference of marginal means at one visit × subgroup.
#[derive(Debug, Clone)]
pub struct TreatmentContrast {
    pub visit: String,
    pub subgroup: Subgroup,
    pub value: ContrastValue,
}

pub fn estimated_marginal_means(design: &Design, fit: &FittedModel) -> Vec<EstimatedMean> {
    let mut out = Vec::with_capacity(design.cell_columns.len());
    for &(v, t, g) in design.cell_columns.keys() {
        let row = prediction_row(design, v, t, g);
        let (estimate, se) = linear_estimate(fit, &row);
        out.push(EstimatedMean {
            visit: design.visits[v].clone(),
            treatment: design.treatments[t].clone(),
            subgroup: design.subgroups[g],
            estimate,
            se,
        });
    }
    out
}

/// One contrast per visit × subgroup combination. The stored estimate is the
/// negated active-minus-placebo difference when `benefit_positive` is set, so
/// a positive value means greater weight reduction under the active arm; the
/// negation is a reporting convention of the source analysis, not a
/// processing step.
pub fn treatment_contrasts(
    design: &Design,
    fit: &FittedModel,
    config: &ComparisonConfig,
) -> Result<Vec<TreatmentContrast>, DesignError> {
    let active = design
        .treatment_index(&config.active_arm)
        .ok_or_else(|| DesignError::UnknownArm(config.active_arm.clone()))?;
    let placebo = design
        .treatment_index(&config.placebo_arm)
        .ok_or_else(|| DesignError::UnknownArm(config.placebo_arm.clone()))?;

    let mut out = Vec::new();
    for v in 0..design.visits.len() {
        for (g, &subgroup) in design.subgroups.iter().enumerate() {
            let value = if design.cell_observed((v, active, g))
                && design.cell_observed((v, placebo, g))
            {
                let diff = &prediction_row(design, v, active, g)
                    - &prediction_row(design, v, placebo, g);
                let (raw, se) = linear_estimate(fit, &diff);
                let estimate = if config.benefit_positive { -raw } else { raw };
                ContrastValue::Estimable {
                    estimate,
                    se,
                    lower: estimate - config.ci_multiplier * se,
                    upper: estimate + config.ci_multiplier * se,
                }
            } else {
                tracing::warn!(
                    visit = %design.visits[v],
                    subgroup = %subgroup,
                    "contrast not estimable: unobserved treatment cell"
                );
                ContrastValue::NotEstimable
            };
            out.push(TreatmentContrast {
                visit: design.visits[v].clone(),
                subgroup,
                value,
            });
        }
    }
    Ok(out)
}

fn prediction_row(design: &Design, v: usize, t: usize, g: usize) -> Array1<f64> {
    let mut row = Array1::<f64>::zeros(design.n_fixed_effects());
    row[design.baseline_column] = design.baseline_mean;
    for &(visit, col) in &design.baseline_visit_columns {
        if visit == v {
            row[col] = design.baseline_mean;
        }
    }
    if let Some(&col) = design.cell_columns.get(&(v, t, g)) {
        row[col] = 1.0;
    }
    row
}

/// Point estimate and delta-method standard error of xᵀβ.
fn linear_estimate(fit: &FittedModel, x: &Array1<f64>) -> (f64, f64) {
    let estimate = x.dot(&fit.beta);
    let variance = x.dot(&fit.beta_cov.dot(x));
    (estimate, variance.max(0.0).sqrt())
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/emmeans.rs"]
mod tests;
