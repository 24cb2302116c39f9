use thiserror::Error;

use crate::input::Observation;
use crate::pipeline::stage2_baseline::BaselineJoined;

#[derive(Debug, Error)]
pub enum Stage3Error {
    #[error(
        "cannot derive percent change for subject {subject} at visit {visit}: \
         measured value is zero"
    )]
    ZeroDenominator { subject: String, visit: String },
}

/// Post-baseline observation with its derived change measures. Computed once
/// per run, immutable afterwards.
#[derive(Debug, Clone)]
pub struct DerivedObservation {
    pub observation: Observation,
    pub baseline: f64,
    pub change: f64,
    pub percent_change: f64,
}

/// Derive absolute and percent change from baseline.
///
/// The percent denominator is the CURRENT measured value, not the baseline:
/// percent_change = 100 * (value - baseline) / value. This reproduces the
/// source analysis and is locked in by tests; see DESIGN.md before changing
/// it. A zero measured value would make the result non-finite and is
/// rejected outright.
pub fn run_stage3(joined: Vec<BaselineJoined>) -> Result<Vec<DerivedObservation>, Stage3Error> {
    let mut out = Vec::with_capacity(joined.len());
    for BaselineJoined {
        observation,
        baseline,
    } in joined
    {
        if observation.value == 0.0 {
            return Err(Stage3Error::ZeroDenominator {
                subject: observation.subject,
                visit: observation.visit,
            });
        }
        let change = observation.value - baseline;
        let percent_change = 100.0 * (observation.value - baseline) / observation.value;
        out.push(DerivedObservation {
            observation,
            baseline,
            change,
            percent_change,
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_change.rs"]
mod tests;
