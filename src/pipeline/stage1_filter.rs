use std::collections::HashSet;

use crate::config::FilterConfig;
use crate::input::{InputError, Observation};

#[derive(Debug)]
pub struct Stage1Output {
    pub observations: Vec<Observation>,
    pub n_read: usize,
}

/// Restrict the loaded export to the requested analysis set and enforce the
/// one-observation-per-(subject, visit) invariant inside it.
pub fn run_stage1(
    all: Vec<Observation>,
    filter: &FilterConfig,
) -> Result<Stage1Output, InputError> {
    let n_read = all.len();
    let mut kept = Vec::new();
    for obs in all {
        if obs.study == filter.study
            && obs.part == filter.part
            && obs.compartment == filter.compartment
            && filter.matches_dose(&obs.dose)
        {
            kept.push(obs);
        }
    }

    if kept.is_empty() {
        return Err(InputError::Empty(format!(
            "no rows match study={} part={} compartment={} doses={}",
            filter.study,
            filter.part,
            filter.compartment,
            filter.doses.join(",")
        )));
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    for obs in &kept {
        if !seen.insert((obs.subject.clone(), obs.visit.clone())) {
            return Err(InputError::DuplicateObservation {
                subject: obs.subject.clone(),
                visit: obs.visit.clone(),
            });
        }
    }

    tracing::info!(
        kept = kept.len(),
        dropped = n_read - kept.len(),
        "analysis set filtered"
    );

    Ok(Stage1Output {
        observations: kept,
        n_read,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_filter.rs"]
mod tests;
