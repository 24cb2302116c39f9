use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::input::Observation;

#[derive(Debug, Error)]
pub enum Stage2Error {
    #[error("subject {0} has more than one baseline record")]
    DuplicateBaseline(String),
    #[error("no baseline records found at profile day {0}")]
    NoBaselines(i64),
    #[error("no post-baseline records remain after joining baselines")]
    EmptyJoin,
}

/// A post-baseline observation joined with its subject's baseline value.
#[derive(Debug, Clone)]
pub struct BaselineJoined {
    pub observation: Observation,
    pub baseline: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Stage2Counts {
    pub baselines: usize,
    pub post_baseline: usize,
    pub joined: usize,
    pub subjects_dropped: usize,
}

#[derive(Debug)]
pub struct Stage2Output {
    pub joined: Vec<BaselineJoined>,
    pub counts: Stage2Counts,
}

/// Partition the analysis set into baseline and post-baseline records, then
/// inner-join baselines back by subject. A subject with a duplicate baseline
/// is a hard error; a post-baseline subject with no baseline is dropped with
/// a warning, never silently averaged.
pub fn run_stage2(
    observations: Vec<Observation>,
    baseline_day: i64,
) -> Result<Stage2Output, Stage2Error> {
    let mut baselines: BTreeMap<String, f64> = BTreeMap::new();
    let mut post = Vec::new();

    for obs in observations {
        if obs.profile_day == baseline_day {
            if baselines.insert(obs.subject.clone(), obs.value).is_some() {
                return Err(Stage2Error::DuplicateBaseline(obs.subject));
            }
        } else {
            post.push(obs);
        }
    }

    if baselines.is_empty() {
        return Err(Stage2Error::NoBaselines(baseline_day));
    }

    let post_baseline = post.len();
    let mut dropped: BTreeSet<String> = BTreeSet::new();
    let mut joined = Vec::with_capacity(post_baseline);
    for obs in post {
        match baselines.get(&obs.subject) {
            Some(&baseline) => joined.push(BaselineJoined {
                observation: obs,
                baseline,
            }),
            None => {
                dropped.insert(obs.subject.clone());
            }
        }
    }

    for subject in &dropped {
        tracing::warn!(%subject, "dropping post-baseline records: subject has no baseline");
    }

    if joined.is_empty() {
        return Err(Stage2Error::EmptyJoin);
    }

    let counts = Stage2Counts {
        baselines: baselines.len(),
        post_baseline,
        joined: joined.len(),
        subjects_dropped: dropped.len(),
    };
    tracing::info!(
        baselines = counts.baselines,
        joined = counts.joined,
        subjects_dropped = counts.subjects_dropped,
        "baseline join complete"
    );

    Ok(Stage2Output { joined, counts })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_baseline.rs"]
mod tests;
