use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array1, Array2};
use thiserror::Error;

use crate::input::Subgroup;

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("empty design: {0}")]
    Empty(String),
    #[error("treatment arm {0:?} not present in the analysis set")]
    UnknownArm(String),
    #[error("subject {subject} has multiple values at visit {visit}")]
    DuplicateCellRow { subject: String, visit: String },
}

/// One post-baseline record prepared for model fitting.
#[derive(Debug, Clone)]
pub struct DesignRecord {
    pub subject: String,
    pub visit: String,
    pub nominal_time_hr: f64,
    pub treatment: String,
    pub subgroup: Subgroup,
    pub baseline: f64,
    pub value: f64,
}

/// (visit index, treatment index, subgroup index).
pub type CellKey = (usize, usize, usize);

/// Fixed- and random-effect design for the mixed model.
///
/// The factorial part is cell-mean coded: one indicator column per observed
/// visit × treatment × subgroup cell, plus the baseline covariate and its
/// per-visit interaction columns. Same span as the intercept + main effects
/// + all two- and three-way interactions parameterization; stays full rank
/// when cells are unobserved.
#[derive(Debug, Clone)]
pub struct Design {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub column_names: Vec<String>,

    pub subjects: Vec<String>,
    pub subject_index: Vec<usize>,
    /// Random-slope covariate per row: the visit's chronological index.
    pub slope_covariate: Vec<f64>,
    /// False when only one post-baseline visit exists; the slope is then
    /// unidentifiable and the random part reduces to an intercept.
    pub with_slope: bool,

    /// Chronological order (by earliest nominal time, then label).
    pub visits: Vec<String>,
    /// Reference (placebo) arm first, remaining arms in label order.
    pub treatments: Vec<String>,
    pub subgroups: Vec<Subgroup>,

    pub cell_columns: BTreeMap<CellKey, usize>,
    pub baseline_mean: f64,
    pub baseline_column: usize,
    /// (visit index, column) for visits after the first.
    pub baseline_visit_columns: Vec<(usize, usize)>,
}

impl Design {
    pub fn n_observations(&self) -> usize {
        self.y.len()
    }

    pub fn n_fixed_effects(&self) -> usize {
        self.x.ncols()
    }

    pub fn n_subjects(&self) -> usize {
        self.subjects.len()
    }

    pub fn treatment_index(&self, arm: &str) -> Option<usize> {
        self.treatments.iter().position(|t| t == arm)
    }

    pub fn subgroup_index(&self, subgroup: Subgroup) -> Option<usize> {
        self.subgroups.iter().position(|&g| g == subgroup)
    }

    pub fn cell_observed(&self, key: CellKey) -> bool {
        self.cell_columns.contains_key(&key)
    }
}

pub fn build_design(records: &[DesignRecord], placebo_arm: &str) -> Result<Design, DesignError> {
    if records.is_empty() {
        return Err(DesignError::Empty(
            "no post-baseline records to fit".to_string(),
        ));
    }

    let visits = visit_order(records);
    let visit_index: BTreeMap<&str, usize> = visits
        .iter()
        .enumerate()
        .map(|(i, v)| (v.as_str(), i))
        .collect();

    let mut arms: BTreeSet<&str> = records.iter().map(|r| r.treatment.as_str()).collect();
    if !arms.remove(placebo_arm) {
        return Err(DesignError::UnknownArm(placebo_arm.to_string()));
    }
    let mut treatments = vec![placebo_arm.to_string()];
    treatments.extend(arms.into_iter().map(|a| a.to_string()));
    let treatment_index: BTreeMap<&str, usize> = treatments
        .iter()
        .enumerate()
        .map(|(i, t)| (t.as_str(), i))
        .collect();

    let observed_groups: BTreeSet<Subgroup> = records.iter().map(|r| r.subgroup).collect();
    let subgroups: Vec<Subgroup> = Subgroup::both()
        .into_iter()
        .filter(|g| observed_groups.contains(g))
        .collect();

    let subject_set: BTreeSet<&str> = records.iter().map(|r| r.subject.as_str()).collect();
    let subjects: Vec<String> = subject_set.iter().map(|s| s.to_string()).collect();
    let subject_lookup: BTreeMap<&str, usize> = subjects
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();

    let mut seen_rows: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut cells: BTreeSet<CellKey> = BTreeSet::new();
    for record in records {
        let v = visit_index[record.visit.as_str()];
        let t = treatment_index[record.treatment.as_str()];
        let g = subgroups
            .iter()
            .position(|&x| x == record.subgroup)
            .expect("subgroup registered above");
        cells.insert((v, t, g));

        let s = subject_lookup[record.subject.as_str()];
        if !seen_rows.insert((s, v)) {
            return Err(DesignError::DuplicateCellRow {
                subject: record.subject.clone(),
                visit: record.visit.clone(),
            });
        }
    }

    let baseline_column = 0usize;
    let mut baseline_visit_columns = Vec::new();
    let mut column_names = vec!["baseline".to_string()];
    for (v, visit) in visits.iter().enumerate().skip(1) {
        baseline_visit_columns.push((v, column_names.len()));
        column_names.push(format!("baseline:{visit}"));
    }
    let mut cell_columns: BTreeMap<CellKey, usize> = BTreeMap::new();
    for &(v, t, g) in &cells {
        cell_columns.insert((v, t, g), column_names.len());
        column_names.push(format!(
            "{}:{}:{}",
            visits[v], treatments[t], subgroups[g]
        ));
    }

    let n = records.len();
    let p = column_names.len();
    let mut x = Array2::<f64>::zeros((n, p));
    let mut y = Array1::<f64>::zeros(n);
    let mut subject_rows = Vec::with_capacity(n);
    let mut slope_covariate = Vec::with_capacity(n);

    let baseline_mean = records.iter().map(|r| r.baseline).sum::<f64>() / n as f64;

    for (row, record) in records.iter().enumerate() {
        let v = visit_index[record.visit.as_str()];
        let t = treatment_index[record.treatment.as_str()];
        let g = subgroups
            .iter()
            .position(|&x| x == record.subgroup)
            .expect("subgroup registered above");

        x[[row, baseline_column]] = record.baseline;
        for &(visit, col) in &baseline_visit_columns {
            if visit == v {
                x[[row, col]] = record.baseline;
            }
        }
        x[[row, cell_columns[&(v, t, g)]]] = 1.0;

        y[row] = record.value;
        subject_rows.push(subject_lookup[record.subject.as_str()]);
        slope_covariate.push(v as f64);
    }

    let with_slope = visits.len() > 1;

    Ok(Design {
        x,
        y,
        column_names,
        subjects,
        subject_index: subject_rows,
        slope_covariate,
        with_slope,
        visits,
        treatments,
        subgroups,
        cell_columns,
        baseline_mean,
        baseline_column,
        baseline_visit_columns,
    })
}

fn visit_order(records: &[DesignRecord]) -> Vec<String> {
    let mut earliest: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        let entry = earliest
            .entry(record.visit.as_str())
            .or_insert(record.nominal_time_hr);
        if record.nominal_time_hr < *entry {
            *entry = record.nominal_time_hr;
        }
    }
    let mut order: Vec<(&str, f64)> = earliest.into_iter().collect();
    order.sort_by(|a, b| match a.1.partial_cmp(&b.1) {
        Some(std::cmp::Ordering::Equal) | None => a.0.cmp(b.0),
        Some(other) => other,
    });
    order.into_iter().map(|(v, _)| v.to_string()).collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/design.rs"]
mod tests;
