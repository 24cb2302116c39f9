use serde::Serialize;

pub mod json;
pub mod text;

/// Configuration echoed into the summary so a run is reproducible from its
/// outputs alone.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigEcho {
    pub study: String,
    pub part: String,
    pub compartment: String,
    pub doses: Vec<String>,
    pub baseline_day: i64,
    pub active_arm: String,
    pub placebo_arm: String,
    pub ci_multiplier: f64,
    pub benefit_positive: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageCounts {
    pub rows_read: usize,
    pub rows_in_analysis_set: usize,
    pub baseline_records: usize,
    pub post_baseline_records: usize,
    pub derived_records: usize,
    pub subjects_dropped: usize,
    pub subjects_modeled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceSummary {
    pub residual_sd: f64,
    pub intercept_sd: f64,
    pub slope_sd: Option<f64>,
    pub intercept_slope_corr: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoefficientRow {
    pub name: String,
    pub estimate: f64,
    pub se: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FitSummary {
    pub n_observations: usize,
    pub n_subjects: usize,
    pub n_fixed_effects: usize,
    pub iterations: usize,
    pub reml_deviance: f64,
    pub variance: VarianceSummary,
    pub coefficients: Vec<CoefficientRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmmeanRow {
    pub visit: String,
    pub treatment: String,
    pub subgroup: String,
    pub estimate: f64,
    pub se: f64,
}

/// One row of the contrast table. Not-estimable combinations keep their row
/// with the numeric fields absent so consumers can tell a gap from a zero.
#[derive(Debug, Clone, Serialize)]
pub struct ContrastRow {
    pub visit: String,
    pub subgroup: String,
    pub estimable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub se: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub tool: String,
    pub version: String,
    pub configuration: ConfigEcho,
    pub counts: StageCounts,
    pub fit: FitSummary,
    pub emmeans: Vec<EmmeanRow>,
    pub contrasts: Vec<ContrastRow>,
}

/// Context for the narrative text report.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub active_arm: String,
    pub placebo_arm: String,
    pub counts: StageCounts,
    pub median_percent_change_active: Option<f64>,
    pub median_percent_change_placebo: Option<f64>,
    pub variance: VarianceSummary,
    pub iterations: usize,
    pub contrasts: Vec<ContrastRow>,
    pub ci_multiplier: f64,
    pub benefit_positive: bool,
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn quantile_indexed(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let idx = ((n - 1) as f64 * p).ceil() as usize;
    sorted[idx]
}

pub fn median(values: &[f64]) -> f64 {
    quantile_indexed(values, 0.5)
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
