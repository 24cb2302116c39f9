/// Row filters selecting the analysis set. All values are caller-supplied;
/// nothing here is specific to a particular study.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub study: String,
    pub part: String,
    pub compartment: String,
    pub doses: Vec<String>,
    /// Profile day identifying the baseline record for each subject.
    pub baseline_day: i64,
}

impl FilterConfig {
    pub fn matches_dose(&self, dose: &str) -> bool {
        self.doses.iter().any(|d| d == dose)
    }
}

/// Treatment comparison settings for the contrast stage.
#[derive(Debug, Clone)]
pub struct ComparisonConfig {
    pub active_arm: String,
    pub placebo_arm: String,
    /// Multiplier for the confidence bounds, 1.96 for an approximate 95% interval.
    pub ci_multiplier: f64,
    /// When true the stored contrast is the negated active-minus-placebo
    /// difference, so that a positive value means greater weight reduction
    /// under the active arm.
    pub benefit_positive: bool,
}

impl ComparisonConfig {
    pub fn new(active_arm: &str, placebo_arm: &str) -> Self {
        Self {
            active_arm: active_arm.to_string(),
            placebo_arm: placebo_arm.to_string(),
            ci_multiplier: 1.96,
            benefit_positive: true,
        }
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/config.rs"]
mod tests;
