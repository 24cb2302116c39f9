use super::*;

use crate::model::design::{DesignRecord, build_design};
use crate::model::lmm::fit_reml;

fn record(
    subject: &str,
    visit: &str,
    time: f64,
    treatment: &str,
    subgroup: Subgroup,
    baseline: f64,
    value: f64,
) -> DesignRecord {
    DesignRecord {
        subject: subject.to_string(),
        visit: visit.to_string(),
        nominal_time_hr: time,
        treatment: treatment.to_string(),
        subgroup,
        baseline,
        value,
    }
}

/// Noise-free single-visit dataset where the active arm sits exactly 2.0
/// below placebo at Week 12 in both subgroups.
fn effect_records() -> Vec<DesignRecord> {
    let mut out = Vec::new();
    let mut id = 0;
    for &(arm, effect) in &[("placebo", 0.0), ("active", -2.0)] {
        for &group in &Subgroup::both() {
            for rep in 0..3 {
                id += 1;
                let baseline = 84.0 + (id as f64) * 1.3 + (rep as f64) * 0.2;
                out.push(record(
                    &format!("S{id}"),
                    "Week 12",
                    2016.0,
                    arm,
                    group,
                    baseline,
                    baseline + effect,
                ));
            }
        }
    }
    out
}

#[test]
fn test_emmeans_cover_every_observed_cell() {
    let design = build_design(&effect_records(), "placebo").unwrap();
    let fit = fit_reml(&design).unwrap();
    let means = estimated_marginal_means(&design, &fit);
    assert_eq!(means.len(), design.cell_columns.len());
    for mean in &means {
        assert!(mean.estimate.is_finite());
        assert!(mean.se >= 0.0);
    }
}

#[test]
fn test_benefit_positive_sign_convention() {
    // The generating active-minus-placebo difference is -2.0; the stored
    // contrast must be its negation.
    let design = build_design(&effect_records(), "placebo").unwrap();
    let fit = fit_reml(&design).unwrap();
    let config = ComparisonConfig::new("active", "placebo");
    let contrasts = treatment_contrasts(&design, &fit, &config).unwrap();
    assert_eq!(contrasts.len(), 2);
    for contrast in &contrasts {
        match contrast.value {
            ContrastValue::Estimable { estimate, .. } => {
                assert!((estimate - 2.0).abs() < 1e-5, "stored {estimate}");
            }
            ContrastValue::NotEstimable => panic!("expected estimable contrast"),
        }
    }
}

#[test]
fn test_keep_direction_stores_raw_difference() {
    let design = build_design(&effect_records(), "placebo").unwrap();
    let fit = fit_reml(&design).unwrap();
    let mut config = ComparisonConfig::new("active", "placebo");
    config.benefit_positive = false;
    let contrasts = treatment_contrasts(&design, &fit, &config).unwrap();
    for contrast in &contrasts {
        match contrast.value {
            ContrastValue::Estimable { estimate, .. } => {
                assert!((estimate + 2.0).abs() < 1e-5, "raw {estimate}");
            }
            ContrastValue::NotEstimable => panic!("expected estimable contrast"),
        }
    }
}

#[test]
fn test_confidence_bounds_follow_multiplier() {
    let design = build_design(&effect_records(), "placebo").unwrap();
    let fit = fit_reml(&design).unwrap();
    let mut config = ComparisonConfig::new("active", "placebo");
    config.ci_multiplier = 2.5;
    let contrasts = treatment_contrasts(&design, &fit, &config).unwrap();
    for contrast in &contrasts {
        if let ContrastValue::Estimable {
            estimate,
            se,
            lower,
            upper,
        } = contrast.value
        {
            assert!((lower - (estimate - 2.5 * se)).abs() < 1e-12);
            assert!((upper - (estimate + 2.5 * se)).abs() < 1e-12);
        }
    }
}

#[test]
fn test_missing_cell_reports_not_estimable() {
    let records: Vec<DesignRecord> = effect_records()
        .into_iter()
        .filter(|r| !(r.treatment == "placebo" && r.subgroup == Subgroup::Negative))
        .collect();
    let design = build_design(&records, "placebo").unwrap();
    let fit = fit_reml(&design).unwrap();
    let config = ComparisonConfig::new("active", "placebo");
    let contrasts = treatment_contrasts(&design, &fit, &config).unwrap();

    let negative = contrasts
        .iter()
        .find(|c| c.subgroup == Subgroup::Negative)
        .unwrap();
    assert_eq!(negative.value, ContrastValue::NotEstimable);

    let positive = contrasts
        .iter()
        .find(|c| c.subgroup == Subgroup::Positive)
        .unwrap();
    assert!(matches!(positive.value, ContrastValue::Estimable { .. }));
}

#[test]
fn test_unknown_arm_is_rejected() {
    let design = build_design(&effect_records(), "placebo").unwrap();
    let fit = fit_reml(&design).unwrap();
    let config = ComparisonConfig::new("nonexistent", "placebo");
    let err = treatment_contrasts(&design, &fit, &config).unwrap_err();
    assert!(matches!(err, DesignError::UnknownArm(arm) if arm == "nonexistent"));
}
