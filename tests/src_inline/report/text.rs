use super::*;

use crate::report::{StageCounts, VarianceSummary};

fn context() -> ReportContext {
    ReportContext {
        active_arm: "active".to_string(),
        placebo_arm: "placebo".to_string(),
        counts: StageCounts {
            rows_read: 20,
            rows_in_analysis_set: 18,
            baseline_records: 8,
            post_baseline_records: 10,
            derived_records: 10,
            subjects_dropped: 1,
            subjects_modeled: 7,
        },
        median_percent_change_active: Some(-2.4),
        median_percent_change_placebo: Some(-0.1),
        variance: VarianceSummary {
            residual_sd: 0.42,
            intercept_sd: 1.1,
            slope_sd: Some(0.2),
            intercept_slope_corr: Some(-0.3),
        },
        iterations: 57,
        contrasts: vec![
            ContrastRow {
                visit: "Week 12".to_string(),
                subgroup: "negative".to_string(),
                estimable: true,
                estimate: Some(2.1),
                se: Some(0.4),
                lower: Some(1.316),
                upper: Some(2.884),
            },
            ContrastRow {
                visit: "Week 12".to_string(),
                subgroup: "positive".to_string(),
                estimable: false,
                estimate: None,
                se: None,
                lower: None,
                upper: None,
            },
        ],
        ci_multiplier: 1.96,
        benefit_positive: true,
    }
}

#[test]
fn test_report_sections_present() {
    let text = render_report_text(&context());
    assert!(text.contains("1. Analysis set"));
    assert!(text.contains("2. Change from baseline"));
    assert!(text.contains("3. Mixed model fit"));
    assert!(text.contains("4. Treatment contrasts (active vs placebo)"));
    assert!(text.contains("5. Conventions"));
}

#[test]
fn test_estimable_and_gap_rows_rendered() {
    let text = render_report_text(&context());
    assert!(text.contains("Week 12, biomarker negative: 2.100000"));
    assert!(text.contains("Week 12, biomarker positive: not estimable (no supporting data)"));
}

#[test]
fn test_dropped_subjects_mentioned() {
    let text = render_report_text(&context());
    assert!(text.contains("Subjects dropped for missing baseline: 1"));
}

#[test]
fn test_raw_direction_statement() {
    let mut ctx = context();
    ctx.benefit_positive = false;
    let text = render_report_text(&ctx);
    assert!(text.contains("raw active-minus-placebo differences"));
}
