use super::*;

#[test]
fn test_matches_dose() {
    let filter = FilterConfig {
        study: "CT-101".to_string(),
        part: "B".to_string(),
        compartment: "plasma".to_string(),
        doses: vec!["5".to_string(), "10".to_string()],
        baseline_day: 0,
    };
    assert!(filter.matches_dose("5"));
    assert!(filter.matches_dose("10"));
    assert!(!filter.matches_dose("20"));
}

#[test]
fn test_comparison_defaults() {
    let cfg = ComparisonConfig::new("semaglutide", "placebo");
    assert_eq!(cfg.active_arm, "semaglutide");
    assert_eq!(cfg.placebo_arm, "placebo");
    assert_eq!(cfg.ci_multiplier, 1.96);
    assert!(cfg.benefit_positive);
}
