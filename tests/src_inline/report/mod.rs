use super::*;

#[test]
fn test_median_and_quantiles() {
    let v = vec![1.0f64, 2.0, 3.0, 4.0, 5.0];
    assert_eq!(median(&v), 3.0);
    assert_eq!(quantile_indexed(&v, 0.9), 5.0);
    assert_eq!(quantile_indexed(&v, 0.0), 1.0);
}

#[test]
fn test_median_empty_is_zero() {
    assert_eq!(median(&[]), 0.0);
}

#[test]
fn test_format_f64_6() {
    assert_eq!(format_f64_6(1.0), "1.000000");
    assert_eq!(format_f64_6(-2.123456789), "-2.123457");
}

#[test]
fn test_contrast_row_serialization_skips_absent_fields() {
    let row = ContrastRow {
        visit: "Week 8".to_string(),
        subgroup: "negative".to_string(),
        estimable: false,
        estimate: None,
        se: None,
        lower: None,
        upper: None,
    };
    let json = serde_json::to_string(&row).unwrap();
    assert!(json.contains("\"estimable\":false"));
    assert!(!json.contains("estimate"));

    let row = ContrastRow {
        estimable: true,
        estimate: Some(2.0),
        se: Some(0.5),
        lower: Some(1.02),
        upper: Some(2.98),
        ..row
    };
    let json = serde_json::to_string(&row).unwrap();
    assert!(json.contains("\"estimate\":2.0"));
}
