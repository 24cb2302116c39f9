use super::*;

use crate::input::Subgroup;

fn obs(subject: &str, visit: &str, day: i64, value: f64) -> Observation {
    Observation {
        subject: subject.to_string(),
        study: "CT-101".to_string(),
        part: "B".to_string(),
        compartment: "plasma".to_string(),
        dose: "10".to_string(),
        nominal_time_hr: day as f64 * 24.0,
        profile_day: day,
        visit: visit.to_string(),
        treatment: "placebo".to_string(),
        subgroup: Subgroup::Negative,
        value,
    }
}

#[test]
fn test_joins_baseline_by_subject() {
    let observations = vec![
        obs("S1", "Baseline", 0, 92.0),
        obs("S1", "Week 12", 84, 90.0),
        obs("S2", "Baseline", 0, 88.0),
        obs("S2", "Week 12", 84, 86.5),
    ];
    let out = run_stage2(observations, 0).unwrap();
    assert_eq!(out.joined.len(), 2);
    assert_eq!(out.joined[0].observation.subject, "S1");
    assert_eq!(out.joined[0].baseline, 92.0);
    assert_eq!(out.joined[1].baseline, 88.0);
    assert_eq!(out.counts.baselines, 2);
    assert_eq!(out.counts.post_baseline, 2);
    assert_eq!(out.counts.subjects_dropped, 0);
}

#[test]
fn test_subject_without_baseline_is_dropped() {
    let observations = vec![
        obs("S1", "Baseline", 0, 92.0),
        obs("S1", "Week 12", 84, 90.0),
        obs("S2", "Week 12", 84, 86.5),
    ];
    let out = run_stage2(observations, 0).unwrap();
    assert_eq!(out.joined.len(), 1);
    assert_eq!(out.joined[0].observation.subject, "S1");
    assert_eq!(out.counts.subjects_dropped, 1);
}

#[test]
fn test_duplicate_baseline_names_subject() {
    let observations = vec![
        obs("S1", "Baseline", 0, 92.0),
        obs("S1", "Baseline repeat", 0, 91.5),
        obs("S1", "Week 12", 84, 90.0),
    ];
    let err = run_stage2(observations, 0).unwrap_err();
    assert!(matches!(err, Stage2Error::DuplicateBaseline(subject) if subject == "S1"));
}

#[test]
fn test_no_baselines_is_error() {
    let observations = vec![obs("S1", "Week 12", 84, 90.0)];
    let err = run_stage2(observations, 0).unwrap_err();
    assert!(matches!(err, Stage2Error::NoBaselines(0)));
}

#[test]
fn test_all_post_baseline_dropped_is_error() {
    let observations = vec![
        obs("S1", "Baseline", 0, 92.0),
        obs("S2", "Week 12", 84, 86.5),
    ];
    let err = run_stage2(observations, 0).unwrap_err();
    assert!(matches!(err, Stage2Error::EmptyJoin));
}

#[test]
fn test_custom_baseline_day() {
    let observations = vec![
        obs("S1", "Run-in", 0, 95.0),
        obs("S1", "Baseline", 7, 92.0),
        obs("S1", "Week 12", 84, 90.0),
    ];
    let out = run_stage2(observations, 7).unwrap();
    // Day 0 becomes an ordinary post-baseline record under baseline_day = 7.
    assert_eq!(out.counts.baselines, 1);
    assert_eq!(out.joined.len(), 2);
    assert!(out.joined.iter().all(|j| j.baseline == 92.0));
}
