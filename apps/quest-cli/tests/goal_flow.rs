// goal_flow.rs — End-to-end flow through the Quest library crates.
//
// Flow:
//   1. An authoring collaborator hands over a sloppy YAML goal
//   2. validate_with_recovery repairs it and returns warnings
//   3. The schedule is previewed and fails a 4-per-week minimum
//   4. Two added dates are recorded; the check now passes
//   5. The schedule is confirmed, which locks further edits
//   6. The declared signals are checked against the policy registry
//   7. Proof evidence for one occurrence is evaluated
//
// A second test walks a frequency goal from JSON through its rolling window.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use quest_schedule::{
    check_frequency_goal, check_schedule_goal, confirm_schedule, preview_occurrences,
    record_overrides, CountRule, OverrideOptions, ScheduleError, WeekBoundaryConfig,
};
use quest_spec::{validate, validate_with_recovery, GoalType, Override, SpecError, TimeOfDay};
use quest_verify::{
    evaluate, match_policy, validate_signals, EvaluatorConfig, RuleKind, VerificationEvidence,
};

const GYM_GOAL: &str = r#"
title: Gym before work
timezone: America/New_York
period:
  start: "2024-01-08"
  end: "2024-01-22"
verification:
  signals: [time, location]
schedule:
  rules:
    - weekdays: [1, 2, 3]
      time: 7am
"#;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[test]
fn schedule_goal_from_authoring_to_proof() {
    // 1-2. Repair and validate.
    let raw: serde_json::Value = serde_yaml::from_str(GYM_GOAL).unwrap();
    assert!(validate(&raw).is_err());
    let outcome = validate_with_recovery(&raw);
    assert!(outcome.is_valid(), "{:?}", outcome.errors);
    let repairs: Vec<&str> = outcome.warnings.iter().map(|w| w.repair.as_str()).collect();
    assert!(repairs.contains(&"default_goal_type"));
    assert!(repairs.contains(&"normalize_times"));
    let mut spec = outcome.spec.unwrap();
    assert_eq!(spec.goal_type(), GoalType::Schedule);
    assert_eq!(
        spec.schedule().unwrap().rules[0].time,
        TimeOfDay::from_hm(7, 0).unwrap()
    );

    // 3. Preview and check against the minimum.
    let options = OverrideOptions::default();
    let weeks = WeekBoundaryConfig::default();
    let rule = CountRule::at_least_per_week(4);
    assert_eq!(preview_occurrences(&spec, &options).unwrap().len(), 7);
    let report = check_schedule_goal(&spec, &rule, &weeks, &options).unwrap();
    assert!(!report.pass);
    assert_eq!(
        report.failure_summary,
        "week of 2024-01-08: 3 < 4; week of 2024-01-15: 3 < 4"
    );

    // 4. Record two extra sessions.
    let seven = TimeOfDay::from_hm(7, 0).unwrap();
    let edits = vec![
        Override::Add {
            date: d("2024-01-11"),
            time: seven,
        },
        Override::Add {
            date: d("2024-01-18"),
            time: seven,
        },
    ];
    let version = spec.version;
    record_overrides(&mut spec, &edits, version, &options).unwrap();
    assert_eq!(spec.version, version + 1);
    assert!(check_schedule_goal(&spec, &rule, &weeks, &options).unwrap().pass);

    // The persisted document still validates and carries the edits.
    let stored = spec.to_json().unwrap();
    assert_eq!(stored["schedule"]["overrides"][1]["op"], "add");
    assert_eq!(validate(&stored).unwrap(), spec);

    // 5. Confirm; edits are now rejected.
    let current = spec.version;
    let locked = confirm_schedule(&mut spec, current, &options).unwrap();
    assert_eq!(locked.len(), 9);
    let current = spec.version;
    let err = record_overrides(&mut spec, &edits, current, &options).unwrap_err();
    assert!(matches!(err, ScheduleError::Spec(SpecError::Locked { .. })));

    // 6. Declared signals are a known schedule policy.
    let kind = RuleKind::from(spec.goal_type());
    let signals = &spec.verification.signals;
    assert!(validate_signals(kind, signals).valid);
    assert_eq!(match_policy(kind, signals).unwrap().name, "time_location");

    // 7. Evidence for the 2024-01-11 session, submitted at 07:20.
    let evidence = VerificationEvidence::from_json_lenient(&json!({
        "time": {
            "present": true,
            "windowStart": "2024-01-11T12:00:00Z",
            "windowEnd": "2024-01-11T13:00:00Z"
        },
        "location": {"present": true, "inside": true, "distance": 8.0}
    }));
    let now: DateTime<Utc> = "2024-01-11T12:20:00Z".parse().unwrap();
    let verdict = evaluate("schedule", &evidence, now, &EvaluatorConfig::default());
    assert!(verdict.pass);
    assert!(verdict.details["timeWithLocation"]);

    let late: DateTime<Utc> = "2024-01-11T14:00:00Z".parse().unwrap();
    let verdict = evaluate("schedule", &evidence, late, &EvaluatorConfig::default());
    assert!(!verdict.pass);
    assert_eq!(
        verdict.unmet(),
        vec!["manualWithLocation", "photoValid", "timeOk", "timeWithManual"]
    );
}

#[test]
fn frequency_goal_rolling_window_and_evidence() {
    let outcome = validate_with_recovery(&json!({
        "type": "frequency",
        "title": "Read 3x a week",
        "timezone": "UTC",
        "period": {"start": "2024-01-01", "end": "2024-01-14"},
        "frequency": {"targetPerWeek": "3"}
    }));
    assert!(outcome.is_valid(), "{:?}", outcome.errors);
    let repairs: Vec<&str> = outcome.warnings.iter().map(|w| w.repair.as_str()).collect();
    assert!(repairs.contains(&"default_signals"));
    assert!(repairs.contains(&"coerce_target_per_week"));
    let spec = outcome.spec.unwrap();
    assert_eq!(spec.frequency().unwrap().target_per_week, 3);

    // Manual alone is declared but needs corroboration.
    let check = validate_signals(RuleKind::Frequency, &spec.verification.signals);
    assert!(!check.valid);
    assert_eq!(check.suggestions, vec!["add location", "add photo"]);

    let weeks = WeekBoundaryConfig::default();
    let steady: Vec<NaiveDate> = [
        "2024-01-01",
        "2024-01-03",
        "2024-01-05",
        "2024-01-08",
        "2024-01-10",
        "2024-01-12",
    ]
    .iter()
    .map(|s| d(s))
    .collect();
    let report = check_frequency_goal(&spec, &steady, &weeks).unwrap();
    assert!(report.pass, "{}", report.failure_summary);

    let lapsed = &steady[..3];
    let report = check_frequency_goal(&spec, lapsed, &weeks).unwrap();
    assert!(!report.pass);
    assert!(report.failure_summary.starts_with("window 2024-01-02..2024-01-08: 2 < 3"));

    let evidence = VerificationEvidence::from_json_lenient(&json!({
        "manual": {"present": true},
        "photo": {"present": true, "validation": {"freshnessValid": true}}
    }));
    let verdict = evaluate("frequency", &evidence, Utc::now(), &EvaluatorConfig::default());
    assert!(verdict.pass);
    assert!(verdict.details["manualWithFreshPhoto"]);
}
