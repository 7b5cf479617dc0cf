// repair.rs — Best-effort recovery for specifications authored by a
// free-text assistant.
//
// Each heuristic is an independent named function over the raw document. It
// either fixes what it targets and returns one warning per fix, or leaves the
// document untouched and returns nothing. `validate_with_recovery()` runs them all in
// order and then re-validates, so a repair can only turn a semantic problem
// into a valid value. Structural problems (wrong primitive types, unknown
// fields) survive every heuristic and still block.
//
// Heuristics:
// 1. default_goal_type        — infer `type` from the payload present
// 2. synthesize_original_text — copy `title` into a missing `originalText`
// 3. default_signals          — missing/empty signals become ["manual"]
// 4. normalize_times          — "9", "9am", "9.30" → "09:00"/"09:30"
// 5. coerce_target_per_week   — "3" → 3

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationIssue;
use crate::spec::GoalSpecification;
use crate::time::TimeOfDay;
use crate::validator::validate;

/// Time used when a time string cannot be understood at all.
pub const FALLBACK_TIME: &str = "09:00";

/// A fix that was applied automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepairWarning {
    /// Name of the heuristic that applied the fix.
    pub repair: String,
    /// JSON path of the field that changed.
    pub path: String,
    pub message: String,
}

/// Result of `validate_with_recovery()`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecoveryOutcome {
    /// The validated specification, when validation succeeded after repair.
    pub spec: Option<GoalSpecification>,
    /// Fixes that were applied. Empty when validation still failed.
    pub warnings: Vec<RepairWarning>,
    /// Blocking problems. Empty when `spec` is present.
    pub errors: Vec<ValidationIssue>,
}

impl RecoveryOutcome {
    pub fn is_valid(&self) -> bool {
        self.spec.is_some()
    }
}

/// Signature shared by every repair heuristic.
pub type RepairFn = fn(&mut Map<String, Value>) -> Vec<RepairWarning>;

/// The fixed, ordered list of repair heuristics.
pub const REPAIRS: &[(&str, RepairFn)] = &[
    ("default_goal_type", default_goal_type),
    ("synthesize_original_text", synthesize_original_text),
    ("default_signals", default_signals),
    ("normalize_times", normalize_times),
    ("coerce_target_per_week", coerce_target_per_week),
];

/// Validate, repairing what can be repaired first.
///
/// If the repaired document is valid, returns it with the warnings of every
/// fix applied. Otherwise returns only the hard errors of the repaired
/// document.
pub fn validate_with_recovery(raw: &Value) -> RecoveryOutcome {
    let mut doc = raw.clone();
    let mut warnings = Vec::new();

    if let Some(map) = doc.as_object_mut() {
        for (name, repair) in REPAIRS {
            let applied = repair(map);
            if !applied.is_empty() {
                tracing::debug!(repair = *name, fixes = applied.len(), "repair applied");
            }
            warnings.extend(applied);
        }
    }

    match validate(&doc) {
        Ok(spec) => {
            for w in &warnings {
                tracing::warn!(path = %w.path, "{}", w.message);
            }
            RecoveryOutcome {
                spec: Some(spec),
                warnings,
                errors: Vec::new(),
            }
        }
        Err(errors) => RecoveryOutcome {
            spec: None,
            warnings: Vec::new(),
            errors: errors.issues,
        },
    }
}

fn warning(repair: &str, path: &str, message: String) -> RepairWarning {
    RepairWarning {
        repair: repair.to_string(),
        path: path.to_string(),
        message,
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Infer a missing `type` from whichever payload block is present.
///
/// Falls back to `frequency` when no payload hints at the shape; the
/// re-validation then reports the missing payload.
pub fn default_goal_type(doc: &mut Map<String, Value>) -> Vec<RepairWarning> {
    if !is_missing(doc.get("type")) {
        return Vec::new();
    }
    let inferred = ["schedule", "frequency", "milestone"]
        .into_iter()
        .find(|key| doc.get(*key).is_some_and(Value::is_object));
    let (goal_type, reason) = match inferred {
        Some(t) => (t, format!("inferred from the '{}' block", t)),
        None => ("frequency", "no payload block present".to_string()),
    };
    doc.insert("type".to_string(), Value::String(goal_type.to_string()));
    vec![warning(
        "default_goal_type",
        "type",
        format!("type was missing; defaulted to '{}' ({})", goal_type, reason),
    )]
}

/// Copy the title into a missing or blank `originalText`.
pub fn synthesize_original_text(doc: &mut Map<String, Value>) -> Vec<RepairWarning> {
    let blank = match doc.get("originalText") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    };
    if !blank {
        return Vec::new();
    }
    let Some(title) = doc.get("title").and_then(Value::as_str) else {
        return Vec::new();
    };
    if title.trim().is_empty() {
        return Vec::new();
    }
    let title = title.to_string();
    doc.insert("originalText".to_string(), Value::String(title));
    vec![warning(
        "synthesize_original_text",
        "originalText",
        "originalText was missing; used the title instead".to_string(),
    )]
}

/// Default missing or empty verification signals to `["manual"]`.
///
/// A `verification` value that is present but not an object is left alone.
pub fn default_signals(doc: &mut Map<String, Value>) -> Vec<RepairWarning> {
    let manual = || Value::Array(vec![Value::String("manual".to_string())]);
    if is_missing(doc.get("verification")) {
        let mut block = Map::new();
        block.insert("signals".to_string(), manual());
        doc.insert("verification".to_string(), Value::Object(block));
    } else {
        let Some(Value::Object(block)) = doc.get_mut("verification") else {
            return Vec::new();
        };
        let empty = match block.get("signals") {
            None | Some(Value::Null) => true,
            Some(Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        };
        if !empty {
            return Vec::new();
        }
        block.insert("signals".to_string(), manual());
    }
    vec![warning(
        "default_signals",
        "verification.signals",
        "no verification signals given; defaulted to manual confirmation".to_string(),
    )]
}

/// Rewrite every non-canonical time in the schedule block into `HH:mm`.
///
/// Only string and integer values are touched; unparseable text falls back
/// to `FALLBACK_TIME`.
pub fn normalize_times(doc: &mut Map<String, Value>) -> Vec<RepairWarning> {
    let mut warnings = Vec::new();
    let Some(Value::Object(schedule)) = doc.get_mut("schedule") else {
        return warnings;
    };

    let sections: [(&str, &[&str]); 3] = [
        ("rules", &["time"]),
        ("overrides", &["time", "newTime", "toTime"]),
        ("occurrences", &["time"]),
    ];
    for (section, fields) in sections {
        let Some(Value::Array(items)) = schedule.get_mut(section) else {
            continue;
        };
        for (i, item) in items.iter_mut().enumerate() {
            let Some(obj) = item.as_object_mut() else {
                continue;
            };
            for field in fields {
                let Some(value) = obj.get_mut(*field) else {
                    continue;
                };
                let path = format!("schedule.{}[{}].{}", section, i, field);
                if let Some(w) = normalize_time_value(value, &path) {
                    warnings.push(w);
                }
            }
        }
    }
    warnings
}

fn normalize_time_value(value: &mut Value, path: &str) -> Option<RepairWarning> {
    let original = match value {
        Value::String(s) => {
            if TimeOfDay::parse_strict(s).is_some() {
                return None;
            }
            s.clone()
        }
        Value::Number(n) if n.is_u64() => n.to_string(),
        _ => return None,
    };
    let (canonical, message) = match parse_loose_time(&original) {
        Some(t) => {
            let canonical = t.to_string();
            let message = format!("reparsed time '{}' as {}", original, canonical);
            (canonical, message)
        }
        None => (
            FALLBACK_TIME.to_string(),
            format!(
                "could not understand time '{}'; defaulted to {}",
                original, FALLBACK_TIME
            ),
        ),
    };
    *value = Value::String(canonical);
    Some(warning("normalize_times", path, message))
}

const LOOSE_TIME_PATTERN: &str =
    r"(?i)^\s*(\d{1,2})(?:\s*[:.h]?\s*(\d{2}))?\s*(a\.?m\.?|p\.?m\.?)?\s*$";

fn loose_time_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LOOSE_TIME_PATTERN).ok()).as_ref()
}

/// Parse loosely formatted times: "9", "9am", "9:30 pm", "21.15", "0730",
/// "noon", "midnight".
pub fn parse_loose_time(input: &str) -> Option<TimeOfDay> {
    let trimmed = input.trim();
    if let Some(t) = TimeOfDay::parse_strict(trimmed) {
        return Some(t);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "noon" | "midday" => return TimeOfDay::from_hm(12, 0),
        "midnight" => return TimeOfDay::from_hm(0, 0),
        _ => {}
    }

    let caps = loose_time_regex()?.captures(trimmed)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if let Some(meridiem) = caps.get(3) {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let pm = meridiem.as_str().to_ascii_lowercase().starts_with('p');
        hour = match (pm, hour) {
            (false, 12) => 0,
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, h) => h,
        };
    }
    TimeOfDay::from_hm(hour, minute)
}

/// Turn a numeric-string `frequency.targetPerWeek` into an integer.
pub fn coerce_target_per_week(doc: &mut Map<String, Value>) -> Vec<RepairWarning> {
    let Some(Value::Object(frequency)) = doc.get_mut("frequency") else {
        return Vec::new();
    };
    let Some(Value::String(raw)) = frequency.get("targetPerWeek") else {
        return Vec::new();
    };
    let Ok(n) = raw.trim().parse::<u64>() else {
        return Vec::new();
    };
    let message = format!("converted targetPerWeek '{}' to the integer {}", raw, n);
    frequency.insert("targetPerWeek".to_string(), Value::from(n));
    vec![warning(
        "coerce_target_per_week",
        "frequency.targetPerWeek",
        message,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn loose_times_are_understood() {
        let cases = [
            ("9", "09:00"),
            ("9am", "09:00"),
            ("9 AM", "09:00"),
            ("9:30pm", "21:30"),
            ("12am", "00:00"),
            ("12 p.m.", "12:00"),
            ("21.15", "21:15"),
            ("0730", "07:30"),
            ("7h45", "07:45"),
            ("noon", "12:00"),
            ("07:05", "07:05"),
        ];
        for (input, expected) in cases {
            let parsed = parse_loose_time(input).map(|t| t.to_string());
            assert_eq!(parsed.as_deref(), Some(expected), "input {input:?}");
        }
    }

    #[test]
    fn nonsense_times_are_not_understood() {
        for input in ["", "soon", "25", "13pm", "9:75", "after lunch"] {
            assert!(parse_loose_time(input).is_none(), "accepted {input:?}");
        }
    }

    #[test]
    fn default_goal_type_infers_from_payload() {
        let mut doc = obj(json!({"milestone": {"milestones": []}}));
        let warnings = default_goal_type(&mut doc);
        assert_eq!(doc["type"], "milestone");
        assert_eq!(warnings.len(), 1);

        let mut typed = obj(json!({"type": "schedule"}));
        assert!(default_goal_type(&mut typed).is_empty());
    }

    #[test]
    fn synthesize_original_text_uses_title() {
        let mut doc = obj(json!({"title": "Run 5k"}));
        let warnings = synthesize_original_text(&mut doc);
        assert_eq!(doc["originalText"], "Run 5k");
        assert_eq!(warnings[0].path, "originalText");

        let mut untitled = obj(json!({}));
        assert!(synthesize_original_text(&mut untitled).is_empty());
        assert!(!untitled.contains_key("originalText"));
    }

    #[test]
    fn default_signals_fills_missing_or_empty() {
        let mut missing = obj(json!({}));
        assert_eq!(default_signals(&mut missing).len(), 1);
        assert_eq!(missing["verification"]["signals"], json!(["manual"]));

        let mut empty = obj(json!({"verification": {"signals": []}}));
        assert_eq!(default_signals(&mut empty).len(), 1);

        let mut present = obj(json!({"verification": {"signals": ["photo"]}}));
        assert!(default_signals(&mut present).is_empty());

        let mut malformed = obj(json!({"verification": "manual"}));
        assert!(default_signals(&mut malformed).is_empty());
        assert_eq!(malformed["verification"], "manual");
    }

    #[test]
    fn normalize_times_rewrites_each_field() {
        let mut doc = obj(json!({
            "schedule": {
                "rules": [{"weekdays": [1], "time": "7am"}, {"weekdays": [2], "time": "08:00"}],
                "overrides": [{"op": "retime", "date": "2024-01-09", "newTime": 18}],
                "occurrences": [{"date": "2024-01-10", "time": "whenever"}]
            }
        }));
        let warnings = normalize_times(&mut doc);
        assert_eq!(warnings.len(), 3);
        assert_eq!(doc["schedule"]["rules"][0]["time"], "07:00");
        assert_eq!(doc["schedule"]["rules"][1]["time"], "08:00");
        assert_eq!(doc["schedule"]["overrides"][0]["newTime"], "18:00");
        assert_eq!(doc["schedule"]["occurrences"][0]["time"], FALLBACK_TIME);
        assert_eq!(warnings[2].path, "schedule.occurrences[0].time");
    }

    #[test]
    fn coerce_target_per_week_only_touches_numeric_strings() {
        let mut doc = obj(json!({"frequency": {"targetPerWeek": " 4 "}}));
        assert_eq!(coerce_target_per_week(&mut doc).len(), 1);
        assert_eq!(doc["frequency"]["targetPerWeek"], 4);

        let mut words = obj(json!({"frequency": {"targetPerWeek": "four"}}));
        assert!(coerce_target_per_week(&mut words).is_empty());
        assert_eq!(words["frequency"]["targetPerWeek"], "four");
    }

    #[test]
    fn recovery_repairs_a_sloppy_frequency_goal() {
        let raw = json!({
            "title": "Practice piano",
            "timezone": "UTC",
            "period": {"start": "2024-01-01", "end": "2024-02-29"},
            "frequency": {"targetPerWeek": "3"}
        });
        let outcome = validate_with_recovery(&raw);
        assert!(outcome.is_valid(), "errors: {:?}", outcome.errors);
        let spec = outcome.spec.unwrap();
        assert_eq!(spec.frequency().unwrap().target_per_week, 3);
        assert_eq!(spec.original_text.as_deref(), Some("Practice piano"));
        let repairs: Vec<&str> = outcome.warnings.iter().map(|w| w.repair.as_str()).collect();
        assert_eq!(
            repairs,
            vec![
                "default_goal_type",
                "synthesize_original_text",
                "default_signals",
                "coerce_target_per_week"
            ]
        );
    }

    #[test]
    fn recovery_repairs_loose_schedule_times() {
        let raw = json!({
            "type": "schedule",
            "title": "Swim",
            "originalText": "swim monday and thursday at 6",
            "timezone": "UTC",
            "period": {"start": "2024-01-08", "end": "2024-01-21"},
            "verification": {"signals": ["time", "location"]},
            "schedule": {"rules": [{"weekdays": [1, 4], "time": "6"}]}
        });
        let outcome = validate_with_recovery(&raw);
        let spec = outcome.spec.unwrap();
        assert_eq!(spec.schedule().unwrap().rules[0].time.to_string(), "06:00");
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn recovery_never_masks_structural_errors() {
        let raw = json!({
            "type": "schedule",
            "title": "Swim",
            "timezone": "UTC",
            "period": {"start": "2024-01-08", "end": "2024-01-21"},
            "verification": {"signals": ["time"]},
            "schedule": {"rules": [{"weekdays": "mon", "time": "6am"}]},
            "mood": "excited"
        });
        let outcome = validate_with_recovery(&raw);
        assert!(!outcome.is_valid());
        assert!(outcome.warnings.is_empty());
        let paths: Vec<&str> = outcome.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"mood"));
        assert!(paths.contains(&"schedule.rules[0].weekdays"));
    }

    #[test]
    fn recovery_of_non_object_reports_error() {
        let outcome = validate_with_recovery(&json!("run every day"));
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors[0].path, "$");
    }
}
