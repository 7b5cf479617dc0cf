// validator.rs — Structural and type-specific validation of goal specifications.
//
// `validate()` walks the raw JSON document once and collects every problem it
// finds, each scoped to a JSON path, before deciding. Only a document with no
// issues is converted into a typed `GoalSpecification`.
//
// Two kinds of issue are reported:
// 1. Structural — unknown fields (the schema is closed at every level) and
//    wrong primitive types. Never repairable.
// 2. Semantic — missing required fields, empty lists, out-of-range values,
//    unparseable dates/times in correctly-typed strings. Some of these are
//    fixed by the repair pass in repair.rs.
//
// The validator is a pure function of its input and never panics.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::error::{IssueKind, ValidationErrors, ValidationIssue};
use crate::schedule::Period;
use crate::signal::{GoalType, SignalKind};
use crate::spec::GoalSpecification;
use crate::time::TimeOfDay;

/// Fields allowed at the top level of a specification document.
pub const TOP_LEVEL_FIELDS: &[&str] = &[
    "type",
    "title",
    "originalText",
    "timezone",
    "period",
    "verification",
    "successCriteria",
    "version",
    "confirmed",
    "schedule",
    "frequency",
    "milestone",
];

const PERIOD_FIELDS: &[&str] = &["start", "end"];
const VERIFICATION_FIELDS: &[&str] = &["signals"];
const SUCCESS_FIELDS: &[&str] = &["targetRate"];
const SCHEDULE_FIELDS: &[&str] = &["rules", "overrides", "occurrences"];
const RULE_FIELDS: &[&str] = &["weekdays", "time"];
const OCCURRENCE_FIELDS: &[&str] = &["date", "time"];
const FREQUENCY_FIELDS: &[&str] = &["targetPerWeek", "windowDays"];
const MILESTONE_FIELDS: &[&str] = &["milestones", "currentState"];
const MILESTONE_STEP_FIELDS: &[&str] = &["key", "label"];

/// Validate a candidate specification document.
///
/// Returns the typed specification, or every field-scoped problem found.
pub fn validate(raw: &Value) -> Result<GoalSpecification, ValidationErrors> {
    let mut checker = Checker::default();

    let Some(doc) = raw.as_object() else {
        checker.structural("$", "specification must be a JSON object");
        return Err(checker.finish());
    };

    checker.closed("", doc, TOP_LEVEL_FIELDS);

    let goal_type = checker.goal_type(doc.get("type"));
    checker.non_empty_string("title", doc.get("title"), true);
    checker.optional_string("originalText", doc.get("originalText"));
    checker.non_empty_string("timezone", doc.get("timezone"), true);
    let period = checker.period(doc.get("period"));
    checker.verification(doc.get("verification"));
    checker.success_criteria(doc.get("successCriteria"));
    checker.optional_u64("version", doc.get("version"));
    checker.optional_bool("confirmed", doc.get("confirmed"));

    if let Some(goal_type) = goal_type {
        checker.foreign_payloads(doc, goal_type);
        match goal_type {
            GoalType::Schedule => checker.schedule(doc.get("schedule"), period.as_ref()),
            GoalType::Frequency => checker.frequency(doc.get("frequency")),
            GoalType::Milestone => checker.milestone(doc.get("milestone")),
        }
    }

    if !checker.issues.is_empty() {
        let errors = checker.finish();
        tracing::debug!(issues = errors.issues.len(), "specification rejected");
        return Err(errors);
    }

    serde_json::from_value(without_nulls(raw)).map_err(|e| ValidationErrors {
        issues: vec![ValidationIssue {
            path: "$".to_string(),
            kind: IssueKind::Structural,
            message: format!("document does not match the specification shape: {}", e),
        }],
    })
}

/// Drop `null` object members so an explicit null reads like an absent field.
///
/// The checker already reported every required field that was null.
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}

/// Collects issues while walking the document.
#[derive(Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn finish(self) -> ValidationErrors {
        ValidationErrors {
            issues: self.issues,
        }
    }

    fn push(&mut self, path: &str, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: if path.is_empty() { "$" } else { path }.to_string(),
            kind,
            message: message.into(),
        });
    }

    fn structural(&mut self, path: &str, message: impl Into<String>) {
        self.push(path, IssueKind::Structural, message);
    }

    fn semantic(&mut self, path: &str, message: impl Into<String>) {
        self.push(path, IssueKind::Semantic, message);
    }

    // ── Primitive helpers ──

    /// Report every key of `obj` not listed in `allowed`.
    fn closed(&mut self, path: &str, obj: &Map<String, Value>, allowed: &[&str]) {
        for key in obj.keys() {
            if !allowed.contains(&key.as_str()) {
                self.structural(&join(path, key), format!("unknown field '{}'", key));
            }
        }
    }

    fn object<'a>(
        &mut self,
        path: &str,
        value: Option<&'a Value>,
        required: bool,
    ) -> Option<&'a Map<String, Value>> {
        match value {
            None | Some(Value::Null) => {
                if required {
                    self.semantic(path, "is required");
                }
                None
            }
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                self.structural(path, format!("expected object, found {}", type_name(other)));
                None
            }
        }
    }

    fn array<'a>(
        &mut self,
        path: &str,
        value: Option<&'a Value>,
        required: bool,
    ) -> Option<&'a Vec<Value>> {
        match value {
            None | Some(Value::Null) => {
                if required {
                    self.semantic(path, "is required");
                }
                None
            }
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                self.structural(path, format!("expected array, found {}", type_name(other)));
                None
            }
        }
    }

    fn string<'a>(
        &mut self,
        path: &str,
        value: Option<&'a Value>,
        required: bool,
    ) -> Option<&'a str> {
        match value {
            None | Some(Value::Null) => {
                if required {
                    self.semantic(path, "is required");
                }
                None
            }
            Some(Value::String(s)) => Some(s),
            Some(other) => {
                self.structural(path, format!("expected string, found {}", type_name(other)));
                None
            }
        }
    }

    fn non_empty_string<'a>(
        &mut self,
        path: &str,
        value: Option<&'a Value>,
        required: bool,
    ) -> Option<&'a str> {
        let s = self.string(path, value, required)?;
        if s.trim().is_empty() {
            self.semantic(path, "must not be empty");
            return None;
        }
        Some(s)
    }

    fn optional_string(&mut self, path: &str, value: Option<&Value>) {
        self.string(path, value, false);
    }

    fn optional_bool(&mut self, path: &str, value: Option<&Value>) {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(_)) => {}
            Some(other) => {
                self.structural(path, format!("expected boolean, found {}", type_name(other)))
            }
        }
    }

    fn optional_u64(&mut self, path: &str, value: Option<&Value>) -> Option<u64> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => match n.as_u64() {
                Some(v) => Some(v),
                None => {
                    self.structural(path, format!("expected non-negative integer, found {}", n));
                    None
                }
            },
            Some(other) => {
                self.structural(
                    path,
                    format!("expected non-negative integer, found {}", type_name(other)),
                );
                None
            }
        }
    }

    /// A required integer in `1..=u32::MAX`.
    fn positive_u32(&mut self, path: &str, value: Option<&Value>, required: bool) -> Option<u32> {
        if required && matches!(value, None | Some(Value::Null)) {
            self.semantic(path, "is required");
            return None;
        }
        let n = self.optional_u64(path, value)?;
        match u32::try_from(n) {
            Ok(0) => {
                self.semantic(path, "must be a positive integer");
                None
            }
            Ok(v) => Some(v),
            Err(_) => {
                self.semantic(path, format!("{} is too large", n));
                None
            }
        }
    }

    fn date(&mut self, path: &str, value: Option<&Value>) -> Option<NaiveDate> {
        let s = self.string(path, value, true)?;
        match s.parse::<NaiveDate>() {
            Ok(d) => Some(d),
            Err(_) => {
                self.semantic(path, format!("'{}' is not a YYYY-MM-DD date", s));
                None
            }
        }
    }

    fn time(&mut self, path: &str, value: Option<&Value>) -> Option<TimeOfDay> {
        let s = self.string(path, value, true)?;
        match TimeOfDay::parse_strict(s) {
            Some(t) => Some(t),
            None => {
                self.semantic(path, format!("'{}' is not a HH:mm time (00:00–23:59)", s));
                None
            }
        }
    }

    /// A date that must fall inside the goal period (when the period is known).
    fn date_in_period(&mut self, path: &str, value: Option<&Value>, period: Option<&Period>) {
        if let (Some(date), Some(period)) = (self.date(path, value), period) {
            if !period.contains(date) {
                self.semantic(
                    path,
                    format!(
                        "{} is outside the goal period {}..{}",
                        date, period.start, period.end
                    ),
                );
            }
        }
    }

    // ── Common fields ──

    fn goal_type(&mut self, value: Option<&Value>) -> Option<GoalType> {
        let s = self.string("type", value, true)?;
        match s.parse::<GoalType>() {
            Ok(t) => Some(t),
            Err(msg) => {
                self.semantic(
                    "type",
                    format!("{}; expected schedule, frequency or milestone", msg),
                );
                None
            }
        }
    }

    fn period(&mut self, value: Option<&Value>) -> Option<Period> {
        let obj = self.object("period", value, true)?;
        self.closed("period", obj, PERIOD_FIELDS);
        let start = self.date("period.start", obj.get("start"));
        let end = self.date("period.end", obj.get("end"));
        let (start, end) = (start?, end?);
        if start > end {
            self.semantic("period", format!("start {} is after end {}", start, end));
            return None;
        }
        Some(Period::new(start, end))
    }

    fn verification(&mut self, value: Option<&Value>) {
        let Some(obj) = self.object("verification", value, true) else {
            return;
        };
        self.closed("verification", obj, VERIFICATION_FIELDS);
        let Some(signals) = self.array("verification.signals", obj.get("signals"), true) else {
            return;
        };
        if signals.is_empty() {
            self.semantic("verification.signals", "must list at least one signal");
        }
        for (i, signal) in signals.iter().enumerate() {
            let path = format!("verification.signals[{}]", i);
            if let Some(s) = self.string(&path, Some(signal), true) {
                if let Err(msg) = s.parse::<SignalKind>() {
                    self.semantic(&path, msg);
                }
            }
        }
    }

    fn success_criteria(&mut self, value: Option<&Value>) {
        let Some(obj) = self.object("successCriteria", value, false) else {
            return;
        };
        self.closed("successCriteria", obj, SUCCESS_FIELDS);
        let path = "successCriteria.targetRate";
        match obj.get("targetRate") {
            None | Some(Value::Null) => self.semantic(path, "is required"),
            Some(Value::Number(n)) => {
                let rate = n.as_f64().unwrap_or(f64::NAN);
                if !(rate > 0.0 && rate <= 1.0) {
                    self.semantic(path, format!("{} is outside (0, 1]", n));
                }
            }
            Some(other) => {
                self.structural(path, format!("expected number, found {}", type_name(other)))
            }
        }
    }

    /// Payload blocks that belong to a different goal type must be absent or null.
    fn foreign_payloads(&mut self, doc: &Map<String, Value>, goal_type: GoalType) {
        for other in GoalType::ALL {
            if other == goal_type {
                continue;
            }
            if matches!(doc.get(other.as_str()), Some(v) if !v.is_null()) {
                self.semantic(
                    other.as_str(),
                    format!("'{}' payload does not apply to a {} goal", other, goal_type),
                );
            }
        }
    }

    // ── Type-specific payloads ──

    fn schedule(&mut self, value: Option<&Value>, period: Option<&Period>) {
        let Some(obj) = self.object("schedule", value, true) else {
            return;
        };
        self.closed("schedule", obj, SCHEDULE_FIELDS);

        let mut producing = 0usize;

        if let Some(rules) = self.array("schedule.rules", obj.get("rules"), false) {
            for (i, rule) in rules.iter().enumerate() {
                if self.rule(&format!("schedule.rules[{}]", i), rule) {
                    producing += 1;
                }
            }
        }

        if let Some(edits) = self.array("schedule.overrides", obj.get("overrides"), false) {
            for (i, edit) in edits.iter().enumerate() {
                if self.override_edit(&format!("schedule.overrides[{}]", i), edit, period) {
                    producing += 1;
                }
            }
        }

        if let Some(occurrences) = self.array("schedule.occurrences", obj.get("occurrences"), false)
        {
            for (i, occ) in occurrences.iter().enumerate() {
                let path = format!("schedule.occurrences[{}]", i);
                if let Some(o) = self.object(&path, Some(occ), true) {
                    self.closed(&path, o, OCCURRENCE_FIELDS);
                    self.date_in_period(&format!("{}.date", path), o.get("date"), period);
                    if self.time(&format!("{}.time", path), o.get("time")).is_some() {
                        producing += 1;
                    }
                }
            }
        }

        if producing == 0 {
            self.semantic(
                "schedule",
                "needs at least one rule, occurrence or added date with a valid weekday and time",
            );
        }
    }

    /// Returns true when the rule can produce occurrences.
    fn rule(&mut self, path: &str, value: &Value) -> bool {
        let Some(obj) = self.object(path, Some(value), true) else {
            return false;
        };
        self.closed(path, obj, RULE_FIELDS);

        let weekdays_path = format!("{}.weekdays", path);
        let mut valid_days = 0usize;
        if let Some(days) = self.array(&weekdays_path, obj.get("weekdays"), true) {
            if days.is_empty() {
                self.semantic(&weekdays_path, "must list at least one weekday");
            }
            for (j, day) in days.iter().enumerate() {
                let day_path = format!("{}[{}]", weekdays_path, j);
                match day.as_u64() {
                    Some(d) if d <= 6 => valid_days += 1,
                    Some(d) => self.semantic(
                        &day_path,
                        format!("weekday {} is outside 0 (Sunday) – 6 (Saturday)", d),
                    ),
                    None => self.structural(
                        &day_path,
                        format!("expected weekday integer, found {}", type_name(day)),
                    ),
                }
            }
        }

        let time = self.time(&format!("{}.time", path), obj.get("time"));
        valid_days > 0 && time.is_some()
    }

    /// Returns true when the edit places an occurrence.
    fn override_edit(&mut self, path: &str, value: &Value, period: Option<&Period>) -> bool {
        let Some(obj) = self.object(path, Some(value), true) else {
            return false;
        };
        let Some(op) = self.string(&format!("{}.op", path), obj.get("op"), true) else {
            return false;
        };
        let field = |name: &str| format!("{}.{}", path, name);
        match op {
            "add" => {
                self.closed(path, obj, &["op", "date", "time"]);
                self.date_in_period(&field("date"), obj.get("date"), period);
                self.time(&field("time"), obj.get("time")).is_some()
            }
            "cancel" => {
                self.closed(path, obj, &["op", "date"]);
                self.date(&field("date"), obj.get("date"));
                false
            }
            "retime" => {
                self.closed(path, obj, &["op", "date", "newTime"]);
                self.date_in_period(&field("date"), obj.get("date"), period);
                self.time(&field("newTime"), obj.get("newTime")).is_some()
            }
            "move" => {
                self.closed(path, obj, &["op", "fromDate", "toDate", "toTime"]);
                self.date(&field("fromDate"), obj.get("fromDate"));
                self.date_in_period(&field("toDate"), obj.get("toDate"), period);
                self.time(&field("toTime"), obj.get("toTime")).is_some()
            }
            other => {
                self.semantic(
                    &field("op"),
                    format!("unknown override '{}'; expected add, cancel, retime or move", other),
                );
                false
            }
        }
    }

    fn frequency(&mut self, value: Option<&Value>) {
        let Some(obj) = self.object("frequency", value, true) else {
            return;
        };
        self.closed("frequency", obj, FREQUENCY_FIELDS);
        self.positive_u32("frequency.targetPerWeek", obj.get("targetPerWeek"), true);
        self.positive_u32("frequency.windowDays", obj.get("windowDays"), false);
    }

    fn milestone(&mut self, value: Option<&Value>) {
        let Some(obj) = self.object("milestone", value, true) else {
            return;
        };
        self.closed("milestone", obj, MILESTONE_FIELDS);

        let mut keys = HashSet::new();
        if let Some(steps) = self.array("milestone.milestones", obj.get("milestones"), true) {
            if steps.is_empty() {
                self.semantic("milestone.milestones", "must list at least one milestone");
            }
            for (i, step) in steps.iter().enumerate() {
                let path = format!("milestone.milestones[{}]", i);
                let Some(step) = self.object(&path, Some(step), true) else {
                    continue;
                };
                self.closed(&path, step, MILESTONE_STEP_FIELDS);
                self.non_empty_string(&format!("{}.label", path), step.get("label"), true);
                let key_path = format!("{}.key", path);
                if let Some(key) = self.non_empty_string(&key_path, step.get("key"), true) {
                    if !keys.insert(key) {
                        self.semantic(&key_path, format!("duplicate milestone key '{}'", key));
                    }
                }
            }
        }

        if let Some(current) = self.string("milestone.currentState", obj.get("currentState"), false)
        {
            if !keys.is_empty() && !keys.contains(current) {
                self.semantic(
                    "milestone.currentState",
                    format!("'{}' does not name a milestone key", current),
                );
            }
        }
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::GoalKind;
    use serde_json::json;

    fn schedule_doc() -> Value {
        json!({
            "type": "schedule",
            "title": "Gym",
            "timezone": "America/New_York",
            "period": {"start": "2024-01-08", "end": "2024-01-22"},
            "verification": {"signals": ["time", "location"]},
            "schedule": {
                "rules": [{"weekdays": [1, 2, 3], "time": "07:00"}],
                "overrides": [{"op": "add", "date": "2024-01-11", "time": "07:00"}]
            }
        })
    }

    fn paths(errors: &ValidationErrors) -> Vec<&str> {
        errors.issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn valid_schedule_document_is_accepted() {
        let spec = validate(&schedule_doc()).unwrap();
        assert_eq!(spec.title, "Gym");
        assert_eq!(spec.version, 0);
        let schedule = spec.schedule().unwrap();
        assert_eq!(schedule.rules.len(), 1);
        assert_eq!(schedule.overrides.len(), 1);
        assert_eq!(spec.success_criteria.target_rate, 1.0);
    }

    #[test]
    fn non_object_document_is_structural() {
        let errors = validate(&json!(["not", "a", "spec"])).unwrap_err();
        assert!(errors.has_structural());
        assert_eq!(paths(&errors), vec!["$"]);
    }

    #[test]
    fn unknown_top_level_field_is_rejected() {
        let mut doc = schedule_doc();
        doc["priority"] = json!("high");
        let errors = validate(&doc).unwrap_err();
        let issue = errors.at("priority").next().unwrap();
        assert_eq!(issue.kind, IssueKind::Structural);
    }

    #[test]
    fn unknown_nested_field_is_rejected() {
        let mut doc = schedule_doc();
        doc["period"]["timezone"] = json!("UTC");
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["period.timezone"]);
    }

    #[test]
    fn malformed_time_is_semantic_and_scoped() {
        let mut doc = schedule_doc();
        doc["schedule"]["rules"][0]["time"] = json!("7am");
        let errors = validate(&doc).unwrap_err();
        let issue = errors.at("schedule.rules[0].time").next().unwrap();
        assert_eq!(issue.kind, IssueKind::Semantic);
        assert!(!errors.has_structural());
    }

    #[test]
    fn time_of_wrong_type_is_structural() {
        let mut doc = schedule_doc();
        doc["schedule"]["rules"][0]["time"] = json!(7);
        let errors = validate(&doc).unwrap_err();
        assert!(errors.has_structural());
    }

    #[test]
    fn weekday_out_of_range_is_reported() {
        let mut doc = schedule_doc();
        doc["schedule"]["rules"][0]["weekdays"] = json!([1, 7]);
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["schedule.rules[0].weekdays[1]"]);
    }

    #[test]
    fn schedule_without_producing_event_is_rejected() {
        let mut doc = schedule_doc();
        doc["schedule"] = json!({
            "rules": [],
            "overrides": [{"op": "cancel", "date": "2024-01-09"}]
        });
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["schedule"]);
    }

    #[test]
    fn explicit_occurrences_count_as_producing_events() {
        let mut doc = schedule_doc();
        doc["schedule"] = json!({"occurrences": [{"date": "2024-01-09", "time": "06:30"}]});
        validate(&doc).unwrap();
    }

    #[test]
    fn override_outside_period_is_rejected() {
        let mut doc = schedule_doc();
        doc["schedule"]["overrides"][0]["date"] = json!("2024-02-01");
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["schedule.overrides[0].date"]);
    }

    #[test]
    fn unknown_override_op_is_reported() {
        let mut doc = schedule_doc();
        doc["schedule"]["overrides"][0] = json!({"op": "skip", "date": "2024-01-09"});
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["schedule.overrides[0].op"]);
    }

    #[test]
    fn inverted_period_is_rejected() {
        let mut doc = schedule_doc();
        doc["period"] = json!({"start": "2024-01-22", "end": "2024-01-08"});
        let errors = validate(&doc).unwrap_err();
        assert!(paths(&errors).contains(&"period"));
    }

    #[test]
    fn empty_signals_are_rejected() {
        let mut doc = schedule_doc();
        doc["verification"]["signals"] = json!([]);
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["verification.signals"]);
    }

    #[test]
    fn unknown_signal_is_rejected() {
        let mut doc = schedule_doc();
        doc["verification"]["signals"] = json!(["time", "gps"]);
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["verification.signals[1]"]);
    }

    #[test]
    fn frequency_requires_positive_integer_target() {
        let base = json!({
            "type": "frequency",
            "title": "Read",
            "timezone": "UTC",
            "period": {"start": "2024-01-01", "end": "2024-03-31"},
            "verification": {"signals": ["manual", "photo"]},
            "frequency": {"targetPerWeek": 3}
        });
        let spec = validate(&base).unwrap();
        assert_eq!(spec.frequency().unwrap().window_days, 7);

        let mut zero = base.clone();
        zero["frequency"]["targetPerWeek"] = json!(0);
        let errors = validate(&zero).unwrap_err();
        assert_eq!(paths(&errors), vec!["frequency.targetPerWeek"]);

        let mut text = base.clone();
        text["frequency"]["targetPerWeek"] = json!("3");
        let errors = validate(&text).unwrap_err();
        assert!(errors.has_structural());
    }

    #[test]
    fn explicit_null_optional_fields_read_as_absent() {
        let fields = [
            ("", "version"),
            ("", "confirmed"),
            ("", "successCriteria"),
            ("", "originalText"),
            ("/schedule", "overrides"),
            ("/schedule", "occurrences"),
        ];
        for (parent, key) in fields {
            let mut doc = schedule_doc();
            doc.pointer_mut(parent)
                .and_then(Value::as_object_mut)
                .unwrap()
                .insert(key.to_string(), Value::Null);
            let spec = validate(&doc)
                .unwrap_or_else(|e| panic!("{}/{} = null: {:?}", parent, key, e.issues));
            assert_eq!(spec.version, 0);
            assert!(!spec.confirmed);
            assert_eq!(spec.success_criteria.target_rate, 1.0);
        }

        let doc = json!({
            "type": "frequency",
            "title": "Read",
            "timezone": "UTC",
            "period": {"start": "2024-01-01", "end": "2024-03-31"},
            "verification": {"signals": ["manual", "photo"]},
            "frequency": {"targetPerWeek": 3, "windowDays": null},
            "schedule": null
        });
        let spec = validate(&doc).unwrap();
        assert_eq!(spec.frequency().unwrap().window_days, 7);
    }

    #[test]
    fn null_required_field_is_reported_at_its_path() {
        let mut doc = schedule_doc();
        doc["title"] = Value::Null;
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["title"]);
        assert!(!errors.has_structural());
    }

    #[test]
    fn milestone_requires_steps_and_known_current_state() {
        let doc = json!({
            "type": "milestone",
            "title": "Ship the book",
            "timezone": "UTC",
            "period": {"start": "2024-01-01", "end": "2024-06-30"},
            "verification": {"signals": ["partner"]},
            "milestone": {
                "milestones": [
                    {"key": "outline", "label": "Outline"},
                    {"key": "draft", "label": "First draft"}
                ],
                "currentState": "draft"
            }
        });
        let spec = validate(&doc).unwrap();
        assert!(matches!(spec.kind, GoalKind::Milestone { .. }));
        assert_eq!(spec.milestone().unwrap().current_index(), Some(1));

        let mut bad = doc.clone();
        bad["milestone"]["currentState"] = json!("print");
        bad["milestone"]["milestones"][1]["key"] = json!("outline");
        let errors = validate(&bad).unwrap_err();
        assert!(paths(&errors).contains(&"milestone.milestones[1].key"));
        assert!(paths(&errors).contains(&"milestone.currentState"));

        let mut empty = doc.clone();
        empty["milestone"] = json!({"milestones": []});
        let errors = validate(&empty).unwrap_err();
        assert_eq!(paths(&errors), vec!["milestone.milestones"]);
    }

    #[test]
    fn foreign_payload_is_rejected() {
        let mut doc = schedule_doc();
        doc["frequency"] = json!({"targetPerWeek": 3});
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["frequency"]);

        let mut null_payload = schedule_doc();
        null_payload["frequency"] = Value::Null;
        validate(&null_payload).unwrap();
    }

    #[test]
    fn missing_type_is_semantic() {
        let mut doc = schedule_doc();
        doc.as_object_mut().unwrap().remove("type");
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["type"]);
        assert!(!errors.has_structural());
    }

    #[test]
    fn target_rate_must_be_a_fraction() {
        let mut doc = schedule_doc();
        doc["successCriteria"] = json!({"targetRate": 80});
        let errors = validate(&doc).unwrap_err();
        assert_eq!(paths(&errors), vec!["successCriteria.targetRate"]);
    }

    #[test]
    fn all_problems_are_collected_at_once() {
        let doc = json!({
            "type": "schedule",
            "title": "",
            "period": {"start": "2024-13-01", "end": "2024-01-22"},
            "verification": {"signals": []},
            "schedule": {"rules": [{"weekdays": [], "time": "25:00"}]}
        });
        let errors = validate(&doc).unwrap_err();
        let found = paths(&errors);
        for expected in [
            "title",
            "timezone",
            "period.start",
            "verification.signals",
            "schedule.rules[0].weekdays",
            "schedule.rules[0].time",
            "schedule",
        ] {
            assert!(found.contains(&expected), "missing {expected}: {found:?}");
        }
    }
}
