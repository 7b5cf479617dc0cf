// evaluator.rs — Verification rule evaluator.
//
// Decides whether a proof submission's evidence satisfies the rule for its
// goal type. Three rules exist:
//
// 1. Schedule  — timeOk AND any of
//                  (manual ∧ location inside)
//                  (photo ∧ timeValid ∧ freshnessValid)
//                  (time ∧ location inside)
//                  (time ∧ manual)
// 2. Frequency — (manual ∧ location inside) OR (manual ∧ photo ∧ freshnessValid)
// 3. Partner   — reviewed ∧ approved; other evidence is recorded only
//
// Any other goal type (milestone included) falls back to the frequency rule.
//
// The evaluator is pure: the caller supplies `now`, and one evaluation reads
// it once. Every outcome carries the named sub-conditions so a failure can be
// explained condition by condition.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use quest_spec::GoalType;

use crate::error::PolicyError;
use crate::evidence::VerificationEvidence;

/// Default slack around a time window, in minutes.
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 15;

fn default_tolerance() -> i64 {
    DEFAULT_TOLERANCE_MINUTES
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Minutes accepted before `windowStart` and after `windowEnd`.
    #[serde(default = "default_tolerance")]
    pub tolerance_minutes: i64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            tolerance_minutes: DEFAULT_TOLERANCE_MINUTES,
        }
    }
}

/// Which rule an evaluation ran. Also the policy domains of the registry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Schedule,
    Frequency,
    Partner,
}

impl RuleKind {
    pub const ALL: [RuleKind; 3] = [RuleKind::Schedule, RuleKind::Frequency, RuleKind::Partner];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Schedule => "schedule",
            RuleKind::Frequency => "frequency",
            RuleKind::Partner => "partner",
        }
    }

    /// Dispatch used by the evaluator: unknown names get the frequency rule.
    pub fn for_goal_type(goal_type: &str) -> Self {
        goal_type.parse().unwrap_or(RuleKind::Frequency)
    }
}

impl From<GoalType> for RuleKind {
    fn from(goal_type: GoalType) -> Self {
        match goal_type {
            GoalType::Schedule => RuleKind::Schedule,
            GoalType::Frequency | GoalType::Milestone => RuleKind::Frequency,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| PolicyError::UnknownGoalType {
                name: s.to_string(),
            })
    }
}

/// The result of one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub pass: bool,
    pub rule: RuleKind,
    /// Named sub-conditions, each true when satisfied.
    pub details: BTreeMap<String, bool>,
    /// Observations that did not affect the outcome.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl VerificationOutcome {
    fn new(rule: RuleKind, pass: bool, details: &[(&str, bool)]) -> Self {
        Self {
            pass,
            rule,
            details: details
                .iter()
                .map(|(name, ok)| (name.to_string(), *ok))
                .collect(),
            notes: Vec::new(),
        }
    }

    /// Names of the sub-conditions that were not satisfied.
    pub fn unmet(&self) -> Vec<&str> {
        self.details
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// `now` inside the time window widened by the tolerance on both sides.
///
/// A missing bound is open on that side; no bounds means presence suffices.
/// A widened bound that falls outside the representable range is also open.
fn time_ok(evidence: &VerificationEvidence, now: DateTime<Utc>, config: &EvaluatorConfig) -> bool {
    let Some(time) = evidence.time.as_ref().filter(|t| t.present) else {
        return false;
    };
    let tolerance = Duration::try_minutes(config.tolerance_minutes.max(0));
    let lower = time
        .window_start
        .and_then(|start| tolerance.and_then(|t| start.checked_sub_signed(t)));
    let upper = time
        .window_end
        .and_then(|end| tolerance.and_then(|t| end.checked_add_signed(t)));
    lower.map_or(true, |lower| now >= lower) && upper.map_or(true, |upper| now <= upper)
}

pub fn evaluate_schedule_rule(
    evidence: &VerificationEvidence,
    now: DateTime<Utc>,
    config: &EvaluatorConfig,
) -> VerificationOutcome {
    let time_ok = time_ok(evidence, now, config);
    let manual_with_location = evidence.manual_present() && evidence.location_inside();
    let photo_valid = evidence
        .photo
        .as_ref()
        .is_some_and(|p| p.present && p.time_valid() && p.freshness_valid());
    let time_with_location = evidence.time_present() && evidence.location_inside();
    let time_with_manual = evidence.time_present() && evidence.manual_present();

    let corroborated =
        manual_with_location || photo_valid || time_with_location || time_with_manual;
    VerificationOutcome::new(
        RuleKind::Schedule,
        time_ok && corroborated,
        &[
            ("timeOk", time_ok),
            ("manualWithLocation", manual_with_location),
            ("photoValid", photo_valid),
            ("timeWithLocation", time_with_location),
            ("timeWithManual", time_with_manual),
        ],
    )
}

pub fn evaluate_frequency_rule(evidence: &VerificationEvidence) -> VerificationOutcome {
    let manual = evidence.manual_present();
    let manual_with_location = manual && evidence.location_inside();
    let manual_with_fresh_photo = manual
        && evidence
            .photo
            .as_ref()
            .is_some_and(|p| p.present && p.freshness_valid());
    VerificationOutcome::new(
        RuleKind::Frequency,
        manual_with_location || manual_with_fresh_photo,
        &[
            ("manualWithLocation", manual_with_location),
            ("manualWithFreshPhoto", manual_with_fresh_photo),
        ],
    )
}

/// Partner approval alone decides the outcome. Corroborating evidence is
/// reported in the details and, when present, noted as not enforced.
pub fn evaluate_partner_rule(evidence: &VerificationEvidence) -> VerificationOutcome {
    let reviewed = evidence.partner.as_ref().is_some_and(|p| p.reviewed);
    let approved = evidence.partner.as_ref().is_some_and(|p| p.approved);
    let manual = evidence.manual_present();
    let photo = evidence.photo_present();
    let location = evidence.location_inside();

    let mut outcome = VerificationOutcome::new(
        RuleKind::Partner,
        reviewed && approved,
        &[
            ("reviewed", reviewed),
            ("approved", approved),
            ("manualPresent", manual),
            ("photoPresent", photo),
            ("locationInside", location),
        ],
    );

    let corroborating: Vec<&str> = [("manual", manual), ("photo", photo), ("location", location)]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect();
    if !corroborating.is_empty() {
        outcome.notes.push(format!(
            "corroborating evidence ({}) recorded but not required by the partner rule",
            corroborating.join(", ")
        ));
    }
    outcome
}

/// Run the rule for `kind`.
pub fn evaluate_rule(
    kind: RuleKind,
    evidence: &VerificationEvidence,
    now: DateTime<Utc>,
    config: &EvaluatorConfig,
) -> VerificationOutcome {
    match kind {
        RuleKind::Schedule => evaluate_schedule_rule(evidence, now, config),
        RuleKind::Frequency => evaluate_frequency_rule(evidence),
        RuleKind::Partner => evaluate_partner_rule(evidence),
    }
}

/// Evaluate `evidence` for a goal type name. Unknown names use the frequency rule.
pub fn evaluate(
    goal_type: &str,
    evidence: &VerificationEvidence,
    now: DateTime<Utc>,
    config: &EvaluatorConfig,
) -> VerificationOutcome {
    let kind = RuleKind::for_goal_type(goal_type);
    let outcome = evaluate_rule(kind, evidence, now, config);
    tracing::debug!(
        goal_type,
        rule = %kind,
        pass = outcome.pass,
        unmet = ?outcome.unmet(),
        "evaluated verification evidence"
    );
    outcome
}
