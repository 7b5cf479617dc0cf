// spec.rs — GoalSpecification: the validated goal declaration.
//
// A specification has common fields (title, timezone, period, verification,
// success criteria, version) plus exactly one type-specific payload. The
// payload is modeled as a sum type keyed by `type`, so a schedule goal can
// never carry a meaningless `targetPerWeek` and vice versa.
//
// Lifecycle:
//   authored → validated → (override edits, each bumping `version`)
//     → confirmed (occurrences locked) → reopened → ...
//
// The persistence collaborator compares `version` before writing back; every
// mutating operation here takes the version the caller read and rejects the
// call if the specification has moved on.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::schedule::{Occurrence, Override, Period, ScheduleRule};
use crate::signal::{GoalType, SignalKind};

/// Verification block: which evidence kinds back a proof submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationSpec {
    pub signals: BTreeSet<SignalKind>,
}

/// How much of the goal must be completed to count as a success.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuccessCriteria {
    /// Fraction of instances that must be completed, in (0, 1].
    pub target_rate: f64,
}

impl Default for SuccessCriteria {
    fn default() -> Self {
        Self { target_rate: 1.0 }
    }
}

/// Payload of a schedule goal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleSpec {
    #[serde(default)]
    pub rules: Vec<ScheduleRule>,

    /// Exception edits, applied in list order.
    #[serde(default)]
    pub overrides: Vec<Override>,

    /// The confirmed final occurrence list (empty until confirmed).
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

/// Payload of a frequency goal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrequencySpec {
    pub target_per_week: u32,

    /// Length of the rolling window completions are counted over.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

pub const DEFAULT_WINDOW_DAYS: u32 = 7;

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

/// One step of a milestone goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    pub key: String,
    pub label: String,
}

/// Payload of a milestone goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneSpec {
    pub milestones: Vec<Milestone>,

    /// Key of the milestone currently being worked on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<String>,
}

impl MilestoneSpec {
    /// Position of `current_state` in the ordered list.
    pub fn current_index(&self) -> Option<usize> {
        let key = self.current_state.as_deref()?;
        self.milestones.iter().position(|m| m.key == key)
    }
}

/// The type-specific part of a specification.
///
/// `#[serde(tag = "type")]` together with `#[serde(flatten)]` on the parent
/// keeps the wire shape flat: `{"type": "schedule", "schedule": {...}, ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GoalKind {
    Schedule { schedule: ScheduleSpec },
    Frequency { frequency: FrequencySpec },
    Milestone { milestone: MilestoneSpec },
}

impl GoalKind {
    pub fn goal_type(&self) -> GoalType {
        match self {
            GoalKind::Schedule { .. } => GoalType::Schedule,
            GoalKind::Frequency { .. } => GoalType::Frequency,
            GoalKind::Milestone { .. } => GoalType::Milestone,
        }
    }
}

/// A validated goal declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalSpecification {
    pub title: String,

    /// The free text the goal was authored from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,

    /// IANA zone name the schedule times are expressed in.
    pub timezone: String,

    pub period: Period,

    pub verification: VerificationSpec,

    #[serde(default)]
    pub success_criteria: SuccessCriteria,

    /// Monotonic revision counter for optimistic-concurrency writes.
    #[serde(default)]
    pub version: u64,

    /// True once the occurrence list has been locked.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub confirmed: bool,

    #[serde(flatten)]
    pub kind: GoalKind,
}

impl GoalSpecification {
    pub fn goal_type(&self) -> GoalType {
        self.kind.goal_type()
    }

    pub fn schedule(&self) -> Option<&ScheduleSpec> {
        match &self.kind {
            GoalKind::Schedule { schedule } => Some(schedule),
            _ => None,
        }
    }

    pub fn schedule_mut(&mut self) -> Option<&mut ScheduleSpec> {
        match &mut self.kind {
            GoalKind::Schedule { schedule } => Some(schedule),
            _ => None,
        }
    }

    pub fn frequency(&self) -> Option<&FrequencySpec> {
        match &self.kind {
            GoalKind::Frequency { frequency } => Some(frequency),
            _ => None,
        }
    }

    pub fn milestone(&self) -> Option<&MilestoneSpec> {
        match &self.kind {
            GoalKind::Milestone { milestone } => Some(milestone),
            _ => None,
        }
    }

    /// Reject the call if the caller's snapshot is stale.
    pub fn check_version(&self, expected: u64) -> Result<(), SpecError> {
        if self.version != expected {
            return Err(SpecError::VersionConflict {
                expected,
                actual: self.version,
            });
        }
        Ok(())
    }

    /// Reject the call if the occurrences are locked.
    pub fn ensure_editable(&self) -> Result<(), SpecError> {
        if self.confirmed {
            return Err(SpecError::Locked {
                title: self.title.clone(),
            });
        }
        Ok(())
    }

    /// Record a successful mutation.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Unlock a confirmed goal so it can be edited again.
    ///
    /// The confirmed occurrence list is kept as-is; the next confirm replaces it.
    pub fn reopen(&mut self, expected_version: u64) -> Result<(), SpecError> {
        self.check_version(expected_version)?;
        if !self.confirmed {
            return Err(SpecError::NotConfirmed {
                title: self.title.clone(),
            });
        }
        self.confirmed = false;
        self.bump_version();
        tracing::info!(title = %self.title, version = self.version, "goal reopened");
        Ok(())
    }

    /// Serialize back into the JSON document shape the validator accepts.
    pub fn to_json(&self) -> Result<serde_json::Value, SpecError> {
        Ok(serde_json::to_value(self)?)
    }
}
