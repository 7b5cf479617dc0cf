// signal.rs — Goal types and verification signal kinds.
//
// Both enums are shared by the validator (which checks that a specification
// names known kinds) and by the verification crate (which evaluates evidence
// for them). Their wire names are the lowercase words used in specification
// documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three shapes a goal can take.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    /// A recurring weekday/time schedule.
    Schedule,
    /// A weekly frequency target ("3 times a week").
    Frequency,
    /// An ordered sequence of milestones.
    Milestone,
}

impl GoalType {
    pub const ALL: [GoalType; 3] = [GoalType::Schedule, GoalType::Frequency, GoalType::Milestone];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Schedule => "schedule",
            GoalType::Frequency => "frequency",
            GoalType::Milestone => "milestone",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GoalType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown goal type '{}'", s))
    }
}

/// A kind of runtime evidence that can back a proof submission.
///
/// The derived `Ord` gives signal sets a stable order, which keeps
/// serialized signal lists and policy names deterministic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// The submission happened inside the scheduled time window.
    Time,
    /// The device was inside the goal's geofence.
    Location,
    /// A photo was captured as proof.
    Photo,
    /// The user confirmed completion by hand.
    Manual,
    /// A partner reviewed and approved the proof.
    Partner,
}

impl SignalKind {
    pub const ALL: [SignalKind; 5] = [
        SignalKind::Time,
        SignalKind::Location,
        SignalKind::Photo,
        SignalKind::Manual,
        SignalKind::Partner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Time => "time",
            SignalKind::Location => "location",
            SignalKind::Photo => "photo",
            SignalKind::Manual => "manual",
            SignalKind::Partner => "partner",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignalKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown signal kind '{}'", s))
    }
}
