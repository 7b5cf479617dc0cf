// error.rs — Error types for the specification subsystem.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a validation problem is about shape or about meaning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Schema-shape violation (unknown field, wrong primitive type). Always blocking.
    Structural,
    /// Type-specific requirement violated (missing payload, empty list, bad range).
    Semantic,
}

/// One field-scoped validation problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON path of the offending field, e.g. `schedule.rules[0].time`.
    /// `$` refers to the document root.
    pub path: String,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The full list of problems found in a candidate specification.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("specification has {} problem(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationErrors {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    /// Whether any issue is structural (never repairable).
    pub fn has_structural(&self) -> bool {
        self.issues.iter().any(|i| i.kind == IssueKind::Structural)
    }

    /// Issues reported at exactly `path`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.issues.iter().filter(move |i| i.path == path)
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from lifecycle operations on a validated specification.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The candidate document failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),

    /// The caller read an older version than the one it is trying to modify.
    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// The occurrences are locked; the goal must be reopened first.
    #[error("goal '{title}' is confirmed; reopen it before editing")]
    Locked { title: String },

    /// Reopen was requested on a goal that is not confirmed.
    #[error("goal '{title}' is not confirmed")]
    NotConfirmed { title: String },

    /// The operation only applies to a different goal type.
    #[error("operation requires a {expected} goal, found {actual}")]
    WrongGoalType { expected: String, actual: String },

    /// Failed to serialize/deserialize specification data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
