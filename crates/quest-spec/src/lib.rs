//! # quest-spec
//!
//! Goal specification model, validation and repair for Quest.
//!
//! A [`GoalSpecification`] declares a goal as one of three shapes: a
//! recurring schedule, a weekly frequency target, or a milestone sequence.
//! Specifications arrive as JSON documents from an authoring collaborator
//! and are accepted only after [`validate`] finds no problems.
//!
//! ## Key components
//!
//! - [`validate`] — closed-schema, field-scoped validation
//! - [`validate_with_recovery`] — the same, after a fixed list of
//!   independent repair heuristics ([`REPAIRS`])
//! - [`GoalSpecification`] / [`GoalKind`] — the typed model, one payload per
//!   goal type
//! - [`ScheduleRule`], [`Override`], [`Occurrence`], [`Period`] — calendar
//!   building blocks consumed by quest-schedule
//! - [`SignalKind`] — verification evidence kinds consumed by quest-verify

pub mod error;
pub mod repair;
pub mod schedule;
pub mod signal;
pub mod spec;
pub mod time;
pub mod validator;

pub use error::{IssueKind, SpecError, ValidationErrors, ValidationIssue};
pub use repair::{validate_with_recovery, RecoveryOutcome, RepairWarning, REPAIRS};
pub use schedule::{weekday_index, Occurrence, Override, Period, ScheduleRule};
pub use signal::{GoalType, SignalKind};
pub use spec::{
    FrequencySpec, GoalKind, GoalSpecification, Milestone, MilestoneSpec, ScheduleSpec,
    SuccessCriteria, VerificationSpec,
};
pub use time::TimeOfDay;
pub use validator::validate;
