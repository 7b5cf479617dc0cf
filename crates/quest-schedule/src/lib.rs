//! # quest-schedule
//!
//! Occurrence expansion, exception edits and frequency checks for Quest goals.
//!
//! Everything here is a pure function of its inputs: the same rules, period
//! and edit list always produce the same occurrence list, and the same
//! occurrences and CountRule always produce the same report.
//!
//! ## Key components
//!
//! - [`expand_rules`] / [`apply_overrides`] / [`diff_to_overrides`] — the
//!   occurrence engine, date-keyed and order-sensitive
//! - [`check_calendar_buckets`] — CountRule per week, day or month bucket,
//!   with configurable week anchoring and partial-bucket enforcement
//! - [`check_rolling_window`] — trailing-window check for frequency goals
//! - [`preview_occurrences`], [`record_overrides`], [`confirm_schedule`] —
//!   version-checked lifecycle operations on a [`GoalSpecification`]
//!
//! [`GoalSpecification`]: quest_spec::GoalSpecification

pub mod error;
pub mod frequency;
pub mod lifecycle;
pub mod occurrence;

pub use error::ScheduleError;
pub use frequency::{
    check_calendar_buckets, check_declared_target, check_rolling_window, BucketResult,
    CountOperator, CountRule, CountUnit, FrequencyReport, WeekAnchor, WeekBoundaryConfig,
};
pub use lifecycle::{
    check_frequency_goal, check_frequency_target, check_schedule_goal, confirm_schedule,
    preview_occurrences, record_overrides, record_preview_edits,
};
pub use occurrence::{
    apply_overrides, apply_overrides_with, diff_to_overrides, expand_rules, MoveCollision,
    OverrideOptions,
};
