// error.rs — Error types for the schedule subsystem.

use chrono::NaiveDate;
use thiserror::Error;

use quest_spec::SpecError;

/// Errors that can occur while expanding, editing or checking a schedule.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// A lifecycle precondition on the specification failed.
    #[error(transparent)]
    Spec(#[from] SpecError),

    /// A `move` edit would land on a date that already holds an occurrence.
    #[error("override #{index}: moving {from} to {to} would overwrite the occurrence on {to}")]
    MoveCollision {
        index: usize,
        from: NaiveDate,
        to: NaiveDate,
    },

    /// An edit places an occurrence outside the goal period.
    #[error("override #{index}: {date} is outside the goal period {start}..{end}")]
    OutsidePeriod {
        index: usize,
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// A snapshot holds several occurrences on one date, which date-keyed
    /// edits cannot express.
    #[error("{date} holds {count} occurrences; edits address one occurrence per date")]
    SameDayMultiples { date: NaiveDate, count: usize },

    /// The check only supports a different count unit.
    #[error("declared weekly targets can only be checked per_week, not {unit}")]
    UnsupportedUnit { unit: String },
}
