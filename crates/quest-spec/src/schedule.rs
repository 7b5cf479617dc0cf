// schedule.rs — Calendar building blocks for schedule goals.
//
// A schedule goal is declared as abstract weekly rules (`ScheduleRule`) plus
// an ordered list of exception edits (`Override`). Expanding the rules over a
// `Period` and applying the edits yields concrete `Occurrence`s. The expansion
// itself lives in the quest-schedule crate; this module only defines the data.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::time::TimeOfDay;

/// An inclusive calendar-date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` lies within `[start, end]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered (0 for an inverted period).
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days().max(-1) + 1
    }

    /// Iterate every date in the period, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Weekday numbering used by schedule rules: 0 = Sunday … 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// A recurring weekly pattern: every listed weekday at `time`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleRule {
    /// Weekday indices, 0 = Sunday … 6 = Saturday.
    pub weekdays: BTreeSet<u8>,
    pub time: TimeOfDay,
}

impl ScheduleRule {
    pub fn new(weekdays: impl IntoIterator<Item = u8>, time: TimeOfDay) -> Self {
        Self {
            weekdays: weekdays.into_iter().collect(),
            time,
        }
    }

    /// Whether this rule fires on `date`.
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.weekdays.contains(&weekday_index(date))
    }
}

/// A concrete dated-and-timed instance of a schedule.
///
/// Field order matters: the derived `Ord` sorts by (date, time).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub time: TimeOfDay,
}

impl Occurrence {
    pub fn new(date: NaiveDate, time: TimeOfDay) -> Self {
        Self { date, time }
    }
}

/// One exception edit applied on top of the base recurrence.
///
/// Serialized with an `op` tag, e.g. `{"op": "retime", "date": "2024-01-09",
/// "newTime": "18:00"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Override {
    /// Insert an occurrence (replacing whatever is on that date).
    Add { date: NaiveDate, time: TimeOfDay },

    /// Remove the occurrence on a date, if any.
    Cancel { date: NaiveDate },

    /// Change the time of the occurrence on a date (adds one if absent).
    #[serde(rename_all = "camelCase")]
    Retime { date: NaiveDate, new_time: TimeOfDay },

    /// Remove the occurrence on `from_date` and place one on `to_date`.
    #[serde(rename_all = "camelCase")]
    Move {
        from_date: NaiveDate,
        to_date: NaiveDate,
        to_time: TimeOfDay,
    },
}

impl Override {
    /// Short name of the edit kind, matching the serialized `op` tag.
    pub fn op(&self) -> &'static str {
        match self {
            Override::Add { .. } => "add",
            Override::Cancel { .. } => "cancel",
            Override::Retime { .. } => "retime",
            Override::Move { .. } => "move",
        }
    }

    /// The date this edit places an occurrence on, if it places one.
    pub fn target_date(&self) -> Option<NaiveDate> {
        match self {
            Override::Add { date, .. } | Override::Retime { date, .. } => Some(*date),
            Override::Move { to_date, .. } => Some(*to_date),
            Override::Cancel { .. } => None,
        }
    }
}
