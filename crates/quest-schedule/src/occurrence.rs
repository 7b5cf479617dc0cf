// occurrence.rs — Occurrence engine: rule expansion and exception edits.
//
// Three operations:
//
// 1. expand_rules()      — weekday/time rules × period → dated occurrences
// 2. apply_overrides()   — base occurrences + ordered edits → final list
// 3. diff_to_overrides() — two snapshots → the minimal edit list between them
//
// Edits are date-keyed: every override addresses "the occurrence on date D".
// The working set maps each date to its times; any edit that touches a date
// leaves at most one occurrence on it. Edits apply strictly in list order,
// so when two edits target the same date the later one wins.
//
// The round-trip law ties 2 and 3 together:
//   apply_overrides(a, diff_to_overrides(a, b)?)? == b
// for any `b` with at most one occurrence per date.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use quest_spec::{Occurrence, Override, Period, ScheduleRule, TimeOfDay};

use crate::error::ScheduleError;

/// What a `move` does when its destination date is already occupied.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoveCollision {
    /// Fail the whole edit list with `ScheduleError::MoveCollision`.
    #[default]
    Reject,
    /// Replace the destination occurrence, like `add` does.
    Replace,
}

/// Tunables for `apply_overrides_with()`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OverrideOptions {
    #[serde(default)]
    pub move_collision: MoveCollision,
}

/// Expand weekly rules into every matching date of `period` (inclusive).
///
/// Each (weekday, time) pair yields one occurrence per matching date.
/// Overlapping rules may therefore put several times on one date; identical
/// (date, time) pairs are emitted once. The result is sorted.
pub fn expand_rules(rules: &[ScheduleRule], period: &Period) -> Vec<Occurrence> {
    let mut occurrences: Vec<Occurrence> = period
        .days()
        .flat_map(|date| {
            rules
                .iter()
                .filter(move |rule| rule.matches(date))
                .map(move |rule| Occurrence::new(date, rule.time))
        })
        .collect();
    occurrences.sort();
    occurrences.dedup();
    tracing::debug!(
        rules = rules.len(),
        occurrences = occurrences.len(),
        "expanded schedule rules"
    );
    occurrences
}

/// Apply `overrides` in order with the default options (moves onto an
/// occupied date are rejected).
pub fn apply_overrides(
    base: &[Occurrence],
    overrides: &[Override],
) -> Result<Vec<Occurrence>, ScheduleError> {
    apply_overrides_with(base, overrides, &OverrideOptions::default())
}

/// Apply `overrides` in order on top of `base`.
///
/// - `cancel` removes the date (absent date → no-op)
/// - `add` places one occurrence, replacing whatever the date held
/// - `retime` changes the date's time, or adds when the date is empty
/// - `move` clears `from_date` (absent → no-op) and places at `to_date`,
///   subject to `options.move_collision`
pub fn apply_overrides_with(
    base: &[Occurrence],
    overrides: &[Override],
    options: &OverrideOptions,
) -> Result<Vec<Occurrence>, ScheduleError> {
    let mut working: BTreeMap<NaiveDate, BTreeSet<TimeOfDay>> = BTreeMap::new();
    for occ in base {
        working.entry(occ.date).or_default().insert(occ.time);
    }

    for (index, edit) in overrides.iter().enumerate() {
        match edit {
            Override::Cancel { date } => {
                if working.remove(date).is_none() {
                    tracing::debug!(%date, "cancel on empty date ignored");
                }
            }
            Override::Add { date, time } => place(&mut working, *date, *time),
            Override::Retime { date, new_time } => {
                if !working.contains_key(date) {
                    tracing::debug!(%date, "retime on empty date treated as add");
                }
                place(&mut working, *date, *new_time);
            }
            Override::Move {
                from_date,
                to_date,
                to_time,
            } => {
                if working.remove(from_date).is_none() {
                    tracing::debug!(%from_date, "move source empty");
                }
                if options.move_collision == MoveCollision::Reject
                    && working.contains_key(to_date)
                {
                    tracing::warn!(
                        index,
                        %from_date,
                        %to_date,
                        "move rejected: destination occupied"
                    );
                    return Err(ScheduleError::MoveCollision {
                        index,
                        from: *from_date,
                        to: *to_date,
                    });
                }
                place(&mut working, *to_date, *to_time);
            }
        }
    }

    Ok(flatten(working))
}

fn place(working: &mut BTreeMap<NaiveDate, BTreeSet<TimeOfDay>>, date: NaiveDate, time: TimeOfDay) {
    working.insert(date, BTreeSet::from([time]));
}

fn flatten(working: BTreeMap<NaiveDate, BTreeSet<TimeOfDay>>) -> Vec<Occurrence> {
    // BTreeMap/BTreeSet iteration order is already (date, time) ascending.
    working
        .into_iter()
        .flat_map(|(date, times)| times.into_iter().map(move |t| Occurrence::new(date, t)))
        .collect()
}

fn group_by_date(occurrences: &[Occurrence]) -> BTreeMap<NaiveDate, BTreeSet<TimeOfDay>> {
    let mut grouped: BTreeMap<NaiveDate, BTreeSet<TimeOfDay>> = BTreeMap::new();
    for occ in occurrences {
        grouped.entry(occ.date).or_default().insert(occ.time);
    }
    grouped
}

/// Derive the minimal cancel/add/retime list that turns `original` into
/// `current`.
///
/// - date only in `original` → `cancel`
/// - date only in `current` → `add`
/// - date in both with different times → `retime`
///
/// Edits come out in date order. Dates whose times are the same in both
/// snapshots produce no edit; every other date in `current` must hold at most
/// one occurrence.
pub fn diff_to_overrides(
    original: &[Occurrence],
    current: &[Occurrence],
) -> Result<Vec<Override>, ScheduleError> {
    let before = group_by_date(original);
    let after = group_by_date(current);

    let dates: BTreeSet<NaiveDate> = before.keys().chain(after.keys()).copied().collect();
    let mut edits = Vec::new();
    for date in dates {
        let old = before.get(&date);
        if old == after.get(&date) {
            continue;
        }
        let new = match after.get(&date) {
            Some(times) if times.len() > 1 => {
                return Err(ScheduleError::SameDayMultiples {
                    date,
                    count: times.len(),
                });
            }
            Some(times) => times.iter().next().copied(),
            None => None,
        };
        match (old, new) {
            (Some(_), None) => edits.push(Override::Cancel { date }),
            (None, Some(time)) => edits.push(Override::Add { date, time }),
            (Some(times), Some(time)) => {
                if !(times.len() == 1 && times.contains(&time)) {
                    edits.push(Override::Retime {
                        date,
                        new_time: time,
                    });
                }
            }
            (None, None) => {}
        }
    }
    Ok(edits)
}
