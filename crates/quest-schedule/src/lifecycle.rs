// lifecycle.rs — Schedule lifecycle on top of a GoalSpecification.
//
// The occurrence engine and frequency validator are pure functions over
// occurrence lists. This module wires them to a stored specification:
//
//   preview_occurrences()  — base recurrence + stored overrides, or the locked
//                            list once confirmed
//   record_overrides()     — append edits (version-checked, bumps version)
//   record_preview_edits() — diff an edited preview into overrides, then record
//   confirm_schedule()     — lock the previewed list into `occurrences`
//   check_schedule_goal()  — CountRule over the previewed occurrences
//   check_frequency_goal() — rolling window over recorded completions
//
// Every mutating call takes the version the caller read. Nothing is written
// to the specification unless the whole call succeeds.

use chrono::NaiveDate;

use quest_spec::{
    GoalSpecification, GoalType, Occurrence, Override, ScheduleSpec, SpecError,
};

use crate::error::ScheduleError;
use crate::frequency::{
    check_calendar_buckets, check_declared_target, check_rolling_window, CountRule,
    FrequencyReport, WeekBoundaryConfig,
};
use crate::occurrence::{apply_overrides_with, diff_to_overrides, expand_rules, OverrideOptions};

fn wrong_type(spec: &GoalSpecification, expected: GoalType) -> ScheduleError {
    ScheduleError::Spec(SpecError::WrongGoalType {
        expected: expected.to_string(),
        actual: spec.goal_type().to_string(),
    })
}

fn schedule_of(spec: &GoalSpecification) -> Result<&ScheduleSpec, ScheduleError> {
    spec.schedule()
        .ok_or_else(|| wrong_type(spec, GoalType::Schedule))
}

/// The list overrides are applied to: the rule expansion, or the explicit
/// occurrence list when a goal was authored without rules.
fn base_occurrences(spec: &GoalSpecification, schedule: &ScheduleSpec) -> Vec<Occurrence> {
    if schedule.rules.is_empty() {
        schedule
            .occurrences
            .iter()
            .filter(|o| spec.period.contains(o.date))
            .copied()
            .collect()
    } else {
        expand_rules(&schedule.rules, &spec.period)
    }
}

fn project(
    spec: &GoalSpecification,
    schedule: &ScheduleSpec,
    extra: &[Override],
    options: &OverrideOptions,
) -> Result<Vec<Occurrence>, ScheduleError> {
    let base = base_occurrences(spec, schedule);
    let edits: Vec<Override> = schedule.overrides.iter().chain(extra).cloned().collect();
    apply_overrides_with(&base, &edits, options)
}

/// The occurrence list a schedule goal currently describes.
///
/// Confirmed goals return their locked list unchanged.
pub fn preview_occurrences(
    spec: &GoalSpecification,
    options: &OverrideOptions,
) -> Result<Vec<Occurrence>, ScheduleError> {
    let schedule = schedule_of(spec)?;
    if spec.confirmed {
        return Ok(schedule.occurrences.clone());
    }
    project(spec, schedule, &[], options)
}

fn ensure_in_period(
    spec: &GoalSpecification,
    offset: usize,
    edits: &[Override],
) -> Result<(), ScheduleError> {
    for (i, edit) in edits.iter().enumerate() {
        // Cancels and move sources may name any date; only placements are bounded.
        if let Some(date) = edit.target_date().filter(|d| !spec.period.contains(*d)) {
            return Err(ScheduleError::OutsidePeriod {
                index: offset + i,
                date,
                start: spec.period.start,
                end: spec.period.end,
            });
        }
    }
    Ok(())
}

/// Append `edits` to the goal's override list.
///
/// The edits are applied to the current preview first; on any error the
/// specification is left untouched.
pub fn record_overrides(
    spec: &mut GoalSpecification,
    edits: &[Override],
    expected_version: u64,
    options: &OverrideOptions,
) -> Result<Vec<Occurrence>, ScheduleError> {
    spec.check_version(expected_version)?;
    spec.ensure_editable()?;
    let schedule = schedule_of(spec)?;
    ensure_in_period(spec, schedule.overrides.len(), edits)?;
    let preview = project(spec, schedule, edits, options)?;

    if let Some(schedule) = spec.schedule_mut() {
        schedule.overrides.extend(edits.iter().cloned());
    }
    spec.bump_version();
    tracing::info!(
        title = %spec.title,
        edits = edits.len(),
        version = spec.version,
        "recorded schedule overrides"
    );
    Ok(preview)
}

/// Record the difference between the current preview and an edited copy of it.
///
/// Returns the edits that were recorded (empty when nothing changed, in which
/// case the version is not bumped).
pub fn record_preview_edits(
    spec: &mut GoalSpecification,
    edited: &[Occurrence],
    expected_version: u64,
    options: &OverrideOptions,
) -> Result<Vec<Override>, ScheduleError> {
    spec.check_version(expected_version)?;
    spec.ensure_editable()?;
    let current = preview_occurrences(spec, options)?;
    let edits = diff_to_overrides(&current, edited)?;
    if edits.is_empty() {
        return Ok(edits);
    }
    record_overrides(spec, &edits, expected_version, options)?;
    Ok(edits)
}

/// Lock the previewed occurrences into the specification.
///
/// The overrides stay on record for rule-based goals so a reopened goal can
/// be previewed again. Goals authored as an explicit list have their
/// overrides folded in, since the list itself is the base.
pub fn confirm_schedule(
    spec: &mut GoalSpecification,
    expected_version: u64,
    options: &OverrideOptions,
) -> Result<Vec<Occurrence>, ScheduleError> {
    spec.check_version(expected_version)?;
    spec.ensure_editable()?;
    let final_list = preview_occurrences(spec, options)?;

    if let Some(schedule) = spec.schedule_mut() {
        if schedule.rules.is_empty() {
            schedule.overrides.clear();
        }
        schedule.occurrences = final_list.clone();
    }
    spec.confirmed = true;
    spec.bump_version();
    tracing::info!(
        title = %spec.title,
        occurrences = final_list.len(),
        version = spec.version,
        "schedule confirmed"
    );
    Ok(final_list)
}

/// Check a schedule goal's occurrences against a CountRule.
pub fn check_schedule_goal(
    spec: &GoalSpecification,
    rule: &CountRule,
    weeks: &WeekBoundaryConfig,
    options: &OverrideOptions,
) -> Result<FrequencyReport, ScheduleError> {
    let occurrences = preview_occurrences(spec, options)?;
    Ok(check_calendar_buckets(&occurrences, &spec.period, rule, weeks))
}

/// Check a frequency goal's declared weekly target against a minimum rule.
pub fn check_frequency_target(
    spec: &GoalSpecification,
    rule: &CountRule,
    weeks: &WeekBoundaryConfig,
) -> Result<FrequencyReport, ScheduleError> {
    let frequency = spec
        .frequency()
        .ok_or_else(|| wrong_type(spec, GoalType::Frequency))?;
    check_declared_target(frequency.target_per_week, &spec.period, rule, weeks)
}

/// Check a frequency goal's recorded completions over its rolling window.
pub fn check_frequency_goal(
    spec: &GoalSpecification,
    completions: &[NaiveDate],
    weeks: &WeekBoundaryConfig,
) -> Result<FrequencyReport, ScheduleError> {
    let frequency = spec
        .frequency()
        .ok_or_else(|| wrong_type(spec, GoalType::Frequency))?;
    Ok(check_rolling_window(
        completions,
        &spec.period,
        frequency,
        weeks.enforce_partial_weeks,
    ))
}
