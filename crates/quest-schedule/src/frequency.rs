// frequency.rs — Frequency validator.
//
// Two independent modes:
//
// 1. Calendar buckets: the period is cut into unit-length buckets (weeks,
//    days or calendar months). Weeks are anchored either on the weekday of
//    `period.start` or on Monday (ISO weeks). A bucket that spans a full unit
//    inside the period is "complete"; one truncated by either period boundary
//    is "partial". Complete buckets are always checked against the CountRule.
//    Partial buckets are only checked when `enforce_partial_weeks` is set, and
//    then against a threshold prorated to their day count:
//        ceil(count × days_in_bucket / unit_days)
//
// 2. Rolling window, for frequency goals. Every trailing `window_days`
//    window ending inside the period must hold at least the weekly target
//    scaled to the window length. Windows that would reach before
//    `period.start` are partial and follow the same enforcement flag.
//
// Both modes return a FrequencyReport; zero occurrences is an ordinary input
// that simply fails every enforced bucket.

use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use quest_spec::{FrequencySpec, Occurrence, Period};

use crate::error::ScheduleError;

/// Comparison applied between a bucket's count and the rule's threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CountOperator {
    #[serde(rename = ">=")]
    AtLeast,
    #[serde(rename = "==")]
    Exactly,
    #[serde(rename = "<=")]
    AtMost,
}

impl CountOperator {
    pub fn holds(&self, count: u32, threshold: u32) -> bool {
        match self {
            CountOperator::AtLeast => count >= threshold,
            CountOperator::Exactly => count == threshold,
            CountOperator::AtMost => count <= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CountOperator::AtLeast => ">=",
            CountOperator::Exactly => "==",
            CountOperator::AtMost => "<=",
        }
    }

    /// The relation that holds when the check fails (`3 < 4`).
    fn failed_symbol(&self) -> &'static str {
        match self {
            CountOperator::AtLeast => "<",
            CountOperator::Exactly => "!=",
            CountOperator::AtMost => ">",
        }
    }
}

impl std::str::FromStr for CountOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">=" => Ok(CountOperator::AtLeast),
            "==" | "=" => Ok(CountOperator::Exactly),
            "<=" => Ok(CountOperator::AtMost),
            other => Err(format!("unknown operator '{}'; expected >=, == or <=", other)),
        }
    }
}

/// The bucket length a CountRule is expressed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CountUnit {
    PerWeek,
    PerDay,
    PerMonth,
}

impl CountUnit {
    fn label(&self) -> &'static str {
        match self {
            CountUnit::PerWeek => "week",
            CountUnit::PerDay => "day",
            CountUnit::PerMonth => "month",
        }
    }
}

impl fmt::Display for CountUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountUnit::PerWeek => write!(f, "per_week"),
            CountUnit::PerDay => write!(f, "per_day"),
            CountUnit::PerMonth => write!(f, "per_month"),
        }
    }
}

/// An operator + threshold judged per bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountRule {
    pub operator: CountOperator,
    pub count: u32,
    pub unit: CountUnit,
}

impl CountRule {
    pub fn new(operator: CountOperator, count: u32, unit: CountUnit) -> Self {
        Self {
            operator,
            count,
            unit,
        }
    }

    pub fn at_least_per_week(count: u32) -> Self {
        Self::new(CountOperator::AtLeast, count, CountUnit::PerWeek)
    }
}

/// Where week buckets start.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WeekAnchor {
    /// Buckets start on the weekday of `period.start`.
    #[default]
    #[serde(alias = "start_weekday")]
    StartWeekday,
    /// Buckets start on Monday.
    #[serde(alias = "iso_week")]
    IsoWeek,
}

/// How calendar buckets are cut and which of them are judged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeekBoundaryConfig {
    #[serde(default)]
    pub anchor: WeekAnchor,

    /// Check truncated buckets too (with a prorated threshold).
    #[serde(default, alias = "enforce_partial_weeks")]
    pub enforce_partial_weeks: bool,
}

/// The outcome for one bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BucketResult {
    pub bucket_start: NaiveDate,
    pub bucket_end: NaiveDate,
    pub count: u32,
    /// Threshold the count was compared with (prorated for partial buckets).
    pub threshold: u32,
    pub complete: bool,
    /// Whether this bucket takes part in the overall decision.
    pub enforced: bool,
    /// Always true for buckets that are not enforced.
    pub pass: bool,
}

/// The outcome of a frequency check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyReport {
    pub pass: bool,
    pub per_bucket: Vec<BucketResult>,
    /// Empty on success; otherwise names the failing buckets and shortfalls.
    pub failure_summary: String,
}

/// Number of failing buckets spelled out in a summary before truncating.
const SUMMARY_LIMIT: usize = 3;

impl FrequencyReport {
    fn from_buckets(
        per_bucket: Vec<BucketResult>,
        describe: impl Fn(&BucketResult) -> String,
    ) -> Self {
        let failing: Vec<&BucketResult> = per_bucket.iter().filter(|b| !b.pass).collect();
        let mut parts: Vec<String> = failing
            .iter()
            .take(SUMMARY_LIMIT)
            .map(|b| describe(b))
            .collect();
        if failing.len() > SUMMARY_LIMIT {
            parts.push(format!("and {} more", failing.len() - SUMMARY_LIMIT));
        }
        let pass = failing.is_empty();
        Self {
            pass,
            failure_summary: parts.join("; "),
            per_bucket,
        }
    }

    /// The buckets that failed.
    pub fn failures(&self) -> impl Iterator<Item = &BucketResult> {
        self.per_bucket.iter().filter(|b| !b.pass)
    }
}

/// A bucket before counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bucket {
    start: NaiveDate,
    end: NaiveDate,
    complete: bool,
    unit_days: u32,
}

impl Bucket {
    fn days(&self) -> u32 {
        ((self.end - self.start).num_days() + 1).max(0) as u32
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// `ceil(value × days / unit_days)`, the threshold for a truncated bucket.
fn prorate(value: u32, days: u32, unit_days: u32) -> u32 {
    if unit_days == 0 {
        return value;
    }
    let scaled = u64::from(value) * u64::from(days);
    u32::try_from(scaled.div_ceil(u64::from(unit_days))).unwrap_or(u32::MAX)
}

/// Clip the unit span `[start, end]` to `period` and record completeness.
fn clipped(start: NaiveDate, end: NaiveDate, period: &Period, unit_days: u32) -> Bucket {
    Bucket {
        start: start.max(period.start),
        end: end.min(period.end),
        complete: start >= period.start && end <= period.end,
        unit_days,
    }
}

fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

/// Cut `period` into buckets of `unit`.
fn buckets(period: &Period, unit: CountUnit, anchor: WeekAnchor) -> Vec<Bucket> {
    let mut out = Vec::new();
    if period.start > period.end {
        return out;
    }
    match unit {
        CountUnit::PerDay => {
            out.extend(period.days().map(|d| clipped(d, d, period, 1)));
        }
        CountUnit::PerWeek => {
            let first = match anchor {
                WeekAnchor::StartWeekday => Some(period.start),
                WeekAnchor::IsoWeek => period.start.checked_sub_days(Days::new(u64::from(
                    period.start.weekday().num_days_from_monday(),
                ))),
            };
            let mut cursor = first;
            while let Some(start) = cursor.filter(|s| *s <= period.end) {
                let Some(end) = add_days(start, 6) else {
                    break;
                };
                out.push(clipped(start, end, period, 7));
                cursor = add_days(start, 7);
            }
        }
        CountUnit::PerMonth => {
            let mut cursor = period.start.with_day(1);
            while let Some(start) = cursor.filter(|s| *s <= period.end) {
                let next = start.checked_add_months(Months::new(1));
                let Some(end) = next.and_then(|n| n.pred_opt()) else {
                    break;
                };
                let unit_days = ((end - start).num_days() + 1) as u32;
                out.push(clipped(start, end, period, unit_days));
                cursor = next;
            }
        }
    }
    out
}

fn judge(
    bucket: &Bucket,
    count: u32,
    rule_count: u32,
    operator: CountOperator,
    enforce_partial: bool,
) -> BucketResult {
    let threshold = if bucket.complete {
        rule_count
    } else {
        prorate(rule_count, bucket.days(), bucket.unit_days)
    };
    let enforced = bucket.complete || enforce_partial;
    BucketResult {
        bucket_start: bucket.start,
        bucket_end: bucket.end,
        count,
        threshold,
        complete: bucket.complete,
        enforced,
        pass: !enforced || operator.holds(count, threshold),
    }
}

fn describe_bucket(unit: CountUnit, operator: CountOperator, b: &BucketResult) -> String {
    let partial = if b.complete {
        String::new()
    } else {
        format!(
            " (partial, {} day{})",
            (b.bucket_end - b.bucket_start).num_days() + 1,
            if b.bucket_end == b.bucket_start { "" } else { "s" }
        )
    };
    format!(
        "{} of {}{}: {} {} {}",
        unit.label(),
        b.bucket_start,
        partial,
        b.count,
        operator.failed_symbol(),
        b.threshold
    )
}

/// Calendar-bucket mode: count `occurrences` per bucket and judge each one.
///
/// Occurrences outside `period` are ignored.
pub fn check_calendar_buckets(
    occurrences: &[Occurrence],
    period: &Period,
    rule: &CountRule,
    weeks: &WeekBoundaryConfig,
) -> FrequencyReport {
    let per_bucket: Vec<BucketResult> = buckets(period, rule.unit, weeks.anchor)
        .iter()
        .map(|bucket| {
            let count = occurrences.iter().filter(|o| bucket.contains(o.date)).count() as u32;
            judge(bucket, count, rule.count, rule.operator, weeks.enforce_partial_weeks)
        })
        .collect();

    let report = FrequencyReport::from_buckets(per_bucket, |b| {
        describe_bucket(rule.unit, rule.operator, b)
    });
    tracing::debug!(
        pass = report.pass,
        buckets = report.per_bucket.len(),
        rule = %format!("{} {} {}", rule.operator.symbol(), rule.count, rule.unit),
        "calendar frequency check"
    );
    report
}

/// Declared-target mode: check a frequency goal's weekly target against a
/// minimum rule before any completions exist.
///
/// Each week bucket "holds" the declared target (prorated for partial weeks).
pub fn check_declared_target(
    target_per_week: u32,
    period: &Period,
    rule: &CountRule,
    weeks: &WeekBoundaryConfig,
) -> Result<FrequencyReport, ScheduleError> {
    if rule.unit != CountUnit::PerWeek {
        return Err(ScheduleError::UnsupportedUnit {
            unit: rule.unit.to_string(),
        });
    }
    let per_bucket = buckets(period, CountUnit::PerWeek, weeks.anchor)
        .iter()
        .map(|bucket| {
            let count = if bucket.complete {
                target_per_week
            } else {
                prorate(target_per_week, bucket.days(), bucket.unit_days)
            };
            judge(bucket, count, rule.count, rule.operator, weeks.enforce_partial_weeks)
        })
        .collect();
    Ok(FrequencyReport::from_buckets(per_bucket, |b| {
        describe_bucket(CountUnit::PerWeek, rule.operator, b)
    }))
}

/// Rolling-window mode: every trailing `window_days` window ending inside
/// `period` must hold `ceil(target_per_week × window_days / 7)` completions.
///
/// `completions` may contain the same date more than once.
pub fn check_rolling_window(
    completions: &[NaiveDate],
    period: &Period,
    frequency: &FrequencySpec,
    enforce_partial: bool,
) -> FrequencyReport {
    let window = frequency.window_days.max(1);
    let per_bucket: Vec<BucketResult> = period
        .days()
        .map(|end| {
            // A window reaching past the calendar's range is cut at the period start.
            let start = end.checked_sub_days(Days::new(u64::from(window - 1)));
            let bucket = Bucket {
                start: start.map_or(period.start, |s| s.max(period.start)),
                end,
                complete: start.is_some_and(|s| s >= period.start),
                unit_days: 7,
            };
            let count = completions.iter().filter(|d| bucket.contains(**d)).count() as u32;
            let threshold = prorate(frequency.target_per_week, bucket.days(), 7);
            let enforced = bucket.complete || enforce_partial;
            BucketResult {
                bucket_start: bucket.start,
                bucket_end: bucket.end,
                count,
                threshold,
                complete: bucket.complete,
                enforced,
                pass: !enforced || count >= threshold,
            }
        })
        .collect();

    let report = FrequencyReport::from_buckets(per_bucket, |b| {
        format!(
            "window {}..{}: {} < {}",
            b.bucket_start, b.bucket_end, b.count, b.threshold
        )
    });
    tracing::debug!(
        pass = report.pass,
        windows = report.per_bucket.len(),
        target = frequency.target_per_week,
        window_days = window,
        "rolling frequency check"
    );
    report
}
