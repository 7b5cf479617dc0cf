// frequency.rs — `quest frequency`: CountRule and rolling-window checks.
//
// - schedule goal → calendar buckets over the previewed occurrences
// - frequency goal with --completions → rolling window over the completions
// - frequency goal without completions → declared target per calendar week

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};

use quest_schedule::{
    check_frequency_goal, check_frequency_target, check_schedule_goal, CountOperator, CountRule,
    CountUnit, WeekAnchor, WeekBoundaryConfig,
};
use quest_spec::GoalType;

use crate::config::QuestConfig;
use crate::document::{print_json, read_as, read_spec};

#[derive(Clone, Copy, ValueEnum)]
pub enum UnitArg {
    PerWeek,
    PerDay,
    PerMonth,
}

impl From<UnitArg> for CountUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::PerWeek => CountUnit::PerWeek,
            UnitArg::PerDay => CountUnit::PerDay,
            UnitArg::PerMonth => CountUnit::PerMonth,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AnchorArg {
    StartWeekday,
    IsoWeek,
}

impl From<AnchorArg> for WeekAnchor {
    fn from(anchor: AnchorArg) -> Self {
        match anchor {
            AnchorArg::StartWeekday => WeekAnchor::StartWeekday,
            AnchorArg::IsoWeek => WeekAnchor::IsoWeek,
        }
    }
}

#[derive(Args)]
pub struct FrequencyArgs {
    /// Goal specification (JSON or YAML).
    file: PathBuf,

    /// Comparison: >=, == or <=.
    #[arg(long, default_value = ">=", value_parser = parse_operator)]
    operator: CountOperator,

    /// Threshold per bucket. Defaults to the goal's weekly target for
    /// frequency goals.
    #[arg(long)]
    count: Option<u32>,

    #[arg(long, value_enum, default_value = "per-week")]
    unit: UnitArg,

    /// Week anchoring (overrides the config file).
    #[arg(long, value_enum)]
    anchor: Option<AnchorArg>,

    /// Also check partial weeks at the period edges.
    #[arg(long)]
    enforce_partial: bool,

    /// File with a list of completion dates (frequency goals).
    #[arg(long)]
    completions: Option<PathBuf>,
}

fn parse_operator(s: &str) -> Result<CountOperator, String> {
    s.parse()
}

pub fn execute(args: &FrequencyArgs, config: &QuestConfig) -> anyhow::Result<()> {
    let spec = read_spec(&args.file)?;
    let weeks = WeekBoundaryConfig {
        anchor: args.anchor.map(WeekAnchor::from).unwrap_or(config.weeks.anchor),
        enforce_partial_weeks: args.enforce_partial || config.weeks.enforce_partial_weeks,
    };

    let report = match spec.goal_type() {
        GoalType::Schedule => {
            let Some(count) = args.count else {
                anyhow::bail!("--count is required for schedule goals");
            };
            let rule = CountRule::new(args.operator, count, args.unit.into());
            check_schedule_goal(&spec, &rule, &weeks, &config.overrides)?
        }
        GoalType::Frequency => match &args.completions {
            Some(path) => {
                let completions: Vec<NaiveDate> = read_as(path)?;
                check_frequency_goal(&spec, &completions, &weeks)?
            }
            None => {
                let target = spec.frequency().map(|f| f.target_per_week).unwrap_or_default();
                let rule =
                    CountRule::new(args.operator, args.count.unwrap_or(target), args.unit.into());
                check_frequency_target(&spec, &rule, &weeks)?
            }
        },
        GoalType::Milestone => anyhow::bail!("milestone goals have no frequency to check"),
    };

    tracing::info!(title = %spec.title, pass = report.pass, "frequency check");
    print_json(&report)?;
    if !report.pass {
        anyhow::bail!("{}", report.failure_summary);
    }
    Ok(())
}
