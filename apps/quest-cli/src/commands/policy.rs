// policy.rs — Policy subcommands: check, list, alignment.

use clap::Subcommand;
use serde_json::json;

use quest_verify::{
    check_alignment_with, is_allowed_combination, match_policy, parse_signals, policies_for,
    validate_signals, PolicyCatalog, RuleKind,
};

use crate::config::QuestConfig;
use crate::document::print_json;

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Check a signal set against a goal type's policies.
    Check {
        /// schedule, frequency or partner.
        goal_type: String,
        /// Signals, e.g. `time location`.
        #[arg(required = true)]
        signals: Vec<String>,
    },
    /// List the built-in policies.
    List,
    /// Report drift between the policy catalog and the rule evaluator.
    Alignment,
}

pub fn execute(cmd: &PolicyCommands, config: &QuestConfig) -> anyhow::Result<()> {
    match cmd {
        PolicyCommands::Check { goal_type, signals } => {
            let kind: RuleKind = goal_type.parse()?;
            let signals = parse_signals(signals.as_slice())?;
            let check = validate_signals(kind, &signals);
            print_json(&json!({
                "goalType": kind,
                "signals": signals,
                "valid": check.valid,
                "errors": check.errors,
                "suggestions": check.suggestions,
                "matchedPolicy": match_policy(kind, &signals).map(|p| p.name),
                "allowedCombination": is_allowed_combination(&signals),
            }))?;
            if !check.valid {
                anyhow::bail!("signal set is not valid for {} goals", kind);
            }
        }

        PolicyCommands::List => {
            let listing: Vec<_> = RuleKind::ALL
                .iter()
                .map(|kind| {
                    json!({
                        "goalType": kind,
                        "policies": policies_for(*kind)
                            .iter()
                            .map(|p| json!({
                                "name": p.name,
                                "required": p.required,
                                "optional": p.optional,
                                "description": p.describe(),
                            }))
                            .collect::<Vec<_>>(),
                    })
                })
                .collect();
            print_json(&listing)?;
        }

        PolicyCommands::Alignment => {
            let report = check_alignment_with(&PolicyCatalog::builtin(), &config.evaluator);
            for gap in &report.gaps {
                tracing::info!(kind = ?gap.kind, rule = %gap.rule, "{}", gap.detail);
            }
            print_json(&report)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(goal_type: &str, signals: &[&str]) -> anyhow::Result<()> {
        let cmd = PolicyCommands::Check {
            goal_type: goal_type.to_string(),
            signals: signals.iter().map(|s| s.to_string()).collect(),
        };
        execute(&cmd, &QuestConfig::default())
    }

    #[test]
    fn check_accepts_policies_and_rejects_bare_anchors() {
        check("schedule", &["time", "location"]).unwrap();
        check("frequency", &["manual", "photo"]).unwrap();

        let err = check("frequency", &["manual"]).unwrap_err();
        assert!(err.to_string().contains("not valid for frequency goals"));
        assert!(check("habit", &["manual"]).is_err());
        assert!(check("schedule", &["time", "gps"]).is_err());
    }

    #[test]
    fn list_and_alignment_succeed() {
        let config = QuestConfig::default();
        execute(&PolicyCommands::List, &config).unwrap();
        execute(&PolicyCommands::Alignment, &config).unwrap();
    }
}
