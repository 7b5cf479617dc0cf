// verify.rs — `quest verify`: evaluate a proof evidence bundle.

use std::path::Path;

use chrono::{DateTime, Utc};

use quest_verify::{evaluate, VerificationEvidence};

use crate::config::QuestConfig;
use crate::document::{print_json, read_document};

pub fn execute(
    goal_type: &str,
    evidence: &Path,
    at: Option<DateTime<Utc>>,
    config: &QuestConfig,
) -> anyhow::Result<()> {
    let bundle = VerificationEvidence::from_json_lenient(&read_document(evidence)?);
    let now = at.unwrap_or_else(Utc::now);
    let outcome = evaluate(goal_type, &bundle, now, &config.evaluator);

    print_json(&outcome)?;
    if !outcome.pass {
        anyhow::bail!(
            "evidence does not satisfy the {} rule (unmet: {})",
            outcome.rule,
            outcome.unmet().join(", ")
        );
    }
    Ok(())
}
