// alignment.rs — Registry ↔ evaluator drift detection.
//
// The policy catalog and the rule evaluator are maintained separately, so
// they can disagree. This check runs the evaluator over every signal set with
// best-case evidence and compares the result with what the catalog declares:
//
// 1. DeclaredButRejected   — a policy's required set never passes its rule
// 2. AcceptedButUndeclared — a minimal passing set no policy covers
// 3. SignalNeverConsulted  — a signal a domain's policies name that never
//                            changes that domain's outcome
//
// The built-in catalog is expected to report only the partner rule's
// corroborating signals under (3): partner approval is sufficient on its own
// while the catalog lists manual/photo/location as optional partner evidence.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quest_spec::SignalKind;

use crate::evaluator::{evaluate_rule, EvaluatorConfig, RuleKind};
use crate::evidence::VerificationEvidence;
use crate::registry::PolicyCatalog;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    DeclaredButRejected,
    AcceptedButUndeclared,
    SignalNeverConsulted,
}

/// One disagreement between the catalog and the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlignmentGap {
    pub kind: GapKind,
    pub rule: RuleKind,
    /// The signal set (or single signal) the gap is about.
    pub signals: Vec<SignalKind>,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlignmentReport {
    pub gaps: Vec<AlignmentGap>,
}

impl AlignmentReport {
    pub fn is_aligned(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn of_kind(&self, kind: GapKind) -> impl Iterator<Item = &AlignmentGap> {
        self.gaps.iter().filter(move |g| g.kind == kind)
    }
}

/// Every subset of the five signals, the empty set included.
fn all_signal_sets() -> Vec<BTreeSet<SignalKind>> {
    (0u32..(1 << SignalKind::ALL.len()))
        .map(|mask| {
            SignalKind::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, s)| *s)
                .collect()
        })
        .collect()
}

fn names(signals: &BTreeSet<SignalKind>) -> String {
    signals
        .iter()
        .map(SignalKind::as_str)
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Check the built-in catalog against the evaluator with default settings.
pub fn check_alignment() -> AlignmentReport {
    check_alignment_with(&PolicyCatalog::builtin(), &EvaluatorConfig::default())
}

/// Check `catalog` against the evaluator.
pub fn check_alignment_with(
    catalog: &PolicyCatalog<'_>,
    config: &EvaluatorConfig,
) -> AlignmentReport {
    // Best-case evidence carries no time window, so the instant is irrelevant.
    let now: DateTime<Utc> = DateTime::<Utc>::MIN_UTC;
    let sets = all_signal_sets();
    let mut gaps = Vec::new();

    for rule in RuleKind::ALL {
        let passes = |signals: &BTreeSet<SignalKind>| {
            evaluate_rule(rule, &VerificationEvidence::best_case(signals), now, config).pass
        };
        let policies = catalog.policies(rule);

        for policy in policies {
            let required = policy.required_set();
            if !passes(&required) {
                gaps.push(AlignmentGap {
                    kind: GapKind::DeclaredButRejected,
                    rule,
                    signals: required.iter().copied().collect(),
                    detail: format!(
                        "policy '{}' declares {} but the {} rule rejects it",
                        policy.name,
                        names(&required),
                        rule
                    ),
                });
            }
        }

        let accepted: Vec<&BTreeSet<SignalKind>> = sets.iter().filter(|s| passes(s)).collect();
        for set in &accepted {
            let minimal = !accepted
                .iter()
                .any(|other| other.len() < set.len() && other.is_subset(set));
            if minimal && !policies.iter().any(|p| p.covers(set)) {
                gaps.push(AlignmentGap {
                    kind: GapKind::AcceptedButUndeclared,
                    rule,
                    signals: set.iter().copied().collect(),
                    detail: format!(
                        "the {} rule accepts {} but no policy declares it",
                        rule,
                        names(set)
                    ),
                });
            }
        }

        let named: BTreeSet<SignalKind> = policies.iter().flat_map(|p| p.named_signals()).collect();
        for signal in named {
            let consulted = sets.iter().filter(|s| !s.contains(&signal)).any(|without| {
                let mut with = without.clone();
                with.insert(signal);
                passes(without) != passes(&with)
            });
            if !consulted {
                gaps.push(AlignmentGap {
                    kind: GapKind::SignalNeverConsulted,
                    rule,
                    signals: vec![signal],
                    detail: format!(
                        "{} policies list {} but the {} rule never consults it",
                        rule, signal, rule
                    ),
                });
            }
        }
    }

    for gap in &gaps {
        tracing::debug!(kind = ?gap.kind, rule = %gap.rule, "{}", gap.detail);
    }
    AlignmentReport { gaps }
}
