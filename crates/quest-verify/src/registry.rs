// registry.rs — Verification policy registry.
//
// A static catalog maps each rule domain to named policies. A policy is a
// required signal set plus optional extras; a signal set is covered by a
// policy when it contains every required signal and nothing beyond the
// required and optional ones.
//
// Queries:
//   match_policy()           — exact required-set match
//   validate_signals()       — domain minimums + catalog coverage, with fixes
//   is_allowed_combination() — membership in the flat ALLOWED_COMBINATIONS list
//
// The flat list exists for conformance checks against the catalog and the
// evaluator (see alignment.rs); it must stay equal to the union of every
// policy's covered sets.

use std::collections::BTreeSet;

use serde::Serialize;

use quest_spec::SignalKind;
use quest_spec::SignalKind::{Location, Manual, Partner, Photo, Time};

use crate::error::PolicyError;
use crate::evaluator::RuleKind;

/// One named way of verifying a goal.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub name: &'static str,
    pub required: &'static [SignalKind],
    pub optional: &'static [SignalKind],
}

impl VerificationPolicy {
    pub fn required_set(&self) -> BTreeSet<SignalKind> {
        self.required.iter().copied().collect()
    }

    /// Every signal the policy mentions.
    pub fn named_signals(&self) -> BTreeSet<SignalKind> {
        self.required.iter().chain(self.optional).copied().collect()
    }

    /// `required ⊆ signals ⊆ required ∪ optional`.
    pub fn covers(&self, signals: &BTreeSet<SignalKind>) -> bool {
        self.required.iter().all(|s| signals.contains(s))
            && signals.iter().all(|s| self.required.contains(s) || self.optional.contains(s))
    }

    /// Human-readable form, e.g. `time + location (optional: photo, manual)`.
    pub fn describe(&self) -> String {
        let join = |signals: &[SignalKind]| {
            signals
                .iter()
                .map(SignalKind::as_str)
                .collect::<Vec<_>>()
        };
        let mut text = join(self.required).join(" + ");
        if !self.optional.is_empty() {
            text.push_str(&format!(" (optional: {})", join(self.optional).join(", ")));
        }
        text
    }
}

pub static SCHEDULE_POLICIES: &[VerificationPolicy] = &[
    VerificationPolicy {
        name: "time_location",
        required: &[Time, Location],
        optional: &[Photo, Manual],
    },
    VerificationPolicy {
        name: "time_photo",
        required: &[Time, Photo],
        optional: &[Location],
    },
    VerificationPolicy {
        name: "time_manual",
        required: &[Time, Manual],
        optional: &[Location, Photo],
    },
    VerificationPolicy {
        name: "time_manual_location",
        required: &[Time, Manual, Location],
        optional: &[Photo],
    },
];

pub static FREQUENCY_POLICIES: &[VerificationPolicy] = &[
    VerificationPolicy {
        name: "manual_location",
        required: &[Manual, Location],
        optional: &[Photo],
    },
    VerificationPolicy {
        name: "manual_photo",
        required: &[Manual, Photo],
        optional: &[Location],
    },
    VerificationPolicy {
        name: "manual_photo_location",
        required: &[Manual, Photo, Location],
        optional: &[],
    },
];

pub static PARTNER_POLICIES: &[VerificationPolicy] = &[VerificationPolicy {
    name: "partner_review",
    required: &[Partner],
    optional: &[Manual, Photo, Location],
}];

/// Every legal signal combination across all domains, in canonical order.
pub static ALLOWED_COMBINATIONS: &[&[SignalKind]] = &[
    // schedule
    &[Time, Location],
    &[Time, Photo],
    &[Time, Manual],
    &[Time, Location, Photo],
    &[Time, Location, Manual],
    &[Time, Photo, Manual],
    &[Time, Location, Photo, Manual],
    // frequency
    &[Location, Manual],
    &[Photo, Manual],
    &[Location, Photo, Manual],
    // partner
    &[Partner],
    &[Manual, Partner],
    &[Photo, Partner],
    &[Location, Partner],
    &[Photo, Manual, Partner],
    &[Location, Manual, Partner],
    &[Location, Photo, Partner],
    &[Location, Photo, Manual, Partner],
];

/// A per-domain policy table. The built-in one is [`PolicyCatalog::builtin`];
/// other tables can be supplied to the alignment check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PolicyCatalog<'a> {
    pub schedule: &'a [VerificationPolicy],
    pub frequency: &'a [VerificationPolicy],
    pub partner: &'a [VerificationPolicy],
}

impl PolicyCatalog<'static> {
    pub fn builtin() -> Self {
        Self {
            schedule: SCHEDULE_POLICIES,
            frequency: FREQUENCY_POLICIES,
            partner: PARTNER_POLICIES,
        }
    }
}

impl Default for PolicyCatalog<'static> {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> PolicyCatalog<'a> {
    pub fn policies(&self, kind: RuleKind) -> &'a [VerificationPolicy] {
        match kind {
            RuleKind::Schedule => self.schedule,
            RuleKind::Frequency => self.frequency,
            RuleKind::Partner => self.partner,
        }
    }

    /// Every signal set some policy of `kind` covers.
    pub fn covered_sets(&self, kind: RuleKind) -> BTreeSet<BTreeSet<SignalKind>> {
        let mut sets = BTreeSet::new();
        for policy in self.policies(kind) {
            let optional: Vec<SignalKind> = policy
                .optional
                .iter()
                .copied()
                .filter(|s| !policy.required.contains(s))
                .collect();
            for mask in 0u32..(1 << optional.len()) {
                let mut set = policy.required_set();
                set.extend(
                    optional
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| mask & (1 << i) != 0)
                        .map(|(_, s)| *s),
                );
                sets.insert(set);
            }
        }
        sets
    }
}

/// The built-in policies for a domain.
pub fn policies_for(kind: RuleKind) -> &'static [VerificationPolicy] {
    PolicyCatalog::builtin().policies(kind)
}

/// The policy whose required set equals `signals`, ignoring order.
pub fn match_policy(
    kind: RuleKind,
    signals: &BTreeSet<SignalKind>,
) -> Option<&'static VerificationPolicy> {
    policies_for(kind)
        .iter()
        .find(|p| p.required_set() == *signals)
}

/// Result of [`validate_signals`].
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SignalCheck {
    pub valid: bool,
    pub errors: Vec<String>,
    pub suggestions: Vec<String>,
}

/// The signal every set in a domain must contain.
fn anchor_signal(kind: RuleKind) -> SignalKind {
    match kind {
        RuleKind::Schedule => Time,
        RuleKind::Frequency => Manual,
        RuleKind::Partner => Partner,
    }
}

/// Signals that can corroborate the anchor when it would otherwise stand alone.
fn corroborating_signals(kind: RuleKind) -> &'static [SignalKind] {
    match kind {
        RuleKind::Schedule => &[Location, Photo, Manual],
        RuleKind::Frequency => &[Location, Photo],
        RuleKind::Partner => &[],
    }
}

fn names(signals: &[SignalKind]) -> String {
    signals
        .iter()
        .map(SignalKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check a declared signal set against the domain's minimums and catalog.
pub fn validate_signals(kind: RuleKind, signals: &BTreeSet<SignalKind>) -> SignalCheck {
    let mut check = SignalCheck::default();
    let anchor = anchor_signal(kind);
    let catalog = policies_for(kind);

    if signals.is_empty() {
        check.errors.push("at least one signal is required".to_string());
    } else if !signals.contains(&anchor) {
        check
            .errors
            .push(format!("{} goals must include the {} signal", kind, anchor));
        check.suggestions.push(format!("add {}", anchor));
    } else if signals.len() == 1 && !corroborating_signals(kind).is_empty() {
        let extras = corroborating_signals(kind);
        check.errors.push(format!(
            "{} alone cannot verify a {} goal; add one of {}",
            anchor,
            kind,
            names(extras)
        ));
        check
            .suggestions
            .extend(extras.iter().map(|s| format!("add {}", s)));
    }

    let unused: Vec<SignalKind> = signals
        .iter()
        .copied()
        .filter(|s| !catalog.iter().any(|p| p.named_signals().contains(s)))
        .collect();
    if !unused.is_empty() {
        check.errors.push(format!(
            "{} not used by any {} policy",
            names(&unused),
            kind
        ));
        check
            .suggestions
            .extend(unused.iter().map(|s| format!("remove {}", s)));
    }

    if check.errors.is_empty() && !catalog.iter().any(|p| p.covers(signals)) {
        let given: Vec<SignalKind> = signals.iter().copied().collect();
        check.errors.push(format!(
            "[{}] does not match any {} policy",
            names(&given),
            kind
        ));
        check.suggestions.extend(
            catalog
                .iter()
                .filter(|p| p.required.iter().any(|s| signals.contains(s)))
                .map(|p| format!("use {}: {}", p.name, p.describe())),
        );
    }

    check.valid = check.errors.is_empty();
    tracing::debug!(
        rule = %kind,
        valid = check.valid,
        errors = check.errors.len(),
        "validated signal set"
    );
    check
}

/// Whether `signals` is one of [`ALLOWED_COMBINATIONS`].
pub fn is_allowed_combination(signals: &BTreeSet<SignalKind>) -> bool {
    ALLOWED_COMBINATIONS
        .iter()
        .any(|combo| combo.len() == signals.len() && combo.iter().all(|s| signals.contains(s)))
}

/// Parse signal names, rejecting unknown ones.
pub fn parse_signals<S: AsRef<str>>(raw: &[S]) -> Result<BTreeSet<SignalKind>, PolicyError> {
    raw.iter()
        .map(|name| {
            name.as_ref()
                .parse::<SignalKind>()
                .map_err(|_| PolicyError::UnknownSignal {
                    name: name.as_ref().to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(signals: &[SignalKind]) -> BTreeSet<SignalKind> {
        signals.iter().copied().collect()
    }

    #[test]
    fn match_policy_ignores_order() {
        let policy = match_policy(RuleKind::Schedule, &set(&[Location, Time])).unwrap();
        assert_eq!(policy.name, "time_location");
        let policy = match_policy(RuleKind::Frequency, &set(&[Location, Photo, Manual])).unwrap();
        assert_eq!(policy.name, "manual_photo_location");
        assert!(match_policy(RuleKind::Schedule, &set(&[Time])).is_none());
        assert!(match_policy(RuleKind::Frequency, &set(&[Time, Location])).is_none());
    }

    #[test]
    fn schedule_requires_time() {
        let check = validate_signals(RuleKind::Schedule, &set(&[Manual, Location]));
        assert!(!check.valid);
        assert_eq!(check.errors, vec!["schedule goals must include the time signal"]);
        assert_eq!(check.suggestions, vec!["add time"]);
    }

    #[test]
    fn frequency_requires_manual() {
        let check = validate_signals(RuleKind::Frequency, &set(&[Photo, Location]));
        assert!(!check.valid);
        assert_eq!(check.errors, vec!["frequency goals must include the manual signal"]);
    }

    #[test]
    fn lone_anchor_needs_corroboration() {
        let check = validate_signals(RuleKind::Schedule, &set(&[Time]));
        assert!(!check.valid);
        assert_eq!(
            check.errors,
            vec!["time alone cannot verify a schedule goal; add one of location, photo, manual"]
        );
        assert_eq!(check.suggestions, vec!["add location", "add photo", "add manual"]);

        let check = validate_signals(RuleKind::Frequency, &set(&[Manual]));
        assert!(!check.valid);
        assert_eq!(check.suggestions, vec!["add location", "add photo"]);

        assert!(validate_signals(RuleKind::Partner, &set(&[Partner])).valid);
    }

    #[test]
    fn optional_signals_are_accepted() {
        assert!(validate_signals(RuleKind::Schedule, &set(&[Time, Location, Photo, Manual])).valid);
        assert!(validate_signals(RuleKind::Frequency, &set(&[Manual, Photo, Location])).valid);
        assert!(validate_signals(RuleKind::Partner, &set(&[Partner, Photo])).valid);
    }

    #[test]
    fn foreign_signals_are_rejected() {
        let check = validate_signals(RuleKind::Frequency, &set(&[Manual, Location, Time]));
        assert!(!check.valid);
        assert_eq!(check.errors, vec!["time not used by any frequency policy"]);
        assert_eq!(check.suggestions, vec!["remove time"]);

        let check = validate_signals(RuleKind::Schedule, &set(&[Time, Location, Partner]));
        assert!(!check.valid);
        assert!(check.suggestions.contains(&"remove partner".to_string()));
    }

    #[test]
    fn empty_set_is_invalid() {
        let check = validate_signals(RuleKind::Partner, &BTreeSet::new());
        assert!(!check.valid);
        assert_eq!(check.errors, vec!["at least one signal is required"]);
    }

    #[test]
    fn narrower_catalog_covers_fewer_sets() {
        let narrow = [VerificationPolicy {
            name: "time_location",
            required: &[Time, Location],
            optional: &[],
        }];
        let catalog = PolicyCatalog {
            schedule: &narrow,
            ..PolicyCatalog::builtin()
        };
        assert!(!catalog.covered_sets(RuleKind::Schedule).contains(&set(&[Time, Location, Photo])));
    }

    #[test]
    fn allowed_combinations_match_catalog() {
        let catalog = PolicyCatalog::builtin();
        let from_catalog: BTreeSet<BTreeSet<SignalKind>> = RuleKind::ALL
            .iter()
            .flat_map(|kind| catalog.covered_sets(*kind))
            .collect();
        let flat: BTreeSet<BTreeSet<SignalKind>> =
            ALLOWED_COMBINATIONS.iter().map(|combo| set(combo)).collect();
        assert_eq!(flat.len(), ALLOWED_COMBINATIONS.len(), "duplicate entries");
        assert_eq!(from_catalog, flat);
    }

    #[test]
    fn allowed_combinations_validate_in_some_domain() {
        for combo in ALLOWED_COMBINATIONS {
            let signals = set(combo);
            assert!(is_allowed_combination(&signals));
            assert!(
                RuleKind::ALL.iter().any(|kind| validate_signals(*kind, &signals).valid),
                "{:?}",
                signals
            );
        }
        assert!(!is_allowed_combination(&set(&[Time])));
        assert!(!is_allowed_combination(&set(&[Time, Partner])));
    }

    #[test]
    fn describe_lists_optional_signals() {
        assert_eq!(
            SCHEDULE_POLICIES[0].describe(),
            "time + location (optional: photo, manual)"
        );
        assert_eq!(FREQUENCY_POLICIES[2].describe(), "manual + photo + location");
    }

    #[test]
    fn parse_signals_rejects_unknown_names() {
        assert_eq!(
            parse_signals(&["photo", "time"]).unwrap(),
            set(&[Time, Photo])
        );
        assert!(matches!(
            parse_signals(&["selfie"]),
            Err(PolicyError::UnknownSignal { .. })
        ));
    }
}
