//! # quest-verify
//!
//! Verification policy registry and evidence rule evaluation for Quest.
//!
//! A proof submission carries a [`VerificationEvidence`] bundle. The
//! [`evaluate`] function decides whether that bundle satisfies the rule for
//! the goal's type and explains the decision sub-condition by sub-condition.
//! The registry declares which signal combinations a goal may be configured
//! with, and [`check_alignment`] reports where the two disagree.
//!
//! ## Key invariants
//!
//! - **Evaluation never fails**: absent or malformed evidence fails the
//!   relevant sub-condition; it is never an error.
//! - **Static catalog**: the built-in policies are immutable statics exposed
//!   only through read-only queries.
//! - **Partner approval is sufficient**: corroborating evidence on a partner
//!   review is reported, not enforced, and the alignment check names it.

pub mod alignment;
pub mod error;
pub mod evaluator;
pub mod evidence;
pub mod registry;

pub use alignment::{check_alignment, check_alignment_with, AlignmentGap, AlignmentReport, GapKind};
pub use error::PolicyError;
pub use evaluator::{
    evaluate, evaluate_frequency_rule, evaluate_partner_rule, evaluate_rule,
    evaluate_schedule_rule, EvaluatorConfig, RuleKind, VerificationOutcome,
    DEFAULT_TOLERANCE_MINUTES,
};
pub use evidence::{
    LocationEvidence, ManualEvidence, PartnerEvidence, PhotoEvidence, PhotoValidation,
    TimeEvidence, VerificationEvidence,
};
pub use registry::{
    is_allowed_combination, match_policy, parse_signals, policies_for, validate_signals,
    PolicyCatalog, SignalCheck, VerificationPolicy, ALLOWED_COMBINATIONS,
};
