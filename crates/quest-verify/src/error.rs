// error.rs — Error types for the verification subsystem.
//
// Evaluation itself never fails; these cover the registry's strict lookups.

use thiserror::Error;

/// Errors that can occur during policy lookups.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The name does not identify a policy domain.
    #[error("unknown goal type '{name}'; expected schedule, frequency or partner")]
    UnknownGoalType { name: String },

    /// The name does not identify a verification signal.
    #[error("unknown signal '{name}'; expected time, location, photo, manual or partner")]
    UnknownSignal { name: String },
}
