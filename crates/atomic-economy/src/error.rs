//! Error types for the atomic-economy crate.
//!
//! Every economy operation either succeeds completely or returns one of
//! these variants with the account left exactly as it was. The variants
//! map one-to-one onto the short declined-reason strings the front-end
//! shows players.

use atomic_ledger::LedgerError;
use atomic_types::{BoosterKind, ComplexKind, Resource};
use chrono::{DateTime, Utc};

/// Errors raised by progression, booster and bonus operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EconomyError {
    /// The complex type is not in the catalog.
    #[error("unknown complex: {0}")]
    UnknownComplex(ComplexKind),

    /// The booster type is not in the catalog.
    #[error("unknown booster: {0}")]
    UnknownBooster(BoosterKind),

    /// Balances do not cover the full cost.
    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResources {
        /// The first short resource.
        resource: Resource,
        /// Amount required.
        required: u64,
        /// Amount held.
        available: u64,
    },

    /// A timed booster is already running.
    #[error("booster {active} already active until {ends_at}")]
    AlreadyActive {
        /// The running booster.
        active: BoosterKind,
        /// When it ends.
        ends_at: DateTime<Utc>,
    },

    /// The prerequisite complex has not reached the required level.
    #[error("requires {requires} level {level} (current {current})")]
    LockedPrerequisite {
        /// The prerequisite complex.
        requires: ComplexKind,
        /// The level it must reach.
        level: u32,
        /// The level the account has.
        current: u32,
    },

    /// The account is banned; every mutation is rejected.
    #[error("account is banned")]
    Banned,

    /// Purchase of a complex the account already owns.
    #[error("{0} already owned")]
    AlreadyOwned(ComplexKind),

    /// Upgrade of a complex the account does not own.
    #[error("{0} not owned")]
    NotOwned(ComplexKind),

    /// Today's daily bonus has been claimed.
    #[error("daily bonus already claimed (streak {streak})")]
    AlreadyClaimed {
        /// The current streak.
        streak: u32,
    },

    /// A cost, production or credit computation overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: String,
    },

    /// Event construction failed.
    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for EconomyError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientResources {
                resource,
                required,
                available,
            } => Self::InsufficientResources {
                resource,
                required,
                available,
            },
            LedgerError::Overflow { resource } => Self::ArithmeticOverflow {
                context: format!("{resource} balance"),
            },
            other => Self::Ledger(other),
        }
    }
}

impl EconomyError {
    /// Shorthand for an [`EconomyError::ArithmeticOverflow`].
    pub fn overflow(context: &str) -> Self {
        Self::ArithmeticOverflow {
            context: String::from(context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_shortfall_maps_to_insufficient_resources() {
        let err = EconomyError::from(LedgerError::InsufficientResources {
            resource: Resource::Neutrons,
            required: 10,
            available: 3,
        });
        assert_eq!(
            err,
            EconomyError::InsufficientResources {
                resource: Resource::Neutrons,
                required: 10,
                available: 3
            }
        );
    }

    #[test]
    fn ledger_overflow_maps_to_arithmetic_overflow() {
        let err = EconomyError::from(LedgerError::Overflow {
            resource: Resource::Energons,
        });
        assert!(matches!(err, EconomyError::ArithmeticOverflow { .. }));
    }
}
