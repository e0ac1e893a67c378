//! Service-level errors.
//!
//! [`GameError`] is what every [`GameService`](crate::service::GameService)
//! operation returns. [`GameError::class`] sorts it into the four outcomes a
//! caller can act on, and [`GameError::declined_reason`] gives the short
//! string shown to players. Internal details never reach that string.

use atomic_db::DbError;
use atomic_economy::EconomyError;
use atomic_ledger::{LedgerError, ProductionDrift};

/// How a caller should treat a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself was malformed; nothing was attempted.
    Invalid,
    /// The account or catalog entry does not exist.
    NotFound,
    /// The action was refused; nothing changed.
    Declined,
    /// The account is banned.
    Forbidden,
    /// Store or arithmetic failure; not the player's fault.
    Internal,
}

/// Errors returned by game service operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No account is registered for the external identity.
    #[error("no account for external id {external_id}")]
    AccountNotFound {
        /// The identity looked up.
        external_id: i64,
    },

    /// A click request carried zero clicks.
    #[error("click count must be positive")]
    NoClicks,

    /// A click request carried more clicks than one batch may hold.
    #[error("at most {max} clicks per request, got {requested}")]
    TooManyClicks {
        /// Clicks in the request.
        requested: u64,
        /// The per-request limit.
        max: u64,
    },

    /// An economy rule refused the action.
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// The account store failed.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// A mutation left the cached production rate out of step with the
    /// owned complexes; the change was not committed.
    #[error("{0}")]
    Audit(ProductionDrift),
}

impl From<LedgerError> for GameError {
    fn from(err: LedgerError) -> Self {
        Self::Economy(EconomyError::from(err))
    }
}

impl GameError {
    /// Classify the error.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::AccountNotFound { .. }
            | Self::Store(DbError::AccountNotFound(_))
            | Self::Economy(
                EconomyError::UnknownComplex(_)
                | EconomyError::UnknownBooster(_)
                | EconomyError::NotOwned(_),
            ) => ErrorClass::NotFound,
            Self::NoClicks | Self::TooManyClicks { .. } => ErrorClass::Invalid,
            Self::Economy(
                EconomyError::InsufficientResources { .. }
                | EconomyError::AlreadyActive { .. }
                | EconomyError::LockedPrerequisite { .. }
                | EconomyError::AlreadyOwned(_)
                | EconomyError::AlreadyClaimed { .. },
            ) => ErrorClass::Declined,
            Self::Economy(EconomyError::Banned) => ErrorClass::Forbidden,
            Self::Economy(EconomyError::ArithmeticOverflow { .. } | EconomyError::Ledger(_))
            | Self::Store(_)
            | Self::Audit(_) => ErrorClass::Internal,
        }
    }

    /// Whether a later retry may succeed (store failures only).
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Store(err)
                if !matches!(err, DbError::AccountNotFound(_) | DbError::OutOfRange { .. })
        )
    }

    /// The short player-facing reason.
    pub fn declined_reason(&self) -> String {
        match self.class() {
            ErrorClass::Internal => String::from("internal error, try again later"),
            ErrorClass::NotFound if matches!(self, Self::Store(_)) => {
                String::from("account not found")
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use atomic_types::{AccountId, BoosterKind, ComplexKind, Resource};
    use chrono::Utc;

    use super::*;

    #[test]
    fn declined_actions_are_classified() {
        let short = GameError::from(EconomyError::InsufficientResources {
            resource: Resource::Energons,
            required: 500,
            available: 10,
        });
        assert_eq!(short.class(), ErrorClass::Declined);
        assert_eq!(short.declined_reason(), "insufficient energons: need 500, have 10");

        let active = GameError::from(EconomyError::AlreadyActive {
            active: BoosterKind::ProtonM87,
            ends_at: Utc::now(),
        });
        assert_eq!(active.class(), ErrorClass::Declined);
    }

    #[test]
    fn missing_things_are_not_found() {
        assert_eq!(
            GameError::AccountNotFound { external_id: 9 }.class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            GameError::from(EconomyError::NotOwned(ComplexKind::ZaryaM)).class(),
            ErrorClass::NotFound
        );
        let missing = GameError::from(DbError::AccountNotFound(AccountId::new()));
        assert_eq!(missing.class(), ErrorClass::NotFound);
        assert_eq!(missing.declined_reason(), "account not found");
        assert!(!missing.is_transient());
    }

    #[test]
    fn malformed_click_requests_are_invalid() {
        assert_eq!(GameError::NoClicks.class(), ErrorClass::Invalid);
        let oversized = GameError::TooManyClicks {
            requested: 1_000_000,
            max: 10,
        };
        assert_eq!(oversized.class(), ErrorClass::Invalid);
        assert_eq!(
            oversized.declined_reason(),
            "at most 10 clicks per request, got 1000000"
        );
    }

    #[test]
    fn banned_is_forbidden() {
        assert_eq!(
            GameError::from(EconomyError::Banned).class(),
            ErrorClass::Forbidden
        );
    }

    #[test]
    fn internal_details_are_hidden() {
        let err = GameError::from(DbError::Corrupt(String::from("bad row 42")));
        assert_eq!(err.class(), ErrorClass::Internal);
        assert!(err.is_transient());
        assert!(!err.declined_reason().contains("42"));

        let overflow = GameError::from(EconomyError::overflow("click credit"));
        assert_eq!(overflow.class(), ErrorClass::Internal);
        assert!(!overflow.is_transient());
    }

    #[test]
    fn out_of_range_values_are_not_retried() {
        let err = GameError::from(DbError::OutOfRange {
            column: "energons",
            value: u64::MAX,
            reason: String::from("out of range integral type conversion attempted"),
        });
        assert_eq!(err.class(), ErrorClass::Internal);
        assert!(!err.is_transient());
    }

    #[test]
    fn ledger_errors_route_through_economy() {
        let err = GameError::from(LedgerError::MissingField("kind"));
        assert!(matches!(err, GameError::Economy(EconomyError::Ledger(_))));
    }
}
