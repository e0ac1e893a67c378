//! Builder for validated [`GameEvent`] values.
//!
//! Every state change the engine commits is accompanied by an event. The
//! builder enforces that an event names its account, kind and timestamp,
//! and that credit-like kinds actually carry an amount.

use atomic_types::{AccountId, EventId, EventKind, GameEvent, ResourceBundle};
use chrono::{DateTime, Utc};

use crate::LedgerError;

/// Builder for [`GameEvent`] values.
///
/// # Examples
///
/// ```
/// use atomic_ledger::EventBuilder;
/// use atomic_types::{AccountId, EventKind, ResourceBundle};
/// use chrono::Utc;
///
/// let event = EventBuilder::new(AccountId::new(), EventKind::Production)
///     .amounts(ResourceBundle::energons(60))
///     .at(Utc::now())
///     .build();
///
/// assert!(event.is_ok());
/// ```
#[derive(Debug)]
pub struct EventBuilder {
    account_id: AccountId,
    kind: EventKind,
    amounts: ResourceBundle,
    detail: serde_json::Value,
    created_at: Option<DateTime<Utc>>,
}

impl EventBuilder {
    /// Start building an event of `kind` for `account_id`.
    pub const fn new(account_id: AccountId, kind: EventKind) -> Self {
        Self {
            account_id,
            kind,
            amounts: ResourceBundle::ZERO,
            detail: serde_json::Value::Null,
            created_at: None,
        }
    }

    /// Set the resources moved by the event.
    #[must_use]
    pub const fn amounts(mut self, amounts: ResourceBundle) -> Self {
        self.amounts = amounts;
        self
    }

    /// Attach structured detail.
    #[must_use]
    pub fn detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }

    /// Set the event timestamp.
    #[must_use]
    pub const fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Validate and produce the event.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if no timestamp was set, and
    /// [`LedgerError::EmptyAmount`] if a credit-like kind carries nothing.
    pub fn build(self) -> Result<GameEvent, LedgerError> {
        let created_at = self.created_at.ok_or(LedgerError::MissingField("created_at"))?;

        if requires_amount(self.kind) && self.amounts.is_empty() {
            return Err(LedgerError::EmptyAmount { kind: self.kind });
        }

        Ok(GameEvent {
            id: EventId::new(),
            account_id: self.account_id,
            kind: self.kind,
            amounts: self.amounts,
            detail: self.detail,
            created_at,
        })
    }
}

/// Kinds that are meaningless without a non-zero amount.
const fn requires_amount(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::ManualClick
            | EventKind::ComplexPurchased
            | EventKind::ComplexUpgraded
            | EventKind::Production
            | EventKind::SatelliteBonus
            | EventKind::DailyBonus
    )
}
