//! Account balances, event log entries and production audit for the
//! Atomic Progress economy.
//!
//! Every currency unit an account holds enters through [`wallet::credit`]
//! and leaves through [`wallet::debit`]. Both are checked and all-or-nothing:
//! the ledger never panics and never leaves a partially-applied change.
//!
//! # Architecture
//!
//! - [`wallet`] -- Checked credit/debit on an [`Account`](atomic_types::Account).
//! - [`event`] -- The [`EventBuilder`] for validated event log entries.
//! - [`audit`] -- The production-rate invariant check.
//!
//! # Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | Balances never negative | unsigned balances + [`wallet::debit`] pre-check |
//! | Failed debit changes nothing | all components checked before any is written |
//! | Lifetime totals only grow | [`wallet::credit`] is the only writer |
//! | Cached rate equals owned production | [`audit::verify_production`] |
//!
//! # Usage
//!
//! ```
//! use atomic_ledger::audit::{verify_production, AuditResult};
//! use atomic_ledger::wallet;
//! use atomic_types::{Account, AccountId, AccountRecord, ResourceBundle};
//! use chrono::Utc;
//! use rust_decimal::Decimal;
//!
//! let now = Utc::now();
//! let mut record = AccountRecord {
//!     account: Account {
//!         id: AccountId::new(),
//!         external_id: 42,
//!         display_name: "comrade".to_owned(),
//!         balances: ResourceBundle::energons(100),
//!         lifetime: ResourceBundle::energons(100),
//!         manual_clicks: 0,
//!         total_production_rate: Decimal::ZERO,
//!         production_multiplier: Decimal::ONE,
//!         click_multiplier: Decimal::ONE,
//!         active_booster: None,
//!         next_satellite_at: None,
//!         daily_bonus_claimed: false,
//!         bonus_streak: 0,
//!         banned: false,
//!         created_at: now,
//!         updated_at: now,
//!     },
//!     complexes: Default::default(),
//! };
//!
//! wallet::credit(&mut record.account, &ResourceBundle::energons(50)).ok();
//! assert!(wallet::debit(&mut record.account, &ResourceBundle::energons(500)).is_err());
//! assert_eq!(record.account.balances.energons, 150);
//! assert_eq!(verify_production(&record), AuditResult::Consistent);
//! ```

pub mod audit;
pub mod event;
pub mod wallet;

// Re-export primary types at crate root.
pub use audit::{AuditResult, ProductionDrift};
pub use event::EventBuilder;

use atomic_types::{EventKind, Resource};

/// Errors that can occur when mutating balances or building events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The account cannot cover a cost component.
    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResources {
        /// The first short resource.
        resource: Resource,
        /// Amount required.
        required: u64,
        /// Amount held.
        available: u64,
    },

    /// A credit would overflow a balance.
    #[error("{resource} balance overflow")]
    Overflow {
        /// The overflowing resource.
        resource: Resource,
    },

    /// A required builder field was not set.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A credit-like event carries no amount.
    #[error("{kind:?} event must carry a non-zero amount")]
    EmptyAmount {
        /// The event kind.
        kind: EventKind,
    },
}
