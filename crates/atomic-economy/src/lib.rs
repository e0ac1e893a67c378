//! Progression, booster and production rules for the Atomic Progress economy.
//!
//! Every function here is a pure transformation of an in-memory
//! [`AccountRecord`](atomic_types::AccountRecord) against the shared
//! [`Catalog`](atomic_catalog::Catalog). No I/O, no clocks: callers pass
//! `now` in and persist the record afterwards inside one store transaction.
//! A function that returns `Err` has left the record unchanged.
//!
//! # Modules
//!
//! - [`progression`] -- Cost curve, quotes, purchase and upgrade
//! - [`booster`] -- The `Idle -> Active -> Idle` booster state machine
//! - [`production`] -- Passive accrual and labor automation
//! - [`click`] -- Click power and click crediting
//! - [`bonus`] -- Satellite payouts and the daily bonus
//! - [`achievements`] -- Derived achievement progress
//! - [`account`] -- New-account seeding
//! - [`config`] -- [`EconomyRules`]

pub mod account;
pub mod achievements;
pub mod bonus;
pub mod booster;
pub mod click;
pub mod config;
pub mod error;
pub mod production;
pub mod progression;

mod math;

#[cfg(test)]
mod testing;

pub use config::EconomyRules;
pub use error::EconomyError;

use atomic_types::Account;

/// Reject mutations on banned accounts.
pub const fn ensure_active(account: &Account) -> Result<(), EconomyError> {
    if account.banned {
        return Err(EconomyError::Banned);
    }
    Ok(())
}
