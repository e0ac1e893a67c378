//! Shared type definitions for the Atomic Progress game economy.
//!
//! This crate is the single source of truth for the data model used across
//! the workspace. Types flow downstream to `TypeScript` via `ts-rs` for the
//! chat front-end.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for accounts and events
//! - [`enums`] -- Resources, complex and booster kinds, event kinds, ranking metrics
//! - [`structs`] -- Accounts, complex ownership, events, leaderboard rows

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{BoosterKind, ComplexKind, EventKind, RankingMetric, Resource, UnknownVariant};
pub use ids::{AccountId, EventId};
pub use structs::{
    Account, AccountRecord, ActiveBooster, ComplexOwnership, GameEvent, LeaderboardEntry,
    RankPosition, ResourceBundle,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::AccountId::export_all();
        let _ = crate::ids::EventId::export_all();

        let _ = crate::enums::Resource::export_all();
        let _ = crate::enums::ComplexKind::export_all();
        let _ = crate::enums::BoosterKind::export_all();
        let _ = crate::enums::EventKind::export_all();
        let _ = crate::enums::RankingMetric::export_all();

        let _ = crate::structs::ResourceBundle::export_all();
        let _ = crate::structs::ActiveBooster::export_all();
        let _ = crate::structs::Account::export_all();
        let _ = crate::structs::ComplexOwnership::export_all();
        let _ = crate::structs::GameEvent::export_all();
        let _ = crate::structs::LeaderboardEntry::export_all();
        let _ = crate::structs::RankPosition::export_all();
    }
}
