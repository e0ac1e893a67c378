//! Enumeration types for the Atomic Progress economy.
//!
//! Complex and booster kinds are closed enums rather than free-form strings:
//! every key the front-end sends is parsed once at the edge (see the
//! [`FromStr`](core::str::FromStr) impls) and everything downstream matches
//! exhaustively.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A string did not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {family}: {value}")]
pub struct UnknownVariant {
    /// Which enum was being parsed (e.g. "complex").
    pub family: &'static str,
    /// The rejected input.
    pub value: String,
}

impl UnknownVariant {
    fn new(family: &'static str, value: &str) -> Self {
        Self {
            family,
            value: value.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// One of the three currencies an account accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Resource {
    /// Primary currency, earned by clicking and by the base complex.
    Energons,
    /// Secondary currency for advanced complexes.
    Neutrons,
    /// Prestige currency for late-game purchases.
    Particles,
}

impl Resource {
    /// Every resource, in display order.
    pub const ALL: [Self; 3] = [Self::Energons, Self::Neutrons, Self::Particles];

    /// Stable lowercase key used in storage and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Energons => "energons",
            Self::Neutrons => "neutrons",
            Self::Particles => "particles",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Complexes
// ---------------------------------------------------------------------------

/// A purchasable production building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ComplexKind {
    /// Base energon generator.
    #[serde(rename = "KOLLEKTIV-1")]
    Kollektiv1,
    /// Energon production amplifier.
    #[serde(rename = "ZARYA-M")]
    ZaryaM,
    /// Neutron producer.
    #[serde(rename = "SOYUZ-ATOM")]
    SoyuzAtom,
    /// Click power amplifier.
    #[serde(rename = "KRASNIY-CIKLOTRON")]
    KrasniyCiklotron,
    /// All-production amplifier.
    #[serde(rename = "AKADEMGOROD-17")]
    Akademgorod17,
    /// Periodic satellite bonus.
    #[serde(rename = "SPUTNIK-GAMMA")]
    SputnikGamma,
    /// Particle producer.
    #[serde(rename = "KVANT-SIBIR")]
    KvantSibir,
    /// Rare materials (no passive effect).
    #[serde(rename = "MATERIYA-3")]
    Materiya3,
    /// Labor automation (simulated clicks).
    #[serde(rename = "MOZG-MACHINA")]
    MozgMachina,
    /// Seasonal events (no passive effect).
    #[serde(rename = "POLYUS-K88")]
    PolyusK88,
}

impl ComplexKind {
    /// Every complex, in unlock order.
    pub const ALL: [Self; 10] = [
        Self::Kollektiv1,
        Self::ZaryaM,
        Self::SoyuzAtom,
        Self::KrasniyCiklotron,
        Self::Akademgorod17,
        Self::SputnikGamma,
        Self::KvantSibir,
        Self::Materiya3,
        Self::MozgMachina,
        Self::PolyusK88,
    ];

    /// The catalog key for this complex.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kollektiv1 => "KOLLEKTIV-1",
            Self::ZaryaM => "ZARYA-M",
            Self::SoyuzAtom => "SOYUZ-ATOM",
            Self::KrasniyCiklotron => "KRASNIY-CIKLOTRON",
            Self::Akademgorod17 => "AKADEMGOROD-17",
            Self::SputnikGamma => "SPUTNIK-GAMMA",
            Self::KvantSibir => "KVANT-SIBIR",
            Self::Materiya3 => "MATERIYA-3",
            Self::MozgMachina => "MOZG-MACHINA",
            Self::PolyusK88 => "POLYUS-K88",
        }
    }
}

impl fmt::Display for ComplexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("complex", s))
    }
}

// ---------------------------------------------------------------------------
// Boosters
// ---------------------------------------------------------------------------

/// A purchasable temporary (or instantaneous) effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BoosterKind {
    /// Production multiplier.
    #[serde(rename = "PROTON-M87")]
    ProtonM87,
    /// Instant grant of a day of production.
    #[serde(rename = "RED-STAR")]
    RedStar,
    /// Click multiplier.
    #[serde(rename = "ATOMIC-HEART-42")]
    AtomicHeart42,
    /// Click-class helper.
    #[serde(rename = "IRON-COMRADE")]
    IronComrade,
    /// Universal multiplier.
    #[serde(rename = "T-POLYMER")]
    TPolymer,
}

impl BoosterKind {
    /// Every booster, in catalog order.
    pub const ALL: [Self; 5] = [
        Self::ProtonM87,
        Self::RedStar,
        Self::AtomicHeart42,
        Self::IronComrade,
        Self::TPolymer,
    ];

    /// The catalog key for this booster.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProtonM87 => "PROTON-M87",
            Self::RedStar => "RED-STAR",
            Self::AtomicHeart42 => "ATOMIC-HEART-42",
            Self::IronComrade => "IRON-COMRADE",
            Self::TPolymer => "T-POLYMER",
        }
    }
}

impl fmt::Display for BoosterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoosterKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant::new("booster", s))
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What an entry in the event log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// A new account was seeded.
    AccountCreated,
    /// A batch of buffered manual clicks was credited.
    ManualClick,
    /// A complex was bought at level 1.
    ComplexPurchased,
    /// A complex gained a level.
    ComplexUpgraded,
    /// A timed booster started.
    BoosterActivated,
    /// A timed booster ended and multipliers were reset.
    BoosterExpired,
    /// An instantaneous booster granted resources.
    InstantGrant,
    /// Passive production was credited by the scheduler.
    Production,
    /// The satellite paid out its periodic bonus.
    SatelliteBonus,
    /// The daily bonus was claimed.
    DailyBonus,
    /// The moderation flag changed.
    BanChanged,
}

impl EventKind {
    /// Stable `snake_case` key used in storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccountCreated => "account_created",
            Self::ManualClick => "manual_click",
            Self::ComplexPurchased => "complex_purchased",
            Self::ComplexUpgraded => "complex_upgraded",
            Self::BoosterActivated => "booster_activated",
            Self::BoosterExpired => "booster_expired",
            Self::InstantGrant => "instant_grant",
            Self::Production => "production",
            Self::SatelliteBonus => "satellite_bonus",
            Self::DailyBonus => "daily_bonus",
            Self::BanChanged => "ban_changed",
        }
    }

    /// Every event kind.
    pub const ALL: [Self; 11] = [
        Self::AccountCreated,
        Self::ManualClick,
        Self::ComplexPurchased,
        Self::ComplexUpgraded,
        Self::BoosterActivated,
        Self::BoosterExpired,
        Self::InstantGrant,
        Self::Production,
        Self::SatelliteBonus,
        Self::DailyBonus,
        Self::BanChanged,
    ];
}

impl FromStr for EventKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("event kind", s))
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// A leaderboard ordering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RankingMetric {
    /// Current primary balance.
    #[default]
    Energons,
    /// Current secondary balance.
    Neutrons,
    /// Current prestige balance.
    Particles,
    /// Cached total production rate.
    Production,
    /// Sum of all owned complex levels.
    TotalLevel,
}

impl RankingMetric {
    /// Every metric.
    pub const ALL: [Self; 5] = [
        Self::Energons,
        Self::Neutrons,
        Self::Particles,
        Self::Production,
        Self::TotalLevel,
    ];

    /// Stable key used in query strings and index names.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Energons => "energons",
            Self::Neutrons => "neutrons",
            Self::Particles => "particles",
            Self::Production => "production",
            Self::TotalLevel => "total_level",
        }
    }
}

impl FromStr for RankingMetric {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("ranking metric", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_keys_parse_case_insensitively() {
        assert_eq!("kollektiv-1".parse(), Ok(ComplexKind::Kollektiv1));
        assert_eq!("POLYUS-K88".parse(), Ok(ComplexKind::PolyusK88));
    }

    #[test]
    fn unknown_complex_is_rejected() {
        let err = "TOKAMAK".parse::<ComplexKind>();
        assert_eq!(
            err,
            Err(UnknownVariant {
                family: "complex",
                value: String::from("TOKAMAK"),
            })
        );
    }

    #[test]
    fn serde_uses_catalog_keys() {
        let json = serde_json::to_string(&BoosterKind::TPolymer).ok();
        assert_eq!(json.as_deref(), Some("\"T-POLYMER\""));
        let json = serde_json::to_string(&ComplexKind::Akademgorod17).ok();
        assert_eq!(json.as_deref(), Some("\"AKADEMGOROD-17\""));
    }

    #[test]
    fn event_kind_keys_round_trip_through_from_str() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse(), Ok(kind));
        }
    }

    #[test]
    fn ranking_metric_defaults_to_primary_balance() {
        assert_eq!(RankingMetric::default(), RankingMetric::Energons);
        assert_eq!("total_level".parse(), Ok(RankingMetric::TotalLevel));
    }
}
