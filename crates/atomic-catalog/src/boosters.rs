//! Booster definitions and effect resolution.
//!
//! Raw booster data states a duration, a factor and the effect class the
//! booster belongs to. [`resolve_effect`] turns that into an explicit
//! [`BoosterEffect`] once, when the catalog is built, so activation never
//! has to inspect booster names or durations again.

use atomic_types::{BoosterKind, ComplexKind, ResourceBundle};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::complexes::Prerequisite;

/// Durations at or below this many seconds denote an instantaneous booster.
pub const INSTANT_DURATION_SECS: u64 = 1;

/// Production window granted by an instantaneous booster (24 hours).
pub const INSTANT_GRANT_SECS: u64 = 86_400;

/// The multiplier a booster class targets, as written in the raw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectClass {
    /// Passive production.
    Production,
    /// Click power.
    Click,
    /// Both multipliers.
    Universal,
}

/// The resolved effect of activating a booster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoosterEffect {
    /// Multiplies the production multiplier for the booster's duration.
    ProductionMultiplier {
        /// The factor applied.
        factor: Decimal,
    },
    /// Multiplies the click multiplier for the booster's duration.
    ClickMultiplier {
        /// The factor applied.
        factor: Decimal,
    },
    /// Multiplies both multipliers for the booster's duration.
    Both {
        /// The factor applied to each.
        factor: Decimal,
    },
    /// Credits a window of current passive production immediately.
    InstantGrant {
        /// Seconds of production granted.
        production_secs: u64,
    },
}

impl BoosterEffect {
    /// Whether activation occupies the single timed-booster slot.
    pub const fn is_timed(&self) -> bool {
        !matches!(self, Self::InstantGrant { .. })
    }
}

/// Immutable definition of one booster type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoosterDef {
    /// Catalog key.
    pub kind: BoosterKind,
    /// Display name.
    pub name: &'static str,
    /// One-line description for the front-end.
    pub description: &'static str,
    /// Seconds the booster stays active (0 for instant boosters).
    pub duration_secs: u64,
    /// Full activation cost.
    pub cost: ResourceBundle,
    /// Unlock requirement, checked on every activation.
    pub prerequisite: Option<Prerequisite>,
    /// Resolved effect.
    pub effect: BoosterEffect,
}

/// Raw booster data before effect resolution.
#[derive(Debug, Clone, Copy)]
pub struct BoosterSpec {
    /// Catalog key.
    pub kind: BoosterKind,
    /// Display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Declared duration in seconds.
    pub duration_secs: u64,
    /// Declared multiplier factor.
    pub factor: Decimal,
    /// Which multiplier the factor targets.
    pub class: EffectClass,
    /// Activation cost.
    pub cost: ResourceBundle,
    /// Unlock requirement.
    pub prerequisite: Option<Prerequisite>,
}

/// Resolve a raw spec into its effect descriptor.
///
/// A duration of at most [`INSTANT_DURATION_SECS`] is an instant grant of
/// [`INSTANT_GRANT_SECS`] of production, whatever the declared class.
pub const fn resolve_effect(spec: &BoosterSpec) -> BoosterEffect {
    if spec.duration_secs <= INSTANT_DURATION_SECS {
        return BoosterEffect::InstantGrant {
            production_secs: INSTANT_GRANT_SECS,
        };
    }
    match spec.class {
        EffectClass::Production => BoosterEffect::ProductionMultiplier {
            factor: spec.factor,
        },
        EffectClass::Click => BoosterEffect::ClickMultiplier {
            factor: spec.factor,
        },
        EffectClass::Universal => BoosterEffect::Both {
            factor: spec.factor,
        },
    }
}

impl BoosterDef {
    /// Build a definition from a raw spec.
    pub const fn from_spec(spec: &BoosterSpec) -> Self {
        let effect = resolve_effect(spec);
        Self {
            kind: spec.kind,
            name: spec.name,
            description: spec.description,
            duration_secs: if effect.is_timed() {
                spec.duration_secs
            } else {
                0
            },
            cost: spec.cost,
            prerequisite: spec.prerequisite,
            effect,
        }
    }
}

/// Hours to seconds.
const fn hours(h: u64) -> u64 {
    h.saturating_mul(3_600)
}

/// The standard booster line-up.
pub fn standard_boosters() -> Vec<BoosterSpec> {
    vec![
        BoosterSpec {
            kind: BoosterKind::ProtonM87,
            name: "Proton-M87",
            description: "+200% production for 4 hours",
            duration_secs: hours(4),
            factor: Decimal::from_parts(30, 0, 0, false, 1),
            class: EffectClass::Production,
            cost: ResourceBundle::new(5_000, 0, 0),
            prerequisite: Some(Prerequisite {
                kind: ComplexKind::ZaryaM,
                level: 2,
            }),
        },
        BoosterSpec {
            kind: BoosterKind::RedStar,
            name: "Red Star",
            description: "Instantly adds 24 hours of production",
            duration_secs: 1,
            factor: Decimal::ONE,
            class: EffectClass::Production,
            cost: ResourceBundle::new(10_000, 500, 0),
            prerequisite: Some(Prerequisite {
                kind: ComplexKind::SoyuzAtom,
                level: 5,
            }),
        },
        BoosterSpec {
            kind: BoosterKind::AtomicHeart42,
            name: "Atomic Heart-42",
            description: "Doubles click power for 12 hours",
            duration_secs: hours(12),
            factor: Decimal::TWO,
            class: EffectClass::Click,
            cost: ResourceBundle::new(15_000, 1_000, 0),
            prerequisite: Some(Prerequisite {
                kind: ComplexKind::Akademgorod17,
                level: 3,
            }),
        },
        BoosterSpec {
            kind: BoosterKind::IronComrade,
            name: "Iron Comrade",
            description: "Keeps collecting bonuses for 8 hours",
            duration_secs: hours(8),
            factor: Decimal::ONE,
            class: EffectClass::Click,
            cost: ResourceBundle::new(20_000, 2_000, 0),
            prerequisite: Some(Prerequisite {
                kind: ComplexKind::SputnikGamma,
                level: 3,
            }),
        },
        BoosterSpec {
            kind: BoosterKind::TPolymer,
            name: "T-Polymer",
            description: "+150% to production and clicks for 6 hours",
            duration_secs: hours(6),
            factor: Decimal::from_parts(25, 0, 0, false, 1),
            class: EffectClass::Universal,
            cost: ResourceBundle::new(25_000, 3_000, 50),
            prerequisite: Some(Prerequisite {
                kind: ComplexKind::KvantSibir,
                level: 2,
            }),
        },
    ]
}
