//! Complex definitions: cost curves, production and passive roles.

use atomic_types::{ComplexKind, Resource, ResourceBundle};
use rust_decimal::Decimal;
use serde::Serialize;

/// A (complex, minimum level) requirement that gates a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prerequisite {
    /// The complex that must be owned.
    pub kind: ComplexKind,
    /// The minimum level it must have reached.
    pub level: u32,
}

/// What owning a complex does beyond its own production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ComplexRole {
    /// Produces `base_production · level` of one resource per second.
    Producer {
        /// The resource produced.
        resource: Resource,
    },
    /// Adds a percentage per level to every producer of one resource.
    ProductionAmplifier {
        /// The resource whose producers are amplified.
        resource: Resource,
        /// Fractional bonus per level (0.05 = +5%).
        per_level: Decimal,
    },
    /// Adds a percentage per level to every producer.
    GlobalAmplifier {
        /// Fractional bonus per level.
        per_level: Decimal,
    },
    /// Adds a percentage per level to click power.
    ClickAmplifier {
        /// Fractional bonus per level.
        per_level: Decimal,
    },
    /// Pays a periodic lump sum of production.
    Satellite {
        /// Seconds between payouts, also the production window paid.
        period_secs: u64,
        /// Fractional bonus per level on top of the window.
        per_level: Decimal,
    },
    /// Converts each level into one simulated click per second.
    LaborAutomation,
    /// No passive effect; owned for progression only.
    Passive,
}

/// Immutable definition of one complex type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexDef {
    /// Catalog key.
    pub kind: ComplexKind,
    /// Display name.
    pub name: &'static str,
    /// One-line description for the front-end.
    pub description: &'static str,
    /// Production per second contributed by each level.
    pub base_production: Decimal,
    /// Cost of the level 0 -> 1 purchase.
    pub base_cost: ResourceBundle,
    /// Multiplicative cost growth per level.
    pub cost_growth: Decimal,
    /// Unlock requirement, checked only before first purchase.
    pub prerequisite: Option<Prerequisite>,
    /// Passive role.
    pub role: ComplexRole,
}

impl ComplexDef {
    /// The resource this complex produces, if it is a producer.
    pub const fn produced_resource(&self) -> Option<Resource> {
        match self.role {
            ComplexRole::Producer { resource } => Some(resource),
            _ => None,
        }
    }
}

/// Helper to build a [`ComplexDef`].
#[allow(clippy::too_many_arguments)]
const fn complex(
    kind: ComplexKind,
    name: &'static str,
    description: &'static str,
    base_production: Decimal,
    base_cost: ResourceBundle,
    cost_growth: Decimal,
    prerequisite: Option<Prerequisite>,
    role: ComplexRole,
) -> ComplexDef {
    ComplexDef {
        kind,
        name,
        description,
        base_production,
        base_cost,
        cost_growth,
        prerequisite,
        role,
    }
}

/// Helper to build a [`Prerequisite`].
const fn requires(kind: ComplexKind, level: u32) -> Option<Prerequisite> {
    Some(Prerequisite { kind, level })
}

/// `mantissa / 10^scale` as a [`Decimal`].
const fn dec(mantissa: u32, scale: u32) -> Decimal {
    Decimal::from_parts(mantissa, 0, 0, false, scale)
}

/// The standard complex line-up, in unlock order.
pub fn standard_complexes() -> Vec<ComplexDef> {
    use ComplexKind::{
        Akademgorod17, Kollektiv1, KrasniyCiklotron, KvantSibir, Materiya3, MozgMachina,
        PolyusK88, SoyuzAtom, SputnikGamma, ZaryaM,
    };

    vec![
        complex(
            Kollektiv1,
            "KOLLEKTIV-1",
            "Base energy generator. Produces 1 energon per second per level.",
            dec(1, 0),
            ResourceBundle::new(100, 0, 0),
            dec(15, 1),
            None,
            ComplexRole::Producer {
                resource: Resource::Energons,
            },
        ),
        complex(
            ZaryaM,
            "ZARYA-M",
            "Raises energon production by 5% per level.",
            Decimal::ZERO,
            ResourceBundle::new(500, 0, 0),
            dec(16, 1),
            requires(Kollektiv1, 3),
            ComplexRole::ProductionAmplifier {
                resource: Resource::Energons,
                per_level: dec(5, 2),
            },
        ),
        complex(
            SoyuzAtom,
            "SOYUZ-ATOM",
            "Produces neutrons, the secondary currency.",
            dec(2, 1),
            ResourceBundle::new(2_000, 0, 0),
            dec(17, 1),
            requires(Kollektiv1, 5),
            ComplexRole::Producer {
                resource: Resource::Neutrons,
            },
        ),
        complex(
            KrasniyCiklotron,
            "KRASNIY CIKLOTRON",
            "Raises click power by 10% per level.",
            Decimal::ZERO,
            ResourceBundle::new(1_500, 0, 0),
            dec(17, 1),
            requires(Kollektiv1, 5),
            ComplexRole::ClickAmplifier {
                per_level: dec(1, 1),
            },
        ),
        complex(
            Akademgorod17,
            "AKADEMGOROD-17",
            "Trains researchers who raise all production by 2% per level.",
            Decimal::ZERO,
            ResourceBundle::new(5_000, 100, 0),
            dec(18, 1),
            requires(SoyuzAtom, 3),
            ComplexRole::GlobalAmplifier {
                per_level: dec(2, 2),
            },
        ),
        complex(
            SputnikGamma,
            "SPUTNIK-GAMMA",
            "Pays out 30 minutes of production every 30 minutes.",
            Decimal::ZERO,
            ResourceBundle::new(10_000, 500, 0),
            dec(2, 0),
            requires(Akademgorod17, 2),
            ComplexRole::Satellite {
                period_secs: 1_800,
                per_level: dec(2, 1),
            },
        ),
        complex(
            KvantSibir,
            "KVANT-SIBIR",
            "Generates quantum particles for prestige upgrades.",
            dec(5, 2),
            ResourceBundle::new(25_000, 1_000, 0),
            dec(22, 1),
            requires(SputnikGamma, 2),
            ComplexRole::Producer {
                resource: Resource::Particles,
            },
        ),
        complex(
            Materiya3,
            "MATERIYA-3",
            "Creates rare materials for special upgrades.",
            Decimal::ZERO,
            ResourceBundle::new(50_000, 2_500, 0),
            dec(25, 1),
            requires(KvantSibir, 3),
            ComplexRole::Passive,
        ),
        complex(
            MozgMachina,
            "MOZG-MACHINA",
            "Automates clicking: one click per second per level.",
            Decimal::ZERO,
            ResourceBundle::new(75_000, 5_000, 100),
            dec(3, 0),
            requires(Materiya3, 2),
            ComplexRole::LaborAutomation,
        ),
        complex(
            PolyusK88,
            "POLYUS-K88",
            "Opens seasonal events with unique rewards.",
            Decimal::ZERO,
            ResourceBundle::new(100_000, 10_000, 250),
            dec(35, 1),
            requires(MozgMachina, 2),
            ComplexRole::Passive,
        ),
    ]
}
