//! Static complex and booster definitions for the Atomic Progress economy.
//!
//! The [`Catalog`] is built once at process start, validated, and then shared
//! read-only (behind an `Arc`) by every other component. Nothing mutates it
//! afterwards.
//!
//! # Modules
//!
//! - [`complexes`] -- [`ComplexDef`], roles, prerequisites, the standard line-up
//! - [`boosters`] -- [`BoosterDef`], effect resolution, the standard line-up
//!
//! # Validation
//!
//! | Check | Error |
//! |-------|-------|
//! | Key defined twice | [`CatalogError::Duplicate`] |
//! | Prerequisite names an undefined complex | [`CatalogError::UnknownPrerequisite`] |
//! | Prerequisite names the complex itself | [`CatalogError::SelfPrerequisite`] |
//! | Cost growth not above 1 | [`CatalogError::NonGrowingCost`] |
//! | Booster factor below 1 | [`CatalogError::FactorBelowOne`] |

pub mod boosters;
pub mod complexes;

pub use boosters::{BoosterDef, BoosterEffect, BoosterSpec, EffectClass};
pub use complexes::{ComplexDef, ComplexRole, Prerequisite};

use std::collections::BTreeMap;

use atomic_types::{BoosterKind, ComplexKind};
use rust_decimal::Decimal;

/// Errors raised while building a [`Catalog`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The same key was defined more than once.
    #[error("catalog key defined twice: {key}")]
    Duplicate {
        /// The repeated key.
        key: &'static str,
    },

    /// A prerequisite references a complex the catalog does not define.
    #[error("{key} requires undefined complex {requires}")]
    UnknownPrerequisite {
        /// The entry carrying the prerequisite.
        key: &'static str,
        /// The missing complex.
        requires: ComplexKind,
    },

    /// A complex lists itself as its prerequisite.
    #[error("{kind} cannot require itself")]
    SelfPrerequisite {
        /// The offending complex.
        kind: ComplexKind,
    },

    /// Cost growth must be strictly greater than one.
    #[error("{kind} cost growth {growth} must exceed 1")]
    NonGrowingCost {
        /// The offending complex.
        kind: ComplexKind,
        /// The declared growth.
        growth: Decimal,
    },

    /// Booster factors below one would reduce output.
    #[error("{kind} factor {factor} is below 1")]
    FactorBelowOne {
        /// The offending booster.
        kind: BoosterKind,
        /// The declared factor.
        factor: Decimal,
    },
}

/// The validated, immutable set of complex and booster definitions.
#[derive(Debug, Clone)]
pub struct Catalog {
    complexes: BTreeMap<ComplexKind, ComplexDef>,
    boosters: BTreeMap<BoosterKind, BoosterDef>,
}

impl Catalog {
    /// Build the standard catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the built-in data fails validation.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::build(complexes::standard_complexes(), &boosters::standard_boosters())
    }

    /// Validate definitions and resolve booster effects.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for duplicates, dangling or self-referencing
    /// prerequisites, non-growing costs and sub-unit booster factors.
    pub fn build(
        complex_defs: Vec<ComplexDef>,
        booster_specs: &[BoosterSpec],
    ) -> Result<Self, CatalogError> {
        let mut complexes = BTreeMap::new();
        for def in complex_defs {
            if def.cost_growth <= Decimal::ONE {
                return Err(CatalogError::NonGrowingCost {
                    kind: def.kind,
                    growth: def.cost_growth,
                });
            }
            if def.prerequisite.is_some_and(|p| p.kind == def.kind) {
                return Err(CatalogError::SelfPrerequisite { kind: def.kind });
            }
            let key = def.kind.as_str();
            if complexes.insert(def.kind, def).is_some() {
                return Err(CatalogError::Duplicate { key });
            }
        }

        for def in complexes.values() {
            check_prerequisite(&complexes, def.kind.as_str(), def.prerequisite)?;
        }

        let mut boosters = BTreeMap::new();
        for spec in booster_specs {
            if spec.factor < Decimal::ONE {
                return Err(CatalogError::FactorBelowOne {
                    kind: spec.kind,
                    factor: spec.factor,
                });
            }
            check_prerequisite(&complexes, spec.kind.as_str(), spec.prerequisite)?;
            if boosters
                .insert(spec.kind, BoosterDef::from_spec(spec))
                .is_some()
            {
                return Err(CatalogError::Duplicate {
                    key: spec.kind.as_str(),
                });
            }
        }

        Ok(Self {
            complexes,
            boosters,
        })
    }

    /// Look up a complex definition.
    pub fn complex(&self, kind: ComplexKind) -> Option<&ComplexDef> {
        self.complexes.get(&kind)
    }

    /// Look up a booster definition.
    pub fn booster(&self, kind: BoosterKind) -> Option<&BoosterDef> {
        self.boosters.get(&kind)
    }

    /// All complex definitions, in key order.
    pub fn complexes(&self) -> impl Iterator<Item = &ComplexDef> {
        self.complexes.values()
    }

    /// All booster definitions, in key order.
    pub fn boosters(&self) -> impl Iterator<Item = &BoosterDef> {
        self.boosters.values()
    }

    /// The first complex with the given role discriminant, used to find the
    /// amplifier, satellite and automation complexes without naming them.
    pub fn find_role(&self, matches: impl Fn(&ComplexRole) -> bool) -> Option<&ComplexDef> {
        self.complexes.values().find(|def| matches(&def.role))
    }
}

fn check_prerequisite(
    complexes: &BTreeMap<ComplexKind, ComplexDef>,
    key: &'static str,
    prerequisite: Option<Prerequisite>,
) -> Result<(), CatalogError> {
    match prerequisite {
        Some(p) if !complexes.contains_key(&p.kind) => Err(CatalogError::UnknownPrerequisite {
            key,
            requires: p.kind,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_validates() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.complexes().count(), 10);
        assert_eq!(catalog.boosters().count(), 5);
    }

    #[test]
    fn lookups_return_definitions() {
        let catalog = Catalog::standard().unwrap();
        let zarya = catalog.complex(ComplexKind::ZaryaM).unwrap();
        assert_eq!(
            zarya.prerequisite,
            Some(Prerequisite {
                kind: ComplexKind::Kollektiv1,
                level: 3
            })
        );
        let red_star = catalog.booster(BoosterKind::RedStar).unwrap();
        assert!(!red_star.effect.is_timed());
    }

    #[test]
    fn find_role_locates_satellite() {
        let catalog = Catalog::standard().unwrap();
        let satellite = catalog
            .find_role(|role| matches!(role, ComplexRole::Satellite { .. }))
            .unwrap();
        assert_eq!(satellite.kind, ComplexKind::SputnikGamma);
    }

    #[test]
    fn dangling_prerequisite_is_rejected() {
        let only_zarya: Vec<_> = complexes::standard_complexes()
            .into_iter()
            .filter(|d| d.kind == ComplexKind::ZaryaM)
            .collect();
        let err = Catalog::build(only_zarya, &[]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownPrerequisite {
                key: "ZARYA-M",
                requires: ComplexKind::Kollektiv1
            }
        );
    }

    #[test]
    fn flat_cost_growth_is_rejected() {
        let mut defs = complexes::standard_complexes();
        defs[0].cost_growth = Decimal::ONE;
        let err = Catalog::build(defs, &[]).unwrap_err();
        assert!(matches!(err, CatalogError::NonGrowingCost { .. }));
    }

    #[test]
    fn duplicate_booster_is_rejected() {
        let specs = boosters::standard_boosters();
        let doubled: Vec<_> = specs.iter().chain(specs.iter()).copied().collect();
        let err = Catalog::build(complexes::standard_complexes(), &doubled).unwrap_err();
        assert_eq!(err, CatalogError::Duplicate { key: "PROTON-M87" });
    }

    #[test]
    fn weakening_booster_is_rejected() {
        let mut specs = boosters::standard_boosters();
        specs[0].factor = Decimal::new(5, 1);
        let err = Catalog::build(complexes::standard_complexes(), &specs).unwrap_err();
        assert!(matches!(err, CatalogError::FactorBelowOne { .. }));
    }
}
