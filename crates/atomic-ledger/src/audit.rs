//! Production-rate audit.
//!
//! The cached `total_production_rate` on an account must always equal the
//! sum of its owned complexes' production. Every path that changes a level
//! recomputes the cache, so this check passes by construction; the service
//! runs it after each mutation and the scheduler logs any drift it finds.

use atomic_types::{AccountRecord, ComplexKind};
use rust_decimal::Decimal;

/// A mismatch between the cached rate and the owned complexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionDrift {
    /// The rate cached on the account.
    pub cached: Decimal,
    /// The rate recomputed from owned complexes.
    pub actual: Decimal,
    /// Complexes whose level is below 1.
    pub invalid_levels: Vec<ComplexKind>,
}

impl core::fmt::Display for ProductionDrift {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "production drift: cached {} but complexes sum to {}",
            self.cached, self.actual
        )?;
        if !self.invalid_levels.is_empty() {
            write!(f, "; invalid levels on {:?}", self.invalid_levels)?;
        }
        Ok(())
    }
}

/// Outcome of [`verify_production`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditResult {
    /// Cache and complexes agree.
    Consistent,
    /// They do not.
    Drift(ProductionDrift),
}

/// Sum of owned complexes' production.
///
/// Saturates at [`Decimal::MAX`] rather than overflowing.
pub fn owned_production(record: &AccountRecord) -> Decimal {
    record
        .complexes
        .values()
        .fold(Decimal::ZERO, |acc, c| {
            acc.checked_add(c.production).unwrap_or(Decimal::MAX)
        })
}

/// Check the production-rate invariant for one account.
pub fn verify_production(record: &AccountRecord) -> AuditResult {
    let actual = owned_production(record);
    let invalid_levels: Vec<ComplexKind> = record
        .complexes
        .values()
        .filter(|c| c.level == 0)
        .map(|c| c.kind)
        .collect();

    if actual == record.account.total_production_rate && invalid_levels.is_empty() {
        AuditResult::Consistent
    } else {
        tracing::warn!(
            account = %record.account.id,
            cached = %record.account.total_production_rate,
            actual = %actual,
            "Production rate drift detected"
        );
        AuditResult::Drift(ProductionDrift {
            cached: record.account.total_production_rate,
            actual,
            invalid_levels,
        })
    }
}
