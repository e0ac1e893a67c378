//! Checked decimal helpers shared by the formula modules.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::EconomyError;

/// `a · b`, failing with [`EconomyError::ArithmeticOverflow`].
pub fn mul(a: Decimal, b: Decimal, context: &str) -> Result<Decimal, EconomyError> {
    a.checked_mul(b).ok_or_else(|| EconomyError::overflow(context))
}

/// `a + b`, failing with [`EconomyError::ArithmeticOverflow`].
pub fn add(a: Decimal, b: Decimal, context: &str) -> Result<Decimal, EconomyError> {
    a.checked_add(b).ok_or_else(|| EconomyError::overflow(context))
}

/// Round down to a whole unit. Negative values clamp to 0.
pub fn floor_units(value: Decimal, context: &str) -> Result<u64, EconomyError> {
    value
        .max(Decimal::ZERO)
        .floor()
        .to_u64()
        .ok_or_else(|| EconomyError::overflow(context))
}

/// `1 + per_level · level`.
pub fn level_bonus(per_level: Decimal, level: u32) -> Result<Decimal, EconomyError> {
    let scaled = mul(per_level, Decimal::from(level), "level bonus")?;
    add(Decimal::ONE, scaled, "level bonus")
}

/// `now + secs`, failing on out-of-range timestamps.
pub fn after(now: DateTime<Utc>, secs: u64) -> Result<DateTime<Utc>, EconomyError> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| EconomyError::overflow("timestamp"))
}
