//! Click power and click crediting.
//!
//! Click power stays an exact decimal; it is floored once per credit, over
//! the whole batch of clicks, never per click.

use atomic_catalog::{Catalog, ComplexRole};
use atomic_ledger::wallet;
use atomic_types::{AccountRecord, ResourceBundle};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::EconomyRules;
use crate::math::{floor_units, mul};
use crate::production::amplifier;
use crate::{EconomyError, booster};

/// Result of crediting a batch of manual clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClickCredit {
    /// Clicks credited.
    pub clicks: u64,
    /// Click power used.
    pub power: Decimal,
    /// Energons credited.
    pub credited: u64,
}

/// `base · (1 + Σ per_level · level) · click_multiplier`.
pub fn click_power(
    record: &AccountRecord,
    catalog: &Catalog,
    rules: &EconomyRules,
) -> Result<Decimal, EconomyError> {
    let bonus = amplifier(record, catalog, |role| match *role {
        ComplexRole::ClickAmplifier { per_level } => Some(per_level),
        _ => None,
    })?;
    let amplified = mul(Decimal::from(rules.base_click_power), bonus, "click power")?;
    mul(
        amplified,
        record.account.click_multiplier,
        "click multiplier",
    )
}

/// `floor(clicks · power)`.
pub fn click_credit(clicks: u64, power: Decimal) -> Result<u64, EconomyError> {
    floor_units(mul(Decimal::from(clicks), power, "click credit")?, "click credit")
}

/// Credit `clicks` manual clicks at the account's current click power.
pub fn credit_clicks(
    record: &mut AccountRecord,
    catalog: &Catalog,
    rules: &EconomyRules,
    clicks: u64,
    now: DateTime<Utc>,
) -> Result<ClickCredit, EconomyError> {
    crate::ensure_active(&record.account)?;
    let mut staged = record.clone();
    booster::expire_if_due(&mut staged.account, now);

    let power = click_power(&staged, catalog, rules)?;
    let credited = click_credit(clicks, power)?;
    let manual_clicks = staged
        .account
        .manual_clicks
        .checked_add(clicks)
        .ok_or_else(|| EconomyError::overflow("manual click counter"))?;

    wallet::credit(&mut staged.account, &ResourceBundle::energons(credited))?;
    staged.account.manual_clicks = manual_clicks;
    staged.account.updated_at = now;
    *record = staged;

    Ok(ClickCredit {
        clicks,
        power,
        credited,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atomic_types::ComplexKind;

    use super::*;
    use crate::testing::{catalog, record_with};

    #[test]
    fn base_power_is_ten() {
        let record = record_with(0, &[(ComplexKind::Kollektiv1, 1)]);
        let power = click_power(&record, &catalog(), &EconomyRules::default()).unwrap();
        assert_eq!(power, Decimal::TEN);
    }

    #[test]
    fn amplifier_and_multiplier_compose() {
        let mut record = record_with(0, &[(ComplexKind::KrasniyCiklotron, 3)]);
        record.account.click_multiplier = Decimal::new(25, 1);
        let power = click_power(&record, &catalog(), &EconomyRules::default()).unwrap();
        // 10 * 1.3 * 2.5
        assert_eq!(power, Decimal::new(325, 1));
    }

    #[test]
    fn credit_floors_the_batch_not_each_click() {
        // 3 clicks at 32.5 = 97.5 -> 97 (per-click flooring would give 96)
        assert_eq!(click_credit(3, Decimal::new(325, 1)).unwrap(), 97);
        assert_eq!(click_credit(0, Decimal::new(325, 1)).unwrap(), 0);
    }

    #[test]
    fn credit_clicks_updates_balance_and_counter() {
        let catalog = catalog();
        let mut record = record_with(5, &[(ComplexKind::Kollektiv1, 1)]);
        let credit =
            credit_clicks(&mut record, &catalog, &EconomyRules::default(), 7, Utc::now()).unwrap();
        assert_eq!(credit.credited, 70);
        assert_eq!(record.account.balances.energons, 75);
        assert_eq!(record.account.manual_clicks, 7);
    }

    #[test]
    fn banned_account_cannot_click() {
        let catalog = catalog();
        let mut record = record_with(0, &[]);
        record.account.banned = true;
        let err = credit_clicks(&mut record, &catalog, &EconomyRules::default(), 1, Utc::now())
            .unwrap_err();
        assert_eq!(err, EconomyError::Banned);
    }
}
