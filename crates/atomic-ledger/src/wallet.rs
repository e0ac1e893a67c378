//! Balance mutation for accounts.
//!
//! All arithmetic is checked. A debit either removes the whole cost or
//! nothing at all: every component is verified before any is subtracted, so
//! a failed purchase can never leave a half-paid account behind.

use atomic_types::{Account, Resource, ResourceBundle};

use crate::LedgerError;

/// Whether `balances` covers every component of `cost`.
pub fn can_afford(balances: &ResourceBundle, cost: &ResourceBundle) -> bool {
    first_shortfall(balances, cost).is_none()
}

/// The first resource (in [`Resource::ALL`] order) that `balances` cannot
/// cover, as `(resource, required, available)`.
pub fn first_shortfall(
    balances: &ResourceBundle,
    cost: &ResourceBundle,
) -> Option<(Resource, u64, u64)> {
    Resource::ALL.into_iter().find_map(|resource| {
        let required = cost.get(resource);
        let available = balances.get(resource);
        (available < required).then_some((resource, required, available))
    })
}

/// Component-wise checked sum of two bundles.
pub fn checked_sum(a: &ResourceBundle, b: &ResourceBundle) -> Result<ResourceBundle, LedgerError> {
    let mut out = *a;
    for (resource, amount) in b.iter() {
        let slot = out.get_mut(resource);
        *slot = slot
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { resource })?;
    }
    Ok(out)
}

/// Credit `amount` to the account's balances and lifetime totals.
///
/// Both totals are computed before either is written, so an overflow
/// leaves the account untouched.
pub fn credit(account: &mut Account, amount: &ResourceBundle) -> Result<(), LedgerError> {
    if amount.is_empty() {
        return Ok(());
    }
    let balances = checked_sum(&account.balances, amount)?;
    let lifetime = checked_sum(&account.lifetime, amount)?;
    account.balances = balances;
    account.lifetime = lifetime;
    Ok(())
}

/// Debit the full `cost` from the account's balances.
///
/// Fails with [`LedgerError::InsufficientResources`] naming the first short
/// resource, in which case no balance is changed.
pub fn debit(account: &mut Account, cost: &ResourceBundle) -> Result<(), LedgerError> {
    if let Some((resource, required, available)) = first_shortfall(&account.balances, cost) {
        return Err(LedgerError::InsufficientResources {
            resource,
            required,
            available,
        });
    }

    let mut remaining = account.balances;
    for (resource, amount) in cost.iter() {
        let slot = remaining.get_mut(resource);
        *slot = slot
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientResources {
                resource,
                required: amount,
                available: *slot,
            })?;
    }
    account.balances = remaining;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atomic_types::AccountId;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn account_with(balances: ResourceBundle) -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(),
            external_id: 1,
            display_name: String::from("tester"),
            balances,
            lifetime: balances,
            manual_clicks: 0,
            total_production_rate: Decimal::ZERO,
            production_multiplier: Decimal::ONE,
            click_multiplier: Decimal::ONE,
            active_booster: None,
            next_satellite_at: None,
            daily_bonus_claimed: false,
            bonus_streak: 0,
            banned: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn credit_updates_balance_and_lifetime() {
        let mut account = account_with(ResourceBundle::energons(10));
        credit(&mut account, &ResourceBundle::new(5, 2, 0)).unwrap();
        assert_eq!(account.balances, ResourceBundle::new(15, 2, 0));
        assert_eq!(account.lifetime, ResourceBundle::new(15, 2, 0));
    }

    #[test]
    fn credit_overflow_leaves_account_unchanged() {
        let mut account = account_with(ResourceBundle::energons(u64::MAX));
        let before = account.clone();
        let err = credit(&mut account, &ResourceBundle::energons(1)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Overflow {
                resource: Resource::Energons
            }
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn exact_debit_leaves_zero() {
        let mut account = account_with(ResourceBundle::energons(5_000));
        debit(&mut account, &ResourceBundle::energons(5_000)).unwrap();
        assert_eq!(account.balances.energons, 0);
        // Lifetime totals never go down.
        assert_eq!(account.lifetime.energons, 5_000);
    }

    #[test]
    fn partial_shortfall_debits_nothing() {
        let mut account = account_with(ResourceBundle::new(10_000, 100, 0));
        let before = account.clone();
        let err = debit(&mut account, &ResourceBundle::new(5_000, 500, 0)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientResources {
                resource: Resource::Neutrons,
                required: 500,
                available: 100
            }
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn shortfall_reports_first_missing_resource() {
        let balances = ResourceBundle::new(0, 0, 0);
        let cost = ResourceBundle::new(1, 1, 1);
        assert_eq!(
            first_shortfall(&balances, &cost),
            Some((Resource::Energons, 1, 0))
        );
        assert!(can_afford(&ResourceBundle::new(1, 1, 1), &cost));
    }
}
