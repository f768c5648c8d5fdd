//! # Discount Allocation
//!
//! Spreads a discount amount over a list of targets (the components of a
//! bundle, or the lines of an order) in proportion to their line prices.
//!
//! ## Allocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Discount 10.00 over lines [ 9.00 ×3 | 0.00 | 9.00 ×3 ]                 │
//! │                                                                         │
//! │  1. Proportional split (floor), every target but the last priced one   │
//! │     9.00 × 10.00 / 18.00 = 5.00 → truncated to a multiple of 0.03      │
//! │     → applied 4.98, remainder 0.02                                     │
//! │     0.00 line → 0                                                       │
//! │                                                                         │
//! │  2. Last priced target closes the drift                                │
//! │     10.00 − 4.98 = 5.02 (capped at its spare capacity)                 │
//! │                                                                         │
//! │  3. Anything the cap held back → redistribute module                   │
//! │     (proportional → odd absorber → ascending sweep)                    │
//! │                                                                         │
//! │  Σ allocations = 10.00  ✔                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Capacity
//! A target can absorb at most `capacity − already allocated`, where the
//! already-allocated amount comes from earlier discount applications on the
//! same target. A discount never pushes a target below zero.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::money::{floor_to, floor_to_multiple, sum, Currency};
use crate::redistribute::{redistribute, Slot};
use crate::types::{AllocationTarget, DiscountAllocation, DiscountApplication};

/// Allocates one discount application across `targets`.
///
/// `already_allocated[i]` is the discount target `i` carries from earlier
/// applications; pass an empty slice when there are none.
/// The result has one entry per target (zero amounts included) and its
/// amounts sum to exactly `application.amount`.
///
/// ## Errors
/// `CoreError::InvariantViolation` when the amount is negative or exceeds the
/// targets' combined spare capacity.
pub fn allocate_discount(
    application: &DiscountApplication,
    targets: &[AllocationTarget],
    already_allocated: &[Decimal],
    currency: &Currency,
) -> CoreResult<Vec<DiscountAllocation>> {
    let amount = application.amount;
    let unit = currency.minimal_unit();

    let spare: Vec<Decimal> = targets
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let taken = already_allocated.get(i).copied().unwrap_or(Decimal::ZERO);
            (t.capacity - taken).max(Decimal::ZERO)
        })
        .collect();

    let total_spare = sum(spare.iter().copied());
    if amount.is_sign_negative() && !amount.is_zero() || amount > total_spare {
        return Err(CoreError::InvariantViolation {
            context: format!("discount {}", application.application_id),
            remaining: amount,
            capacity: total_spare,
        });
    }

    let parent_total = sum(targets.iter().map(|t| t.line_price));
    let last_priced = targets.iter().rposition(|t| t.line_price > Decimal::ZERO);

    let mut applied = vec![Decimal::ZERO; targets.len()];
    let mut remainders = vec![Decimal::ZERO; targets.len()];

    for (i, target) in targets.iter().enumerate() {
        if Some(i) == last_priced {
            continue;
        }
        let split = if target.line_price.is_zero() || parent_total.is_zero() {
            Decimal::ZERO
        } else {
            floor_to(target.line_price * amount / parent_total, currency)
        };
        applied[i] = floor_to_multiple(split.min(spare[i]), target.step(unit));
        remainders[i] = split - applied[i];
    }

    if let Some(last) = last_priced {
        let wanted = amount - sum(applied.iter().copied());
        applied[last] = wanted.min(spare[last]);
        remainders[last] = wanted - applied[last];
    }

    let overflow = amount - sum(applied.iter().copied());
    let slots: Vec<Slot> = targets
        .iter()
        .enumerate()
        .map(|(i, t)| Slot::new(t.weight, spare[i] - applied[i], remainders[i]))
        .collect();
    let context = format!("discount {}", application.application_id);
    let placed = redistribute(&context, overflow, &slots, currency, |s| *s)?;

    let allocations = targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let amount = applied[i] + placed.grants[i];
            let remainder = amount - floor_to_multiple(amount, target.step(unit));
            DiscountAllocation {
                application_id: application.application_id.clone(),
                amount,
                remainder,
            }
        })
        .collect();

    Ok(allocations)
}

/// Allocates several applications in order, each seeing the capacity the
/// previous ones left behind.
///
/// Returns one list per target; zero-amount allocations are dropped.
pub fn allocate_discounts(
    applications: &[DiscountApplication],
    targets: &[AllocationTarget],
    already_allocated: &[Decimal],
    currency: &Currency,
) -> CoreResult<Vec<Vec<DiscountAllocation>>> {
    let mut taken: Vec<Decimal> = (0..targets.len())
        .map(|i| already_allocated.get(i).copied().unwrap_or(Decimal::ZERO))
        .collect();
    let mut per_target: Vec<Vec<DiscountAllocation>> = vec![Vec::new(); targets.len()];

    for application in applications {
        let allocations = allocate_discount(application, targets, &taken, currency)?;
        for (i, allocation) in allocations.into_iter().enumerate() {
            taken[i] += allocation.amount;
            if !allocation.amount.is_zero() {
                per_target[i].push(allocation);
            }
        }
    }

    Ok(per_target)
}

// =============================================================================
// Unit Tests
// =============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_discount_allocations_sum_to_amount(
            raw in prop::collection::vec((0i64..100_000, 1i64..10), 1..=50),
            percent in 0i64..=100,
            digits in 0u32..3,
        ) {
            let currency = Currency::new("TST", digits);
            let targets: Vec<AllocationTarget> = raw
                .iter()
                .map(|&(price, qty)| {
                    let line = Decimal::new(price, digits);
                    AllocationTarget::new(Decimal::from(qty), line / Decimal::from(qty), line)
                })
                .collect();
            let total: Decimal = targets.iter().map(|t| t.line_price).sum();
            let amount = floor_to(total * Decimal::from(percent) / Decimal::from(100), &currency);
            let application = DiscountApplication { application_id: "p".to_string(), amount };

            let result = allocate_discount(&application, &targets, &[], &currency).unwrap();

            let allocated: Decimal = result.iter().map(|a| a.amount).sum();
            prop_assert_eq!(allocated, amount);
            for (allocation, target) in result.iter().zip(&targets) {
                prop_assert!(allocation.amount >= Decimal::ZERO);
                prop_assert!(allocation.amount <= target.line_price);
            }
        }

        #[test]
        fn prop_discount_is_deterministic(
            raw in prop::collection::vec((0i64..10_000, 1i64..5), 1..20),
            percent in 0i64..=100,
        ) {
            let currency = Currency::new("USD", 2);
            let targets: Vec<AllocationTarget> = raw
                .iter()
                .map(|&(price, qty)| {
                    let line = Decimal::new(price, 2);
                    AllocationTarget::new(Decimal::from(qty), line / Decimal::from(qty), line)
                })
                .collect();
            let total: Decimal = targets.iter().map(|t| t.line_price).sum();
            let amount = floor_to(total * Decimal::from(percent) / Decimal::from(100), &currency);
            let application = DiscountApplication { application_id: "p".to_string(), amount };

            let first = allocate_discount(&application, &targets, &[], &currency).unwrap();
            let second = allocate_discount(&application, &targets, &[], &currency).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
