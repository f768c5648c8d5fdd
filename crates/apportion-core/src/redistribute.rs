//! # Remainder Redistribution
//!
//! Places a leftover amount back onto an ordered list of targets in whole
//! minimal-unit steps, without ever exceeding a target's capacity.
//!
//! ## The Three Passes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total remainder R, targets ordered by DESCENDING remainder             │
//! │                                                                         │
//! │  Pass 1: proportional                                                   │
//! │  ├── each target takes min(weight × unit, spare capacity)               │
//! │  ├── repeat while R ≥ smallest weight × unit                            │
//! │  └── keeps unit prices whole (a qty-3 target moves by 3 units)         │
//! │           │                                                             │
//! │           ▼  R can no longer land on a whole unit                       │
//! │  Pass 2: odd absorber                                                   │
//! │  └── target with the largest remainder (first on ties, or the first    │
//! │      target if none is positive) takes min(R, spare capacity)          │
//! │           │                                                             │
//! │           ▼  still something left?                                      │
//! │  Pass 3: ascending sweep                                                │
//! │  └── targets by ASCENDING remainder, each filled up to capacity        │
//! │                                                                         │
//! │  Σ capacity < R  →  CoreError::InvariantViolation (never drop money)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Implementation, Three Call Sites
//! Bundle components, discount leftovers and multi-pack odd units all go
//! through [`redistribute`]. Callers describe each target with a [`Slot`]
//! (the capacity extractor) and apply the returned grants themselves.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::money::{sum, Currency};
use crate::types::AllocationTarget;

/// What the redistributor needs to know about one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Quantity; one proportional step is `weight × minimal_unit`.
    pub weight: Decimal,
    /// Spare capacity: the most this target may still receive.
    pub capacity: Decimal,
    /// Leftover from the split that produced this target; drives ordering.
    pub remainder: Decimal,
}

impl Slot {
    pub fn new(weight: Decimal, capacity: Decimal, remainder: Decimal) -> Self {
        Slot {
            weight,
            capacity,
            remainder,
        }
    }
}

impl From<&AllocationTarget> for Slot {
    fn from(target: &AllocationTarget) -> Self {
        Slot::new(target.weight, target.capacity, target.remainder)
    }
}

/// Outcome of a redistribution: one grant per target, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redistribution {
    pub grants: Vec<Decimal>,

    /// The designated odd absorber (largest remainder, first on ties).
    pub absorber: Option<usize>,

    /// The target that received the final top-up, if anything was placed.
    pub last_recipient: Option<usize>,
}

impl Redistribution {
    /// Total amount placed.
    pub fn total(&self) -> Decimal {
        sum(self.grants.iter().copied())
    }

    /// The target that should carry the `can_absorb_odd` mark.
    pub fn odd_holder(&self) -> Option<usize> {
        self.last_recipient.or(self.absorber)
    }
}

/// Distributes `total` over `targets`.
///
/// `slot_of` extracts weight, spare capacity and remainder from each target.
/// The returned grants are aligned with `targets` and sum to exactly `total`.
///
/// ## Errors
/// `CoreError::InvariantViolation` if `total` is negative or the targets'
/// combined spare capacity cannot hold it.
pub fn redistribute<T, F>(
    context: &str,
    total: Decimal,
    targets: &[T],
    currency: &Currency,
    slot_of: F,
) -> CoreResult<Redistribution>
where
    F: Fn(&T) -> Slot,
{
    let slots: Vec<Slot> = targets.iter().map(slot_of).collect();
    let descending = order_by_remainder(&slots, true);
    let absorber = designate_absorber(&slots, &descending);
    let mut grants = vec![Decimal::ZERO; slots.len()];

    if total.is_zero() {
        return Ok(Redistribution {
            grants,
            absorber,
            last_recipient: None,
        });
    }

    let capacity = sum(slots.iter().map(|s| s.capacity.max(Decimal::ZERO)));
    if total.is_sign_negative() || capacity < total {
        return Err(CoreError::InvariantViolation {
            context: context.to_string(),
            remaining: total,
            capacity,
        });
    }

    let unit = currency.minimal_unit();
    let mut left = total;
    let mut last_recipient = None;

    // Pass 1: whole-unit steps, largest remainders first.
    let smallest_step = descending
        .iter()
        .map(|&i| &slots[i])
        .filter(|s| s.weight > Decimal::ZERO && s.capacity > Decimal::ZERO)
        .map(|s| s.weight * unit)
        .min();

    if let Some(smallest_step) = smallest_step {
        'proportional: loop {
            let mut progressed = false;
            for &i in &descending {
                if left < smallest_step {
                    break 'proportional;
                }
                let slot = &slots[i];
                if slot.weight <= Decimal::ZERO {
                    continue;
                }
                let spare = slot.capacity - grants[i];
                if spare <= Decimal::ZERO {
                    continue;
                }
                let give = (slot.weight * unit).min(spare);
                if give > left {
                    continue;
                }
                grants[i] += give;
                left -= give;
                last_recipient = Some(i);
                progressed = true;
            }
            if !progressed {
                break;
            }
        }
    }

    // Pass 2: the odd absorber.
    if left > Decimal::ZERO {
        if let Some(a) = absorber {
            let give = left.min((slots[a].capacity - grants[a]).max(Decimal::ZERO));
            if give > Decimal::ZERO {
                grants[a] += give;
                left -= give;
                last_recipient = Some(a);
            }
        }
    }

    // Pass 3: smallest remainders first, up to capacity.
    if left > Decimal::ZERO {
        for i in order_by_remainder(&slots, false) {
            if left <= Decimal::ZERO {
                break;
            }
            let give = left.min((slots[i].capacity - grants[i]).max(Decimal::ZERO));
            if give > Decimal::ZERO {
                grants[i] += give;
                left -= give;
                last_recipient = Some(i);
            }
        }
    }

    if left != Decimal::ZERO {
        return Err(CoreError::InvariantViolation {
            context: context.to_string(),
            remaining: left,
            capacity: capacity - (total - left),
        });
    }

    Ok(Redistribution {
        grants,
        absorber,
        last_recipient,
    })
}

/// Indices ordered by remainder; ties keep input order.
fn order_by_remainder(slots: &[Slot], descending: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..slots.len()).collect();
    if descending {
        order.sort_by(|&a, &b| slots[b].remainder.cmp(&slots[a].remainder));
    } else {
        order.sort_by(|&a, &b| slots[a].remainder.cmp(&slots[b].remainder));
    }
    order
}

/// Largest positive remainder (first on ties), else the first target.
fn designate_absorber(slots: &[Slot], descending: &[usize]) -> Option<usize> {
    let first = *descending.first()?;
    if slots[first].remainder > Decimal::ZERO {
        Some(first)
    } else {
        Some(0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn slot(weight: i64, capacity: &str, remainder: &str) -> Slot {
        Slot::new(Decimal::from(weight), d(capacity), d(remainder))
    }

    fn vnd() -> Currency {
        Currency::new("VND", 0)
    }

    fn run(total: &str, slots: &[Slot], currency: &Currency) -> CoreResult<Redistribution> {
        redistribute("test", d(total), slots, currency, |s| *s)
    }

    #[test]
    fn test_zero_total_grants_nothing() {
        let slots = [slot(1, "10", "0"), slot(2, "10", "0")];
        let result = run("0", &slots, &vnd()).unwrap();
        assert_eq!(result.grants, vec![Decimal::ZERO, Decimal::ZERO]);
        assert_eq!(result.absorber, Some(0));
        assert_eq!(result.last_recipient, None);
        assert_eq!(result.odd_holder(), Some(0));
    }

    #[test]
    fn test_below_smallest_step_goes_to_absorber() {
        // Packsize: 6 units, 4 VND left over; no whole-unit step fits.
        let slots = [slot(6, "100000", "4")];
        let result = run("4", &slots, &vnd()).unwrap();
        assert_eq!(result.grants, vec![d("4")]);
        assert_eq!(result.last_recipient, Some(0));
    }

    #[test]
    fn test_proportional_pass_prefers_largest_remainder() {
        // Two qty-2 targets; 2 VND fits one whole step on the bigger remainder.
        let slots = [slot(2, "100", "0"), slot(2, "100", "1")];
        let result = run("2", &slots, &vnd()).unwrap();
        assert_eq!(result.grants, vec![d("0"), d("2")]);
        assert_eq!(result.absorber, Some(1));
    }

    #[test]
    fn test_proportional_then_absorber() {
        let slots = [slot(3, "100", "2"), slot(2, "100", "1")];
        // 3 → first target (step 3), then 2 → second (step 2), 1 left → absorber (target 0)
        let result = run("6", &slots, &vnd()).unwrap();
        assert_eq!(result.total(), d("6"));
        assert_eq!(result.grants, vec![d("4"), d("2")]);
        assert_eq!(result.odd_holder(), Some(0));
    }

    #[test]
    fn test_capacity_is_respected_and_sweep_fills_the_rest() {
        // Absorber has only 1 spare; the sweep fills the others in ascending remainder order.
        let slots = [slot(5, "1", "3"), slot(5, "2", "0"), slot(5, "10", "1")];
        let result = run("7", &slots, &vnd()).unwrap();
        assert_eq!(result.total(), d("7"));
        assert!(result.grants[0] <= d("1"));
        assert!(result.grants[1] <= d("2"));
        // A caps at 1, C takes one step of 5, the sweep hands the last unit to B.
        assert_eq!(result.grants, vec![d("1"), d("1"), d("5")]);
    }

    #[test]
    fn test_zero_capacity_targets_never_receive() {
        let slots = [slot(1, "0", "0"), slot(1, "50", "0"), slot(1, "50", "0")];
        let result = run("100", &slots, &vnd()).unwrap();
        assert_eq!(result.grants[0], Decimal::ZERO);
        assert_eq!(result.total(), d("100"));
    }

    #[test]
    fn test_two_digit_currency_steps() {
        let usd = Currency::new("USD", 2);
        let slots = [slot(2, "10", "0.01"), slot(1, "10", "0")];
        let result = run("0.03", &slots, &usd).unwrap();
        assert_eq!(result.total(), d("0.03"));
        assert_eq!(result.grants, vec![d("0.02"), d("0.01")]);
    }

    #[test]
    fn test_insufficient_capacity_is_an_invariant_violation() {
        let slots = [slot(1, "2", "0"), slot(1, "3", "0")];
        let err = run("6", &slots, &vnd()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvariantViolation { ref remaining, ref capacity, .. }
                if *remaining == d("6") && *capacity == d("5")
        ));
    }

    #[test]
    fn test_negative_total_is_an_invariant_violation() {
        let slots = [slot(1, "10", "0")];
        assert!(run("-1", &slots, &vnd()).unwrap_err().is_invariant_violation());
    }

    #[test]
    fn test_empty_targets() {
        let slots: [Slot; 0] = [];
        assert!(run("0", &slots, &vnd()).unwrap().grants.is_empty());
        assert!(run("1", &slots, &vnd()).is_err());
    }

    #[test]
    fn test_slot_from_target() {
        let mut target = AllocationTarget::new(d("4"), d("2.5"), d("10"));
        target.remainder = d("0.02");
        let s = Slot::from(&target);
        assert_eq!(s, Slot::new(d("4"), d("10"), d("0.02")));
    }
}
