//! # Line Decomposition
//!
//! Splits the price of a composite line (bundle or multi-pack) into priced
//! components whose line prices add back up to the line price exactly.
//!
//! ## Combo Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Combo "Breakfast Set" × 2, line price 99 999 VND                       │
//! │                                                                         │
//! │  catalog: Coffee 30 × 1, Bread 70 × 1, Napkin 0 × 1                    │
//! │       │                                                                 │
//! │       ▼  partition by catalog price                                     │
//! │  positive group: Coffee, Bread     zero group: Napkin                  │
//! │       │                                                                 │
//! │       ▼  proportional split (half-up), last one closes the drift       │
//! │  Coffee 30 000   Bread 69 999      Napkin 0                            │
//! │       │                                                                 │
//! │       ▼  whole unit prices over component quantity (floor)             │
//! │  Coffee 15 000 × 2 (+0)   Bread 34 999 × 2 (+1)   Napkin 0 × 2         │
//! │       │                                                                 │
//! │       ▼  redistribute Σ remainders = 1                                  │
//! │  Bread line price 69 999, marked can_absorb_odd                        │
//! │                                                                         │
//! │  Σ component line prices = 99 999  ✔                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A packsize line is the single-component case of the same flow.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::money::{floor_to, round_half_up, sum, Currency};
use crate::redistribute::{redistribute, Slot};
use crate::types::{AllocationTarget, Component, ComponentSpec, CompositeLine, LineComposition};

/// Decomposes a composite line into priced components.
///
/// Normal lines and combos with no catalog components yield an empty list;
/// the caller treats such a line as having no breakdown.
///
/// ## Errors
/// - `CoreError::InvalidComposite` for a non-positive line quantity or base quantity
/// - `CoreError::InvariantViolation` if remainder placement fails (never expected)
pub fn decompose(line: &CompositeLine, currency: &Currency) -> CoreResult<Vec<Component>> {
    match &line.composition {
        LineComposition::Normal => Ok(Vec::new()),
        LineComposition::Combo(specs) if specs.is_empty() => Ok(Vec::new()),
        LineComposition::Combo(specs) => {
            ensure_positive_quantity(line.quantity)?;
            let splits = combo_splits(specs, line.line_price, currency)?;
            build_components(specs, &splits, line.quantity, currency)
        }
        LineComposition::Packsize(spec) => {
            ensure_positive_quantity(line.quantity)?;
            let specs = std::slice::from_ref(spec);
            let splits = Splits {
                prices: vec![line.line_price],
                drift_absorber: Some(0),
            };
            build_components(specs, &splits, line.quantity, currency)
        }
    }
}

/// Per-component split prices before unit pricing.
struct Splits {
    prices: Vec<Decimal>,
    /// Component that closed the split drift of the pricing group.
    drift_absorber: Option<usize>,
}

fn ensure_positive_quantity(quantity: Decimal) -> CoreResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(CoreError::InvalidComposite {
            reason: format!("line quantity must be positive, got {quantity}"),
        });
    }
    Ok(())
}

/// Computes each combo component's share of `line_price`.
fn combo_splits(specs: &[ComponentSpec], line_price: Decimal, currency: &Currency) -> CoreResult<Splits> {
    if let Some(bad) = specs.iter().find(|s| s.base_quantity <= Decimal::ZERO) {
        return Err(CoreError::InvalidComposite {
            reason: format!("component '{}' has non-positive base quantity", bad.title),
        });
    }

    let (positive, zero): (Vec<usize>, Vec<usize>) =
        (0..specs.len()).partition(|&i| specs[i].catalog_price > Decimal::ZERO);

    let original_combo_price = round_half_up(
        sum(positive.iter().map(|&i| specs[i].catalog_price * specs[i].base_quantity)),
        currency,
    );

    let mut prices = vec![Decimal::ZERO; specs.len()];
    let mut drift_absorber = None;

    if !positive.is_empty() {
        // A combo whose catalog value rounds to nothing falls back to quantity weights.
        let weight = |i: usize| {
            if original_combo_price.is_zero() {
                specs[i].base_quantity
            } else {
                specs[i].catalog_price * specs[i].base_quantity
            }
        };
        drift_absorber = split_group(&positive, line_price, weight, &mut prices, currency);
    }

    let remaining = line_price - sum(positive.iter().map(|&i| prices[i]));
    if !zero.is_empty() {
        let absorber = split_group(&zero, remaining, |i| specs[i].base_quantity, &mut prices, currency);
        drift_absorber = drift_absorber.or(absorber);
    }

    Ok(Splits {
        prices,
        drift_absorber,
    })
}

/// Splits `amount` over `group` by `weight`; the last member closes the drift.
///
/// Earlier shares are clamped to what is still unassigned, so a run of
/// half-up roundings can never push the last share below zero.
fn split_group<W>(
    group: &[usize],
    amount: Decimal,
    weight: W,
    prices: &mut [Decimal],
    currency: &Currency,
) -> Option<usize>
where
    W: Fn(usize) -> Decimal,
{
    let (&last, rest) = group.split_last()?;
    let total_weight = sum(group.iter().map(|&i| weight(i)));
    let mut assigned = Decimal::ZERO;

    for &i in rest {
        let share = if total_weight.is_zero() {
            Decimal::ZERO
        } else {
            round_half_up(amount * weight(i) / total_weight, currency)
        };
        let share = share.min(amount - assigned).max(Decimal::ZERO);
        prices[i] = share;
        assigned += share;
    }
    prices[last] = amount - assigned;
    Some(last)
}

/// Turns split prices into whole unit prices and places the leftovers.
fn build_components(
    specs: &[ComponentSpec],
    splits: &Splits,
    line_quantity: Decimal,
    currency: &Currency,
) -> CoreResult<Vec<Component>> {
    let mut targets = Vec::with_capacity(specs.len());

    for (spec, &split) in specs.iter().zip(&splits.prices) {
        let quantity = spec.base_quantity * line_quantity;
        if quantity <= Decimal::ZERO {
            return Err(CoreError::InvalidComposite {
                reason: format!("component '{}' has non-positive quantity", spec.title),
            });
        }
        let unit_price = floor_to(split / quantity, currency);
        let line_price = unit_price * quantity;
        targets.push(AllocationTarget {
            weight: quantity,
            capacity: split,
            unit_price,
            line_price,
            remainder: split - line_price,
            can_absorb_odd: false,
        });
    }

    let total_remainder = sum(targets.iter().map(|t| t.remainder));
    let placed = redistribute("decompose", total_remainder, &targets, currency, |t| Slot::from(t))?;
    let holder = placed.last_recipient.or(splits.drift_absorber);

    let components = specs
        .iter()
        .zip(targets)
        .enumerate()
        .map(|(i, (spec, mut target))| {
            target.line_price += placed.grants[i];
            target.unit_price = floor_to(target.line_price / target.weight, currency);
            target.remainder = target.line_price - target.unit_price * target.weight;
            target.can_absorb_odd = holder == Some(i);
            Component {
                spec: spec.clone(),
                quantity: target.weight,
                target,
                discount_allocations: Vec::new(),
                tax_lines: Vec::new(),
            }
        })
        .collect();

    Ok(components)
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

    fn spec(title: &str, base_quantity: i64, catalog_price: &str) -> ComponentSpec {
        ComponentSpec {
            variant_id: None,
            product_id: None,
            title: title.to_string(),
            base_quantity: Decimal::from(base_quantity),
            catalog_price: d(catalog_price),
            taxable: true,
        }
    }

    fn line(quantity: i64, line_price: &str, composition: LineComposition) -> CompositeLine {
        CompositeLine::new(Decimal::from(quantity), d(line_price), composition)
    }

    fn vnd() -> Currency {
        Currency::new("VND", 0)
    }

    fn usd() -> Currency {
        Currency::new("USD", 2)
    }

    #[test]
    fn test_packsize_absorbs_remainder() {
        let l = line(2, "100000", LineComposition::Packsize(spec("Water", 3, "0")));
        let components = decompose(&l, &vnd()).unwrap();

        assert_eq!(components.len(), 1);
        let c = &components[0];
        assert_eq!(c.quantity, d("6"));
        assert_eq!(c.target.unit_price, d("16666"));
        assert_eq!(c.target.line_price, d("100000"));
        assert_eq!(c.target.remainder, d("4"));
        assert!(c.target.can_absorb_odd);
    }

    #[test]
    fn test_packsize_even_split() {
        let l = line(1, "12.00", LineComposition::Packsize(spec("Soda", 6, "0")));
        let components = decompose(&l, &usd()).unwrap();
        assert_eq!(components[0].target.unit_price, d("2"));
        assert_eq!(components[0].target.remainder, Decimal::ZERO);
    }

    #[test]
    fn test_combo_last_positive_closes_drift() {
        let l = line(
            1,
            "99999",
            LineComposition::Combo(vec![spec("Coffee", 1, "30"), spec("Bread", 1, "70")]),
        );
        let components = decompose(&l, &vnd()).unwrap();

        assert_eq!(components[0].target.line_price, d("30000"));
        assert_eq!(components[1].target.line_price, d("69999"));
        assert_eq!(components[0].target.line_price + components[1].target.line_price, d("99999"));
    }

    #[test]
    fn test_combo_remainder_marks_receiving_component() {
        let l = line(
            2,
            "99999",
            LineComposition::Combo(vec![spec("Coffee", 1, "30"), spec("Bread", 1, "70")]),
        );
        let components = decompose(&l, &vnd()).unwrap();

        assert_eq!(components[0].target.unit_price, d("15000"));
        assert_eq!(components[0].target.line_price, d("30000"));
        assert_eq!(components[1].target.unit_price, d("34999"));
        assert_eq!(components[1].target.line_price, d("69999"));
        assert_eq!(components[1].target.remainder, d("1"));
        assert!(!components[0].target.can_absorb_odd);
        assert!(components[1].target.can_absorb_odd);
    }

    #[test]
    fn test_combo_zero_price_components_get_nothing() {
        let l = line(
            1,
            "10.00",
            LineComposition::Combo(vec![
                spec("Burger", 1, "6"),
                spec("Napkin", 2, "0"),
                spec("Fries", 1, "3"),
            ]),
        );
        let components = decompose(&l, &usd()).unwrap();

        assert_eq!(components[0].target.line_price, d("6.67"));
        assert_eq!(components[1].target.line_price, Decimal::ZERO);
        assert_eq!(components[2].target.line_price, d("3.33"));
        let total: Decimal = components.iter().map(|c| c.target.line_price).sum();
        assert_eq!(total, d("10.00"));
    }

    #[test]
    fn test_all_zero_price_combo_splits_by_quantity() {
        let l = line(
            1,
            "10.00",
            LineComposition::Combo(vec![spec("A", 1, "0"), spec("B", 2, "0")]),
        );
        let components = decompose(&l, &usd()).unwrap();

        // Split 3.33 / 6.67; B cannot keep a whole unit price at 6.67 over 2 units,
        // so its odd cent moves to A, where one step is a single cent.
        assert_eq!(components[0].target.line_price, d("3.34"));
        assert_eq!(components[0].target.unit_price, d("3.34"));
        assert_eq!(components[1].target.line_price, d("6.66"));
        assert_eq!(components[1].target.unit_price, d("3.33"));
        assert!(components[0].target.can_absorb_odd);
    }

    #[test]
    fn test_half_up_clamp_never_goes_negative() {
        // Three 2/3 shares round up to 1 each; the clamp keeps the tail at zero.
        let l = line(
            1,
            "2",
            LineComposition::Combo(vec![
                spec("A", 1, "1"),
                spec("B", 1, "1"),
                spec("C", 1, "1"),
                spec("D", 1, "0.0001"),
            ]),
        );
        let components = decompose(&l, &vnd()).unwrap();
        assert!(components.iter().all(|c| c.target.line_price >= Decimal::ZERO));
        assert_eq!(l.line_price, components.iter().map(|c| c.target.line_price).sum::<Decimal>());
    }

    #[test]
    fn test_empty_combo_and_normal_lines() {
        let empty = line(1, "10", LineComposition::Combo(vec![]));
        assert!(decompose(&empty, &vnd()).unwrap().is_empty());

        let normal = line(1, "10", LineComposition::Normal);
        assert!(decompose(&normal, &vnd()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_quantities() {
        let zero_qty = line(0, "10", LineComposition::Packsize(spec("X", 2, "0")));
        assert!(matches!(
            decompose(&zero_qty, &vnd()),
            Err(CoreError::InvalidComposite { .. })
        ));

        let zero_base = line(1, "10", LineComposition::Combo(vec![spec("X", 0, "1")]));
        assert!(matches!(
            decompose(&zero_base, &vnd()),
            Err(CoreError::InvalidComposite { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn combo_strategy() -> impl Strategy<Value = (Vec<(i64, i64)>, i64, i64, u32)> {
        (
            // (catalog price in minor units, base quantity); price 0 allowed
            prop::collection::vec((0i64..50_000, 1i64..12), 1..8),
            0i64..10_000_000,
            1i64..20,
            0u32..3,
        )
    }

    fn build(
        parts: &[(i64, i64)],
        digits: u32,
        quantity: i64,
        line_price: i64,
    ) -> (CompositeLine, Currency) {
        let specs = parts
            .iter()
            .enumerate()
            .map(|(i, &(price, base))| ComponentSpec {
                variant_id: Some(i as u64),
                product_id: None,
                title: format!("part-{i}"),
                base_quantity: Decimal::from(base),
                catalog_price: Decimal::new(price, digits),
                taxable: true,
            })
            .collect();
        let line = CompositeLine::new(
            Decimal::from(quantity),
            Decimal::new(line_price, digits),
            LineComposition::Combo(specs),
        );
        (line, Currency::new("TST", digits))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1_200))]

        #[test]
        fn prop_components_sum_to_line_price((parts, line_price, quantity, digits) in combo_strategy()) {
            let (line, currency) = build(&parts, digits, quantity, line_price);
            let components = decompose(&line, &currency).unwrap();

            let total: Decimal = components.iter().map(|c| c.target.line_price).sum();
            prop_assert_eq!(total, line.line_price);
            prop_assert_eq!(components.iter().filter(|c| c.target.can_absorb_odd).count(), 1);
            for c in &components {
                prop_assert!(c.target.line_price >= Decimal::ZERO);
                prop_assert!(c.target.remainder >= Decimal::ZERO);
                prop_assert_eq!(c.target.unit_price * c.quantity + c.target.remainder, c.target.line_price);
            }
        }

        #[test]
        fn prop_packsize_sum_to_line_price(
            line_price in 0i64..10_000_000,
            base in 1i64..48,
            quantity in 1i64..50,
            digits in 0u32..3,
        ) {
            let currency = Currency::new("TST", digits);
            let spec = ComponentSpec {
                variant_id: None,
                product_id: None,
                title: "case".to_string(),
                base_quantity: Decimal::from(base),
                catalog_price: Decimal::ZERO,
                taxable: true,
            };
            let line = CompositeLine::new(
                Decimal::from(quantity),
                Decimal::new(line_price, digits),
                LineComposition::Packsize(spec),
            );
            let components = decompose(&line, &currency).unwrap();
            prop_assert_eq!(components.len(), 1);
            prop_assert_eq!(components[0].target.line_price, line.line_price);
        }

        #[test]
        fn prop_decomposition_is_idempotent((parts, line_price, quantity, digits) in combo_strategy()) {
            let (line, currency) = build(&parts, digits, quantity, line_price);
            let first = decompose(&line, &currency).unwrap();

            // Re-split the total that was just split.
            let mut again = line.clone();
            again.line_price = first.iter().map(|c| c.target.line_price).sum();
            let second = decompose(&again, &currency).unwrap();

            prop_assert_eq!(first, second);
        }
    }
}
