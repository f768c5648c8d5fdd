//! # Tax Line Calculation
//!
//! Computes tax lines for lines and components, splits caller-supplied
//! (custom) tax lines across the components of a bundle, and merges sibling
//! tax lines back up to the parent line.
//!
//! ## Decision Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  exempt?  ── yes ──► no tax lines                                       │
//! │     │ no                                                                │
//! │  custom lines on parent? ── yes ──► split each by linePrice share       │
//! │     │ no                            (half-up, last component closes)    │
//! │  taxable? ── no ──► no tax lines                                        │
//! │     │ yes                                                               │
//! │  tax = subtotal × rate                                                  │
//! │  tax-inclusive? ── yes ──► tax = tax / (1 + rate)                       │
//! │  round half-up to currency scale                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Inclusive Example
//! A 110.00 subtotal at 10% with tax-inclusive pricing carries
//! `110.00 × 0.10 / 1.10 = 10.00` of tax; exclusive, it carries `11.00`.

use rust_decimal::Decimal;

use crate::money::{round_half_up, sum, Currency};
use crate::types::TaxLine;

/// The rate a target is taxed at, resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxRule {
    pub title: String,

    /// Product rate if one exists, else the country default.
    pub rate: Decimal,

    /// Prices already contain tax.
    pub tax_included: bool,

    /// The whole order is exempt.
    pub exempt: bool,
}

impl TaxRule {
    pub fn new(title: impl Into<String>, rate: Decimal, tax_included: bool) -> Self {
        TaxRule {
            title: title.into(),
            rate,
            tax_included,
            exempt: false,
        }
    }

    /// Returns a copy carrying a different rate.
    pub fn with_rate(&self, rate: Decimal) -> Self {
        TaxRule {
            rate,
            ..self.clone()
        }
    }
}

/// Tax charged on `subtotal` at `rate`, rounded half-up.
///
/// With tax-inclusive pricing the tax is backed out of the subtotal.
pub fn rate_tax(subtotal: Decimal, rate: Decimal, tax_included: bool, currency: &Currency) -> Decimal {
    let mut tax = subtotal * rate;
    if tax_included {
        tax /= Decimal::ONE + rate;
    }
    round_half_up(tax, currency)
}

/// Rate-derived tax lines for one target.
///
/// Returns nothing when the order is exempt or the target is not taxable.
pub fn compute_tax_lines(
    subtotal: Decimal,
    taxable: bool,
    rule: &TaxRule,
    currency: &Currency,
) -> Vec<TaxLine> {
    if rule.exempt || !taxable {
        return Vec::new();
    }
    let price = rate_tax(subtotal, rule.rate, rule.tax_included, currency);
    vec![TaxLine::new(rule.title.clone(), rule.rate, price)]
}

/// Splits one custom tax line across components by line-price share.
///
/// Every component but the last gets `round_half_up(price × linePrice / parentLinePrice)`,
/// clamped so the running total never passes `price`; the last takes what is left.
/// With a zero parent line price the whole tax lands on the last component.
pub fn split_custom_tax(
    tax_line: &TaxLine,
    component_line_prices: &[Decimal],
    parent_line_price: Decimal,
    currency: &Currency,
) -> Vec<TaxLine> {
    let Some(last) = component_line_prices.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut assigned = Decimal::ZERO;
    let mut shares = Vec::with_capacity(component_line_prices.len());

    for (i, line_price) in component_line_prices.iter().enumerate() {
        let share = if i == last {
            tax_line.price - assigned
        } else if parent_line_price.is_zero() {
            Decimal::ZERO
        } else {
            let exact = round_half_up(tax_line.price * *line_price / parent_line_price, currency);
            exact.min(tax_line.price - assigned).max(Decimal::ZERO)
        };
        assigned += share;
        shares.push(TaxLine {
            title: tax_line.title.clone(),
            rate: tax_line.rate,
            price: share,
            custom: true,
        });
    }

    shares
}

/// Splits every custom tax line of a parent; returns one list per component.
pub fn split_custom_taxes(
    tax_lines: &[TaxLine],
    component_line_prices: &[Decimal],
    parent_line_price: Decimal,
    currency: &Currency,
) -> Vec<Vec<TaxLine>> {
    let mut per_component = vec![Vec::with_capacity(tax_lines.len()); component_line_prices.len()];
    for tax_line in tax_lines {
        let shares = split_custom_tax(tax_line, component_line_prices, parent_line_price, currency);
        for (list, share) in per_component.iter_mut().zip(shares) {
            list.push(share);
        }
    }
    per_component
}

/// Folds tax lines sharing `(title, rate)` by summing their prices.
///
/// Keys keep the order in which they were first seen.
pub fn merge_tax_lines<I>(lines: I) -> Vec<TaxLine>
where
    I: IntoIterator<Item = TaxLine>,
{
    let mut merged: Vec<TaxLine> = Vec::new();
    for line in lines {
        match merged.iter_mut().find(|m| m.same_key(&line)) {
            Some(existing) => existing.price += line.price,
            None => merged.push(line),
        }
    }
    merged
}

/// Total tax across a list of lines.
pub fn total_tax(lines: &[TaxLine]) -> Decimal {
    sum(lines.iter().map(|t| t.price))
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

    fn usd() -> Currency {
        Currency::new("USD", 2)
    }

    #[test]
    fn test_rate_tax_exclusive_and_inclusive() {
        assert_eq!(rate_tax(d("110.00"), d("0.1"), false, &usd()), d("11"));
        assert_eq!(rate_tax(d("110.00"), d("0.1"), true, &usd()), d("10"));
        // 9.99 × 0.0825 = 0.824175
        assert_eq!(rate_tax(d("9.99"), d("0.0825"), false, &usd()), d("0.82"));
        // 0.125 rounds away from zero
        assert_eq!(rate_tax(d("1.25"), d("0.1"), false, &usd()), d("0.13"));
    }

    #[test]
    fn test_compute_tax_lines_respects_flags() {
        let rule = TaxRule::new("VAT", d("0.1"), false);
        let lines = compute_tax_lines(d("50"), true, &rule, &usd());
        assert_eq!(lines, vec![TaxLine::new("VAT", d("0.1"), d("5"))]);

        assert!(compute_tax_lines(d("50"), false, &rule, &usd()).is_empty());

        let exempt = TaxRule { exempt: true, ..rule };
        assert!(compute_tax_lines(d("50"), true, &exempt, &usd()).is_empty());
    }

    #[test]
    fn test_with_rate() {
        let rule = TaxRule::new("VAT", d("0.1"), true);
        let product = rule.with_rate(d("0.05"));
        assert_eq!(product.rate, d("0.05"));
        assert!(product.tax_included);
        assert_eq!(product.title, "VAT");
    }

    #[test]
    fn test_split_custom_tax_last_absorbs() {
        let tax = TaxLine::new("City", d("0.08"), d("1.00"));
        let shares = split_custom_tax(&tax, &[d("10"), d("10"), d("10")], d("30"), &usd());
        let prices: Vec<Decimal> = shares.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![d("0.33"), d("0.33"), d("0.34")]);
        assert!(shares.iter().all(|t| t.custom && t.title == "City"));
    }

    #[test]
    fn test_split_custom_tax_never_overshoots() {
        // four halves of a cent each round up; the running total is clamped
        let tax = TaxLine::new("City", d("0.08"), d("0.02"));
        let shares = split_custom_tax(&tax, &[d("1"), d("1"), d("1"), d("1")], d("4"), &usd());
        let prices: Vec<Decimal> = shares.iter().map(|t| t.price).collect();
        assert_eq!(prices, vec![d("0.01"), d("0.01"), d("0"), d("0")]);
    }

    #[test]
    fn test_split_custom_tax_zero_parent() {
        let tax = TaxLine::new("City", d("0.08"), d("0.50"));
        let shares = split_custom_tax(&tax, &[d("0"), d("0")], Decimal::ZERO, &usd());
        assert_eq!(shares[0].price, Decimal::ZERO);
        assert_eq!(shares[1].price, d("0.50"));

        assert!(split_custom_tax(&tax, &[], d("10"), &usd()).is_empty());
    }

    #[test]
    fn test_split_custom_taxes_per_component() {
        let taxes = [
            TaxLine::new("State", d("0.06"), d("0.60")),
            TaxLine::new("City", d("0.02"), d("0.20")),
        ];
        let lists = split_custom_taxes(&taxes, &[d("2.50"), d("7.50")], d("10.00"), &usd());
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0][0].price, d("0.15"));
        assert_eq!(lists[1][0].price, d("0.45"));
        assert_eq!(lists[0][1].price, d("0.05"));
        assert_eq!(lists[1][1].price, d("0.15"));
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let merged = merge_tax_lines(vec![
            TaxLine::new("VAT", d("0.1"), d("1")),
            TaxLine::new("Eco", d("0.01"), d("0.5")),
            TaxLine::new("VAT", d("0.10"), d("2")),
            TaxLine::new("VAT", d("0.05"), d("3")),
        ]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].title, "VAT");
        assert_eq!(merged[0].price, d("3"));
        assert_eq!(merged[1].title, "Eco");
        assert_eq!(merged[2].rate, d("0.05"));
        assert_eq!(total_tax(&merged), d("6.5"));
    }
}
