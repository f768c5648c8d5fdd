//! Engine limits and defaults.

use apportion_core::{MAX_AMOUNT, MAX_COMPONENTS, MAX_ITEM_QUANTITY, MAX_LINE_ITEMS};
use rust_decimal::Decimal;

/// Knobs the host sets once and every request shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Currency used when the request names none.
    pub default_currency: String,

    /// Country used for tax resolution when the request names none.
    pub default_country: String,

    pub max_line_items: usize,
    pub max_quantity: Decimal,
    pub max_components: usize,

    /// Ceiling for every price, discount, tax and shipping amount, and for
    /// each resolved line price.
    pub max_amount: Decimal,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            default_currency: "USD".to_string(),
            default_country: "US".to_string(),
            max_line_items: MAX_LINE_ITEMS,
            max_quantity: Decimal::from(MAX_ITEM_QUANTITY),
            max_components: MAX_COMPONENTS,
            max_amount: Decimal::from(MAX_AMOUNT),
        }
    }
}
