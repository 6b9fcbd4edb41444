//! # Line and Order Totals
//!
//! The pure money calculator: turns (quantity, unit price, discount, tax
//! rate) into line totals, and sums lines into order totals. No state, no
//! I/O, deterministic.
//!
//! ## Calculation Rule
//! ```text
//! subtotal   = quantity x unit_price
//! discount   = subtotal x pct / 100     (percent discount)
//!            | given amount             (absolute discount)
//! taxable    = subtotal - discount
//! tax        = taxable x rate / 100
//! line_total = taxable + tax
//! ```
//! Percent takes precedence when both forms could apply. All intermediate
//! values are integer cents; the two percentage applications round
//! half-up once each.

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::TaxRate;

// =============================================================================
// Discount
// =============================================================================

/// A per-line discount. Percent and absolute amounts are mutually
/// exclusive; percent wins when both could apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// Percentage discount in basis points (1000 = 10%).
    Percent(u32),
    /// Absolute discount in cents.
    Amount(i64),
}

impl Discount {
    /// The basis points recorded on the sale item (0 unless percent).
    pub const fn percent_bps(&self) -> u32 {
        match self {
            Discount::Percent(bps) => *bps,
            _ => 0,
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Computed totals for a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub line_total_cents: i64,
}

/// Aggregated totals over all lines of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// Computes totals for one line item.
///
/// Negative quantities, prices and discounts are rejected, never silently
/// negated. An absolute discount larger than the line subtotal is
/// rejected as well (a line cannot go negative before tax).
///
/// ## Example
/// ```rust
/// use vela_core::money::Money;
/// use vela_core::totals::{line_totals, Discount};
/// use vela_core::types::TaxRate;
///
/// // 3 x $10.00, 10% discount, 8% tax
/// let line = line_totals(
///     3,
///     Money::from_cents(1000),
///     Discount::Percent(1000),
///     TaxRate::from_bps(800),
/// )
/// .unwrap();
///
/// assert_eq!(line.discount_cents, 300);  // $3.00
/// assert_eq!(line.tax_cents, 216);       // 8% of $27.00
/// assert_eq!(line.line_total_cents, 2916);
/// ```
pub fn line_totals(
    quantity: i64,
    unit_price: Money,
    discount: Discount,
    tax_rate: TaxRate,
) -> ValidationResult<LineTotals> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if unit_price.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "unit_price".to_string(),
        });
    }
    if tax_rate.bps() > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    let subtotal = unit_price.multiply_quantity(quantity);

    let discount_amount = match discount {
        Discount::None => Money::zero(),
        Discount::Percent(bps) => {
            if bps > 10000 {
                return Err(ValidationError::OutOfRange {
                    field: "discount_percent".to_string(),
                    min: 0,
                    max: 10000,
                });
            }
            subtotal.portion_bps(bps)
        }
        Discount::Amount(cents) => {
            if cents < 0 {
                return Err(ValidationError::MustBeNonNegative {
                    field: "discount_amount".to_string(),
                });
            }
            if cents > subtotal.cents() {
                return Err(ValidationError::OutOfRange {
                    field: "discount_amount".to_string(),
                    min: 0,
                    max: subtotal.cents(),
                });
            }
            Money::from_cents(cents)
        }
    };

    let taxable = subtotal - discount_amount;
    let tax = taxable.calculate_tax(tax_rate);
    let line_total = taxable + tax;

    Ok(LineTotals {
        subtotal_cents: subtotal.cents(),
        discount_cents: discount_amount.cents(),
        tax_cents: tax.cents(),
        line_total_cents: line_total.cents(),
    })
}

/// Sums line totals into order totals. An empty slice yields all zeros.
pub fn order_totals(lines: &[LineTotals]) -> OrderTotals {
    lines.iter().fold(OrderTotals::default(), |acc, line| {
        OrderTotals {
            subtotal_cents: acc.subtotal_cents + line.subtotal_cents,
            discount_cents: acc.discount_cents + line.discount_cents,
            tax_cents: acc.tax_cents + line.tax_cents,
            total_cents: acc.total_cents + line.line_total_cents,
        }
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
