//! # Cart Model
//!
//! The validated input to checkout: a list of lines with product data
//! snapshotted at add time. The cart is a plain value handed to the
//! checkout service; the engine holds no cart state between calls.
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product increases
//!   quantity)
//! - Quantity per line is 1..=MAX_LINE_QUANTITY
//! - At most MAX_CART_LINES lines

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationResult};
use crate::money::Money;
use crate::totals::{line_totals, order_totals, Discount, LineTotals, OrderTotals};
use crate::types::{Product, TaxRate};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// One line in a cart.
///
/// ## Price Freezing
/// Price and tax rate are captured when the product is added. If the
/// product changes in the database afterwards, this line keeps the
/// original figures, and they are the ones copied onto the sale item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID).
    pub product_id: String,

    /// SKU at time of adding (frozen).
    pub sku: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Tax rate in basis points at time of adding (frozen).
    pub tax_rate_bps: u32,

    /// Quantity in cart.
    pub quantity: i64,

    /// Per-line discount.
    pub discount: Discount,
}

impl CartLine {
    /// Creates a cart line from a product snapshot and quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            tax_rate_bps: product.tax_rate_bps,
            quantity,
            discount: Discount::None,
        }
    }

    /// Computes this line's totals.
    pub fn totals(&self) -> ValidationResult<LineTotals> {
        line_totals(
            self.quantity,
            Money::from_cents(self.unit_price_cents),
            self.discount,
            TaxRate::from_bps(self.tax_rate_bps),
        )
    }
}

/// The cart handed to checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product or increases quantity if it is already in the cart.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.id)
        {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Updates a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(product_id);
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::LineNotFound {
                product_id: product_id.to_string(),
            }),
        }
    }

    /// Applies a discount to an existing line.
    pub fn set_discount(&mut self, product_id: &str, discount: Discount) -> CoreResult<()> {
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.discount = discount;
                Ok(())
            }
            None => Err(CoreError::LineNotFound {
                product_id: product_id.to_string(),
            }),
        }
    }

    /// Removes a line by product ID.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(CoreError::LineNotFound {
                product_id: product_id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of unique lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Per-line totals in cart order.
    pub fn line_totals(&self) -> ValidationResult<Vec<LineTotals>> {
        self.lines.iter().map(|l| l.totals()).collect()
    }

    /// Aggregated order totals.
    pub fn totals(&self) -> ValidationResult<OrderTotals> {
        Ok(order_totals(&self.line_totals()?))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxType;
    use chrono::Utc;

    fn test_product(id: &str, price_cents: i64, tax_rate_bps: u32) -> Product {
        Product {
            id: id.to_string(),
            business_id: crate::DEFAULT_BUSINESS_ID.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            description: None,
            price_cents,
            cost_cents: None,
            tax_rate_bps,
            tax_type: TaxType::SalesTax,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_product() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 999, 0), 2).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.totals().unwrap().subtotal_cents, 1998);
    }

    #[test]
    fn test_add_same_product_merges() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 0);

        cart.add_product(&product, 2).unwrap();
        cart.add_product(&product, 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_discounted_line_totals() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 1000, 800), 3).unwrap();
        cart.set_discount("1", Discount::Percent(1000)).unwrap();

        let totals = cart.totals().unwrap();
        assert_eq!(totals.subtotal_cents, 3000);
        assert_eq!(totals.discount_cents, 300);
        assert_eq!(totals.tax_cents, 216);
        assert_eq!(totals.total_cents, 2916);
    }

    #[test]
    fn test_quantity_cap() {
        let mut cart = Cart::new();
        let product = test_product("1", 100, 0);

        assert!(cart.add_product(&product, MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            cart.add_product(&product, 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_unknown_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.remove_line("nope"),
            Err(CoreError::LineNotFound { .. })
        ));
        assert!(matches!(
            cart.update_quantity("nope", 2),
            Err(CoreError::LineNotFound { .. })
        ));
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_product(&test_product("1", 999, 0), 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.totals().unwrap().total_cents, 0);
    }
}
