//! # Receipt View
//!
//! The ephemeral summary returned by checkout for display/printing. Never
//! persisted; callers hold it client-side. All figures are copied from
//! the committed sale and items.

use serde::{Deserialize, Serialize};

use vela_core::{PaymentMethod, PaymentStatus, Sale, SaleItem, SaleStatus, SaleType};

/// One printed line on the receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub line_total_cents: i64,
}

impl From<&SaleItem> for ReceiptLine {
    fn from(item: &SaleItem) -> Self {
        ReceiptLine {
            sku: item.sku_snapshot.clone(),
            name: item.name_snapshot.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            discount_cents: item.discount_cents,
            tax_cents: item.tax_cents,
            line_total_cents: item.line_total_cents,
        }
    }
}

/// The receipt/summary view returned by checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub sale_id: String,
    pub receipt_number: String,
    pub business_id: String,
    pub sale_type: SaleType,
    pub sale_status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub customer_id: Option<String>,
    pub table_id: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub created_at: String,
}

impl Receipt {
    /// Builds the view from a committed sale and its items.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let receipt = Receipt::from_sale(&sale, &items);
    /// let json = serde_json::to_string(&receipt)?; // hand to any binding
    /// ```
    pub fn from_sale(sale: &Sale, items: &[SaleItem]) -> Self {
        Receipt {
            sale_id: sale.id.clone(),
            receipt_number: sale.receipt_number.clone(),
            business_id: sale.business_id.clone(),
            sale_type: sale.sale_type,
            sale_status: sale.sale_status,
            payment_method: sale.payment_method,
            payment_status: sale.payment_status,
            customer_id: sale.customer_id.clone(),
            table_id: sale.table_id.clone(),
            lines: items.iter().map(ReceiptLine::from).collect(),
            subtotal_cents: sale.subtotal_cents,
            discount_cents: sale.discount_cents,
            tax_cents: sale.tax_cents,
            total_cents: sale.total_cents,
            created_at: sale.created_at.to_rfc3339(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
