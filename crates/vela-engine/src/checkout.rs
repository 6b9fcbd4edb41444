//! # Checkout Orchestrator
//!
//! The single entry point that turns a validated cart + context into a
//! persisted sale.
//!
//! ## Algorithm
//! ```text
//! 1. Validate: non-empty cart, line figures, dine-in has an available table
//! 2. Resolve or create the customer (match by phone within the business)
//! 3. Compute totals (pure calculator)
//! 4. Generate a time-derived receipt number
//! 5. Persist sale -> items -> inventory movements  [ONE transaction]
//! 6. Dine-in: flip the table to occupied           [follow-up write]
//! 7. Return the ephemeral receipt view
//! ```
//!
//! Retail sales are created completed and debit stock in the same
//! transaction. Dine-in and takeaway orders are created pending with no
//! stock movement; the order lifecycle posts debits at completion.
//!
//! A failure before step 5 leaves nothing behind (a customer created in
//! step 2 is intentionally kept - it is a directory entry, not part of
//! the sale). A failure at step 6 surfaces as PartialCompletion: the
//! committed sale stands and the operator reconciles the table.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::identity::StaffContext;
use crate::receipt::Receipt;
use vela_core::{
    order_totals, validation, Cart, CoreError, Customer, InventoryTransaction, PaymentMethod,
    PaymentStatus, Sale, SaleItem, SaleStatus, SaleType, StockMovementType, TableStatus,
    ValidationError,
};
use vela_db::{Database, DbError};

/// Contact details supplied at checkout for resolve-or-create.
#[derive(Debug, Clone)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Per-checkout context beyond the cart itself.
#[derive(Debug, Clone)]
pub struct CheckoutContext {
    pub sale_type: SaleType,
    pub payment_method: PaymentMethod,
    /// Required for dine-in, ignored otherwise.
    pub table_id: Option<String>,
    /// Optional walk-in/guest checkout when absent.
    pub customer: Option<CustomerDetails>,
    pub notes: Option<String>,
}

/// The checkout service.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(db: Database) -> Self {
        CheckoutService { db }
    }

    /// Runs the full checkout sequence and returns the receipt view.
    pub async fn checkout(
        &self,
        staff: &StaffContext,
        cart: &Cart,
        context: CheckoutContext,
    ) -> EngineResult<Receipt> {
        debug!(
            business_id = %staff.business_id,
            sale_type = ?context.sale_type,
            lines = cart.line_count(),
            "checkout"
        );

        // Step 1: validation, before any write.
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        let line_totals = cart.line_totals().map_err(CoreError::Validation)?;

        let table_id = match context.sale_type {
            SaleType::DineIn => {
                let table_id = context
                    .table_id
                    .as_deref()
                    .ok_or(ValidationError::TableRequired)?;

                let table = self
                    .db
                    .tables()
                    .get_by_id(table_id)
                    .await?
                    .filter(|t| t.business_id == staff.business_id)
                    .ok_or_else(|| DbError::not_found("RestaurantTable", table_id))?;

                if !table.is_available() {
                    return Err(CoreError::invalid_transition(
                        "RestaurantTable",
                        table.id.clone(),
                        table.status.as_str(),
                        TableStatus::Occupied.as_str(),
                    )
                    .into());
                }
                Some(table.id)
            }
            SaleType::Retail | SaleType::Takeaway => None,
        };

        // Step 2: resolve or create the customer.
        let customer_id = match &context.customer {
            Some(details) => Some(self.resolve_customer(staff, details).await?),
            None => None,
        };

        // Step 3: totals.
        let totals = order_totals(&line_totals);

        // Step 4: receipt number. Collisions are caught by the unique
        // index, not deduplicated here.
        let receipt_number = generate_receipt_number();

        // Step 5: build and persist sale + items (+ retail stock debits)
        // as one transaction.
        let now = Utc::now();
        let settles_now = context.sale_type.settles_immediately();

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            business_id: staff.business_id.clone(),
            receipt_number,
            customer_id,
            sale_type: context.sale_type,
            table_id: table_id.clone(),
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            payment_method: context.payment_method,
            payment_status: if settles_now {
                PaymentStatus::Completed
            } else {
                PaymentStatus::Pending
            },
            sale_status: if settles_now {
                SaleStatus::Completed
            } else {
                SaleStatus::Pending
            },
            created_by: staff.staff_id.clone(),
            notes: context.notes.clone(),
            created_at: now,
            updated_at: now,
            completed_at: settles_now.then_some(now),
        };

        let items: Vec<SaleItem> = cart
            .lines
            .iter()
            .zip(line_totals.iter())
            .map(|(line, totals)| SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                sku_snapshot: line.sku.clone(),
                name_snapshot: line.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                tax_rate_bps: line.tax_rate_bps,
                discount_bps: line.discount.percent_bps(),
                discount_cents: totals.discount_cents,
                tax_cents: totals.tax_cents,
                line_total_cents: totals.line_total_cents,
                created_at: now,
            })
            .collect();

        let movements: Vec<InventoryTransaction> = if settles_now {
            items
                .iter()
                .map(|item| InventoryTransaction {
                    id: Uuid::new_v4().to_string(),
                    business_id: sale.business_id.clone(),
                    product_id: item.product_id.clone(),
                    movement_type: StockMovementType::Sale,
                    quantity: item.quantity,
                    created_by: staff.staff_id.clone(),
                    notes: Some(format!("receipt {}", sale.receipt_number)),
                    created_at: now,
                })
                .collect()
        } else {
            Vec::new()
        };

        self.db
            .sales()
            .insert_sale_with_items(&sale, &items, &movements)
            .await?;

        // Step 6: the table flip is a different aggregate and comes last
        // in the write order. The sale is already durable; a failure here
        // is partial completion, not loss.
        if let Some(table_id) = &table_id {
            if let Err(err) = self
                .db
                .tables()
                .update_status(table_id, TableStatus::Occupied, Some(TableStatus::Available))
                .await
            {
                return Err(EngineError::partial_completion(
                    "Sale",
                    sale.id.clone(),
                    "occupy_table",
                    err,
                ));
            }
        }

        info!(
            sale_id = %sale.id,
            receipt_number = %sale.receipt_number,
            total_cents = sale.total_cents,
            items = items.len(),
            "Sale created"
        );

        // Step 7: ephemeral receipt view.
        Ok(Receipt::from_sale(&sale, &items))
    }

    /// Matches a customer by phone within the business, creating one if
    /// no match exists.
    async fn resolve_customer(
        &self,
        staff: &StaffContext,
        details: &CustomerDetails,
    ) -> EngineResult<String> {
        validation::validate_name("customer_name", &details.name)?;
        validation::validate_phone(&details.phone)?;

        let customers = self.db.customers();

        if let Some(existing) = customers
            .find_by_phone(&staff.business_id, &details.phone)
            .await?
        {
            return Ok(existing.id);
        }

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            business_id: staff.business_id.clone(),
            name: details.name.trim().to_string(),
            phone: Some(details.phone.trim().to_string()),
            email: details.email.clone(),
            created_at: Utc::now(),
        };
        customers.insert(&customer).await?;

        debug!(customer_id = %customer.id, "Customer created at checkout");
        Ok(customer.id)
    }
}

/// Generates a receipt number in format `YYMMDD-HHMMSS-NNNN`.
///
/// Unique enough in practice for one business; the per-business unique
/// index is the backstop for the rare same-instant collision.
pub(crate) fn generate_receipt_number() -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("{}-{:04}", now.format("%y%m%d-%H%M%S"), nanos % 10000)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::identity::Role;
    use crate::testing::{fixture, staff};
    use vela_core::{Discount, StockStatus, DEFAULT_BUSINESS_ID};

    fn retail_context() -> CheckoutContext {
        CheckoutContext {
            sale_type: SaleType::Retail,
            payment_method: PaymentMethod::Cash,
            table_id: None,
            customer: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let fx = fixture().await;
        let service = CheckoutService::new(fx.db.clone());

        let err = service
            .checkout(&staff(Role::Cashier), &Cart::new(), retail_context())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
    }

    #[tokio::test]
    async fn test_retail_checkout_debits_stock() {
        let fx = fixture().await;
        let service = CheckoutService::new(fx.db.clone());

        // Product starts at on-hand 5.
        fx.receive_stock(&fx.product.id, 5).await;

        let mut cart = Cart::new();
        cart.add_product(&fx.product, 2).unwrap();

        let receipt = service
            .checkout(&staff(Role::Cashier), &cart, retail_context())
            .await
            .unwrap();

        assert_eq!(receipt.sale_status, SaleStatus::Completed);
        assert_eq!(receipt.payment_status, PaymentStatus::Completed);
        assert_eq!(receipt.lines.len(), 1);

        let record = fx
            .db
            .inventory()
            .get_record(DEFAULT_BUSINESS_ID, &fx.product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, 3);

        let movements = fx
            .db
            .inventory()
            .list_movements(DEFAULT_BUSINESS_ID, &fx.product.id, 10)
            .await
            .unwrap();
        let sales: Vec<_> = movements
            .iter()
            .filter(|m| m.movement_type == StockMovementType::Sale)
            .collect();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_receipt_totals_with_discount_and_tax() {
        let fx = fixture().await;
        let service = CheckoutService::new(fx.db.clone());

        // 3 x $10.00, 10% discount, 8% tax.
        let mut cart = Cart::new();
        cart.add_product(&fx.taxed_product, 3).unwrap();
        cart.set_discount(&fx.taxed_product.id, Discount::Percent(1000))
            .unwrap();

        let receipt = service
            .checkout(&staff(Role::Cashier), &cart, retail_context())
            .await
            .unwrap();

        assert_eq!(receipt.subtotal_cents, 3000);
        assert_eq!(receipt.discount_cents, 300);
        assert_eq!(receipt.tax_cents, 216);
        assert_eq!(receipt.total_cents, 2916);

        // Persisted figures match the receipt.
        let sale = fx
            .db
            .sales()
            .get_by_id(&receipt.sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sale.total_cents, 2916);
        let items = fx.db.sales().get_items(&receipt.sale_id).await.unwrap();
        assert_eq!(items[0].discount_bps, 1000);
        assert_eq!(items[0].line_total_cents, 2916);
    }

    #[tokio::test]
    async fn test_dine_in_requires_table() {
        let fx = fixture().await;
        let service = CheckoutService::new(fx.db.clone());

        let mut cart = Cart::new();
        cart.add_product(&fx.product, 1).unwrap();

        let context = CheckoutContext {
            sale_type: SaleType::DineIn,
            payment_method: PaymentMethod::Cash,
            table_id: None,
            customer: None,
            notes: None,
        };
        let err = service
            .checkout(&staff(Role::Cashier), &cart, context)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);
    }

    #[tokio::test]
    async fn test_dine_in_creates_pending_and_occupies_table() {
        let fx = fixture().await;
        let service = CheckoutService::new(fx.db.clone());

        fx.receive_stock(&fx.product.id, 5).await;

        let mut cart = Cart::new();
        cart.add_product(&fx.product, 1).unwrap();

        let context = CheckoutContext {
            sale_type: SaleType::DineIn,
            payment_method: PaymentMethod::Card,
            table_id: Some(fx.table.id.clone()),
            customer: None,
            notes: None,
        };
        let receipt = service
            .checkout(&staff(Role::Cashier), &cart, context)
            .await
            .unwrap();

        assert_eq!(receipt.sale_status, SaleStatus::Pending);
        assert_eq!(receipt.payment_status, PaymentStatus::Pending);

        // Table occupied, stock untouched.
        let table = fx.db.tables().get_by_id(&fx.table.id).await.unwrap().unwrap();
        assert_eq!(table.status, TableStatus::Occupied);

        let record = fx
            .db
            .inventory()
            .get_record(DEFAULT_BUSINESS_ID, &fx.product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, 5);
        assert_eq!(record.stock_level().status, StockStatus::InStock);
    }

    #[tokio::test]
    async fn test_occupied_table_rejected_before_any_write() {
        let fx = fixture().await;
        let service = CheckoutService::new(fx.db.clone());

        fx.db
            .tables()
            .update_status(&fx.table.id, TableStatus::Occupied, None)
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_product(&fx.product, 1).unwrap();

        let context = CheckoutContext {
            sale_type: SaleType::DineIn,
            payment_method: PaymentMethod::Cash,
            table_id: Some(fx.table.id.clone()),
            customer: None,
            notes: None,
        };
        let err = service
            .checkout(&staff(Role::Cashier), &cart, context)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidState);

        // No sale was written.
        assert!(fx
            .db
            .sales()
            .list_recent(DEFAULT_BUSINESS_ID, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_customer_resolved_by_phone() {
        let fx = fixture().await;
        let service = CheckoutService::new(fx.db.clone());

        let details = CustomerDetails {
            name: "Ayesha Khan".to_string(),
            phone: "+92 300 1234567".to_string(),
            email: None,
        };

        let mut cart = Cart::new();
        cart.add_product(&fx.product, 1).unwrap();
        let context = CheckoutContext {
            customer: Some(details.clone()),
            ..retail_context()
        };
        let first = service
            .checkout(&staff(Role::Cashier), &cart, context)
            .await
            .unwrap();

        // Second checkout with the same phone reuses the customer.
        let mut cart = Cart::new();
        cart.add_product(&fx.product, 1).unwrap();
        let context = CheckoutContext {
            customer: Some(details),
            ..retail_context()
        };
        let second = service
            .checkout(&staff(Role::Cashier), &cart, context)
            .await
            .unwrap();

        assert!(first.customer_id.is_some());
        assert_eq!(first.customer_id, second.customer_id);
    }
}
