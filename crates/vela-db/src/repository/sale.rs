//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Write Ordering
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  One checkout = one database transaction:                            │
//! │                                                                      │
//! │     1. INSERT sale                                                   │
//! │     2. INSERT sale_items (each references the sale id)               │
//! │     3. apply inventory movements (retail: one 'sale' per line)       │
//! │     COMMIT                                                           │
//! │                                                                      │
//! │  A crash mid-sequence rolls everything back: no sale without its     │
//! │  items, no items without their stock debit.                          │
//! │                                                                      │
//! │  Status flips use guarded updates (WHERE sale_status = 'pending')    │
//! │  so a lost race surfaces as zero rows affected, never as a           │
//! │  double-transition.                                                  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::apply_movement;
use vela_core::{InventoryTransaction, Sale, SaleItem};

const SALE_COLUMNS: &str = "\
    id, business_id, receipt_number, customer_id, sale_type, table_id, \
    subtotal_cents, discount_cents, tax_cents, total_cents, \
    payment_method, payment_status, sale_status, \
    created_by, notes, created_at, updated_at, completed_at";

const SALE_ITEM_COLUMNS: &str = "\
    id, sale_id, product_id, sku_snapshot, name_snapshot, quantity, \
    unit_price_cents, tax_rate_bps, discount_bps, discount_cents, \
    tax_cents, line_total_cents, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Persists a sale, its items and any inventory movements as one
    /// database transaction.
    pub async fn insert_sale_with_items(
        &self,
        sale: &Sale,
        items: &[SaleItem],
        movements: &[InventoryTransaction],
    ) -> DbResult<()> {
        debug!(
            id = %sale.id,
            receipt_number = %sale.receipt_number,
            items = items.len(),
            movements = movements.len(),
            "Inserting sale"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, business_id, receipt_number, customer_id, sale_type, table_id,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                payment_method, payment_status, sale_status,
                created_by, notes, created_at, updated_at, completed_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.business_id)
        .bind(&sale.receipt_number)
        .bind(&sale.customer_id)
        .bind(sale.sale_type)
        .bind(&sale.table_id)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.payment_status)
        .bind(sale.sale_status)
        .bind(&sale.created_by)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.completed_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, sku_snapshot, name_snapshot, quantity,
                    unit_price_cents, tax_rate_bps, discount_bps, discount_cents,
                    tax_cents, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.sku_snapshot)
            .bind(&item.name_snapshot)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.tax_rate_bps)
            .bind(item.discount_bps)
            .bind(item.discount_cents)
            .bind(item.tax_cents)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        for movement in movements {
            apply_movement(&mut tx, movement).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items \
             WHERE sale_id = ?1 ORDER BY created_at, id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Completes a pending sale, posting any completion-time inventory
    /// movements in the same transaction.
    ///
    /// The guarded update means a sale that is no longer pending leaves
    /// zero rows affected; the whole transaction rolls back and nothing
    /// moves.
    pub async fn complete_pending(
        &self,
        sale_id: &str,
        movements: &[InventoryTransaction],
    ) -> DbResult<()> {
        let now = chrono::Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                sale_status = 'completed',
                payment_status = 'completed',
                completed_at = ?2,
                updated_at = ?2
            WHERE id = ?1 AND sale_status = 'pending'
            "#,
        )
        .bind(sale_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (pending)", sale_id));
        }

        for movement in movements {
            apply_movement(&mut tx, movement).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Cancels a pending sale. Totals stay untouched as historical record;
    /// no inventory moves.
    pub async fn cancel_pending(&self, sale_id: &str) -> DbResult<()> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                sale_status = 'cancelled',
                updated_at = ?2
            WHERE id = ?1 AND sale_status = 'pending'
            "#,
        )
        .bind(sale_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (pending)", sale_id));
        }

        Ok(())
    }

    /// Lists recent sales for a business, newest first.
    pub async fn list_recent(&self, business_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE business_id = ?1 ORDER BY created_at DESC LIMIT ?2"
        ))
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Reconciliation sweep: sales that have no line items.
    ///
    /// Cannot be produced by this repository's transactional writes, but a
    /// persistence layer without multi-statement transactions could leave
    /// them behind; operators review these instead of losing them.
    pub async fn find_sales_missing_items(&self, business_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales s \
             WHERE s.business_id = ?1 \
             AND NOT EXISTS (SELECT 1 FROM sale_items i WHERE i.sale_id = s.id) \
             ORDER BY s.created_at"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use chrono::Utc;
    use vela_core::{
        PaymentMethod, PaymentStatus, Product, SaleStatus, SaleType, StockMovementType, TaxType,
        DEFAULT_BUSINESS_ID,
    };

    async fn db_with_product() -> (Database, Product) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            business_id: DEFAULT_BUSINESS_ID.to_string(),
            sku: "BURGER-1".to_string(),
            name: "Beef Burger".to_string(),
            description: None,
            price_cents: 850,
            cost_cents: Some(400),
            tax_rate_bps: 0,
            tax_type: TaxType::None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

        (db, product)
    }

    fn sample_sale(status: SaleStatus) -> Sale {
        let now = Utc::now();
        Sale {
            id: generate_sale_id(),
            business_id: DEFAULT_BUSINESS_ID.to_string(),
            receipt_number: format!("R-{}", Uuid::new_v4()),
            customer_id: None,
            sale_type: SaleType::Retail,
            table_id: None,
            subtotal_cents: 1700,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 1700,
            payment_method: PaymentMethod::Cash,
            payment_status: match status {
                SaleStatus::Completed => PaymentStatus::Completed,
                _ => PaymentStatus::Pending,
            },
            sale_status: status,
            created_by: "staff-1".to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    fn sample_item(sale: &Sale, product: &Product, quantity: i64) -> SaleItem {
        SaleItem {
            id: generate_sale_item_id(),
            sale_id: sale.id.clone(),
            product_id: product.id.clone(),
            sku_snapshot: product.sku.clone(),
            name_snapshot: product.name.clone(),
            quantity,
            unit_price_cents: product.price_cents,
            tax_rate_bps: product.tax_rate_bps,
            discount_bps: 0,
            discount_cents: 0,
            tax_cents: 0,
            line_total_cents: product.price_cents * quantity,
            created_at: sale.created_at,
        }
    }

    fn sale_movement(sale: &Sale, product: &Product, quantity: i64) -> InventoryTransaction {
        InventoryTransaction {
            id: Uuid::new_v4().to_string(),
            business_id: sale.business_id.clone(),
            product_id: product.id.clone(),
            movement_type: StockMovementType::Sale,
            quantity,
            created_by: sale.created_by.clone(),
            notes: Some(format!("receipt {}", sale.receipt_number)),
            created_at: sale.created_at,
        }
    }

    #[tokio::test]
    async fn test_insert_sale_with_items_and_movements() {
        let (db, product) = db_with_product().await;
        let repo = db.sales();

        let sale = sample_sale(SaleStatus::Completed);
        let items = vec![sample_item(&sale, &product, 2)];
        let movements = vec![sale_movement(&sale, &product, 2)];

        repo.insert_sale_with_items(&sale, &items, &movements)
            .await
            .unwrap();

        let fetched = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.sale_status, SaleStatus::Completed);
        assert_eq!(fetched.total_cents, 1700);

        let fetched_items = repo.get_items(&sale.id).await.unwrap();
        assert_eq!(fetched_items.len(), 1);
        assert_eq!(fetched_items[0].quantity, 2);

        // The stock debit landed in the same commit.
        let record = db
            .inventory()
            .get_record(DEFAULT_BUSINESS_ID, &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, -2);
    }

    #[tokio::test]
    async fn test_duplicate_receipt_number_rejected() {
        let (db, product) = db_with_product().await;
        let repo = db.sales();

        let mut first = sample_sale(SaleStatus::Completed);
        first.receipt_number = "R-0001".to_string();
        let items = vec![sample_item(&first, &product, 1)];
        repo.insert_sale_with_items(&first, &items, &[])
            .await
            .unwrap();

        let mut second = sample_sale(SaleStatus::Completed);
        second.receipt_number = "R-0001".to_string();
        let items = vec![sample_item(&second, &product, 1)];
        let err = repo
            .insert_sale_with_items(&second, &items, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // The failed transaction left no orphaned items behind.
        assert!(repo.get_items(&second.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_pending_posts_movements() {
        let (db, product) = db_with_product().await;
        let repo = db.sales();

        let sale = sample_sale(SaleStatus::Pending);
        let items = vec![sample_item(&sale, &product, 3)];
        repo.insert_sale_with_items(&sale, &items, &[])
            .await
            .unwrap();

        let movements = vec![sale_movement(&sale, &product, 3)];
        repo.complete_pending(&sale.id, &movements).await.unwrap();

        let fetched = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.sale_status, SaleStatus::Completed);
        assert_eq!(fetched.payment_status, PaymentStatus::Completed);
        assert!(fetched.completed_at.is_some());

        let record = db
            .inventory()
            .get_record(DEFAULT_BUSINESS_ID, &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, -3);
    }

    #[tokio::test]
    async fn test_guarded_updates_refuse_non_pending() {
        let (db, product) = db_with_product().await;
        let repo = db.sales();

        let sale = sample_sale(SaleStatus::Pending);
        let items = vec![sample_item(&sale, &product, 1)];
        repo.insert_sale_with_items(&sale, &items, &[])
            .await
            .unwrap();

        repo.cancel_pending(&sale.id).await.unwrap();

        // Second transition attempts find no pending row.
        assert!(repo.cancel_pending(&sale.id).await.is_err());
        assert!(repo.complete_pending(&sale.id, &[]).await.is_err());

        let fetched = repo.get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.sale_status, SaleStatus::Cancelled);
        // Totals remain as historical record.
        assert_eq!(fetched.total_cents, 1700);
    }

    #[tokio::test]
    async fn test_find_sales_missing_items() {
        let (db, product) = db_with_product().await;
        let repo = db.sales();

        let orphan = sample_sale(SaleStatus::Pending);
        repo.insert_sale_with_items(&orphan, &[], &[])
            .await
            .unwrap();

        let healthy = sample_sale(SaleStatus::Completed);
        let items = vec![sample_item(&healthy, &product, 1)];
        repo.insert_sale_with_items(&healthy, &items, &[])
            .await
            .unwrap();

        let orphans = repo
            .find_sales_missing_items(DEFAULT_BUSINESS_ID)
            .await
            .unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, orphan.id);
    }
}
