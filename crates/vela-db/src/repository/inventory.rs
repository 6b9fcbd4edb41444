//! # Inventory Repository
//!
//! The inventory ledger: an append-only movement log plus one balance row
//! per (business, product).
//!
//! ## Consistency Rules
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Every stock change is TWO writes in ONE database transaction:       │
//! │                                                                      │
//! │  1. INSERT INTO inventory_transactions (append-only audit row)       │
//! │  2. UPDATE inventory_records                                         │
//! │         SET quantity_on_hand = quantity_on_hand + delta              │
//! │                                                                      │
//! │  The relative UPDATE (never an absolute assignment) is what makes    │
//! │  concurrent movements safe: the database serializes the read-        │
//! │  modify-write per row, so no decrement is ever lost.                 │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger does not block movements that drive on-hand negative;
//! negative stock is surfaced to callers as an availability signal.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vela_core::{InventoryRecord, InventoryTransaction};

const RECORD_COLUMNS: &str = "\
    business_id, product_id, quantity_on_hand, quantity_reserved, \
    reorder_level, updated_at";

const MOVEMENT_COLUMNS: &str = "\
    id, business_id, product_id, movement_type, quantity, \
    created_by, notes, created_at";

/// Repository for inventory balances and the movement log.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets the balance row for a product, if any movement or explicit
    /// creation has happened yet.
    pub async fn get_record(
        &self,
        business_id: &str,
        product_id: &str,
    ) -> DbResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM inventory_records \
             WHERE business_id = ?1 AND product_id = ?2"
        ))
        .bind(business_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Sets the reorder level used for the low-stock signal.
    pub async fn set_reorder_level(
        &self,
        business_id: &str,
        product_id: &str,
        reorder_level: i64,
    ) -> DbResult<()> {
        let now = chrono::Utc::now();

        // Create the row first so a reorder level can be set before the
        // first movement.
        sqlx::query(
            "INSERT OR IGNORE INTO inventory_records \
             (business_id, product_id, quantity_on_hand, quantity_reserved, reorder_level, updated_at) \
             VALUES (?1, ?2, 0, 0, 0, ?3)",
        )
        .bind(business_id)
        .bind(product_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let result = sqlx::query(
            "UPDATE inventory_records SET reorder_level = ?3, updated_at = ?4 \
             WHERE business_id = ?1 AND product_id = ?2",
        )
        .bind(business_id)
        .bind(product_id)
        .bind(reorder_level)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("InventoryRecord", product_id));
        }

        Ok(())
    }

    /// Records one stock movement: appends the audit row and applies its
    /// signed delta to the balance, atomically.
    ///
    /// The balance row is created with on-hand 0 on the first movement for
    /// a product.
    pub async fn record_movement(&self, movement: &InventoryTransaction) -> DbResult<()> {
        debug!(
            product_id = %movement.product_id,
            movement_type = ?movement.movement_type,
            quantity = movement.quantity,
            "Recording inventory movement"
        );

        let mut tx = self.pool.begin().await?;
        apply_movement(&mut tx, movement).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Lists the most recent movements for a product, newest first.
    pub async fn list_movements(
        &self,
        business_id: &str,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<InventoryTransaction>> {
        let movements = sqlx::query_as::<_, InventoryTransaction>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory_transactions \
             WHERE business_id = ?1 AND product_id = ?2 \
             ORDER BY created_at DESC, id DESC LIMIT ?3"
        ))
        .bind(business_id)
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

/// Applies one movement inside a caller-owned transaction.
///
/// Used by [`InventoryRepository::record_movement`] and by the sale
/// repository so checkout can commit sale, items and stock debits as one
/// unit.
pub(crate) async fn apply_movement(
    conn: &mut SqliteConnection,
    movement: &InventoryTransaction,
) -> DbResult<()> {
    // Balance row exists before the first delta is applied.
    sqlx::query(
        "INSERT OR IGNORE INTO inventory_records \
         (business_id, product_id, quantity_on_hand, quantity_reserved, reorder_level, updated_at) \
         VALUES (?1, ?2, 0, 0, 0, ?3)",
    )
    .bind(&movement.business_id)
    .bind(&movement.product_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO inventory_transactions (
            id, business_id, product_id, movement_type, quantity,
            created_by, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.business_id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(&movement.created_by)
    .bind(&movement.notes)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    // Relative update: the database serializes concurrent increments on
    // the row, so no movement is ever lost.
    sqlx::query(
        "UPDATE inventory_records \
         SET quantity_on_hand = quantity_on_hand + ?3, updated_at = ?4 \
         WHERE business_id = ?1 AND product_id = ?2",
    )
    .bind(&movement.business_id)
    .bind(&movement.product_id)
    .bind(movement.signed_delta())
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Helper to generate a new movement ID.
pub fn generate_movement_id() -> String {
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
    use tokio::task::JoinSet;
    use vela_core::{Product, StockMovementType, TaxType, DEFAULT_BUSINESS_ID};

    async fn seeded_db() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            business_id: DEFAULT_BUSINESS_ID.to_string(),
            sku: "TEST-1".to_string(),
            name: "Test Product".to_string(),
            description: None,
            price_cents: 1000,
            cost_cents: None,
            tax_rate_bps: 0,
            tax_type: TaxType::None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();

        (db, product.id)
    }

    fn movement(
        product_id: &str,
        movement_type: StockMovementType,
        quantity: i64,
    ) -> InventoryTransaction {
        InventoryTransaction {
            id: generate_movement_id(),
            business_id: DEFAULT_BUSINESS_ID.to_string(),
            product_id: product_id.to_string(),
            movement_type,
            quantity,
            created_by: "staff-1".to_string(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_first_movement_creates_record() {
        let (db, product_id) = seeded_db().await;
        let repo = db.inventory();

        assert!(repo
            .get_record(DEFAULT_BUSINESS_ID, &product_id)
            .await
            .unwrap()
            .is_none());

        repo.record_movement(&movement(&product_id, StockMovementType::Receiving, 10))
            .await
            .unwrap();

        let record = repo
            .get_record(DEFAULT_BUSINESS_ID, &product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, 10);
    }

    #[tokio::test]
    async fn test_replay_equals_signed_sum() {
        let (db, product_id) = seeded_db().await;
        let repo = db.inventory();

        let moves = [
            (StockMovementType::Receiving, 50),
            (StockMovementType::Sale, 12),
            (StockMovementType::Adjustment, 3),
            (StockMovementType::Damage, 2),
            (StockMovementType::Return, 1),
            (StockMovementType::Sale, 7),
        ];

        let mut expected = 0i64;
        for (movement_type, quantity) in moves {
            repo.record_movement(&movement(&product_id, movement_type, quantity))
                .await
                .unwrap();
            expected += movement_type.sign() * quantity;
        }

        let record = repo
            .get_record(DEFAULT_BUSINESS_ID, &product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, expected);

        let log = repo
            .list_movements(DEFAULT_BUSINESS_ID, &product_id, 100)
            .await
            .unwrap();
        assert_eq!(log.len(), moves.len());
        let replayed: i64 = log.iter().map(|m| m.signed_delta()).sum();
        assert_eq!(replayed, expected);
    }

    #[tokio::test]
    async fn test_negative_stock_is_not_blocked() {
        let (db, product_id) = seeded_db().await;
        let repo = db.inventory();

        repo.record_movement(&movement(&product_id, StockMovementType::Sale, 5))
            .await
            .unwrap();

        let record = repo
            .get_record(DEFAULT_BUSINESS_ID, &product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, -5);
        assert_eq!(
            record.stock_level().status,
            vela_core::StockStatus::OutOfStock
        );
    }

    #[tokio::test]
    async fn test_unknown_product_rejected_by_foreign_key() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();

        let err = repo
            .record_movement(&movement("no-such-product", StockMovementType::Receiving, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        // Nothing was partially applied.
        assert!(repo
            .get_record(DEFAULT_BUSINESS_ID, "no-such-product")
            .await
            .unwrap()
            .map_or(true, |r| r.quantity_on_hand == 0));
        assert!(repo
            .list_movements(DEFAULT_BUSINESS_ID, "no-such-product", 10)
            .await
            .unwrap()
            .is_empty());
    }

    /// N concurrent single-unit sales starting from on-hand = N must end
    /// at exactly zero: the relative update loses no decrements.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_decrements_lose_no_updates() {
        const N: i64 = 20;

        let (db, product_id) = seeded_db().await;
        let repo = db.inventory();

        repo.record_movement(&movement(&product_id, StockMovementType::Receiving, N))
            .await
            .unwrap();

        let mut tasks = JoinSet::new();
        for _ in 0..N {
            let repo = db.inventory();
            let product_id = product_id.clone();
            tasks.spawn(async move {
                repo.record_movement(&movement(&product_id, StockMovementType::Sale, 1))
                    .await
            });
        }

        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        let record = repo
            .get_record(DEFAULT_BUSINESS_ID, &product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, 0);
    }
}
