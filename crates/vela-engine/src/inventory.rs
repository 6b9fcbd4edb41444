//! # Inventory Service
//!
//! The ledger API: record stock movements and read current stock. The
//! ledger is an audit/adjustment trail, not a reservation system - it
//! never blocks a movement that drives on-hand negative; availability is
//! surfaced as a status signal for callers to act on.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::identity::StaffContext;
use vela_core::{CoreError, InventoryTransaction, StockLevel, StockMovementType};
use vela_db::Database;

/// The inventory ledger service.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
}

impl InventoryService {
    /// Creates a new InventoryService.
    pub fn new(db: Database) -> Self {
        InventoryService { db }
    }

    /// Records one stock movement and applies it to the balance.
    ///
    /// Quantity is a magnitude: it must be strictly positive, and the
    /// direction comes from the movement type alone. A movement against a
    /// product that does not exist in the caller's business is an invalid
    /// transaction; nothing is partially applied.
    pub async fn adjust_stock(
        &self,
        staff: &StaffContext,
        product_id: &str,
        movement_type: StockMovementType,
        quantity: i64,
        notes: Option<String>,
    ) -> EngineResult<InventoryTransaction> {
        debug!(
            product_id = %product_id,
            movement_type = ?movement_type,
            quantity,
            "adjust_stock"
        );

        if quantity <= 0 {
            return Err(CoreError::invalid_transaction("quantity must be positive").into());
        }

        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .filter(|p| p.business_id == staff.business_id);
        if product.is_none() {
            return Err(CoreError::invalid_transaction(format!(
                "product {} does not exist in this business",
                product_id
            ))
            .into());
        }

        let movement = InventoryTransaction {
            id: Uuid::new_v4().to_string(),
            business_id: staff.business_id.clone(),
            product_id: product_id.to_string(),
            movement_type,
            quantity,
            created_by: staff.staff_id.clone(),
            notes,
            created_at: Utc::now(),
        };

        self.db.inventory().record_movement(&movement).await?;

        info!(
            movement_id = %movement.id,
            product_id = %product_id,
            delta = movement.signed_delta(),
            "Stock movement recorded"
        );

        Ok(movement)
    }

    /// Current stock for a product. A product with no movements yet reads
    /// as zero on hand.
    pub async fn current_stock(
        &self,
        staff: &StaffContext,
        product_id: &str,
    ) -> EngineResult<StockLevel> {
        let record = self
            .db
            .inventory()
            .get_record(&staff.business_id, product_id)
            .await?;

        let level = match record {
            Some(record) => record.stock_level(),
            None => vela_core::InventoryRecord {
                business_id: staff.business_id.clone(),
                product_id: product_id.to_string(),
                quantity_on_hand: 0,
                quantity_reserved: 0,
                reorder_level: 0,
                updated_at: Utc::now(),
            }
            .stock_level(),
        };

        Ok(level)
    }

    /// Movement history for a product, newest first.
    pub async fn movement_history(
        &self,
        staff: &StaffContext,
        product_id: &str,
        limit: u32,
    ) -> EngineResult<Vec<InventoryTransaction>> {
        let movements = self
            .db
            .inventory()
            .list_movements(&staff.business_id, product_id, limit)
            .await?;
        Ok(movements)
    }

    /// Sets the reorder level that drives the low-stock signal.
    pub async fn set_reorder_level(
        &self,
        staff: &StaffContext,
        product_id: &str,
        reorder_level: i64,
    ) -> EngineResult<()> {
        if reorder_level < 0 {
            return Err(CoreError::invalid_transaction("reorder level must not be negative").into());
        }
        self.db
            .inventory()
            .set_reorder_level(&staff.business_id, product_id, reorder_level)
            .await?;
        Ok(())
    }
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
    use vela_core::StockStatus;

    #[tokio::test]
    async fn test_zero_quantity_rejected_without_record() {
        let fx = fixture().await;
        let service = InventoryService::new(fx.db.clone());

        let err = service
            .adjust_stock(
                &staff(Role::Inventory),
                &fx.product.id,
                StockMovementType::Adjustment,
                0,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTransaction);

        // Nothing was created; on-hand reads zero.
        let level = service
            .current_stock(&staff(Role::Inventory), &fx.product.id)
            .await
            .unwrap();
        assert_eq!(level.on_hand, 0);
        assert!(service
            .movement_history(&staff(Role::Inventory), &fx.product.id, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let fx = fixture().await;
        let service = InventoryService::new(fx.db.clone());

        let err = service
            .adjust_stock(
                &staff(Role::Inventory),
                "no-such-product",
                StockMovementType::Receiving,
                5,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTransaction);
    }

    #[tokio::test]
    async fn test_cross_business_product_rejected() {
        let fx = fixture().await;
        let service = InventoryService::new(fx.db.clone());

        let foreign = StaffContext::new("other-business", "staff-9", Role::Admin);
        let err = service
            .adjust_stock(
                &foreign,
                &fx.product.id,
                StockMovementType::Receiving,
                5,
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTransaction);
    }

    #[tokio::test]
    async fn test_receive_then_damage() {
        let fx = fixture().await;
        let service = InventoryService::new(fx.db.clone());
        let ctx = staff(Role::Inventory);

        service
            .adjust_stock(
                &ctx,
                &fx.product.id,
                StockMovementType::Receiving,
                30,
                Some("delivery".to_string()),
            )
            .await
            .unwrap();
        service
            .adjust_stock(
                &ctx,
                &fx.product.id,
                StockMovementType::Damage,
                3,
                Some("dropped crate".to_string()),
            )
            .await
            .unwrap();

        let level = service.current_stock(&ctx, &fx.product.id).await.unwrap();
        assert_eq!(level.on_hand, 27);
        assert_eq!(level.available, 27);
        assert_eq!(level.status, StockStatus::InStock);

        let history = service
            .movement_history(&ctx, &fx.product.id, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_low_stock_signal() {
        let fx = fixture().await;
        let service = InventoryService::new(fx.db.clone());
        let ctx = staff(Role::Inventory);

        service
            .adjust_stock(&ctx, &fx.product.id, StockMovementType::Receiving, 8, None)
            .await
            .unwrap();
        service
            .set_reorder_level(&ctx, &fx.product.id, 10)
            .await
            .unwrap();

        let level = service.current_stock(&ctx, &fx.product.id).await.unwrap();
        assert_eq!(level.status, StockStatus::Low);
    }
}
