//! # Order Lifecycle
//!
//! Transitions for sales created pending (self-service dine-in and
//! takeaway orders): complete or cancel. Retail register sales never pass
//! through here; they are created completed.
//!
//! ## Policy: stock debits at completion
//! A pending order records intent only. Stock is debited when the order
//! completes, in the same transaction as the status flip, so on-hand
//! always matches completed revenue. Cancellation moves no stock at any
//! point.

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::identity::StaffContext;
use vela_core::{
    InventoryTransaction, Sale, SaleStatus, SaleType, StockMovementType, TableStatus,
};
use vela_db::{Database, DbError};

/// The order lifecycle service.
#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    /// Creates a new OrderService.
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    /// Completes a pending order: flips sale and payment status, posts one
    /// `sale` stock movement per line, then releases the table for dine-in.
    pub async fn complete_order(&self, staff: &StaffContext, sale_id: &str) -> EngineResult<Sale> {
        debug!(sale_id = %sale_id, "complete_order");

        let sale = self.load_scoped(staff, sale_id).await?;
        sale.check_transition(SaleStatus::Completed)?;

        let items = self.db.sales().get_items(sale_id).await?;
        let movements: Vec<InventoryTransaction> = items
            .iter()
            .map(|item| InventoryTransaction {
                id: Uuid::new_v4().to_string(),
                business_id: sale.business_id.clone(),
                product_id: item.product_id.clone(),
                movement_type: StockMovementType::Sale,
                quantity: item.quantity,
                created_by: staff.staff_id.clone(),
                notes: Some(format!("receipt {}", sale.receipt_number)),
                created_at: chrono::Utc::now(),
            })
            .collect();

        self.db
            .sales()
            .complete_pending(sale_id, &movements)
            .await
            .map_err(|err| Self::map_lost_race(err, &sale, SaleStatus::Completed))?;

        self.release_table(&sale).await?;

        info!(sale_id = %sale_id, "Order completed");
        self.reload(sale_id).await
    }

    /// Cancels a pending order. Totals stay as historical record; no
    /// stock ever moved for a pending order, so none moves here.
    pub async fn cancel_order(&self, staff: &StaffContext, sale_id: &str) -> EngineResult<Sale> {
        debug!(sale_id = %sale_id, "cancel_order");

        let sale = self.load_scoped(staff, sale_id).await?;
        sale.check_transition(SaleStatus::Cancelled)?;

        self.db
            .sales()
            .cancel_pending(sale_id)
            .await
            .map_err(|err| Self::map_lost_race(err, &sale, SaleStatus::Cancelled))?;

        self.release_table(&sale).await?;

        info!(sale_id = %sale_id, "Order cancelled");
        self.reload(sale_id).await
    }

    /// Reconciliation sweep: sales that were committed without line items.
    /// Surfaced for operator review instead of being silently orphaned.
    pub async fn audit_orphaned_sales(&self, staff: &StaffContext) -> EngineResult<Vec<Sale>> {
        let orphans = self
            .db
            .sales()
            .find_sales_missing_items(&staff.business_id)
            .await?;
        Ok(orphans)
    }

    /// Loads a sale and enforces the business scope. A sale belonging to
    /// another business is indistinguishable from a missing one.
    async fn load_scoped(&self, staff: &StaffContext, sale_id: &str) -> EngineResult<Sale> {
        let sale = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .filter(|s| s.business_id == staff.business_id)
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        Ok(sale)
    }

    async fn reload(&self, sale_id: &str) -> EngineResult<Sale> {
        let sale = self
            .db
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;
        Ok(sale)
    }

    /// Releases a dine-in table after the status flip committed. A failed
    /// release is partial completion: the sale transition stands and the
    /// table is reconciled by staff.
    async fn release_table(&self, sale: &Sale) -> EngineResult<()> {
        if sale.sale_type != SaleType::DineIn {
            return Ok(());
        }
        let Some(table_id) = &sale.table_id else {
            return Ok(());
        };

        self.db
            .tables()
            .update_status(table_id, TableStatus::Available, None)
            .await
            .map_err(|err| {
                EngineError::partial_completion("Sale", sale.id.clone(), "release_table", err)
            })
    }

    /// A guarded update that affected zero rows means another caller won
    /// the transition race after our pre-check. Same answer as the
    /// pre-check: invalid transition from the now-current state.
    fn map_lost_race(err: DbError, sale: &Sale, requested: SaleStatus) -> EngineError {
        match err {
            DbError::NotFound { .. } => vela_core::CoreError::invalid_transition(
                "Sale",
                sale.id.clone(),
                "not pending",
                requested.as_str(),
            )
            .into(),
            other => other.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
