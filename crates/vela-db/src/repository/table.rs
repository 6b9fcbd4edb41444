//! # Restaurant Table Repository
//!
//! Table directory and status updates. The sale lifecycle drives
//! available<->occupied; staff set the remaining states from the floor
//! plan.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vela_core::{RestaurantTable, TableStatus};

const TABLE_COLUMNS: &str =
    "id, business_id, number, section, seat_capacity, status, updated_at";

/// Repository for restaurant table operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RestaurantTable>> {
        let table = sqlx::query_as::<_, RestaurantTable>(&format!(
            "SELECT {TABLE_COLUMNS} FROM restaurant_tables WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    /// Lists tables for a business, by number.
    pub async fn list(&self, business_id: &str) -> DbResult<Vec<RestaurantTable>> {
        let tables = sqlx::query_as::<_, RestaurantTable>(&format!(
            "SELECT {TABLE_COLUMNS} FROM restaurant_tables \
             WHERE business_id = ?1 ORDER BY number"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    /// Inserts a new table.
    pub async fn insert(&self, table: &RestaurantTable) -> DbResult<()> {
        debug!(id = %table.id, number = table.number, "Inserting table");

        sqlx::query(
            r#"
            INSERT INTO restaurant_tables (
                id, business_id, number, section, seat_capacity, status, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&table.id)
        .bind(&table.business_id)
        .bind(table.number)
        .bind(&table.section)
        .bind(table.seat_capacity)
        .bind(table.status)
        .bind(table.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a table's status.
    ///
    /// With `expected` set, the update only applies if the table is still
    /// in that status; a lost race surfaces as NotFound and the caller
    /// re-reads.
    pub async fn update_status(
        &self,
        table_id: &str,
        status: TableStatus,
        expected: Option<TableStatus>,
    ) -> DbResult<()> {
        debug!(id = %table_id, status = ?status, "Updating table status");

        let now = Utc::now();

        let result = match expected {
            Some(expected) => {
                sqlx::query(
                    "UPDATE restaurant_tables SET status = ?2, updated_at = ?3 \
                     WHERE id = ?1 AND status = ?4",
                )
                .bind(table_id)
                .bind(status)
                .bind(now)
                .bind(expected)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "UPDATE restaurant_tables SET status = ?2, updated_at = ?3 WHERE id = ?1",
                )
                .bind(table_id)
                .bind(status)
                .bind(now)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RestaurantTable", table_id));
        }

        Ok(())
    }
}

/// Generates a new table ID.
pub fn generate_table_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use vela_core::DEFAULT_BUSINESS_ID;

    fn table(number: i64) -> RestaurantTable {
        RestaurantTable {
            id: generate_table_id(),
            business_id: DEFAULT_BUSINESS_ID.to_string(),
            number,
            section: Some("main".to_string()),
            seat_capacity: 4,
            status: TableStatus::Available,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_guarded_status_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tables();

        let t7 = table(7);
        repo.insert(&t7).await.unwrap();

        // Guarded occupy succeeds from available.
        repo.update_status(&t7.id, TableStatus::Occupied, Some(TableStatus::Available))
            .await
            .unwrap();

        // A second guarded occupy loses the race.
        let err = repo
            .update_status(&t7.id, TableStatus::Occupied, Some(TableStatus::Available))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // Unguarded release always applies.
        repo.update_status(&t7.id, TableStatus::Available, None)
            .await
            .unwrap();
        let fetched = repo.get_by_id(&t7.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, TableStatus::Available);
    }

    #[tokio::test]
    async fn test_list_orders_by_number() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tables();

        repo.insert(&table(3)).await.unwrap();
        repo.insert(&table(1)).await.unwrap();
        repo.insert(&table(2)).await.unwrap();

        let tables = repo.list(DEFAULT_BUSINESS_ID).await.unwrap();
        let numbers: Vec<i64> = tables.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }
}
