//! # Customer Repository
//!
//! Customer lookups for checkout's resolve-or-create step. Matching is by
//! phone number within a business.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use vela_core::Customer;

const CUSTOMER_COLUMNS: &str = "id, business_id, name, phone, email, created_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Finds a customer by phone within a business. The oldest match wins
    /// if duplicates were ever imported.
    pub async fn find_by_phone(
        &self,
        business_id: &str,
        phone: &str,
    ) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE business_id = ?1 AND phone = ?2 \
             ORDER BY created_at LIMIT 1"
        ))
        .bind(business_id)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Inserts a new customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, business_id, name, phone, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.business_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Generates a new customer ID.
pub fn generate_customer_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use vela_core::DEFAULT_BUSINESS_ID;

    #[tokio::test]
    async fn test_find_by_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let customer = Customer {
            id: generate_customer_id(),
            business_id: DEFAULT_BUSINESS_ID.to_string(),
            name: "Ayesha Khan".to_string(),
            phone: Some("+92 300 1234567".to_string()),
            email: None,
            created_at: Utc::now(),
        };
        repo.insert(&customer).await.unwrap();

        let found = repo
            .find_by_phone(DEFAULT_BUSINESS_ID, "+92 300 1234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, customer.id);

        // Scoped per business: a different business sees nothing.
        let other = repo
            .find_by_phone("other-business", "+92 300 1234567")
            .await
            .unwrap();
        assert!(other.is_none());
    }
}
