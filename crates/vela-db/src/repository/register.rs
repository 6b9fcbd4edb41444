//! # Register Session Repository
//!
//! Database operations for cash register sessions. A session is inserted
//! on open, mutated exactly once on close (guarded update), and may be
//! archived/unarchived as a visibility flag afterwards.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use vela_core::CashRegisterSession;

const SESSION_COLUMNS: &str = "\
    id, business_id, register_name, staff_id, opening_cents, opened_at, \
    closing_cents, closed_at, variance_cents, status, notes, is_archived";

/// Repository for register session operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashRegisterSession>> {
        let session = sqlx::query_as::<_, CashRegisterSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM register_sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Inserts a newly opened session.
    pub async fn insert(&self, session: &CashRegisterSession) -> DbResult<()> {
        debug!(
            id = %session.id,
            register_name = %session.register_name,
            "Opening register session"
        );

        sqlx::query(
            r#"
            INSERT INTO register_sessions (
                id, business_id, register_name, staff_id, opening_cents, opened_at,
                closing_cents, closed_at, variance_cents, status, notes, is_archived
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&session.id)
        .bind(&session.business_id)
        .bind(&session.register_name)
        .bind(&session.staff_id)
        .bind(session.opening_cents)
        .bind(session.opened_at)
        .bind(session.closing_cents)
        .bind(session.closed_at)
        .bind(session.variance_cents)
        .bind(session.status)
        .bind(&session.notes)
        .bind(session.is_archived)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Closes an open session: sets closing balance, close time, variance
    /// and status in one guarded update. A session that is not open leaves
    /// zero rows affected and nothing is mutated.
    pub async fn close(
        &self,
        session_id: &str,
        closing_cents: i64,
        variance_cents: i64,
        closed_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %session_id, closing_cents, "Closing register session");

        let result = sqlx::query(
            r#"
            UPDATE register_sessions SET
                closing_cents = ?2,
                variance_cents = ?3,
                closed_at = ?4,
                status = 'closed'
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(session_id)
        .bind(closing_cents)
        .bind(variance_cents)
        .bind(closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RegisterSession (open)", session_id));
        }

        Ok(())
    }

    /// Sets the archive visibility flag. Does not touch lifecycle data.
    pub async fn set_archived(&self, session_id: &str, archived: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE register_sessions SET is_archived = ?2 WHERE id = ?1",
        )
        .bind(session_id)
        .bind(archived)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RegisterSession", session_id));
        }

        Ok(())
    }

    /// Lists open sessions for a business.
    pub async fn list_open(&self, business_id: &str) -> DbResult<Vec<CashRegisterSession>> {
        let sessions = sqlx::query_as::<_, CashRegisterSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM register_sessions \
             WHERE business_id = ?1 AND status = 'open' ORDER BY opened_at"
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Lists sessions for history views, newest first. Archived sessions
    /// are hidden unless requested.
    pub async fn list(
        &self,
        business_id: &str,
        include_archived: bool,
        limit: u32,
    ) -> DbResult<Vec<CashRegisterSession>> {
        let sessions = sqlx::query_as::<_, CashRegisterSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM register_sessions \
             WHERE business_id = ?1 AND (is_archived = 0 OR ?2) \
             ORDER BY opened_at DESC LIMIT ?3"
        ))
        .bind(business_id)
        .bind(include_archived)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }
}

/// Generates a new session ID.
pub fn generate_session_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
