//! # Cash Register Sessions
//!
//! Open/close lifecycle of a physical till plus the archive visibility
//! flag.
//!
//! ## Variance Model
//! `variance = closing_balance - opening_balance`, computed once at close.
//! Netting out intervening cash sales and expenses ("expected cash") is a
//! reporting-layer derivation, not part of this service.
//!
//! Two open sessions for the same register name are allowed; whether that
//! is sensible for a given floor is a caller policy, not enforced here.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::identity::StaffContext;
use vela_core::{validation, CashRegisterSession, CoreError, SessionStatus};
use vela_db::{Database, DbError};

/// The register session service.
#[derive(Debug, Clone)]
pub struct RegisterService {
    db: Database,
}

impl RegisterService {
    /// Creates a new RegisterService.
    pub fn new(db: Database) -> Self {
        RegisterService { db }
    }

    /// Opens a register session.
    ///
    /// A non-admin opens for themselves; assigning the session to another
    /// staff member requires the admin role.
    pub async fn open_register(
        &self,
        staff: &StaffContext,
        register_name: &str,
        opening_cents: i64,
        assign_to: Option<&str>,
        notes: Option<String>,
    ) -> EngineResult<CashRegisterSession> {
        debug!(register_name = %register_name, opening_cents, "open_register");

        validation::validate_name("register_name", register_name)?;
        validation::validate_balance_cents("opening_balance", opening_cents)?;

        let staff_id = match assign_to {
            Some(other) if other != staff.staff_id => {
                if !staff.role.can_assign_register() {
                    return Err(CoreError::invalid_register_op(
                        "(new)",
                        "assigning another staff member requires the admin role",
                    )
                    .into());
                }
                other.to_string()
            }
            _ => staff.staff_id.clone(),
        };

        let session = CashRegisterSession {
            id: Uuid::new_v4().to_string(),
            business_id: staff.business_id.clone(),
            register_name: register_name.trim().to_string(),
            staff_id,
            opening_cents,
            opened_at: Utc::now(),
            closing_cents: None,
            closed_at: None,
            variance_cents: None,
            status: SessionStatus::Open,
            notes,
            is_archived: false,
        };

        self.db.registers().insert(&session).await?;

        info!(
            session_id = %session.id,
            register_name = %session.register_name,
            "Register session opened"
        );

        Ok(session)
    }

    /// Closes an open session: records the counted balance and computes
    /// `variance = closing - opening`. One-shot; a session that is not
    /// open is an invalid transition and nothing is mutated.
    pub async fn close_register(
        &self,
        staff: &StaffContext,
        session_id: &str,
        closing_cents: i64,
    ) -> EngineResult<CashRegisterSession> {
        debug!(session_id = %session_id, closing_cents, "close_register");

        if closing_cents < 0 {
            return Err(CoreError::invalid_register_op(
                session_id,
                "closing balance must not be negative",
            )
            .into());
        }

        let session = self.load_scoped(staff, session_id).await?;
        if !session.is_open() {
            return Err(CoreError::invalid_transition(
                "RegisterSession",
                session_id,
                session.status.as_str(),
                SessionStatus::Closed.as_str(),
            )
            .into());
        }

        let variance_cents = closing_cents - session.opening_cents;
        let closed_at = Utc::now();

        self.db
            .registers()
            .close(session_id, closing_cents, variance_cents, closed_at)
            .await
            .map_err(|err| match err {
                // Guarded update lost the race: same answer as the
                // pre-check above.
                DbError::NotFound { .. } => CoreError::invalid_transition(
                    "RegisterSession",
                    session_id,
                    SessionStatus::Closed.as_str(),
                    SessionStatus::Closed.as_str(),
                )
                .into(),
                other => crate::error::EngineError::from(other),
            })?;

        info!(
            session_id = %session_id,
            variance_cents,
            "Register session closed"
        );

        self.reload(session_id).await
    }

    /// Sets the archive visibility flag. Restricted to admin/manager;
    /// never alters opening/closing/variance data.
    pub async fn set_archived(
        &self,
        staff: &StaffContext,
        session_id: &str,
        archived: bool,
    ) -> EngineResult<CashRegisterSession> {
        if !staff.role.can_archive_sessions() {
            return Err(CoreError::invalid_register_op(
                session_id,
                "archiving sessions requires the admin or manager role",
            )
            .into());
        }

        // Scope check before the write.
        self.load_scoped(staff, session_id).await?;

        self.db.registers().set_archived(session_id, archived).await?;
        self.reload(session_id).await
    }

    /// Open sessions for the business.
    pub async fn open_sessions(
        &self,
        staff: &StaffContext,
    ) -> EngineResult<Vec<CashRegisterSession>> {
        let sessions = self.db.registers().list_open(&staff.business_id).await?;
        Ok(sessions)
    }

    /// Session history, newest first; archived sessions hidden unless
    /// requested.
    pub async fn history(
        &self,
        staff: &StaffContext,
        include_archived: bool,
        limit: u32,
    ) -> EngineResult<Vec<CashRegisterSession>> {
        let sessions = self
            .db
            .registers()
            .list(&staff.business_id, include_archived, limit)
            .await?;
        Ok(sessions)
    }

    async fn load_scoped(
        &self,
        staff: &StaffContext,
        session_id: &str,
    ) -> EngineResult<CashRegisterSession> {
        let session = self
            .db
            .registers()
            .get_by_id(session_id)
            .await?
            .filter(|s| s.business_id == staff.business_id)
            .ok_or_else(|| DbError::not_found("RegisterSession", session_id))?;
        Ok(session)
    }

    async fn reload(&self, session_id: &str) -> EngineResult<CashRegisterSession> {
        let session = self
            .db
            .registers()
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("RegisterSession", session_id))?;
        Ok(session)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
