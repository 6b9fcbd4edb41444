//! # Staff Identity
//!
//! The resolved output of the identity collaborator: who is acting, for
//! which business, with what role. The engine never authenticates;
//! callers resolve credentials externally and pass the context in.

use serde::{Deserialize, Serialize};

/// Staff role within a business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
    Inventory,
}

impl Role {
    /// Only admins may open a register session on behalf of another
    /// staff member.
    #[inline]
    pub const fn can_assign_register(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admins and managers control session archive visibility.
    #[inline]
    pub const fn can_archive_sessions(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

/// The acting staff member, resolved by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffContext {
    pub business_id: String,
    pub staff_id: String,
    pub role: Role,
}

impl StaffContext {
    pub fn new(
        business_id: impl Into<String>,
        staff_id: impl Into<String>,
        role: Role,
    ) -> Self {
        StaffContext {
            business_id: business_id.into(),
            staff_id: staff_id.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_gates() {
        assert!(Role::Admin.can_assign_register());
        assert!(!Role::Manager.can_assign_register());
        assert!(!Role::Cashier.can_assign_register());

        assert!(Role::Admin.can_archive_sessions());
        assert!(Role::Manager.can_archive_sessions());
        assert!(!Role::Cashier.can_archive_sessions());
        assert!(!Role::Inventory.can_archive_sessions());
    }
}
