//! # vela-db: Database Layer for Vela
//!
//! This crate provides database access for the Vela system. It uses SQLite
//! for local storage with sqlx for async operations.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations, one per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vela_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/vela.db")).await?;
//! let products = db.products().list_active(business_id, 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::product::ProductRepository;
pub use repository::register::RegisterRepository;
pub use repository::sale::SaleRepository;
pub use repository::table::TableRepository;
