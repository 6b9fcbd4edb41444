//! # vela-core: Pure Business Logic for Vela
//!
//! This crate is the heart of Vela. It contains all business rules as pure
//! functions and types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         Vela Architecture                            │
//! │                                                                      │
//! │  ┌────────────────────────────────────────────────────────────────┐  │
//! │  │                 Caller (RPC / CLI / UI binding)                │  │
//! │  └─────────────────────────────┬──────────────────────────────────┘  │
//! │                                │                                     │
//! │  ┌─────────────────────────────▼──────────────────────────────────┐  │
//! │  │                    vela-engine (services)                      │  │
//! │  │    checkout, complete/cancel order, adjust stock, registers    │  │
//! │  └─────────────────────────────┬──────────────────────────────────┘  │
//! │                                │                                     │
//! │  ┌─────────────────────────────▼──────────────────────────────────┐  │
//! │  │                 ★ vela-core (THIS CRATE) ★                     │  │
//! │  │                                                                │  │
//! │  │   types • money • totals • cart • validation • error           │  │
//! │  │                                                                │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │  │
//! │  └─────────────────────────────┬──────────────────────────────────┘  │
//! │                                │                                     │
//! │  ┌─────────────────────────────▼──────────────────────────────────┐  │
//! │  │                    vela-db (persistence)                       │  │
//! │  └────────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, InventoryRecord, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`totals`] - Line and order totals calculator
//! - [`cart`] - Checkout input model
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, same input = same output
//! 2. **No I/O**: database, network and file system access are forbidden
//! 3. **Integer Money**: all monetary values are cents (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use money::Money;
pub use totals::{line_totals, order_totals, Discount, LineTotals, OrderTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default business ID for single-tenant deployments, tests and seed data.
///
/// The schema is multi-tenant (every row carries a business_id); runtimes
/// that serve one business use this constant instead of resolving tenants.
pub const DEFAULT_BUSINESS_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against fat-finger quantities (1000 typed instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
