//! # Domain Types
//!
//! Core domain types used throughout Vela. One struct per persisted entity,
//! plus the status enums that drive the sale and register lifecycles.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                      Sale / Order State Machine                      │
//! │                                                                      │
//! │   POS register (retail)        Self-service (dine-in / takeaway)     │
//! │   ─────────────────────        ─────────────────────────────────     │
//! │                                                                      │
//! │   create ──► COMPLETED         create ──► PENDING                    │
//! │   (stock debited               (no stock movement,                   │
//! │    immediately)                 table occupied if dine-in)           │
//! │                                    │                                 │
//! │                                    ├──► COMPLETED (stock debited,    │
//! │                                    │               table released)   │
//! │                                    └──► CANCELLED (no stock moved,   │
//! │                                                    table released)   │
//! │                                                                      │
//! │   COMPLETED and CANCELLED are terminal: no transition leaves them.   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key: (sku, receipt_number, table number) - human-readable
//!
//! All entities are scoped to exactly one business via `business_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01% = 1/10000, so 825 bps = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// How tax applies to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TaxType {
    #[default]
    None,
    Vat,
    Gst,
    SalesTax,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Price and tax data are snapshotted into cart lines and sale items at
/// line-creation time; later product edits never rewrite posted sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business this product belongs to.
    pub business_id: String,

    /// Stock Keeping Unit - business identifier, unique per business.
    pub sku: String,

    /// Display name shown to staff and on receipts.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents (for margin reporting).
    pub cost_cents: Option<i64>,

    /// Tax rate in basis points (825 = 8.25%).
    pub tax_rate_bps: u32,

    /// Tax regime this product falls under.
    pub tax_type: TaxType,

    /// Whether the product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record, matched by phone number within a business at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock movement type tags for the inventory ledger.
///
/// The direction of a movement is implied by its type, never by the sign of
/// the quantity: adjustment and receiving add stock; sale, return and
/// damage subtract it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockMovementType {
    Adjustment,
    Receiving,
    Sale,
    Return,
    Damage,
}

impl StockMovementType {
    /// Returns +1 for additive movements and -1 for subtractive ones.
    pub const fn sign(&self) -> i64 {
        match self {
            StockMovementType::Adjustment | StockMovementType::Receiving => 1,
            StockMovementType::Sale | StockMovementType::Return | StockMovementType::Damage => -1,
        }
    }
}

/// One inventory balance row per (business, product).
///
/// `quantity_on_hand` is only ever changed by applying an
/// [`InventoryTransaction`]; it is never written directly except at first
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    pub business_id: String,
    pub product_id: String,
    pub quantity_on_hand: i64,
    pub quantity_reserved: i64,
    pub reorder_level: i64,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Available = on hand minus reserved. May be negative: the ledger is
    /// an audit trail, not a reservation system, and callers decide what
    /// to do with the warning.
    #[inline]
    pub fn available(&self) -> i64 {
        self.quantity_on_hand - self.quantity_reserved
    }

    /// Snapshot view with the derived availability signal.
    pub fn stock_level(&self) -> StockLevel {
        let available = self.available();
        let status = if available <= 0 {
            StockStatus::OutOfStock
        } else if available <= self.reorder_level {
            StockStatus::Low
        } else {
            StockStatus::InStock
        };

        StockLevel {
            on_hand: self.quantity_on_hand,
            reserved: self.quantity_reserved,
            available,
            status,
        }
    }
}

/// Availability signal surfaced to callers instead of hard errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    Low,
    OutOfStock,
}

/// Point-in-time stock view returned by the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub on_hand: i64,
    pub reserved: i64,
    pub available: i64,
    pub status: StockStatus,
}

/// An immutable audit record of one stock change.
///
/// Quantity is an unsigned magnitude (> 0); direction comes from the
/// movement type. Rows are appended once and never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryTransaction {
    pub id: String,
    pub business_id: String,
    pub product_id: String,
    pub movement_type: StockMovementType,
    pub quantity: i64,
    pub created_by: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryTransaction {
    /// The signed delta this movement applies to on-hand stock.
    #[inline]
    pub fn signed_delta(&self) -> i64 {
        self.movement_type.sign() * self.quantity
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Fulfillment mode of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    Retail,
    DineIn,
    Takeaway,
}

impl SaleType {
    /// Retail register sales settle immediately; self-service orders
    /// (dine-in, takeaway) are staged as pending.
    #[inline]
    pub const fn settles_immediately(&self) -> bool {
        matches!(self, SaleType::Retail)
    }
}

/// Lifecycle status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

impl SaleStatus {
    /// Terminal states admit no further transitions.
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Completed | SaleStatus::Cancelled)
    }

    /// Pure transition guard: only pending sales may move, and only to a
    /// terminal state.
    pub const fn can_transition_to(&self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::Pending, SaleStatus::Completed)
                | (SaleStatus::Pending, SaleStatus::Cancelled)
        )
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

/// Payment settlement status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

/// How the customer pays (or intends to pay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
}

/// The transactional root: one customer transaction, in-person or
/// self-service.
///
/// Subtotal/tax/total are fixed at creation by the totals calculator and
/// never recomputed afterwards; cancellation leaves them as historical
/// record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub business_id: String,

    /// Time-derived receipt number, unique per business.
    pub receipt_number: String,

    /// Nullable: walk-in/guest sales carry no customer.
    pub customer_id: Option<String>,

    pub sale_type: SaleType,

    /// Set only for dine-in sales.
    pub table_id: Option<String>,

    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub sale_status: SaleStatus,

    /// Staff member who created the sale.
    pub created_by: String,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Guard used by the lifecycle services before any write happens.
    pub fn check_transition(&self, next: SaleStatus) -> crate::error::CoreResult<()> {
        if self.sale_status.can_transition_to(next) {
            Ok(())
        } else {
            Err(crate::error::CoreError::invalid_transition(
                "Sale",
                self.id.clone(),
                self.sale_status.as_str(),
                next.as_str(),
            ))
        }
    }
}

/// A line item within a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Tax rate in basis points at time of sale (frozen).
    pub tax_rate_bps: u32,
    /// Percent discount in basis points, 0 when an absolute discount
    /// (or none) was applied.
    pub discount_bps: u32,
    /// Discount applied to this line, in cents.
    pub discount_cents: i64,
    /// Tax for this line, in cents.
    pub tax_cents: i64,
    /// quantity x unit_price - discount + tax.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Cash Register Session
// =============================================================================

/// Lifecycle status of a register session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "open",
            SessionStatus::Closed => "closed",
        }
    }
}

/// One open/close cycle of a physical till.
///
/// Created on open; mutated exactly once on close, which sets
/// closing_cents/closed_at/variance_cents/status atomically. Archival is a
/// visibility flag, not a lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashRegisterSession {
    pub id: String,
    pub business_id: String,
    pub register_name: String,
    pub staff_id: String,
    pub opening_cents: i64,
    pub opened_at: DateTime<Utc>,
    pub closing_cents: Option<i64>,
    pub closed_at: Option<DateTime<Utc>>,
    /// closing - opening, set at close.
    pub variance_cents: Option<i64>,
    pub status: SessionStatus,
    pub notes: Option<String>,
    pub is_archived: bool,
}

impl CashRegisterSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

// =============================================================================
// Restaurant Table
// =============================================================================

/// Physical table status. The sale lifecycle drives available<->occupied;
/// the other states are set by staff from the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Cleaning,
    Maintenance,
}

impl TableStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Occupied => "occupied",
            TableStatus::Reserved => "reserved",
            TableStatus::Cleaning => "cleaning",
            TableStatus::Maintenance => "maintenance",
        }
    }
}

/// A physical restaurant table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RestaurantTable {
    pub id: String,
    pub business_id: String,
    pub number: i64,
    pub section: Option<String>,
    pub seat_capacity: i64,
    pub status: TableStatus,
    pub updated_at: DateTime<Utc>,
}

impl RestaurantTable {
    #[inline]
    pub fn is_available(&self) -> bool {
        self.status == TableStatus::Available
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
