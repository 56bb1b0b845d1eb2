//! # Domain Types
//!
//! Core domain types used throughout Mesa.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   CartSession   │   │    CartItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  (session_id,   │       │
//! │  │  price_cents    │   │  expires_at     │   │   product_id)   │       │
//! │  │  stock (ledger) │   │  (now + 5h)     │   │   unique pair   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderItem     │   │  DriverProfile  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  status (DAG)   │   │  unit price     │   │  role='driver'  │       │
//! │  │  total_cents    │   │  snapshotted    │   │  is_available   │       │
//! │  │  driver_id?     │   │  at creation    │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `OrderItem` freezes the product's name and unit price at order-creation
//! time. Future catalog edits never change what a customer was charged.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::OrderStatus;
use crate::CART_SESSION_TTL_HOURS;

/// The profile role that marks a driver account.
pub const ROLE_DRIVER: &str = "driver";

// =============================================================================
// Product
// =============================================================================

/// A product available for ordering.
///
/// The `stock` column IS the Stock Ledger: the authoritative count of
/// sellable units. Cart mutations validate against it without decrementing;
/// only order creation (and restocking/cancellation) moves it, always
/// through a guarded SQL update so it can never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in carts and on receipts.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Sellable units on hand. Never negative.
    pub stock: i64,

    /// Whether the product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units could currently be sold.
    ///
    /// Advisory only: the authoritative check is the guarded decrement at
    /// order creation.
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Cart Session
// =============================================================================

/// A time-boxed, anonymous shopping-cart context.
///
/// ## Lifecycle
/// ```text
/// first cart access ──► created (expires_at = now + 5h)
///        │
///        ├── successful checkout ──► cart cleared, session spent
///        │
///        └── expiry sweep ──► session + items deleted (cascade)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartSession {
    /// Unique identifier (UUID v4), held client-side to correlate calls.
    pub id: String,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Hard expiry. The session is active iff `expires_at > now`.
    pub expires_at: DateTime<Utc>,
}

impl CartSession {
    /// Computes the expiry timestamp for a session created at `now`.
    pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::hours(CART_SESSION_TTL_HOURS)
    }

    /// Checks whether the session is still active at `now`.
    #[inline]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line item in a cart session.
///
/// At most one row exists per `(session_id, product_id)` pair; adding the
/// same product again merges into the existing row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: String,
    pub session_id: String,
    pub product_id: String,
    /// Units requested. Always >= 1; zero is a validation error, not a
    /// deletion.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Cart Line (joined view)
// =============================================================================

/// A cart item joined with the product display data a cart page needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    /// Cart item ID.
    pub id: String,
    pub session_id: String,
    pub product_id: String,
    /// Current product name (carts show live catalog data, unlike orders).
    pub product_name: String,
    /// Current unit price in cents.
    pub unit_price_cents: i64,
    /// Current stock, so the UI can cap quantity steppers.
    pub stock: i64,
    pub quantity: i64,
}

impl CartLine {
    /// Line total in cents (`quantity × unit_price`).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents())
    }
}

// =============================================================================
// Order
// =============================================================================

/// An immutable record of a checkout.
///
/// `total_cents` is computed once inside the creation transaction and is
/// never written again; it always equals the sum of the persisted items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub restaurant_id: String,
    /// Set only together with the transition into `assigned`.
    pub driver_id: Option<String>,
    pub delivery_address: String,
    pub notes: Option<String>,
    /// Immutable post-creation. Equals Σ item quantity × unit price.
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses the snapshot pattern to freeze product data at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at time of checkout (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of checkout (frozen).
    pub unit_price_cents: i64,
    /// Quantity ordered.
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total in cents (`quantity × unit_price`).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

// =============================================================================
// Driver Profile
// =============================================================================

/// The subset of an identity profile that driver assignment consults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DriverProfile {
    pub id: String,
    pub name: String,
    /// Profile role. Only `"driver"` profiles can be assigned deliveries.
    pub role: String,
    /// Whether the driver is currently accepting deliveries.
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DriverProfile {
    /// Checks whether this profile is a driver at all.
    #[inline]
    pub fn is_driver(&self) -> bool {
        self.role == ROLE_DRIVER
    }

    /// Checks whether this profile can be bound to an order right now.
    #[inline]
    pub fn is_assignable(&self) -> bool {
        self.is_driver() && self.is_available
    }
}

// =============================================================================
// Checkout Input
// =============================================================================

/// Caller-supplied fields for creating an order from a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub restaurant_id: String,
    pub delivery_address: String,
    pub notes: Option<String>,
}

/// A partial update of an order's non-financial, non-status fields.
///
/// `update_details` applies exactly these fields and nothing else; totals,
/// items, status, and driver binding are out of its reach by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderPatch {
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

impl OrderPatch {
    /// Checks whether the patch changes anything at all.
    pub fn is_empty(&self) -> bool {
        self.delivery_address.is_none() && self.notes.is_none()
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Half-open time window for statistics queries: `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Orders in one status, with their count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Read-only rollup over committed orders.
///
/// Cancelled orders are excluded from `total_revenue_cents` but still
/// included in `total_orders` and `by_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub total_orders: i64,
    pub total_revenue_cents: i64,
    pub by_status: Vec<StatusCount>,
}

impl OrderStatistics {
    /// Returns the revenue as Money.
    #[inline]
    pub fn total_revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }

    /// Convenience lookup for one status's count (0 when absent).
    pub fn count_for(&self, status: OrderStatus) -> i64 {
        self.by_status
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
