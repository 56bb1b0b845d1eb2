//! # mesa-core: Pure Business Logic for Mesa
//!
//! This crate is the **heart** of the Mesa order-fulfillment system. It
//! contains the domain rules for carts, stock, and the order lifecycle as
//! pure types and functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Mesa Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │       Consumers (HTTP handlers, admin tooling, dashboards)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mesa-db (Storage Layer)                      │   │
//! │  │        SQLite repositories, migrations, transactions            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ mesa-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  status   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ OrderStatus│ │   rules   │  │   │
//! │  │   │   Order   │  │ line math │  │ transitions│ │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, CartSession, Order, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`status`] - Order status state machine and legal transitions
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use mesa_core::money::Money;
//! use mesa_core::status::OrderStatus;
//!
//! // Line totals are integer cents (never floats!)
//! let unit_price = Money::from_cents(1250); // $12.50
//! assert_eq!(unit_price.multiply_quantity(3).cents(), 3750);
//!
//! // Status transitions are checked against one adjacency table
//! assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
//! assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Pending));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mesa_core::Money` instead of
// `use mesa_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use status::OrderStatus;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Lifetime of an anonymous cart session, in hours.
///
/// ## Why 5 Hours?
/// Long enough to survive a browsing session plus a meal decision; short
/// enough that abandoned carts are reaped the same day. Sessions past this
/// age are deleted by the periodic cleanup sweep.
pub const CART_SESSION_TTL_HOURS: i64 = 5;

/// Maximum number of distinct line items in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable order sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
