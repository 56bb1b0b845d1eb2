//! # Error Types
//!
//! Domain-specific error types for mesa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mesa-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mesa-db errors (separate crate)                                       │
//! │  └── DbError          - Storage failures, wraps CoreError as Domain    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product ID, statuses, etc.)
//! 3. Errors are enum variants, never String
//! 4. Nothing panics; every failure crosses the boundary as a `Result`

use thiserror::Error;

use crate::status::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// Callers (forms, admin UIs) map them to field-level messages or toasts.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Adding or updating a cart line would exceed the product's stock.
    ///
    /// ## When This Occurs
    /// - `add_item` where existing quantity + requested quantity > stock
    /// - `update_item` where the new quantity > stock
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 10)
    ///      │
    ///      ▼
    /// Cart already holds 5, stock is 10
    ///      │
    ///      ▼
    /// StockExceeded { available: 10, requested: 15 }
    ///      │
    ///      ▼
    /// UI shows: "Only 10 left in stock"
    /// ```
    #[error("Stock exceeded for product {product_id}: available {available}, requested {requested}")]
    StockExceeded {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// A stock decrement would drive the ledger negative.
    ///
    /// ## When This Occurs
    /// - Checkout re-validation loses a race against a concurrent order
    /// - A manual stock adjustment removes more units than exist
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The requested status change is not a legal transition.
    ///
    /// ## When This Occurs
    /// - Skipping ahead (e.g., `pending → assigned`)
    /// - Going backward (e.g., `completed → pending`)
    /// - Cancelling an order that is already delivered or completed
    #[error("Invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// No driver profile exists for the given ID, or the profile is not a
    /// driver.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// The driver exists but is not currently accepting deliveries.
    #[error("Driver is not available: {0}")]
    DriverUnavailable(String),

    /// Cart has exceeded the maximum number of distinct line items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Checkout was attempted with no cart lines.
    #[error("Cart is empty, nothing to order")]
    EmptyCart,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::StockExceeded {
            product_id: "milk-1l".to_string(),
            available: 10,
            requested: 15,
        };
        assert_eq!(
            err.to_string(),
            "Stock exceeded for product milk-1l: available 10, requested 15"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = CoreError::InvalidTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Invalid order status transition: completed -> pending"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "delivery_address".to_string(),
        };
        assert_eq!(err.to_string(), "delivery_address is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "restaurant_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
