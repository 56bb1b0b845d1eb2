//! # Validation Module
//!
//! Input validation utilities for Mesa.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (forms, admin tooling)                                │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (business rule validation)                       │
//! │  └── Runs before any storage operation                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (stock >= 0, quantity > 0)                      │
//! │  ├── UNIQUE constraints ((session_id, product_id))                     │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: each layer catches different errors                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mesa_core::validation::{validate_quantity, validate_delivery_address};
//!
//! validate_quantity(5).unwrap();
//! validate_delivery_address("12 Elm St, Springfield").unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::NewOrder;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart/order quantity value.
///
/// ## Rules
/// - Must be positive (> 0). There is no "set to zero to remove" shortcut;
///   removal is its own operation.
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (promotional items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a delivery address.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 500 characters
pub fn validate_delivery_address(address: &str) -> ValidationResult<()> {
    let address = address.trim();

    if address.is_empty() {
        return Err(ValidationError::Required {
            field: "delivery_address".to_string(),
        });
    }

    if address.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "delivery_address".to_string(),
            max: 500,
        });
    }

    Ok(())
}

/// Validates a restaurant identifier.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters
pub fn validate_restaurant_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "restaurant_id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "restaurant_id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates the caller-supplied fields of a checkout request.
///
/// ## Rules
/// - restaurant_id and delivery_address must pass their own validators
/// - notes, if present, must be at most 1000 characters
///
/// The non-empty-cart rule is checked separately at order creation, where
/// the cart rows are actually read.
pub fn validate_new_order(input: &NewOrder) -> ValidationResult<()> {
    validate_restaurant_id(&input.restaurant_id)?;
    validate_delivery_address(&input.delivery_address)?;

    if let Some(notes) = &input.notes {
        if notes.len() > 1000 {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: 1000,
            });
        }
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Rules
/// - Must be a valid UUID format
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(100).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Pad Thai").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_delivery_address() {
        assert!(validate_delivery_address("12 Elm St, Springfield").is_ok());
        assert!(validate_delivery_address("").is_err());
        assert!(validate_delivery_address(&"A".repeat(600)).is_err());
    }

    #[test]
    fn test_validate_new_order() {
        let good = NewOrder {
            restaurant_id: "rest-42".to_string(),
            delivery_address: "12 Elm St".to_string(),
            notes: Some("ring twice".to_string()),
        };
        assert!(validate_new_order(&good).is_ok());

        let missing_address = NewOrder {
            restaurant_id: "rest-42".to_string(),
            delivery_address: "  ".to_string(),
            notes: None,
        };
        assert!(validate_new_order(&missing_address).is_err());

        let long_notes = NewOrder {
            restaurant_id: "rest-42".to_string(),
            delivery_address: "12 Elm St".to_string(),
            notes: Some("x".repeat(2000)),
        };
        assert!(validate_new_order(&long_notes).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
