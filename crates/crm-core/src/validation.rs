//! # Validation Module
//!
//! Field validators shared by the entity constructors and the HTTP layer.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: axum extractors                                              │
//! │  └── JSON shape, path parameter types                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called from entity constructors/setters)        │
//! │  └── lengths, formats, numeric bounds                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (users.email, guids)                                       │
//! │  └── Foreign keys with ON DELETE CASCADE                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes.

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Helpers
// =============================================================================

fn check_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

fn check_max(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value > max {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// User Validators
// =============================================================================

/// Validates a user's display name (2-100 characters).
///
/// ```rust
/// use crm_core::validation::validate_user_name;
///
/// assert!(validate_user_name("Jo").is_ok());
/// assert!(validate_user_name("J").is_err());
/// assert!(validate_user_name("   ").is_err());
/// ```
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    check_length("name", name, 2, 100)
}

/// Validates an email address.
///
/// ## Rules
/// - Not empty, at most 254 characters
/// - Exactly one `@`, with a non-empty local part and domain
/// - Domain contains a dot that is neither first nor last
/// - No whitespace
///
/// ```rust
/// use crm_core::validation::validate_email;
///
/// assert!(validate_email("jane@example.com").is_ok());
/// assert!(validate_email("jane.example.com").is_err());
/// assert!(validate_email("jane@").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }
    if email.chars().count() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing '@'"))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid("must look like name@domain"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must contain a dot"));
    }

    Ok(())
}

/// Validates a stored password hash (non-blank).
pub fn validate_password_hash(hash: &str) -> ValidationResult<()> {
    if hash.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

/// Minimum length for plain-text passwords at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validates a plain-text password before hashing.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// Product Validators
// =============================================================================

/// Validates a product name (2-100 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    check_length("name", name, 2, 100)
}

/// Validates a product description (optional, at most 300 characters).
pub fn validate_product_description(description: &str) -> ValidationResult<()> {
    if description.chars().count() > 300 {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 300,
        });
    }
    Ok(())
}

/// Validates a product category (3-50 characters).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    check_length("category", category, 3, 50)
}

/// Largest accepted price, $10,000,000.00.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Largest stock level a product may hold.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Validates a catalog price in cents. Products are never free.
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if price_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "priceCents".to_string(),
        });
    }
    check_max("priceCents", price_cents, MAX_PRICE_CENTS)
}

/// Validates a stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stockQuantity".to_string(),
        });
    }
    check_max("stockQuantity", stock, MAX_STOCK)
}

// =============================================================================
// Order / Cart Validators
// =============================================================================

/// Largest quantity on a single cart or order line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Validates a line quantity (1 to [`MAX_LINE_QUANTITY`]).
///
/// ```rust
/// use crm_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(i64::MAX).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    check_max("quantity", qty, MAX_LINE_QUANTITY)
}

/// Merges two line quantities. The sum is validated like any other quantity.
pub fn merge_quantities(current: i64, added: i64) -> ValidationResult<i64> {
    let merged = current
        .checked_add(added)
        .ok_or_else(|| ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: MAX_LINE_QUANTITY,
        })?;
    validate_quantity(merged)?;
    Ok(merged)
}

/// Validates a unit price on an order line (strictly positive).
pub fn validate_unit_price_cents(price_cents: i64) -> ValidationResult<()> {
    if price_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unitPrice".to_string(),
        });
    }
    check_max("unitPrice", price_cents, MAX_PRICE_CENTS)
}

/// Validates an entity id supplied by a client.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates the username snapshot stored on an order (3-100 characters).
pub fn validate_order_username(username: &str) -> ValidationResult<()> {
    check_length("userNameOrder", username, 3, 100)
}

/// Validates an order description (at most 500 characters).
pub fn validate_order_description(description: &str) -> ValidationResult<()> {
    if description.chars().count() > 500 {
        return Err(ValidationError::TooLong {
            field: "orderDescription".to_string(),
            max: 500,
        });
    }
    Ok(())
}

/// Validates a GUID string.
///
/// ```rust
/// use crm_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "guid".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
