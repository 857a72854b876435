//! # Domain Types
//!
//! Enumerations shared by the entities.
//!
//! ```text
//! ┌─────────────────────┐        ┌───────────────────────────────────────┐
//! │      UserRole       │        │              OrderStatus              │
//! │  ─────────────────  │        │  ───────────────────────────────────  │
//! │  Regular (default)  │        │  Pending ──► Processed ──► Shipped    │
//! │  Admin              │        │     │            │            │       │
//! └─────────────────────┘        │     ▼            ▼            ▼       │
//!                                │  Cancelled    Cancelled    Delivered  │
//!                                └───────────────────────────────────────┘
//! ```
//!
//! JSON uses the variant names (`"Admin"`, `"Pending"`); the database stores
//! them lowercase.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// User Role
// =============================================================================

/// Authorization role carried on the user and in the JWT `role` claim.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UserRole {
    #[default]
    Regular,
    Admin,
}

impl UserRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Regular => "Regular",
            UserRole::Admin => "Admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(UserRole::Regular),
            "admin" => Ok(UserRole::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["Regular".to_string(), "Admin".to_string()],
            }),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of an order.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Placed, stock reserved.
    #[default]
    Pending,
    Processed,
    Shipped,
    Delivered,
    /// Stock returned to the catalog.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processed => "Processed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Delivered and Cancelled orders never change again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal step.
    ///
    /// ```rust
    /// use crm_core::OrderStatus;
    ///
    /// assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processed));
    /// assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    /// ```
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Processed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processed, OrderStatus::Shipped)
                | (OrderStatus::Processed, OrderStatus::Cancelled)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL
                    .iter()
                    .map(|s| s.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("regular".parse::<UserRole>().unwrap(), UserRole::Regular);
        assert!("root".parse::<UserRole>().is_err());
        assert_eq!(UserRole::default(), UserRole::Regular);
    }

    #[test]
    fn test_role_json_uses_variant_name() {
        let json = serde_json::to_string(&UserRole::Admin).unwrap();
        assert_eq!(json, "\"Admin\"");
    }

    #[test]
    fn test_status_transitions() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Processed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processed.can_transition_to(Shipped));
        assert!(Processed.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Cancelled));
        for next in OrderStatus::ALL {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(" Cancelled ".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
