//! # Product
//!
//! A catalog entry. `id` is the database key; `product_guid` is the stable
//! external identifier handed to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::validation::{
    validate_category, validate_price_cents, validate_product_description,
    validate_product_name, validate_stock, ValidationResult,
};

/// A product in the catalog.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub product_guid: String,
    pub name: String,
    pub description: String,
    /// Price in cents, always positive.
    pub price_cents: i64,
    /// Units on hand, never negative.
    pub stock_quantity: i64,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The client-editable fields of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub category: String,
}

impl ProductDraft {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        validate_product_description(&self.description)?;
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock_quantity)?;
        validate_category(&self.category)?;
        Ok(())
    }
}

impl Product {
    /// Creates an unsaved product with a fresh GUID.
    pub fn create(draft: ProductDraft) -> ValidationResult<Self> {
        draft.validate()?;
        let now = Utc::now();

        Ok(Product {
            id: 0,
            product_guid: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
            price_cents: draft.price_cents,
            stock_quantity: draft.stock_quantity,
            category: draft.category.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields. Identity and `created_at` are kept.
    pub fn apply(&mut self, draft: ProductDraft) -> ValidationResult<()> {
        draft.validate()?;

        self.name = draft.name.trim().to_string();
        self.description = draft.description.trim().to_string();
        self.price_cents = draft.price_cents;
        self.stock_quantity = draft.stock_quantity;
        self.category = draft.category.trim().to_string();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Fails with `InsufficientStock` when fewer than `qty` units are on hand.
    pub fn ensure_available(&self, qty: i64) -> CoreResult<()> {
        if self.stock_quantity < qty {
            return Err(CoreError::InsufficientStock {
                product_id: self.id,
                name: self.name.clone(),
                available: self.stock_quantity,
                requested: qty,
            });
        }
        Ok(())
    }
}
