//! # User
//!
//! A registered account. Fields are private so every change goes through a
//! method that re-validates and refreshes `updated_at`.
//!
//! ```text
//! User::new(name, email, hash, role)      ← registration (id = 0 until saved)
//! User::restore(id, ..., timestamps)      ← loading from the database
//!      │
//!      ├── update_name / update_email / set_password_hash   → updated_at = now
//!      └── update_role(role)                                → no-op if unchanged
//! ```

use chrono::{DateTime, Utc};

use crate::types::UserRole;
use crate::validation::{
    validate_email, validate_password_hash, validate_user_name, ValidationResult,
};

/// A user account.
///
/// Not `Serialize`: the password hash must never reach a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: UserRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new, unsaved user.
    ///
    /// Name and email are trimmed before validation. The email is stored
    /// lowercased so lookups are case-insensitive.
    pub fn new(
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> ValidationResult<Self> {
        let now = Utc::now();
        Self::restore(0, name, email, password_hash, role, now, now)
    }

    /// Rebuilds a persisted user, enforcing the same invariants as [`User::new`].
    pub fn restore(
        id: i64,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> ValidationResult<Self> {
        validate_user_name(name)?;
        validate_email(email)?;
        validate_password_hash(password_hash)?;

        Ok(User {
            id,
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash: password_hash.to_string(),
            role,
            created_at,
            updated_at,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the user with its database id assigned.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    pub fn update_name(&mut self, name: &str) -> ValidationResult<()> {
        validate_user_name(name)?;
        self.name = name.trim().to_string();
        self.touch();
        Ok(())
    }

    pub fn update_email(&mut self, email: &str) -> ValidationResult<()> {
        validate_email(email)?;
        self.email = normalize_email(email);
        self.touch();
        Ok(())
    }

    pub fn set_password_hash(&mut self, password_hash: &str) -> ValidationResult<()> {
        validate_password_hash(password_hash)?;
        self.password_hash = password_hash.to_string();
        self.touch();
        Ok(())
    }

    /// Changes the role. Returns `false` (and leaves `updated_at` alone) when
    /// the user already has `role`.
    pub fn update_role(&mut self, role: UserRole) -> bool {
        if self.role == role {
            return false;
        }
        self.role = role;
        self.touch();
        true
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// Unit Tests
// =============================================================================
