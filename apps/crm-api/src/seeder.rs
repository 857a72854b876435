//! Startup admin account.
//!
//! Runs once per boot. With `ADMIN_PASSWORD` unset nothing happens; an
//! existing account with the admin email is never modified.

use thiserror::Error;
use tracing::{info, warn};

use crate::auth::AuthError;
use crate::config::ApiConfig;
use crate::password::hash_password;
use crm_core::validation::validate_password;
use crm_core::{User, UserRole, ValidationError};
use crm_db::{Database, DbError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// No admin password configured.
    Skipped,
    AlreadyExists,
    /// Created with this id.
    Created(i64),
}

pub async fn seed_admin(db: &Database, config: &ApiConfig) -> Result<SeedOutcome, SeedError> {
    let Some(password) = config.admin_password.as_deref() else {
        warn!("ADMIN_PASSWORD not set, skipping admin seeding");
        return Ok(SeedOutcome::Skipped);
    };

    if db.users().email_exists(&config.admin_email).await? {
        info!(email = %config.admin_email, "Admin account already exists");
        return Ok(SeedOutcome::AlreadyExists);
    }

    validate_password(password)?;
    let hash = hash_password(password)?;
    let admin = User::new(&config.admin_name, &config.admin_email, &hash, UserRole::Admin)?;
    let admin = db.users().insert(&admin).await?;

    info!(user_id = admin.id(), email = %admin.email(), "Admin account created");
    Ok(SeedOutcome::Created(admin.id()))
}
