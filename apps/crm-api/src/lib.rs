//! # CRM API
//!
//! JSON back office for users, products, carts and orders.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           CRM API Server                                │
//! │                                                                         │
//! │  Client ──► axum Router ──► Extractors ──► Handlers ──► crm-db          │
//! │             (TraceLayer,    (AuthUser,     (routes/*)    (SQLite)       │
//! │              CorsLayer)      AdminUser,        │                         │
//! │                              ApiJson)          ▼                         │
//! │                                 │          crm-core rules                │
//! │                                 ▼                                        │
//! │                          JwtManager + TokenBlacklist                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (a `.env` file is read first):
//! - `HOST` / `PORT` - Listen address (default: 0.0.0.0:8080)
//! - `DATABASE_PATH` - SQLite file (default: ./crm.db)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - HS256 secret, at least 32 bytes
//! - `JWT_ISSUER` / `JWT_AUDIENCE` - Token `iss` / `aud`
//! - `JWT_EXPIRY_MINUTES` - Token lifetime (default: 60)
//! - `ADMIN_EMAIL` / `ADMIN_NAME` / `ADMIN_PASSWORD` - Startup admin account
//! - `CORS_ALLOWED_ORIGIN` - Single allowed origin (default: http://localhost:3000)
//! - `BLACKLIST_CLEANUP_SECS` - Revoked-token purge interval (default: 300)
//! - `LOG_DIR` / `LOG_FILE` - Log file location (default: Logs/CRM_Logs.txt)

pub mod auth;
pub mod blacklist;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod seeder;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ErrorCode};
pub use routes::router;
pub use state::AppState;
