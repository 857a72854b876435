//! Shared application state.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState (Clone, one Arc)                                              │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────┐  ┌───────────┐ │
//! │  │  Database    │  │  JwtManager  │  │ TokenBlacklist │  │ ApiConfig │ │
//! │  │  (SqlitePool)│  │  (read-only) │  │ (RwLock map)   │  │ (r/o)     │ │
//! │  └──────────────┘  └──────────────┘  └────────────────┘  └───────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use crm_db::Database;

use crate::auth::JwtManager;
use crate::blacklist::TokenBlacklist;
use crate::config::ApiConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    db: Database,
    jwt: JwtManager,
    blacklist: TokenBlacklist,
    config: ApiConfig,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            inner: Arc::new(Inner {
                db,
                jwt: JwtManager::from_config(&config),
                blacklist: TokenBlacklist::new(),
                config,
            }),
        }
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.inner.jwt
    }

    pub fn blacklist(&self) -> &TokenBlacklist {
        &self.inner.blacklist
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }
}
