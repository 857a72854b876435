//! # Token Blacklist
//!
//! Revoked JWT ids, held in memory until the token would have expired
//! anyway. The list is lost on restart.
//!
//! ```text
//! POST /api/auth/logout ──► revoke(jti, exp)
//!                                │
//!                                ▼
//!                  RwLock<HashMap<jti, exp>>  ◄── is_revoked(jti)  (every request)
//!                                ▲
//!                                │
//!            spawn_cleanup ──────┘  every BLACKLIST_CLEANUP_SECS: drop exp <= now
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TokenBlacklist {
    entries: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revokes `jti` until `expires_at`.
    pub async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) {
        self.entries
            .write()
            .await
            .insert(jti.to_string(), expires_at);
        debug!(jti = %jti, %expires_at, "Token revoked");
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .get(jti)
            .is_some_and(|expires_at| *expires_at > now)
    }

    /// Drops entries whose token has expired. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Runs [`cleanup_expired`](Self::cleanup_expired) every `period` until
    /// the returned task is aborted.
    pub fn spawn_cleanup(&self, period: Duration) -> JoinHandle<()> {
        let blacklist = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = blacklist.cleanup_expired().await;
                if removed > 0 {
                    debug!(removed, "Purged expired blacklist entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_revoke_and_check() {
        let blacklist = TokenBlacklist::new();
        assert!(!blacklist.is_revoked("jti-1").await);

        blacklist
            .revoke("jti-1", Utc::now() + ChronoDuration::minutes(5))
            .await;

        assert!(blacklist.is_revoked("jti-1").await);
        assert!(!blacklist.is_revoked("jti-2").await);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let blacklist = TokenBlacklist::new();
        blacklist
            .revoke("expired", Utc::now() - ChronoDuration::seconds(1))
            .await;
        blacklist
            .revoke("live", Utc::now() + ChronoDuration::minutes(5))
            .await;

        assert!(!blacklist.is_revoked("expired").await);
        assert_eq!(blacklist.cleanup_expired().await, 1);
        assert_eq!(blacklist.len().await, 1);
        assert!(blacklist.is_revoked("live").await);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let blacklist = TokenBlacklist::new();
        let clone = blacklist.clone();

        clone
            .revoke("jti-1", Utc::now() + ChronoDuration::minutes(5))
            .await;

        assert!(blacklist.is_revoked("jti-1").await);
    }

    #[tokio::test]
    async fn test_background_cleanup() {
        let blacklist = TokenBlacklist::new();
        blacklist
            .revoke("expired", Utc::now() - ChronoDuration::seconds(1))
            .await;

        let handle = blacklist.spawn_cleanup(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(blacklist.is_empty().await);
    }
}
