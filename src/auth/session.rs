//! Session storage.
//!
//! Sessions live in memory, keyed by an opaque random token that the client
//! presents as a bearer token or cookie. A restart signs everyone out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use tokio::sync::broadcast;

use crate::observability::metrics;

/// Longest accepted session lifetime: ten years.
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// A signed-in user's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

/// A thread-safe store of live sessions.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, Session>>,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl: chrono::Duration::from_std(ttl.min(Duration::from_secs(MAX_SESSION_TTL_SECS)))
                .unwrap_or_else(|_| chrono::Duration::days(14)),
        }
    }

    /// Session lifetime in whole seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Start a session for `user_id` and return its token.
    pub fn create(&self, user_id: &str) -> String {
        let token = generate_token();
        self.inner.insert(
            token.clone(),
            Session {
                user_id: user_id.to_string(),
                expires_at: Utc::now()
                    .checked_add_signed(self.ttl)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            },
        );
        token
    }

    /// Active session for `token`. Expired sessions are dropped on sight.
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.inner.get(token).map(|entry| entry.value().clone())?;
        if session.is_active() {
            Some(session)
        } else {
            self.inner.remove(token);
            None
        }
    }

    /// End a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.inner.remove(token).is_some()
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, session| session.is_active());
        let removed = before.saturating_sub(self.inner.len());
        metrics::set_active_sessions(self.inner.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[cfg(test)]
    fn insert_raw(&self, token: &str, session: Session) {
        self.inner.insert(token.to_string(), session);
    }
}

/// Periodically purge expired sessions until shutdown is signalled.
pub async fn run_purge_loop(
    store: SessionStore,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = store.len(), "Purged expired sessions");
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!("Session purge loop stopping");
                break;
            }
        }
    }
}

/// 32 random bytes, hex encoded.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_get_revoke() {
        let store = SessionStore::new(Duration::from_secs(60));
        let token = store.create("bob");
        assert_eq!(token.len(), 64);

        let session = store.get(&token).unwrap();
        assert_eq!(session.user_id, "bob");
        assert!(store.get("unknown").is_none());

        assert!(store.revoke(&token));
        assert!(!store.revoke(&token));
        assert!(store.get(&token).is_none());
    }

    #[test]
    fn test_oversized_ttl_is_capped() {
        let store = SessionStore::new(Duration::from_secs(10_000_000_000_000));
        assert_eq!(store.ttl_secs(), MAX_SESSION_TTL_SECS as i64);

        let token = store.create("bob");
        assert!(store.get(&token).is_some());
    }

    #[test]
    fn test_tokens_are_unique() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert_ne!(store.create("bob"), store.create("bob"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expired_sessions_are_rejected_and_purged() {
        let store = SessionStore::new(Duration::from_secs(60));
        let expired = Session {
            user_id: "tom".into(),
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        store.insert_raw("old", expired.clone());
        store.insert_raw("older", expired);
        let live = store.create("bob");

        assert!(store.get("old").is_none());
        assert_eq!(store.len(), 2);

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(&live).is_some());
    }

    #[tokio::test]
    async fn test_purge_loop_stops_on_shutdown() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_purge_loop(store, Duration::from_millis(10), rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("purge loop should stop")
            .unwrap();
    }
}
