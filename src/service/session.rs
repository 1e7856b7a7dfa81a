use crate::config::SessionConfig;
use crate::models::session::{IssuedSession, Session};
use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Source of the current time for session expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Storage for live sessions, keyed by the digest of their token.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn put(&self, key: String, session: Session);
    async fn get(&self, key: &str) -> Option<Session>;
    /// Returns whether an entry was removed.
    async fn evict(&self, key: &str) -> bool;
    /// Removes every entry expired at `now`, returning how many were dropped.
    async fn evict_expired(&self, now: DateTime<Utc>) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, key: String, session: Session) {
        self.sessions.lock().await.insert(key, session);
    }

    async fn get(&self, key: &str) -> Option<Session> {
        self.sessions.lock().await.get(key).copied()
    }

    async fn evict(&self, key: &str) -> bool {
        self.sessions.lock().await.remove(key).is_some()
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    Valid(Session),
    Missing,
    Expired,
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    duration: chrono::Duration,
    sweep_interval: Duration,
}

fn session_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Upper bound on configured session lifetimes.
pub const MAX_SESSION_SECONDS: u64 = 366 * 24 * 60 * 60;

/// Shortened token safe to put in logs.
pub fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let token_bytes: [u8; 32] = rng.r#gen();
    hex::encode(token_bytes)
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, config: &SessionConfig) -> Self {
        if config.duration_seconds > MAX_SESSION_SECONDS {
            warn!(
                configured = config.duration_seconds,
                max = MAX_SESSION_SECONDS,
                "session duration too long, clamping"
            );
        }
        let seconds = config.duration_seconds.min(MAX_SESSION_SECONDS);
        Self {
            store,
            clock,
            duration: chrono::Duration::seconds(i64::try_from(seconds).unwrap_or_default()),
            sweep_interval: Duration::from_secs(config.sweep_interval_seconds.max(1)),
        }
    }

    pub fn in_memory(config: &SessionConfig) -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()), Arc::new(SystemClock), config)
    }

    pub async fn issue(&self) -> IssuedSession {
        let token = generate_token();
        let session = Session::starting_at(self.clock.now(), self.duration);
        self.store.put(session_key(&token), session).await;

        info!(token = %token_prefix(&token), expires_at = %session.expires_at, "session issued");
        IssuedSession { token, session }
    }

    /// Looks the token up, dropping it on the spot if it has already expired.
    pub async fn validate(&self, token: &str) -> SessionCheck {
        let key = session_key(token);
        let Some(session) = self.store.get(&key).await else {
            return SessionCheck::Missing;
        };

        if session.is_expired_at(self.clock.now()) {
            self.store.evict(&key).await;
            debug!(token = %token_prefix(token), "expired session evicted on lookup");
            return SessionCheck::Expired;
        }

        SessionCheck::Valid(session)
    }

    pub async fn revoke(&self, token: &str) -> bool {
        let removed = self.store.evict(&session_key(token)).await;
        if removed {
            info!(token = %token_prefix(token), "session revoked");
        }
        removed
    }

    pub async fn sweep(&self) -> usize {
        let evicted = self.store.evict_expired(self.clock.now()).await;
        if evicted > 0 {
            info!(evicted, "expired sessions swept");
        }
        evicted
    }

    pub fn spawn_sweeper(self: Arc<Self>) {
        let sweep_interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Clock that only moves when told to.
    pub(crate) struct ManualClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub(crate) fn new(now: DateTime<Utc>) -> Self {
            Self { now: StdMutex::new(now) }
        }

        pub(crate) fn advance(&self, by: chrono::Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn config() -> SessionConfig {
        SessionConfig {
            duration_seconds: 3600,
            sweep_interval_seconds: 300,
        }
    }

    pub(crate) fn manager_with_clock() -> (SessionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let manager = SessionManager::new(Arc::new(InMemorySessionStore::new()), clock.clone(), &config());
        (manager, clock)
    }

    #[tokio::test]
    async fn issued_token_is_hex_and_valid() {
        let (manager, clock) = manager_with_clock();

        let issued = manager.issue().await;

        assert_eq!(issued.token.len(), 64);
        assert!(issued.token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(issued.session.expires_at, clock.now() + chrono::Duration::hours(1));
        assert_eq!(manager.validate(&issued.token).await, SessionCheck::Valid(issued.session));
    }

    #[tokio::test]
    async fn oversized_duration_is_clamped() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let config = SessionConfig {
            duration_seconds: u64::MAX,
            ..config()
        };
        let manager = SessionManager::new(Arc::new(InMemorySessionStore::new()), clock.clone(), &config);

        let issued = manager.issue().await;

        assert_eq!(issued.session.expires_at, clock.now() + chrono::Duration::days(366));
        assert!(matches!(manager.validate(&issued.token).await, SessionCheck::Valid(_)));
    }

    #[tokio::test]
    async fn tokens_are_unique() {
        let (manager, _) = manager_with_clock();
        let first = manager.issue().await;
        let second = manager.issue().await;
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn unknown_token_is_missing() {
        let (manager, _) = manager_with_clock();
        assert_eq!(manager.validate("deadbeef").await, SessionCheck::Missing);
    }

    #[tokio::test]
    async fn session_is_valid_until_expiry_inclusive() {
        let (manager, clock) = manager_with_clock();
        let issued = manager.issue().await;

        clock.advance(chrono::Duration::hours(1));
        assert!(matches!(manager.validate(&issued.token).await, SessionCheck::Valid(_)));
        assert!(matches!(manager.validate(&issued.token).await, SessionCheck::Valid(_)));

        clock.advance(chrono::Duration::milliseconds(1));
        assert_eq!(manager.validate(&issued.token).await, SessionCheck::Expired);
        // Lazy eviction removed it, so the next lookup no longer knows the token.
        assert_eq!(manager.validate(&issued.token).await, SessionCheck::Missing);
    }

    #[tokio::test]
    async fn sweep_drops_only_expired_sessions() {
        let (manager, clock) = manager_with_clock();
        let old = manager.issue().await;
        clock.advance(chrono::Duration::minutes(45));
        let fresh = manager.issue().await;
        clock.advance(chrono::Duration::minutes(30));

        assert_eq!(manager.sweep().await, 1);
        assert_eq!(manager.validate(&old.token).await, SessionCheck::Missing);
        assert!(matches!(manager.validate(&fresh.token).await, SessionCheck::Valid(_)));
    }

    #[tokio::test]
    async fn revoke_invalidates_token() {
        let (manager, _) = manager_with_clock();
        let issued = manager.issue().await;

        assert!(manager.revoke(&issued.token).await);
        assert!(!manager.revoke(&issued.token).await);
        assert_eq!(manager.validate(&issued.token).await, SessionCheck::Missing);
    }

    #[tokio::test]
    async fn store_never_sees_raw_token() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), Arc::new(SystemClock), &config());
        let issued = manager.issue().await;

        assert!(store.get(&issued.token).await.is_none());
        assert!(store.get(&session_key(&issued.token)).await.is_some());
    }

    #[test]
    fn token_prefix_is_short() {
        assert_eq!(token_prefix("0123456789abcdef"), "01234567");
        assert_eq!(token_prefix("abc"), "abc");
    }
}
