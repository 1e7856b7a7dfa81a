use chrono::{DateTime, Duration, Utc};

/// Lifetime of one issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn starting_at(created_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            created_at,
            expires_at: created_at + duration,
        }
    }

    /// A session stays valid up to and including its expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A freshly minted token together with the session it unlocks.
/// The raw token is only ever handed back to the client.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}
