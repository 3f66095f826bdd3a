//! In-memory session store.
//!
//! Sessions are opaque random tokens mapped to a user id with an absolute
//! expiry. Expiry is checked lazily on resolution; there is no background
//! sweep, since an expired entry costs a map slot until its token is next
//! presented (or the process restarts, which empties the store anyway).

use crate::types::UserId;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sessionId";

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Create a session for the user and return its opaque token.
    pub fn create(&self, user_id: UserId) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        self.sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: Utc::now() + self.ttl,
            },
        );
        token
    }

    /// Resolve a token to its user. Expired sessions are evicted here.
    pub fn resolve(&self, token: &str) -> Option<UserId> {
        let expired = match self.sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => return Some(session.user_id),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove(token);
        }
        None
    }

    /// Drop a session. Returns whether the token existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every session belonging to a user, e.g. after account deletion.
    pub fn revoke_user(&self, user_id: UserId) {
        self.sessions.retain(|_, session| session.user_id != user_id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_resolve_revoke() {
        let store = SessionStore::new(Duration::hours(24));
        let token = store.create(7);

        assert_eq!(store.resolve(&token), Some(7));
        assert!(store.revoke(&token));
        assert_eq!(store.resolve(&token), None);
        assert!(!store.revoke(&token));
    }

    #[test]
    fn tokens_are_unique_and_opaque() {
        let store = SessionStore::new(Duration::hours(24));
        let a = store.create(1);
        let b = store.create(1);
        assert_ne!(a, b);
        // 32 random bytes, base64url without padding
        assert_eq!(a.len(), 43);
        assert!(!a.contains('='));
    }

    #[test]
    fn expired_sessions_are_evicted_on_resolve() {
        let store = SessionStore::new(Duration::seconds(-1));
        let token = store.create(3);

        assert_eq!(store.len(), 1);
        assert_eq!(store.resolve(&token), None);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn revoke_user_drops_all_their_sessions() {
        let store = SessionStore::new(Duration::hours(24));
        let mine_a = store.create(1);
        let mine_b = store.create(1);
        let theirs = store.create(2);

        store.revoke_user(1);
        assert_eq!(store.resolve(&mine_a), None);
        assert_eq!(store.resolve(&mine_b), None);
        assert_eq!(store.resolve(&theirs), Some(2));
    }
}
