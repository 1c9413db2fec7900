//! Bearer-token sessions.
//!
//! Tokens are 32 random bytes, URL-safe base64. Only the SHA-256 hash of a
//! token is held; the registry lives in memory, so a restart signs
//! everyone out.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

/// The signed-in account behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub account_id: Uuid,
    pub email: String,
}

struct SessionEntry {
    identity: Identity,
    expires_at: Instant,
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub struct SessionRegistry {
    sessions: HashMap<[u8; 32], SessionEntry>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Start a session and return the plaintext token (shown once).
    pub fn issue(&mut self, identity: Identity) -> String {
        self.cleanup();
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            SessionEntry {
                identity,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Resolve a token to its identity. Expired tokens are dropped.
    pub fn resolve(&mut self, token: &str) -> Option<Identity> {
        let key = hash_token(token);
        let entry = self.sessions.get(&key)?;
        if Instant::now() >= entry.expires_at {
            self.sessions.remove(&key);
            return None;
        }
        Some(entry.identity.clone())
    }

    /// End a session. Returns `false` if the token was unknown.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    pub fn active_count(&self) -> usize {
        let now = Instant::now();
        self.sessions.values().filter(|e| now < e.expires_at).count()
    }

    fn cleanup(&mut self) {
        let now = Instant::now();
        self.sessions.retain(|_, e| now < e.expires_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            account_id: Uuid::new_v4(),
            email: "donor@example.com".into(),
        }
    }

    #[test]
    fn issued_token_resolves() {
        let mut registry = SessionRegistry::new(Duration::from_secs(60));
        let who = identity();
        let token = registry.issue(who.clone());
        assert_eq!(registry.resolve(&token), Some(who));
    }

    #[test]
    fn unknown_token_is_none() {
        let mut registry = SessionRegistry::new(Duration::from_secs(60));
        registry.issue(identity());
        assert!(registry.resolve("made-up-token").is_none());
    }

    #[test]
    fn revoked_token_no_longer_resolves() {
        let mut registry = SessionRegistry::new(Duration::from_secs(60));
        let token = registry.issue(identity());
        assert!(registry.revoke(&token));
        assert!(registry.resolve(&token).is_none());
        assert!(!registry.revoke(&token));
    }

    #[test]
    fn expired_token_is_dropped() {
        let mut registry = SessionRegistry::new(Duration::ZERO);
        let token = registry.issue(identity());
        assert!(registry.resolve(&token).is_none());
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.len(), 43);
    }

    #[test]
    fn hash_token_is_deterministic() {
        assert_eq!(hash_token("test"), hash_token("test"));
        assert_ne!(hash_token("test"), hash_token("other"));
    }
}
