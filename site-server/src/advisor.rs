//! Advisor login gate
//!
//! SHA-256 password check against a configured hex digest, then an opaque
//! session token with a sliding expiry held in an in-memory store. The
//! comparison runs server-side; the gate is still documented as an
//! obfuscation layer rather than a security boundary.

use crate::config::AdvisorConfig;
use crate::logger::Logger;
use http::{HeaderMap, header};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AdvisorGate {
    config: AdvisorConfig,
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    logger: Logger,
}

struct SessionEntry {
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_in_seconds: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Valid,
    Missing,
    Expired,
}

impl AdvisorGate {
    pub fn new(config: AdvisorConfig, logger: Logger) -> Self {
        Self {
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            logger,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    pub fn session_ttl(&self) -> Duration {
        self.config.session_ttl
    }

    /// Check a password attempt. Hashing first keeps the comparison
    /// constant-time over the digest rather than the input.
    pub fn password_matches(&self, attempt: &str) -> bool {
        let digest = hex::encode(Sha256::digest(attempt.as_bytes()));
        constant_time_eq(digest.as_bytes(), self.config.password_hash.as_bytes())
    }

    pub async fn login(&self, password: &str) -> Option<IssuedSession> {
        if !self.password_matches(password) {
            self.logger.warn("advisor.login_rejected", serde_json::json!({}));
            return None;
        }
        let token = random_hex(24);
        let ttl = self.config.session_ttl;
        let mut sessions = self.sessions.lock().await;
        prune(&mut sessions);
        sessions.insert(
            token.clone(),
            SessionEntry {
                expires_at: Instant::now() + ttl,
            },
        );
        self.logger.info(
            "advisor.session_issued",
            serde_json::json!({ "ttlSeconds": ttl.as_secs() }),
        );
        Some(IssuedSession {
            token,
            expires_in_seconds: ttl.as_secs(),
        })
    }

    /// Validate the session cookie. A valid hit slides the expiry forward.
    pub async fn validate(&self, headers: &HeaderMap) -> SessionStatus {
        let Some(token) = extract_cookie(headers, &self.config.cookie_name) else {
            return SessionStatus::Missing;
        };
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&token) {
            Some(entry) if entry.expires_at > Instant::now() => {
                entry.expires_at = Instant::now() + self.config.session_ttl;
                SessionStatus::Valid
            }
            Some(_) => {
                sessions.remove(&token);
                SessionStatus::Expired
            }
            None => SessionStatus::Missing,
        }
    }

    pub async fn logout(&self, headers: &HeaderMap) {
        if let Some(token) = extract_cookie(headers, &self.config.cookie_name) {
            self.sessions.lock().await.remove(&token);
        }
    }
}

fn prune(sessions: &mut HashMap<String, SessionEntry>) {
    let now = Instant::now();
    sessions.retain(|_, entry| entry.expires_at > now);
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut diff = 0u8;
    for (a, b) in left.iter().zip(right.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

fn random_hex(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    let mut rng = StdRng::from_os_rng();
    rng.fill_bytes(&mut buffer);
    hex::encode(buffer)
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(|segment| segment.trim())
        .find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?.trim();
            if key != name {
                return None;
            }
            let value = parts.next()?.trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        })
}

pub fn build_session_cookie(name: &str, value: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        name,
        value,
        ttl.as_secs()
    )
}
