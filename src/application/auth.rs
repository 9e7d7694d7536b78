//! Admin sign-in and bearer sessions.

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use dashmap::DashMap;
use metrics::counter;
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::metrics::METRIC_ADMIN_LOGINS;

const TOKEN_PREFIX: &str = "bsa_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("admin sign-in is not configured")]
    NotConfigured,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing or invalid session token")]
    InvalidToken,
    #[error("session expired")]
    Expired,
}

/// Credentials accepted by the admin sign-in.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Identity attached to authenticated admin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub username: String,
}

#[derive(Debug, Clone)]
struct SessionEntry {
    username: String,
    expires_at: OffsetDateTime,
}

/// Issues and validates admin bearer tokens. Only SHA-256 digests of
/// tokens are retained.
#[derive(Clone)]
pub struct AdminAuthService {
    credentials: Option<AdminCredentials>,
    ttl: Duration,
    sessions: Arc<DashMap<Vec<u8>, SessionEntry>>,
}

impl AdminAuthService {
    pub fn new(credentials: Option<AdminCredentials>, ttl: Duration) -> Self {
        Self {
            credentials,
            ttl,
            sessions: Arc::new(DashMap::new()),
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let credentials = self.credentials.as_ref().ok_or(AuthError::NotConfigured)?;

        let user_ok = digest(username).ct_eq(&digest(&credentials.username));
        let pass_ok = digest(password).ct_eq(&digest(&credentials.password));
        if (user_ok & pass_ok).unwrap_u8() == 0 {
            counter!(METRIC_ADMIN_LOGINS, "outcome" => "rejected").increment(1);
            warn!(
                target = "bravespace::application::auth",
                username, "admin sign-in rejected"
            );
            return Err(AuthError::InvalidCredentials);
        }

        self.purge_expired();

        let token = generate_token();
        let expires_at = OffsetDateTime::now_utc() + self.ttl;
        self.sessions.insert(
            digest(&token),
            SessionEntry {
                username: credentials.username.clone(),
                expires_at,
            },
        );

        counter!(METRIC_ADMIN_LOGINS, "outcome" => "accepted").increment(1);
        info!(
            target = "bravespace::application::auth",
            username, "admin signed in"
        );
        Ok(IssuedSession { token, expires_at })
    }

    pub fn authenticate(&self, token: &str) -> Result<AdminPrincipal, AuthError> {
        if !token.starts_with(TOKEN_PREFIX) {
            return Err(AuthError::InvalidToken);
        }

        let key = digest(token);
        let entry = self
            .sessions
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::InvalidToken)?;

        if entry.expires_at <= OffsetDateTime::now_utc() {
            self.sessions.remove(&key);
            return Err(AuthError::Expired);
        }

        Ok(AdminPrincipal {
            username: entry.username,
        })
    }

    /// Revoke a token. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) {
        self.sessions.remove(&digest(token));
    }

    fn purge_expired(&self) {
        let now = OffsetDateTime::now_utc();
        self.sessions.retain(|_, entry| entry.expires_at > now);
    }
}

fn digest(value: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_token() -> String {
    let mut raw = [0u8; 32];
    raw[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    raw[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(raw))
}
