//! # Single-Use HMAC Tokens
//!
//! The health authority hands each diagnosed reporter one token. A token
//! authorizes exactly one successful batch.
//!
//! ## Format
//!
//! ```text
//! v1.<nonce uuid>.<expiry unix seconds>.<hex HMAC-SHA256(secret, "v1.<nonce>.<expiry>")>
//! ```
//!
//! ## Security Properties
//!
//! - **HMAC-SHA256**: only holders of the server secret can mint tokens
//! - **Constant-time verification** via `Mac::verify_slice`
//! - **Time-bounded**: tokens past their expiry are refused
//! - **Replay prevention**: a consumed nonce is remembered until it expires

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;
use shared_types::Credential;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::AuthError;
use crate::ports::{AuthGrant, Authorizer};

type HmacSha256 = Hmac<Sha256>;

/// Token format version prefix.
pub const TOKEN_VERSION: &str = "v1";

/// Nonce table size that triggers eviction of expired entries.
pub const NONCE_CLEANUP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonceState {
    Reserved { expires_at: i64 },
    Consumed { expires_at: i64 },
}

impl NonceState {
    fn expires_at(&self) -> i64 {
        match self {
            NonceState::Reserved { expires_at } | NonceState::Consumed { expires_at } => {
                *expires_at
            }
        }
    }
}

/// Mint a token for `nonce`, valid until `expires_at` (Unix seconds).
pub fn issue_token(secret: &[u8], nonce: Uuid, expires_at: i64) -> String {
    let payload = format!("{TOKEN_VERSION}.{nonce}.{expires_at}");
    let tag = mac_for(secret, &payload)
        .map(|mac| mac.finalize().into_bytes().to_vec())
        .unwrap_or_default();
    format!("{payload}.{}", hex::encode(tag))
}

/// `None` only for key lengths HMAC rejects, which SHA-256 has none of.
fn mac_for(secret: &[u8], payload: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    Some(mac)
}

/// [`Authorizer`] accepting single-use tokens signed with a shared secret.
pub struct HmacTokenAuthorizer {
    secret: Vec<u8>,
    nonces: Mutex<HashMap<Uuid, NonceState>>,
}

impl HmacTokenAuthorizer {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            nonces: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a fresh token valid for `ttl`.
    pub fn issue(&self, ttl: Duration) -> String {
        let expires_at = (Utc::now() + ttl).timestamp();
        issue_token(&self.secret, Uuid::new_v4(), expires_at)
    }

    /// Nonces currently reserved or remembered as consumed.
    pub fn tracked_nonces(&self) -> usize {
        self.nonces.lock().len()
    }

    /// Check shape, signature and expiry; returns the nonce and expiry.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<(Uuid, i64), AuthError> {
        let mut parts = token.split('.');
        let (Some(version), Some(nonce_text), Some(expiry), Some(tag), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AuthError::Malformed("expected four dot-separated fields".into()));
        };

        if version != TOKEN_VERSION {
            return Err(AuthError::Malformed(format!(
                "unsupported token version '{version}'"
            )));
        }
        let nonce = Uuid::parse_str(nonce_text)
            .map_err(|e| AuthError::Malformed(format!("nonce: {e}")))?;
        let expires_at: i64 = expiry
            .parse()
            .map_err(|_| AuthError::Malformed("expiry is not an integer".into()))?;
        let tag = hex::decode(tag).map_err(|e| AuthError::Malformed(format!("signature: {e}")))?;

        let payload = format!("{version}.{nonce_text}.{expiry}");
        mac_for(&self.secret, &payload)
            .ok_or(AuthError::BadSignature)?
            .verify_slice(&tag)
            .map_err(|_| AuthError::BadSignature)?;

        if expires_at <= now.timestamp() {
            return Err(AuthError::Expired {
                expired_at: expires_at,
            });
        }

        Ok((nonce, expires_at))
    }

    fn grant_id(grant: &AuthGrant) -> Option<Uuid> {
        Uuid::parse_str(&grant.id).ok()
    }
}

impl Authorizer for HmacTokenAuthorizer {
    fn authorize(&self, credential: &Credential) -> Result<AuthGrant, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::Missing);
        }

        let now = Utc::now();
        let (nonce, expires_at) = self.verify(credential.as_str().trim(), now)?;

        let mut nonces = self.nonces.lock();
        if nonces.len() >= NONCE_CLEANUP_THRESHOLD {
            let cutoff = now.timestamp();
            nonces.retain(|_, state| state.expires_at() > cutoff);
        }

        match nonces.get(&nonce) {
            Some(NonceState::Consumed { .. }) => Err(AuthError::AlreadyUsed),
            Some(NonceState::Reserved { .. }) => Err(AuthError::InUse),
            None => {
                nonces.insert(nonce, NonceState::Reserved { expires_at });
                Ok(AuthGrant {
                    id: nonce.to_string(),
                    expires_at,
                })
            }
        }
    }

    fn consume(&self, grant: AuthGrant) {
        if let Some(nonce) = Self::grant_id(&grant) {
            self.nonces.lock().insert(
                nonce,
                NonceState::Consumed {
                    expires_at: grant.expires_at,
                },
            );
            debug!(nonce = %nonce, "[ha-03] Token consumed");
        }
    }

    fn release(&self, grant: AuthGrant) {
        if let Some(nonce) = Self::grant_id(&grant) {
            let mut nonces = self.nonces.lock();
            if matches!(nonces.get(&nonce), Some(NonceState::Reserved { .. })) {
                nonces.remove(&nonce);
                debug!(nonce = %nonce, "[ha-03] Token reservation released");
            }
        }
    }
}
