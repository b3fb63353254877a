//! Demo credential check for the dashboard login.
//!
//! Tokens are `base64url(claims).base64url(hmac_sha256(claims))`. Nothing else in the agent
//! looks at them; the data routes stay open.

use std::collections::HashMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{AuthConfig, MAX_TOKEN_TTL_SECS};
use hmac::{Hmac, Mac};
use log::{info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("malformed or forged token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("token has been revoked")]
    Revoked,
    #[error("token signing unavailable")]
    SigningFailed,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    jti: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

pub struct Authenticator {
    username: String,
    password: String,
    secret: Vec<u8>,
    ttl: Duration,
    // token -> expiry (unix seconds), pruned on each logout
    revoked: Mutex<HashMap<String, i64>>,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            secret: config.token_secret.as_bytes().to_vec(),
            ttl: Duration::seconds(config.token_ttl_secs.min(MAX_TOKEN_TTL_SECS) as i64),
            revoked: Mutex::new(HashMap::new()),
        }
    }

    pub fn login(&self, username: &str, password: &str, now: DateTime<Utc>) -> Result<Session, AuthError> {
        if username != self.username || password != self.password {
            warn!("Rejected login for user {:?}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: username.to_string(),
            exp: expires_at.timestamp(),
            jti: format!("{:016x}", rand::random::<u64>()),
        };
        let payload = serde_json::to_vec(&claims).map_err(|_| AuthError::SigningFailed)?;
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes())?);

        info!("User {} logged in", username);
        Ok(Session {
            token: format!("{}.{}", payload, signature),
            username: username.to_string(),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| AuthError::InvalidToken)?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or(AuthError::InvalidToken)?;

        if self.revoked.lock().contains_key(token) {
            return Err(AuthError::Revoked);
        }
        if claims.exp <= now.timestamp() {
            return Err(AuthError::TokenExpired);
        }

        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().ok_or(AuthError::InvalidToken)?;
        Ok(Identity { username: claims.sub, expires_at })
    }

    /// Revoke a still-valid token.
    pub fn logout(&self, token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let identity = self.verify(token, now)?;
        let mut revoked = self.revoked.lock();
        let cutoff = now.timestamp();
        revoked.retain(|_, exp| *exp > cutoff);
        revoked.insert(token.to_string(), identity.expires_at.timestamp());
        info!("User {} logged out", identity.username);
        Ok(())
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        <HmacSha256 as Mac>::new_from_slice(&self.secret).map_err(|_| AuthError::SigningFailed)
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut mac = self.mac()?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}
