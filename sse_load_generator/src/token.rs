//! Subscriber token minting.
//!
//! Every connection presents the same HS256 JWT, minted once at startup. The
//! token grants subscription to every topic (`mercure.subscribe = ["*"]`) and
//! expires after a fixed window. It is never refreshed, so connections opened
//! after the window closes are rejected by the hub.
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const SUBSCRIBE_ALL: &str = "*";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("system clock is before the unix epoch")]
    Clock,
    #[error("token expiry is out of range")]
    Expiry,
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MercureScope {
    pub subscribe: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberClaims {
    pub mercure: MercureScope,
    pub exp: u64,
}

/// Signed bearer token shared read-only by every connection.
///
/// `Debug` redacts the token so it never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Mints a subscriber token valid for [`DEFAULT_TOKEN_TTL`].
pub fn issue(secret: &[u8]) -> Result<Credential, TokenError> {
    issue_with_ttl(secret, DEFAULT_TOKEN_TTL)
}

pub fn issue_with_ttl(secret: &[u8], ttl: Duration) -> Result<Credential, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::EmptySecret);
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::Clock)?;
    let claims = SubscriberClaims {
        mercure: MercureScope {
            subscribe: vec![SUBSCRIBE_ALL.to_string()],
        },
        exp: now.checked_add(ttl).ok_or(TokenError::Expiry)?.as_secs(),
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?;
    Ok(Credential(token))
}
