//! Signing boundary: JWT issuance and validation.
//!
//! Tokens are a pure function of the account's public fields plus the
//! configured signing secret; nothing here reads or writes persisted state.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TokenConfig;
use crate::entities::accounts::Role;
use crate::services::account_service::AccountInfo;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token signing secret is not configured")]
    KeyMissing,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: String,

    pub username: String,

    pub email: String,

    pub role: Role,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expiry (unix seconds)
    pub exp: i64,

    pub iss: String,

    pub aud: String,
}

pub fn issue(account: &AccountInfo, config: &TokenConfig) -> Result<String, TokenError> {
    if config.secret.is_empty() {
        return Err(TokenError::KeyMissing);
    }

    let now = Utc::now();
    let claims = Claims {
        sub: account.id.clone(),
        username: account.username.clone(),
        email: account.email.clone(),
        role: account.role,
        iat: now.timestamp(),
        exp: (now + Duration::days(config.expiry_days)).timestamp(),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Validate signature, expiry, issuer, and audience, and return the claims.
pub fn decode_token(token: &str, config: &TokenConfig) -> Result<Claims, TokenError> {
    if config.secret.is_empty() {
        return Err(TokenError::KeyMissing);
    }

    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}
