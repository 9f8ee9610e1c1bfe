//! Domain service for account credentials.
//!
//! Covers registration, credential verification with lockout accounting,
//! token issuance, and the account maintenance flows built on top of them.

use serde::Serialize;
use thiserror::Error;

use crate::entities::accounts::{self, Role};
use crate::services::token::TokenError;

/// Errors specific to account operations.
///
/// `NotFound` and `InvalidCredentials` deliberately render the same message
/// so callers cannot probe which usernames exist.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid credentials")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account temporarily locked, try again in {} seconds", .remaining.as_secs())]
    AccountLocked { remaining: std::time::Duration },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Token signing secret is not configured")]
    SigningKeyMissing,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for AccountError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::KeyMissing => Self::SigningKeyMissing,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Externally visible account representation.
///
/// This is the only serializable view of an account: the password hash and
/// the raw lockout bookkeeping never appear here, only the derived
/// `is_locked` flag.
#[derive(Debug, Clone, Serialize)]
pub struct AccountInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub is_email_verified: bool,
    pub is_locked: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<accounts::Model> for AccountInfo {
    fn from(model: accounts::Model) -> Self {
        Self {
            full_name: model.full_name(),
            is_locked: model.is_locked(),
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            first_name: model.first_name,
            last_name: model.last_name,
            avatar: model.avatar,
            is_email_verified: model.is_email_verified,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Registration input. The password arrives in plaintext and is hashed
/// before anything is persisted.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub profile: ProfileUpdate,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
}

/// Domain service trait for account credentials.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates an account after validating username, email, and password
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] for malformed input or a
    /// duplicate username/email.
    async fn register(&self, new_account: NewAccount) -> Result<AccountInfo, AccountError>;

    /// Verifies credentials for an active account looked up by username or
    /// email, applying failed-attempt accounting and the lockout policy.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NotFound`] or
    /// [`AccountError::InvalidCredentials`] (indistinguishable to callers),
    /// or [`AccountError::AccountLocked`] with the remaining lock duration.
    async fn find_by_credentials(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AccountInfo, AccountError>;

    /// Signs a token for a verified account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::SigningKeyMissing`] when no signing secret is
    /// configured.
    fn issue_token(&self, account: &AccountInfo) -> Result<String, AccountError>;

    /// Changes a password after verifying the current one.
    async fn change_password(
        &self,
        identifier: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;

    /// Updates profile fields only; never touches credentials.
    async fn update_profile(
        &self,
        id: &str,
        changes: ProfileUpdate,
    ) -> Result<AccountInfo, AccountError>;

    /// Soft-deletes an account. Inactive accounts no longer match
    /// credential lookups.
    async fn deactivate(&self, id: &str) -> Result<(), AccountError>;

    /// Issues an email verification token (24 hour expiry) and returns it
    /// for delivery.
    async fn start_email_verification(&self, id: &str) -> Result<String, AccountError>;

    /// Consumes a verification token and marks the email verified.
    async fn confirm_email(&self, token: &str) -> Result<(), AccountError>;

    /// Issues a password reset token (1 hour expiry). Returns `Ok(None)`
    /// for unknown addresses so the caller cannot probe which emails exist.
    async fn start_password_reset(&self, email: &str) -> Result<Option<String>, AccountError>;

    /// Consumes a reset token, stores the new password, and clears any
    /// lockout state.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountError>;
}
