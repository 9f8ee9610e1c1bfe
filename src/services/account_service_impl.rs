//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sea_orm::{DbErr, Set, SqlErr};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{Config, SecurityConfig, TokenConfig};
use crate::db::{Store, generate_token};
use crate::entities::accounts::{self, Role};
use crate::services::account_service::{
    AccountError, AccountInfo, AccountService, NewAccount, ProfileUpdate,
};
use crate::services::{password, token};
use crate::validation;

const EMAIL_VERIFICATION_TTL_HOURS: i64 = 24;
const PASSWORD_RESET_TTL_HOURS: i64 = 1;

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
    token: TokenConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            store,
            security: config.security.clone(),
            token: config.token.clone(),
        }
    }

    async fn refreshed(&self, id: &str) -> Result<AccountInfo, AccountError> {
        self.store
            .get_account(id)
            .await?
            .map(AccountInfo::from)
            .ok_or(AccountError::NotFound)
    }
}

fn map_insert_error(err: anyhow::Error) -> AccountError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) =
        err.downcast_ref::<DbErr>().and_then(DbErr::sql_err)
    {
        if detail.contains("username") {
            return AccountError::Validation("Username is already taken".to_string());
        }
        if detail.contains("email") {
            return AccountError::Validation("Email is already registered".to_string());
        }
        return AccountError::Validation("Account already exists".to_string());
    }

    AccountError::Internal(err.to_string())
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(&self, new_account: NewAccount) -> Result<AccountInfo, AccountError> {
        let username = validation::validate_username(&new_account.username)?.to_string();
        let email = validation::validate_email(&new_account.email)?;
        validation::validate_password(&new_account.password)?;

        if let Some(first) = &new_account.profile.first_name {
            validation::validate_name("First name", first)?;
        }
        if let Some(last) = &new_account.profile.last_name {
            validation::validate_name("Last name", last)?;
        }

        let password_hash = password::hash(new_account.password, self.security.clone()).await?;

        let now = Utc::now().to_rfc3339();
        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(Role::User),
            first_name: Set(new_account.profile.first_name),
            last_name: Set(new_account.profile.last_name),
            avatar: Set(new_account.profile.avatar),
            is_email_verified: Set(false),
            email_verification_token: Set(None),
            email_verification_expires: Set(None),
            password_reset_token: Set(None),
            password_reset_expires: Set(None),
            login_attempts: Set(0),
            lock_until: Set(None),
            last_login_at: Set(None),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        match self.store.insert_account(account).await {
            Ok(created) => {
                info!(username = %created.username, "account registered");
                Ok(created.into())
            }
            Err(err) => Err(map_insert_error(err)),
        }
    }

    async fn find_by_credentials(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AccountInfo, AccountError> {
        let Some(account) = self.store.find_account_by_identifier(identifier).await? else {
            return Err(AccountError::NotFound);
        };

        // Locked accounts reject verification outright; the attempt counter
        // stays untouched so the lock cannot be extended by further guessing.
        if let Some(remaining) = account.lock_remaining() {
            debug!(username = %account.username, "login rejected: account locked");
            return Err(AccountError::AccountLocked { remaining });
        }

        let matches =
            password::verify(password.to_string(), account.password_hash.clone()).await?;

        if !matches {
            self.store
                .record_failed_attempt(&account.id, &self.security.lockout)
                .await?;
            debug!(username = %account.username, "login rejected: password mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        self.store.mark_login_success(&account.id).await?;
        debug!(username = %account.username, "login successful");

        self.refreshed(&account.id).await
    }

    fn issue_token(&self, account: &AccountInfo) -> Result<String, AccountError> {
        Ok(token::issue(account, &self.token)?)
    }

    async fn change_password(
        &self,
        identifier: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        validation::validate_password(new_password)?;

        if current_password == new_password {
            return Err(AccountError::Validation(
                "New password must be different from the current password".to_string(),
            ));
        }

        let Some(account) = self.store.find_account_by_identifier(identifier).await? else {
            return Err(AccountError::NotFound);
        };

        let matches = password::verify(
            current_password.to_string(),
            account.password_hash.clone(),
        )
        .await?;

        if !matches {
            return Err(AccountError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = password::hash(new_password.to_string(), self.security.clone()).await?;
        self.store
            .update_account_password(&account.id, &password_hash)
            .await?;

        info!(username = %account.username, "password changed");
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        changes: ProfileUpdate,
    ) -> Result<AccountInfo, AccountError> {
        if let Some(first) = &changes.first_name {
            validation::validate_name("First name", first)?;
        }
        if let Some(last) = &changes.last_name {
            validation::validate_name("Last name", last)?;
        }

        let updated = self
            .store
            .update_account_profile(
                id,
                changes.first_name.as_deref(),
                changes.last_name.as_deref(),
                changes.avatar.as_deref(),
            )
            .await?;

        if updated == 0 {
            return Err(AccountError::NotFound);
        }

        self.refreshed(id).await
    }

    async fn deactivate(&self, id: &str) -> Result<(), AccountError> {
        let updated = self.store.deactivate_account(id).await?;
        if updated == 0 {
            return Err(AccountError::NotFound);
        }

        info!(id, "account deactivated");
        Ok(())
    }

    async fn start_email_verification(&self, id: &str) -> Result<String, AccountError> {
        let Some(account) = self.store.get_account(id).await? else {
            return Err(AccountError::NotFound);
        };

        let verification_token = generate_token();
        let expires_at =
            (Utc::now() + Duration::hours(EMAIL_VERIFICATION_TTL_HOURS)).to_rfc3339();

        self.store
            .set_email_verification(&account.id, &verification_token, &expires_at)
            .await?;

        debug!(username = %account.username, "email verification token issued");
        Ok(verification_token)
    }

    async fn confirm_email(&self, token: &str) -> Result<(), AccountError> {
        if self.store.confirm_email(token).await? {
            Ok(())
        } else {
            Err(AccountError::Validation(
                "Verification token is invalid or expired".to_string(),
            ))
        }
    }

    async fn start_password_reset(&self, email: &str) -> Result<Option<String>, AccountError> {
        let email = validation::validate_email(email)?;

        let Some(account) = self.store.find_account_by_identifier(&email).await? else {
            // Unknown address: succeed without a token so callers cannot
            // probe which emails are registered.
            return Ok(None);
        };

        let reset_token = generate_token();
        let expires_at = (Utc::now() + Duration::hours(PASSWORD_RESET_TTL_HOURS)).to_rfc3339();

        self.store
            .set_password_reset(&account.id, &reset_token, &expires_at)
            .await?;

        info!(username = %account.username, "password reset token issued");
        Ok(Some(reset_token))
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountError> {
        validation::validate_password(new_password)?;

        let password_hash = password::hash(new_password.to_string(), self.security.clone()).await?;

        if self.store.reset_password(token, &password_hash).await? {
            Ok(())
        } else {
            Err(AccountError::Validation(
                "Reset token is invalid or expired".to_string(),
            ))
        }
    }
}
