use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
};

use crate::config::LockoutConfig;
use crate::entities::accounts;

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, account: accounts::ActiveModel) -> Result<accounts::Model> {
        account
            .insert(&self.conn)
            .await
            .context("Failed to insert account")
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<accounts::Model>> {
        accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by id")
    }

    /// Look up one active account by email (case-insensitive) or username.
    pub async fn find_active_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<accounts::Model>> {
        accounts::Entity::find()
            .filter(accounts::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(accounts::Column::Email.eq(identifier.to_lowercase()))
                    .add(accounts::Column::Username.eq(identifier)),
            )
            .one(&self.conn)
            .await
            .context("Failed to query account by identifier")
    }

    /// Apply the failed-login transition as one conditional UPDATE.
    ///
    /// The guard excludes rows whose lock window is still open, so concurrent
    /// callers never under-count attempts or extend an existing lock:
    /// - an expired window restarts the counter at 1 and clears the lock
    /// - otherwise the counter is incremented, and the row is locked in the
    ///   same statement when the incremented count reaches the threshold
    pub async fn record_failed_attempt(&self, id: &str, policy: &LockoutConfig) -> Result<()> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let lock_seconds = i64::try_from(policy.duration_seconds).unwrap_or(i64::MAX);
        let lock_expiry = (now
            + Duration::try_seconds(lock_seconds).unwrap_or_else(|| Duration::hours(2)))
        .to_rfc3339();

        let window_expired = Condition::all()
            .add(accounts::Column::LockUntil.is_not_null())
            .add(accounts::Column::LockUntil.lte(now_str.clone()));

        let next_attempts = Expr::case(window_expired.clone(), Expr::value(1))
            .finally(Expr::col(accounts::Column::LoginAttempts).add(Expr::value(1)));

        // `login_attempts + 1 >= max` on the pre-update value.
        let next_lock = Expr::case(window_expired, Expr::value(Option::<String>::None))
            .case(
                accounts::Column::LoginAttempts.gte(i64::from(policy.max_attempts) - 1),
                Expr::value(Some(lock_expiry)),
            )
            .finally(Expr::col(accounts::Column::LockUntil));

        accounts::Entity::update_many()
            .col_expr(accounts::Column::LoginAttempts, next_attempts.into())
            .col_expr(accounts::Column::LockUntil, next_lock.into())
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now_str.clone()))
            .filter(accounts::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(accounts::Column::LockUntil.is_null())
                    .add(accounts::Column::LockUntil.lte(now_str)),
            )
            .exec(&self.conn)
            .await
            .context("Failed to record failed login attempt")?;

        Ok(())
    }

    /// Clear attempt bookkeeping and stamp the login time in one UPDATE.
    pub async fn mark_login_success(&self, id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        accounts::Entity::update_many()
            .col_expr(accounts::Column::LoginAttempts, Expr::value(0))
            .col_expr(
                accounts::Column::LockUntil,
                Expr::value(Option::<String>::None),
            )
            .col_expr(accounts::Column::LastLoginAt, Expr::value(Some(now.clone())))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to reset login state")?;

        Ok(())
    }

    pub async fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        accounts::Entity::update_many()
            .col_expr(accounts::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update password hash")?;

        Ok(())
    }

    pub async fn update_profile(
        &self,
        id: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<u64> {
        let now = Utc::now().to_rfc3339();

        let mut update = accounts::Entity::update_many()
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id));

        if let Some(first) = first_name {
            update = update.col_expr(
                accounts::Column::FirstName,
                Expr::value(Some(first.to_string())),
            );
        }
        if let Some(last) = last_name {
            update = update.col_expr(
                accounts::Column::LastName,
                Expr::value(Some(last.to_string())),
            );
        }
        if let Some(avatar) = avatar {
            update = update.col_expr(
                accounts::Column::Avatar,
                Expr::value(Some(avatar.to_string())),
            );
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to update profile")?;

        Ok(result.rows_affected)
    }

    pub async fn deactivate(&self, id: &str) -> Result<u64> {
        let now = Utc::now().to_rfc3339();

        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::IsActive, Expr::value(false))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to deactivate account")?;

        Ok(result.rows_affected)
    }

    pub async fn set_email_verification(
        &self,
        id: &str,
        token: &str,
        expires_at: &str,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        accounts::Entity::update_many()
            .col_expr(
                accounts::Column::EmailVerificationToken,
                Expr::value(Some(token.to_string())),
            )
            .col_expr(
                accounts::Column::EmailVerificationExpires,
                Expr::value(Some(expires_at.to_string())),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store email verification token")?;

        Ok(())
    }

    /// Returns false when the token is unknown, expired, or already used.
    pub async fn confirm_email(&self, token: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();

        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::IsEmailVerified, Expr::value(true))
            .col_expr(
                accounts::Column::EmailVerificationToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                accounts::Column::EmailVerificationExpires,
                Expr::value(Option::<String>::None),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(accounts::Column::EmailVerificationToken.eq(token))
            .filter(accounts::Column::EmailVerificationExpires.gt(now))
            .filter(accounts::Column::IsActive.eq(true))
            .exec(&self.conn)
            .await
            .context("Failed to confirm email")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn set_password_reset(&self, id: &str, token: &str, expires_at: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        accounts::Entity::update_many()
            .col_expr(
                accounts::Column::PasswordResetToken,
                Expr::value(Some(token.to_string())),
            )
            .col_expr(
                accounts::Column::PasswordResetExpires,
                Expr::value(Some(expires_at.to_string())),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to store password reset token")?;

        Ok(())
    }

    /// Swap in the new hash and clear any lockout in one UPDATE.
    /// Returns false when the token is unknown, expired, or already used.
    pub async fn reset_password(&self, token: &str, password_hash: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();

        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(
                accounts::Column::PasswordResetToken,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                accounts::Column::PasswordResetExpires,
                Expr::value(Option::<String>::None),
            )
            .col_expr(accounts::Column::LoginAttempts, Expr::value(0))
            .col_expr(
                accounts::Column::LockUntil,
                Expr::value(Option::<String>::None),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(accounts::Column::PasswordResetToken.eq(token))
            .filter(accounts::Column::PasswordResetExpires.gt(now))
            .filter(accounts::Column::IsActive.eq(true))
            .exec(&self.conn)
            .await
            .context("Failed to reset password")?;

        Ok(result.rows_affected > 0)
    }
}

/// Generate a random verification/reset token (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
