use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Stored lowercase; lookups normalize before comparing.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id PHC string. Never leaves the persistence layer.
    pub password_hash: String,

    pub role: Role,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub avatar: Option<String>,

    pub is_email_verified: bool,

    /// Random hex token (64 chars), cleared once the email is confirmed.
    pub email_verification_token: Option<String>,

    pub email_verification_expires: Option<String>,

    pub password_reset_token: Option<String>,

    pub password_reset_expires: Option<String>,

    /// Failed verification count for the current lockout window.
    pub login_attempts: i32,

    /// RFC3339; present and in the future while the account is locked.
    pub lock_until: Option<String>,

    pub last_login_at: Option<String>,

    /// Soft-delete flag. Inactive accounts never match credential lookups.
    pub is_active: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "moderator")]
    Moderator,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the lockout window is still open.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_remaining().is_some()
    }

    /// Time left until the lock expires, if the account is locked.
    #[must_use]
    pub fn lock_remaining(&self) -> Option<std::time::Duration> {
        let until = DateTime::parse_from_rfc3339(self.lock_until.as_deref()?)
            .ok()?
            .with_timezone(&Utc);
        (until - Utc::now())
            .to_std()
            .ok()
            .filter(|remaining| !remaining.is_zero())
    }

    /// Display name, falling back to the username when the profile is incomplete.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            _ => self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Model {
        let now = Utc::now().to_rfc3339();
        Model {
            id: "test-id".to_string(),
            username: "nadeshiko".to_string(),
            email: "nadeshiko@example.com".to_string(),
            password_hash: String::new(),
            role: Role::User,
            first_name: None,
            last_name: None,
            avatar: None,
            is_email_verified: false,
            email_verification_token: None,
            email_verification_expires: None,
            password_reset_token: None,
            password_reset_expires: None,
            login_attempts: 0,
            lock_until: None,
            last_login_at: None,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    #[test]
    fn lock_state_follows_lock_until() {
        let mut model = account();
        assert!(!model.is_locked());

        model.lock_until = Some((Utc::now() + chrono::Duration::hours(2)).to_rfc3339());
        assert!(model.is_locked());
        let remaining = model.lock_remaining().unwrap();
        assert!(remaining.as_secs() > 7100 && remaining.as_secs() <= 7200);

        model.lock_until = Some((Utc::now() - chrono::Duration::minutes(1)).to_rfc3339());
        assert!(!model.is_locked());
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let mut model = account();
        assert_eq!(model.full_name(), "nadeshiko");

        model.first_name = Some("Nadeshiko".to_string());
        assert_eq!(model.full_name(), "nadeshiko");

        model.last_name = Some("Kagamihara".to_string());
        assert_eq!(model.full_name(), "Nadeshiko Kagamihara");
    }
}
