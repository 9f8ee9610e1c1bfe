use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::LockoutConfig;
use crate::entities::accounts;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{AccountRepository, generate_token};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> AccountRepository {
        AccountRepository::new(self.conn.clone())
    }

    pub async fn insert_account(&self, account: accounts::ActiveModel) -> Result<accounts::Model> {
        self.account_repo().insert(account).await
    }

    pub async fn get_account(&self, id: &str) -> Result<Option<accounts::Model>> {
        self.account_repo().find_by_id(id).await
    }

    pub async fn find_account_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<accounts::Model>> {
        self.account_repo()
            .find_active_by_identifier(identifier)
            .await
    }

    pub async fn record_failed_attempt(&self, id: &str, policy: &LockoutConfig) -> Result<()> {
        self.account_repo().record_failed_attempt(id, policy).await
    }

    pub async fn mark_login_success(&self, id: &str) -> Result<()> {
        self.account_repo().mark_login_success(id).await
    }

    pub async fn update_account_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.account_repo().update_password(id, password_hash).await
    }

    pub async fn update_account_profile(
        &self,
        id: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<u64> {
        self.account_repo()
            .update_profile(id, first_name, last_name, avatar)
            .await
    }

    pub async fn deactivate_account(&self, id: &str) -> Result<u64> {
        self.account_repo().deactivate(id).await
    }

    pub async fn set_email_verification(
        &self,
        id: &str,
        token: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.account_repo()
            .set_email_verification(id, token, expires_at)
            .await
    }

    pub async fn confirm_email(&self, token: &str) -> Result<bool> {
        self.account_repo().confirm_email(token).await
    }

    pub async fn set_password_reset(&self, id: &str, token: &str, expires_at: &str) -> Result<()> {
        self.account_repo()
            .set_password_reset(id, token, expires_at)
            .await
    }

    pub async fn reset_password(&self, token: &str, password_hash: &str) -> Result<bool> {
        self.account_repo().reset_password(token, password_hash).await
    }
}
