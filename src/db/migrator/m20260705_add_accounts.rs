use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Create accounts table; username/email uniqueness comes from the
        // entity definition and is enforced by the storage layer.
        manager
            .create_table(
                schema
                    .create_table_from_entity(Accounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Lookup indexes for the verification and reset token flows.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_accounts_email_verification_token")
                    .table(Accounts)
                    .col(crate::entities::accounts::Column::EmailVerificationToken)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_accounts_password_reset_token")
                    .table(Accounts)
                    .col(crate::entities::accounts::Column::PasswordResetToken)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts).to_owned())
            .await?;

        Ok(())
    }
}
