//! Create `kms_key` and `project_kms_key` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(KmsKey::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(KmsKey::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(KmsKey::EncryptedDataKey).blob().not_null())
                    .col(
                        ColumnDef::new(KmsKey::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectKmsKey::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProjectKmsKey::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProjectKmsKey::ProjectId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectKmsKey::Purpose)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectKmsKey::KmsKeyId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProjectKmsKey::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_kms_key_kms_key")
                            .from(ProjectKmsKey::Table, ProjectKmsKey::KmsKeyId)
                            .to(KmsKey::Table, KmsKey::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One key per project and purpose
        manager
            .create_index(
                Index::create()
                    .name("idx_project_kms_key_project_purpose")
                    .table(ProjectKmsKey::Table)
                    .col(ProjectKmsKey::ProjectId)
                    .col(ProjectKmsKey::Purpose)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectKmsKey::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(KmsKey::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum KmsKey {
    Table,
    Id,
    EncryptedDataKey,
    CreatedAt,
}

#[derive(Iden)]
enum ProjectKmsKey {
    Table,
    Id,
    ProjectId,
    Purpose,
    KmsKeyId,
    CreatedAt,
}
