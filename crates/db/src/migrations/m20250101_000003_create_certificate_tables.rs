//! Create `certificate` and `certificate_body` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Certificate::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Certificate::ProjectId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificate::CaId).string_len(32))
                    .col(ColumnDef::new(Certificate::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Certificate::SerialNumber)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Certificate::CommonName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Certificate::NotBefore)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Certificate::NotAfter)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Certificate::RevokedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Certificate::RevocationReason).small_integer())
                    .col(
                        ColumnDef::new(Certificate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Certificate::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_ca")
                            .from(Certificate::Table, Certificate::CaId)
                            .to(CertificateAuthority::Table, CertificateAuthority::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // CRL regeneration lists revoked certificates per CA
        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_ca_status")
                    .table(Certificate::Table)
                    .col(Certificate::CaId)
                    .col(Certificate::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CertificateBody::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CertificateBody::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateBody::CertId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateBody::EncryptedCertificate)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateBody::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_body_certificate")
                            .from(CertificateBody::Table, CertificateBody::CertId)
                            .to(Certificate::Table, Certificate::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CertificateBody::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Certificate::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Certificate {
    Table,
    Id,
    ProjectId,
    CaId,
    Status,
    SerialNumber,
    CommonName,
    NotBefore,
    NotAfter,
    RevokedAt,
    RevocationReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CertificateBody {
    Table,
    Id,
    CertId,
    EncryptedCertificate,
    CreatedAt,
}

#[derive(Iden)]
enum CertificateAuthority {
    Table,
    Id,
}
