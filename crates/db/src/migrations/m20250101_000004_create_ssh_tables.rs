//! Create SSH certificate authority tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SshCertificateAuthority::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SshCertificateAuthority::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthority::ProjectId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthority::FriendlyName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthority::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthority::KeyAlgorithm)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthority::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthority::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ssh_certificate_authority_project_id")
                    .table(SshCertificateAuthority::Table)
                    .col(SshCertificateAuthority::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SshCertificateAuthoritySecret::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SshCertificateAuthoritySecret::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthoritySecret::SshCaId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthoritySecret::EncryptedPrivateKey)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateAuthoritySecret::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ssh_certificate_authority_secret_ca")
                            .from(
                                SshCertificateAuthoritySecret::Table,
                                SshCertificateAuthoritySecret::SshCaId,
                            )
                            .to(SshCertificateAuthority::Table, SshCertificateAuthority::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SshCertificateTemplate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SshCertificateTemplate::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::SshCaId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::Name)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::Ttl)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::MinTtl)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::MaxTtl)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::AllowedUsers)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::AllowedHosts)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::AllowUserCertificates)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::AllowHostCertificates)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::AllowCustomKeyIds)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SshCertificateTemplate::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ssh_certificate_template_ca")
                            .from(SshCertificateTemplate::Table, SshCertificateTemplate::SshCaId)
                            .to(SshCertificateAuthority::Table, SshCertificateAuthority::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ssh_certificate_template_ca_name")
                    .table(SshCertificateTemplate::Table)
                    .col(SshCertificateTemplate::SshCaId)
                    .col(SshCertificateTemplate::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SshCertificate::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SshCertificate::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SshCertificate::SshCaId).string_len(32))
                    .col(ColumnDef::new(SshCertificate::SshCertificateTemplateId).string_len(32))
                    .col(
                        ColumnDef::new(SshCertificate::SerialNumber)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificate::CertType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificate::Principals)
                            .json_binary()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SshCertificate::KeyId).string_len(256).not_null())
                    .col(
                        ColumnDef::new(SshCertificate::NotBefore)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificate::NotAfter)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificate::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ssh_certificate_ca")
                            .from(SshCertificate::Table, SshCertificate::SshCaId)
                            .to(SshCertificateAuthority::Table, SshCertificateAuthority::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ssh_certificate_template")
                            .from(SshCertificate::Table, SshCertificate::SshCertificateTemplateId)
                            .to(SshCertificateTemplate::Table, SshCertificateTemplate::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SshCertificateBody::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SshCertificateBody::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateBody::SshCertId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateBody::EncryptedCertificate)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SshCertificateBody::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ssh_certificate_body_certificate")
                            .from(SshCertificateBody::Table, SshCertificateBody::SshCertId)
                            .to(SshCertificate::Table, SshCertificate::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SshCertificateBody::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SshCertificate::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SshCertificateTemplate::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SshCertificateAuthoritySecret::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SshCertificateAuthority::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SshCertificateAuthority {
    Table,
    Id,
    ProjectId,
    FriendlyName,
    Status,
    KeyAlgorithm,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SshCertificateAuthoritySecret {
    Table,
    Id,
    SshCaId,
    EncryptedPrivateKey,
    CreatedAt,
}

#[derive(Iden)]
enum SshCertificateTemplate {
    Table,
    Id,
    SshCaId,
    Status,
    Name,
    Ttl,
    MinTtl,
    MaxTtl,
    AllowedUsers,
    AllowedHosts,
    AllowUserCertificates,
    AllowHostCertificates,
    AllowCustomKeyIds,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SshCertificate {
    Table,
    Id,
    SshCaId,
    SshCertificateTemplateId,
    SerialNumber,
    CertType,
    Principals,
    KeyId,
    NotBefore,
    NotAfter,
    CreatedAt,
}

#[derive(Iden)]
enum SshCertificateBody {
    Table,
    Id,
    SshCertId,
    EncryptedCertificate,
    CreatedAt,
}
