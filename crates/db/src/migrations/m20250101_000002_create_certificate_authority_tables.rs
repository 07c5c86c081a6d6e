//! Create certificate authority tables migration.
//!
//! `certificate_authority` plus its one-to-one children: certificate, secret
//! and CRL. Children go away with the CA.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CertificateAuthority::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CertificateAuthority::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::ProjectId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CertificateAuthority::ParentCaId).string_len(32))
                    .col(
                        ColumnDef::new(CertificateAuthority::CaType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::Status)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CertificateAuthority::Dn).text().not_null())
                    .col(
                        ColumnDef::new(CertificateAuthority::CommonName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::Organization)
                            .string_len(256)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::Ou)
                            .string_len(256)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::Country)
                            .string_len(2)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::Province)
                            .string_len(256)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::Locality)
                            .string_len(256)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::KeyAlgorithm)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::MaxPathLength)
                            .integer()
                            .not_null()
                            .default(-1),
                    )
                    .col(ColumnDef::new(CertificateAuthority::SerialNumber).string_len(128))
                    .col(ColumnDef::new(CertificateAuthority::NotBefore).timestamp_with_time_zone())
                    .col(ColumnDef::new(CertificateAuthority::NotAfter).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(CertificateAuthority::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthority::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_authority_parent")
                            .from(CertificateAuthority::Table, CertificateAuthority::ParentCaId)
                            .to(CertificateAuthority::Table, CertificateAuthority::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_authority_project_dn")
                    .table(CertificateAuthority::Table)
                    .col(CertificateAuthority::ProjectId)
                    .col(CertificateAuthority::Dn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CertificateAuthorityCert::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CertificateAuthorityCert::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCert::CaId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCert::EncryptedCertificate)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCert::EncryptedCertificateChain)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCert::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_authority_cert_ca")
                            .from(CertificateAuthorityCert::Table, CertificateAuthorityCert::CaId)
                            .to(CertificateAuthority::Table, CertificateAuthority::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CertificateAuthoritySecret::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CertificateAuthoritySecret::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthoritySecret::CaId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthoritySecret::EncryptedPrivateKey)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthoritySecret::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_authority_secret_ca")
                            .from(
                                CertificateAuthoritySecret::Table,
                                CertificateAuthoritySecret::CaId,
                            )
                            .to(CertificateAuthority::Table, CertificateAuthority::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CertificateAuthorityCrl::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CertificateAuthorityCrl::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCrl::CaId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCrl::EncryptedCrl)
                            .blob()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCrl::CrlNumber)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCrl::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CertificateAuthorityCrl::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_certificate_authority_crl_ca")
                            .from(CertificateAuthorityCrl::Table, CertificateAuthorityCrl::CaId)
                            .to(CertificateAuthority::Table, CertificateAuthority::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CertificateAuthorityCrl::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CertificateAuthoritySecret::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CertificateAuthorityCert::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CertificateAuthority::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CertificateAuthority {
    Table,
    Id,
    ProjectId,
    ParentCaId,
    CaType,
    Status,
    Dn,
    CommonName,
    Organization,
    Ou,
    Country,
    Province,
    Locality,
    KeyAlgorithm,
    MaxPathLength,
    SerialNumber,
    NotBefore,
    NotAfter,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CertificateAuthorityCert {
    Table,
    Id,
    CaId,
    EncryptedCertificate,
    EncryptedCertificateChain,
    CreatedAt,
}

#[derive(Iden)]
enum CertificateAuthoritySecret {
    Table,
    Id,
    CaId,
    EncryptedPrivateKey,
    CreatedAt,
}

#[derive(Iden)]
enum CertificateAuthorityCrl {
    Table,
    Id,
    CaId,
    EncryptedCrl,
    CrlNumber,
    CreatedAt,
    UpdatedAt,
}
