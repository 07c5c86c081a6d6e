//! Issued SSH certificate entity.

use certvault_common::SshCertType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored form of [`SshCertType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum SshCertificateType {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "host")]
    Host,
}

impl From<SshCertType> for SshCertificateType {
    fn from(value: SshCertType) -> Self {
        match value {
            SshCertType::User => Self::User,
            SshCertType::Host => Self::Host,
        }
    }
}

impl From<SshCertificateType> for SshCertType {
    fn from(value: SshCertificateType) -> Self {
        match value {
            SshCertificateType::User => Self::User,
            SshCertificateType::Host => Self::Host,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ssh_certificate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(nullable)]
    pub ssh_ca_id: Option<String>,

    #[sea_orm(nullable)]
    pub ssh_certificate_template_id: Option<String>,

    /// Decimal `u64` serial
    pub serial_number: String,

    pub cert_type: SshCertificateType,

    /// JSON array of principals, in request order
    #[sea_orm(column_type = "JsonBinary")]
    pub principals: Json,

    pub key_id: String,

    pub not_before: DateTimeWithTimeZone,

    pub not_after: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ssh_certificate_authority::Entity",
        from = "Column::SshCaId",
        to = "super::ssh_certificate_authority::Column::Id",
        on_delete = "SetNull"
    )]
    SshCertificateAuthority,
    #[sea_orm(
        belongs_to = "super::ssh_certificate_template::Entity",
        from = "Column::SshCertificateTemplateId",
        to = "super::ssh_certificate_template::Column::Id",
        on_delete = "SetNull"
    )]
    SshCertificateTemplate,
    #[sea_orm(has_one = "super::ssh_certificate_body::Entity")]
    Body,
}

impl Related<super::ssh_certificate_authority::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SshCertificateAuthority.def()
    }
}

impl Related<super::ssh_certificate_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SshCertificateTemplate.def()
    }
}

impl Related<super::ssh_certificate_body::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Body.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
