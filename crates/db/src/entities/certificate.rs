//! Issued leaf certificate entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Certificate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum CertStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "revoked")]
    Revoked,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Project of the issuing CA; outlives the CA link.
    pub project_id: String,

    /// Issuing CA. Cleared if the CA is deleted; the record itself survives.
    #[sea_orm(nullable)]
    pub ca_id: Option<String>,

    pub status: CertStatus,

    /// Hex serial number
    #[sea_orm(unique)]
    pub serial_number: String,

    pub common_name: String,

    pub not_before: DateTimeWithTimeZone,

    pub not_after: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub revoked_at: Option<DateTimeWithTimeZone>,

    /// RFC 5280 reason code
    #[sea_orm(nullable)]
    pub revocation_reason: Option<i16>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::certificate_authority::Entity",
        from = "Column::CaId",
        to = "super::certificate_authority::Column::Id",
        on_delete = "SetNull"
    )]
    CertificateAuthority,
    #[sea_orm(has_one = "super::certificate_body::Entity")]
    Body,
}

impl Related<super::certificate_authority::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CertificateAuthority.def()
    }
}

impl Related<super::certificate_body::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Body.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
