//! Project KMS key entity (which data key protects a project's material).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a project key encrypts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum KmsKeyPurpose {
    /// X.509 CA keys, certificates and CRLs.
    #[sea_orm(string_value = "certificate")]
    Certificate,
    /// SSH CA keys and certificates.
    #[sea_orm(string_value = "ssh")]
    Ssh,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_kms_key")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub project_id: String,

    pub purpose: KmsKeyPurpose,

    pub kms_key_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::kms_key::Entity",
        from = "Column::KmsKeyId",
        to = "super::kms_key::Column::Id",
        on_delete = "Cascade"
    )]
    KmsKey,
}

impl Related<super::kms_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KmsKey.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
