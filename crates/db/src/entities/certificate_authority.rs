//! Certificate authority entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Position of a CA in its hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum CaType {
    #[sea_orm(string_value = "root")]
    Root,
    #[sea_orm(string_value = "intermediate")]
    Intermediate,
}

/// Lifecycle state of a CA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "kebab-case")]
pub enum CaStatus {
    /// Certificate installed, may issue.
    #[sea_orm(string_value = "active")]
    Active,
    /// Intermediate waiting for its certificate to be imported.
    #[sea_orm(string_value = "pending-certificate")]
    PendingCertificate,
    /// Certificate installed, issuance blocked.
    #[sea_orm(string_value = "disabled")]
    Disabled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate_authority")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub project_id: String,

    /// CA whose subject matched this CA's issuer when its certificate was imported.
    /// Informational only; chain verification never consults it.
    #[sea_orm(nullable)]
    pub parent_ca_id: Option<String>,

    pub ca_type: CaType,

    pub status: CaStatus,

    /// Composed subject, e.g. `C=US, O=Acme, CN=Acme Root`
    pub dn: String,

    pub common_name: String,
    pub organization: String,
    pub ou: String,
    pub country: String,
    pub province: String,
    pub locality: String,

    /// `RSA_2048`, `RSA_4096`, `EC_prime256v1` or `EC_secp384r1`
    pub key_algorithm: String,

    /// -1 means unlimited
    pub max_path_length: i32,

    /// Hex serial of the installed certificate
    #[sea_orm(nullable)]
    pub serial_number: Option<String>,

    #[sea_orm(nullable)]
    pub not_before: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub not_after: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::certificate_authority_cert::Entity")]
    Cert,
    #[sea_orm(has_one = "super::certificate_authority_secret::Entity")]
    Secret,
    #[sea_orm(has_one = "super::certificate_authority_crl::Entity")]
    Crl,
    #[sea_orm(has_many = "super::certificate::Entity")]
    Certificate,
}

impl Related<super::certificate_authority_cert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cert.def()
    }
}

impl Related<super::certificate_authority_secret::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Secret.def()
    }
}

impl Related<super::certificate_authority_crl::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Crl.def()
    }
}

impl Related<super::certificate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
