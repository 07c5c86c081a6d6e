//! Certificate authority certificate entity (one per CA, written once).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate_authority_cert")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub ca_id: String,

    /// Encrypted DER certificate
    pub encrypted_certificate: Vec<u8>,

    /// Encrypted PEM chain above the certificate (encrypts `""` for a root)
    pub encrypted_certificate_chain: Vec<u8>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::certificate_authority::Entity",
        from = "Column::CaId",
        to = "super::certificate_authority::Column::Id",
        on_delete = "Cascade"
    )]
    CertificateAuthority,
}

impl Related<super::certificate_authority::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CertificateAuthority.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
