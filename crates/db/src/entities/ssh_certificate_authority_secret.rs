//! SSH certificate authority secret entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ssh_certificate_authority_secret")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub ssh_ca_id: String,

    /// Encrypted OpenSSH private key
    #[serde(skip_serializing)]
    pub encrypted_private_key: Vec<u8>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ssh_certificate_authority::Entity",
        from = "Column::SshCaId",
        to = "super::ssh_certificate_authority::Column::Id",
        on_delete = "Cascade"
    )]
    SshCertificateAuthority,
}

impl Related<super::ssh_certificate_authority::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SshCertificateAuthority.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
