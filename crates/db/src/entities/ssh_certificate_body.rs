//! SSH certificate body entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ssh_certificate_body")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub ssh_cert_id: String,

    /// Encrypted OpenSSH certificate line
    pub encrypted_certificate: Vec<u8>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ssh_certificate::Entity",
        from = "Column::SshCertId",
        to = "super::ssh_certificate::Column::Id",
        on_delete = "Cascade"
    )]
    SshCertificate,
}

impl Related<super::ssh_certificate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SshCertificate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
