//! KMS key entity (data keys wrapped by the root key).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "kms_key")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// 256-bit data key sealed with the root key (`nonce || ciphertext`)
    #[serde(skip_serializing)]
    pub encrypted_data_key: Vec<u8>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_kms_key::Entity")]
    ProjectKmsKey,
}

impl Related<super::project_kms_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProjectKmsKey.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
