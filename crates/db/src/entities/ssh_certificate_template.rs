//! SSH certificate template entity (issuance policy under an SSH CA).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::ssh_certificate_authority::SshStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ssh_certificate_template")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub ssh_ca_id: String,

    pub status: SshStatus,

    /// Unique per SSH CA
    pub name: String,

    /// Default lifetime in seconds
    pub ttl: i64,

    pub min_ttl: i64,

    pub max_ttl: i64,

    /// JSON array of usernames; `"*"` allows any
    #[sea_orm(column_type = "JsonBinary")]
    pub allowed_users: Json,

    /// JSON array of hostnames; `"*"` allows any, `"*.example.com"` allows subdomains
    #[sea_orm(column_type = "JsonBinary")]
    pub allowed_hosts: Json,

    pub allow_user_certificates: bool,

    pub allow_host_certificates: bool,

    pub allow_custom_key_ids: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// `allowed_users` as strings. Non-string entries are ignored.
    #[must_use]
    pub fn allowed_users(&self) -> Vec<String> {
        json_strings(&self.allowed_users)
    }

    /// `allowed_hosts` as strings. Non-string entries are ignored.
    #[must_use]
    pub fn allowed_hosts(&self) -> Vec<String> {
        json_strings(&self.allowed_hosts)
    }
}

fn json_strings(value: &Json) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
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
