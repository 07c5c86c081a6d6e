//! SSH certificate authority repository.

use std::sync::Arc;

use crate::entities::{
    SshCertificateAuthority, SshCertificateAuthoritySecret, ssh_certificate_authority,
    ssh_certificate_authority_secret,
};
use certvault_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// SSH certificate authority repository for database operations.
#[derive(Clone)]
pub struct SshCertificateAuthorityRepository {
    db: Arc<DatabaseConnection>,
}

impl SshCertificateAuthorityRepository {
    /// Create a new SSH certificate authority repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an SSH CA by ID.
    pub async fn find_by_id(
        &self,
        id: &str,
    ) -> AppResult<Option<ssh_certificate_authority::Model>> {
        SshCertificateAuthority::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an SSH CA by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<ssh_certificate_authority::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("SSH CA with ID '{id}' not found")))
    }

    /// Get the secret of an SSH CA, returning an error if not found.
    pub async fn get_secret(
        &self,
        ssh_ca_id: &str,
    ) -> AppResult<ssh_certificate_authority_secret::Model> {
        SshCertificateAuthoritySecret::find()
            .filter(ssh_certificate_authority_secret::Column::SshCaId.eq(ssh_ca_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| {
                AppError::NotFound(format!("Secret for SSH CA '{ssh_ca_id}' not found"))
            })
    }

    /// Create a new SSH CA.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ssh_certificate_authority::ActiveModel,
    ) -> AppResult<ssh_certificate_authority::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the secret of an SSH CA.
    pub async fn create_secret<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ssh_certificate_authority_secret::ActiveModel,
    ) -> AppResult<ssh_certificate_authority_secret::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an SSH CA.
    pub async fn update(
        &self,
        model: ssh_certificate_authority::ActiveModel,
    ) -> AppResult<ssh_certificate_authority::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an SSH CA; its secret and templates go with it.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<()> {
        SshCertificateAuthority::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
