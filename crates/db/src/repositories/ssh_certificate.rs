//! Issued SSH certificate repository.

use std::sync::Arc;

use crate::entities::{SshCertificate, SshCertificateBody, ssh_certificate, ssh_certificate_body};
use certvault_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// SSH certificate repository for database operations.
#[derive(Clone)]
pub struct SshCertificateRepository {
    db: Arc<DatabaseConnection>,
}

impl SshCertificateRepository {
    /// Create a new SSH certificate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an SSH certificate record by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ssh_certificate::Model>> {
        SshCertificate::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the body of an SSH certificate.
    pub async fn get_body(&self, ssh_cert_id: &str) -> AppResult<ssh_certificate_body::Model> {
        SshCertificateBody::find()
            .filter(ssh_certificate_body::Column::SshCertId.eq(ssh_cert_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| {
                AppError::NotFound(format!("Body of SSH certificate {ssh_cert_id} not found"))
            })
    }

    /// Create a new SSH certificate record.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ssh_certificate::ActiveModel,
    ) -> AppResult<ssh_certificate::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the body of an SSH certificate.
    pub async fn create_body<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ssh_certificate_body::ActiveModel,
    ) -> AppResult<ssh_certificate_body::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
