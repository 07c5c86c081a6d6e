//! Issued certificate repository.

use std::sync::Arc;

use crate::entities::{
    Certificate, CertificateBody,
    certificate::{self, CertStatus},
    certificate_body,
};
use certvault_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Certificate repository for database operations.
#[derive(Clone)]
pub struct CertificateRepository {
    db: Arc<DatabaseConnection>,
}

impl CertificateRepository {
    /// Create a new certificate repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a certificate by its hex serial number.
    pub async fn find_by_serial(
        &self,
        serial_number: &str,
    ) -> AppResult<Option<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::SerialNumber.eq(serial_number))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a certificate by its hex serial number, returning an error if not found.
    pub async fn get_by_serial(&self, serial_number: &str) -> AppResult<certificate::Model> {
        self.find_by_serial(serial_number).await?.ok_or_else(|| {
            AppError::NotFound(format!("Certificate with serial number {serial_number} not found"))
        })
    }

    /// Get the body of a certificate.
    pub async fn get_body(&self, cert_id: &str) -> AppResult<certificate_body::Model> {
        CertificateBody::find()
            .filter(certificate_body::Column::CertId.eq(cert_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Body of certificate {cert_id} not found")))
    }

    /// Revoked certificates issued by a CA, in revocation order.
    pub async fn find_revoked_by_ca(&self, ca_id: &str) -> AppResult<Vec<certificate::Model>> {
        Certificate::find()
            .filter(certificate::Column::CaId.eq(ca_id))
            .filter(certificate::Column::Status.eq(CertStatus::Revoked))
            .order_by_asc(certificate::Column::RevokedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new certificate record.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: certificate::ActiveModel,
    ) -> AppResult<certificate::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the body of a certificate.
    pub async fn create_body<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: certificate_body::ActiveModel,
    ) -> AppResult<certificate_body::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a certificate record.
    pub async fn update(&self, model: certificate::ActiveModel) -> AppResult<certificate::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
