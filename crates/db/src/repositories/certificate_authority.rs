//! Certificate authority repository.
//!
//! Covers the CA row and its one-to-one certificate, secret and CRL rows.

use std::sync::Arc;

use crate::entities::{
    CertificateAuthority, CertificateAuthorityCert, CertificateAuthorityCrl,
    CertificateAuthoritySecret, certificate_authority, certificate_authority_cert,
    certificate_authority_crl, certificate_authority_secret,
};
use certvault_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Certificate authority repository for database operations.
#[derive(Clone)]
pub struct CertificateAuthorityRepository {
    db: Arc<DatabaseConnection>,
}

impl CertificateAuthorityRepository {
    /// Create a new certificate authority repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a CA by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<certificate_authority::Model>> {
        CertificateAuthority::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a CA by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<certificate_authority::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("CA with ID '{id}' not found")))
    }

    /// Find a CA in `project_id` whose subject DN is exactly `dn`.
    pub async fn find_by_dn(
        &self,
        project_id: &str,
        dn: &str,
    ) -> AppResult<Option<certificate_authority::Model>> {
        CertificateAuthority::find()
            .filter(certificate_authority::Column::ProjectId.eq(project_id))
            .filter(certificate_authority::Column::Dn.eq(dn))
            .order_by_asc(certificate_authority::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the installed certificate of a CA.
    pub async fn find_cert(
        &self,
        ca_id: &str,
    ) -> AppResult<Option<certificate_authority_cert::Model>> {
        CertificateAuthorityCert::find()
            .filter(certificate_authority_cert::Column::CaId.eq(ca_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the secret of a CA.
    pub async fn find_secret(
        &self,
        ca_id: &str,
    ) -> AppResult<Option<certificate_authority_secret::Model>> {
        CertificateAuthoritySecret::find()
            .filter(certificate_authority_secret::Column::CaId.eq(ca_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the secret of a CA, returning an error if not found.
    pub async fn get_secret(&self, ca_id: &str) -> AppResult<certificate_authority_secret::Model> {
        self.find_secret(ca_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Secret for CA '{ca_id}' not found")))
    }

    /// Find the CRL of a CA.
    pub async fn find_crl(
        &self,
        ca_id: &str,
    ) -> AppResult<Option<certificate_authority_crl::Model>> {
        CertificateAuthorityCrl::find()
            .filter(certificate_authority_crl::Column::CaId.eq(ca_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the CRL of a CA, returning an error if not found.
    pub async fn get_crl(&self, ca_id: &str) -> AppResult<certificate_authority_crl::Model> {
        self.find_crl(ca_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("CRL for CA '{ca_id}' not found")))
    }

    /// Create a new CA.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: certificate_authority::ActiveModel,
    ) -> AppResult<certificate_authority::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a CA.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: certificate_authority::ActiveModel,
    ) -> AppResult<certificate_authority::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the certificate of a CA.
    pub async fn create_cert<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: certificate_authority_cert::ActiveModel,
    ) -> AppResult<certificate_authority_cert::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the secret of a CA.
    pub async fn create_secret<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: certificate_authority_secret::ActiveModel,
    ) -> AppResult<certificate_authority_secret::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the first CRL of a CA.
    pub async fn create_crl<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: certificate_authority_crl::ActiveModel,
    ) -> AppResult<certificate_authority_crl::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the stored CRL of a CA.
    pub async fn update_crl<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: certificate_authority_crl::ActiveModel,
    ) -> AppResult<certificate_authority_crl::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a CA; its certificate, secret and CRL rows go with it.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<()> {
        CertificateAuthority::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
