//! Issued certificate service.

use std::sync::Arc;

use certvault_common::{AppError, AppResult, RevocationReason, x509};
use certvault_db::{
    entities::certificate::{self, CertStatus},
    repositories::CertificateRepository,
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::kms::KeyCustody;
use super::permission::{
    ActorContext, PermissionAction, PermissionChecker, PermissionSubject, enforce,
};

/// Input for revoking a certificate.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RevokeCertificateInput {
    #[validate(length(min = 1, max = 64))]
    pub serial_number: String,
    pub revocation_reason: RevocationReason,
}

/// Service for certificates issued by a CA.
#[derive(Clone)]
pub struct CertificateService {
    cert_repo: CertificateRepository,
    custody: KeyCustody,
    permissions: Arc<dyn PermissionChecker>,
}

impl CertificateService {
    /// Create a new certificate service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        custody: KeyCustody,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            cert_repo: CertificateRepository::new(db),
            custody,
            permissions,
        }
    }

    /// Get a certificate record by its hex serial number.
    pub async fn get_cert_by_serial(
        &self,
        actor: &ActorContext,
        serial_number: &str,
    ) -> AppResult<certificate::Model> {
        self.load(actor, serial_number, PermissionAction::Read).await
    }

    /// The certificate itself as PEM.
    pub async fn get_cert_body(
        &self,
        actor: &ActorContext,
        serial_number: &str,
    ) -> AppResult<String> {
        let cert = self.load(actor, serial_number, PermissionAction::Read).await?;
        let kms_key_id = self
            .custody
            .project_certificate_key_id(&cert.project_id)
            .await?;

        let body = self.cert_repo.get_body(&cert.id).await?;
        let der = self
            .custody
            .decrypt(&kms_key_id, &body.encrypted_certificate)
            .await?;
        x509::certificate_der_to_pem(&der)
    }

    /// Mark a certificate revoked.
    ///
    /// The issuing CA's CRL only picks this up on its next rotation.
    pub async fn revoke_cert(
        &self,
        actor: &ActorContext,
        input: RevokeCertificateInput,
    ) -> AppResult<certificate::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let cert = self
            .load(actor, &input.serial_number, PermissionAction::Delete)
            .await?;

        if cert.status == CertStatus::Revoked {
            return Err(AppError::InvalidState(format!(
                "Certificate {} is already revoked",
                cert.serial_number
            )));
        }

        let now = Utc::now();
        let mut active: certificate::ActiveModel = cert.into();
        active.status = Set(CertStatus::Revoked);
        active.revoked_at = Set(Some(now.into()));
        active.revocation_reason = Set(Some(input.revocation_reason.code()));
        active.updated_at = Set(now.into());
        let revoked = self.cert_repo.update(active).await?;

        info!(
            serial_number = %revoked.serial_number,
            ca_id = ?revoked.ca_id,
            reason = ?input.revocation_reason,
            "Revoked certificate"
        );
        Ok(revoked)
    }

    async fn load(
        &self,
        actor: &ActorContext,
        serial_number: &str,
        action: PermissionAction,
    ) -> AppResult<certificate::Model> {
        let cert = self.cert_repo.get_by_serial(serial_number).await?;
        enforce(
            self.permissions.as_ref(),
            actor,
            &cert.project_id,
            action,
            PermissionSubject::Certificates,
        )
        .await?;
        Ok(cert)
    }
}
