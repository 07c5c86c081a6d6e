//! Service wiring.

use std::sync::Arc;

use certvault_common::{AppResult, Config};
use certvault_core::{
    AllowAllPermissions, CertificateAuthorityService, CertificateService, KeyCustody,
    LocalKmsService, PermissionChecker, SshCertificateAuthorityService,
    SshCertificateTemplateService,
};
use sea_orm::DatabaseConnection;

/// Every service, built over one connection pool and one key custody.
#[derive(Clone)]
pub struct AppServices {
    pub certificate_authorities: CertificateAuthorityService,
    pub certificates: CertificateService,
    pub ssh_certificate_authorities: SshCertificateAuthorityService,
    pub ssh_certificate_templates: SshCertificateTemplateService,
}

impl AppServices {
    /// Build the services. Fails if the configured root key is unusable.
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> AppResult<Self> {
        let kms = LocalKmsService::from_hex_root_key(Arc::clone(&db), &config.kms.root_key)?;
        let custody = KeyCustody::new(Arc::clone(&db), Arc::new(kms));
        let permissions: Arc<dyn PermissionChecker> = Arc::new(AllowAllPermissions);

        Ok(Self {
            certificate_authorities: CertificateAuthorityService::new(
                Arc::clone(&db),
                custody.clone(),
                Arc::clone(&permissions),
                config.pki.clone(),
            ),
            certificates: CertificateService::new(
                Arc::clone(&db),
                custody.clone(),
                Arc::clone(&permissions),
            ),
            ssh_certificate_authorities: SshCertificateAuthorityService::new(
                Arc::clone(&db),
                custody,
                Arc::clone(&permissions),
                config.ssh.clone(),
            ),
            ssh_certificate_templates: SshCertificateTemplateService::new(db, permissions),
        })
    }
}
