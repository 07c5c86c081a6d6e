//! Certificate authority service.
//!
//! Owns the CA lifecycle: root and intermediate creation, CSRs for pending
//! intermediates, signing and importing intermediate certificates, leaf
//! issuance and CRL regeneration.
//!
//! Every operation validates before it decrypts anything, and every
//! multi-row write goes through one transaction.

use std::sync::Arc;

use certvault_common::{
    AppError, AppResult, CertKeyAlgorithm, DistinguishedName, IdGenerator, Validity,
    config::PkiConfig,
    x509::{
        self, CertIssuer, CrlEntry, CrlParams, CrlSigner, CsrUsage, IssuedProfile, RevocationReason,
        RootCertParams,
    },
};
use certvault_db::{
    entities::{
        certificate,
        certificate::CertStatus,
        certificate_authority::{self, CaStatus, CaType},
        certificate_authority_cert, certificate_authority_crl, certificate_authority_secret,
        certificate_body,
    },
    repositories::{CertificateAuthorityRepository, CertificateRepository},
};
use chrono::{DateTime, Duration, Utc};
use openssl::{
    pkey::{PKey, Private},
    x509::X509,
};
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;
use zeroize::Zeroizing;

use super::kms::KeyCustody;
use super::permission::{
    ActorContext, PermissionAction, PermissionChecker, PermissionSubject, enforce,
};

fn unlimited_path_length() -> i32 {
    -1
}

/// Input for creating a CA.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaInput {
    #[validate(length(min = 1, max = 64))]
    pub project_id: String,
    #[serde(rename = "type")]
    pub ca_type: CaType,
    #[validate(length(min = 1, max = 256))]
    pub common_name: String,
    #[serde(default)]
    #[validate(length(max = 256))]
    pub organization: String,
    #[serde(default)]
    #[validate(length(max = 256))]
    pub ou: String,
    #[serde(default)]
    #[validate(length(max = 2))]
    pub country: String,
    #[serde(default)]
    #[validate(length(max = 256))]
    pub province: String,
    #[serde(default)]
    #[validate(length(max = 256))]
    pub locality: String,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
    /// `-1` for unlimited. Only applies to roots; intermediates take theirs from
    /// the imported certificate.
    #[serde(default = "unlimited_path_length")]
    #[validate(range(min = -1))]
    pub max_path_length: i32,
    pub key_algorithm: CertKeyAlgorithm,
}

/// Input for updating a CA.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaInput {
    pub ca_id: String,
    pub status: Option<CaStatus>,
}

/// Input for signing an intermediate CA's CSR.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignIntermediateInput {
    /// The parent (signing) CA.
    pub ca_id: String,
    #[validate(length(min = 1))]
    pub csr: String,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: DateTime<Utc>,
    #[serde(default = "unlimited_path_length")]
    pub max_path_length: i32,
}

/// Input for installing an externally signed certificate on an intermediate CA.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImportCaCertificateInput {
    pub ca_id: String,
    #[validate(length(min = 1))]
    pub certificate: String,
    #[serde(default)]
    pub certificate_chain: String,
}

/// Input for issuing a leaf certificate.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificateInput {
    pub ca_id: String,
    #[validate(length(min = 1, max = 256))]
    pub common_name: String,
    /// Lifetime in seconds, used when `not_after` is absent.
    #[validate(range(min = 1))]
    pub ttl: Option<i64>,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
}

/// A CA's installed certificate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaCertificate {
    pub certificate: String,
    pub certificate_chain: String,
    pub serial_number: String,
}

/// Result of signing an intermediate CA.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIntermediate {
    pub certificate: String,
    pub certificate_chain: String,
    pub issuing_ca_certificate: String,
    pub serial_number: String,
}

/// Result of issuing a leaf certificate. The private key is never stored.
pub struct IssuedCertificate {
    pub certificate: String,
    pub certificate_chain: String,
    pub issuing_ca_certificate: String,
    pub private_key: Zeroizing<String>,
    pub serial_number: String,
}

/// Decrypted certificate material of an installed CA.
struct InstalledCa {
    certificate: X509,
    certificate_pem: String,
    chain_pem: String,
    info: x509::CertificateInfo,
}

/// Service for managing certificate authorities.
#[derive(Clone)]
pub struct CertificateAuthorityService {
    db: Arc<DatabaseConnection>,
    ca_repo: CertificateAuthorityRepository,
    cert_repo: CertificateRepository,
    custody: KeyCustody,
    permissions: Arc<dyn PermissionChecker>,
    config: PkiConfig,
    id_gen: IdGenerator,
}

impl CertificateAuthorityService {
    /// Create a new certificate authority service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        custody: KeyCustody,
        permissions: Arc<dyn PermissionChecker>,
        config: PkiConfig,
    ) -> Self {
        Self {
            ca_repo: CertificateAuthorityRepository::new(Arc::clone(&db)),
            cert_repo: CertificateRepository::new(Arc::clone(&db)),
            db,
            custody,
            permissions,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a root or intermediate CA.
    ///
    /// A root is self-signed on the spot and starts active. An intermediate
    /// starts pending until a certificate is imported for it.
    pub async fn create_ca(
        &self,
        actor: &ActorContext,
        input: CreateCaInput,
    ) -> AppResult<certificate_authority::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        enforce(
            self.permissions.as_ref(),
            actor,
            &input.project_id,
            PermissionAction::Create,
            PermissionSubject::CertificateAuthorities,
        )
        .await?;

        let dn = DistinguishedName {
            common_name: input.common_name.clone(),
            organization: input.organization.clone(),
            ou: input.ou.clone(),
            country: input.country.clone(),
            province: input.province.clone(),
            locality: input.locality.clone(),
        };
        let now = Utc::now();
        let validity = Validity::new(
            input.not_before.unwrap_or(now),
            match input.not_after {
                Some(not_after) => not_after,
                None => days_after(now, self.config.default_ca_validity_days)?,
            },
        )?;

        let key = x509::generate_key_pair(input.key_algorithm)?;
        let key_der = x509::private_key_to_der(&key)?;
        let kms_key_id = self
            .custody
            .project_certificate_key_id(&input.project_id)
            .await?;

        let ca_id = self.id_gen.generate();
        let mut ca = certificate_authority::ActiveModel {
            id: Set(ca_id.clone()),
            project_id: Set(input.project_id.clone()),
            parent_ca_id: Set(None),
            ca_type: Set(input.ca_type),
            status: Set(CaStatus::PendingCertificate),
            dn: Set(dn.to_dn_string()),
            common_name: Set(dn.common_name.clone()),
            organization: Set(dn.organization.clone()),
            ou: Set(dn.ou.clone()),
            country: Set(dn.country.clone()),
            province: Set(dn.province.clone()),
            locality: Set(dn.locality.clone()),
            key_algorithm: Set(input.key_algorithm.to_string()),
            max_path_length: Set(-1),
            serial_number: Set(None),
            not_before: Set(None),
            not_after: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let (ca_cert, crl_der) = match input.ca_type {
            CaType::Root => {
                let serial = x509::generate_serial_number();
                let certificate = x509::create_root_certificate(&RootCertParams {
                    subject: &dn,
                    key: &key,
                    key_algorithm: input.key_algorithm,
                    serial_number: &serial,
                    validity,
                    max_path_length: input.max_path_length,
                })?;
                let cert_der = certificate.to_der()?;
                let info = x509::inspect_certificate(&cert_der)?;

                ca.status = Set(CaStatus::Active);
                ca.max_path_length = Set(input.max_path_length);
                ca.serial_number = Set(Some(info.serial_number));
                ca.not_before = Set(Some(info.validity.not_before.into()));
                ca.not_after = Set(Some(info.validity.not_after.into()));

                let crl_der = self.sign_crl(CrlSigner::Certificate(&cert_der), &key_der, 1, &[])?;
                let ca_cert = certificate_authority_cert::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    ca_id: Set(ca_id.clone()),
                    encrypted_certificate: Set(self.custody.encrypt(&kms_key_id, &cert_der).await?),
                    encrypted_certificate_chain: Set(self.custody.encrypt(&kms_key_id, b"").await?),
                    created_at: Set(now.into()),
                };
                (Some(ca_cert), crl_der)
            }
            CaType::Intermediate => {
                let crl_der = self.sign_crl(CrlSigner::Subject(&dn), &key_der, 1, &[])?;
                (None, crl_der)
            }
        };

        let secret = certificate_authority_secret::ActiveModel {
            id: Set(self.id_gen.generate()),
            ca_id: Set(ca_id.clone()),
            encrypted_private_key: Set(self.custody.encrypt(&kms_key_id, &key_der).await?),
            created_at: Set(now.into()),
        };
        let crl = certificate_authority_crl::ActiveModel {
            id: Set(self.id_gen.generate()),
            ca_id: Set(ca_id.clone()),
            encrypted_crl: Set(self.custody.encrypt(&kms_key_id, &crl_der).await?),
            crl_number: Set(1),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let repo = self.ca_repo.clone();
        let created = certvault_db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let created = repo.create(txn, ca).await?;
                repo.create_secret(txn, secret).await?;
                repo.create_crl(txn, crl).await?;
                if let Some(ca_cert) = ca_cert {
                    repo.create_cert(txn, ca_cert).await?;
                }
                Ok(created)
            })
        })
        .await?;

        info!(
            ca_id = %created.id,
            project_id = %created.project_id,
            ca_type = ?created.ca_type,
            dn = %created.dn,
            "Created certificate authority"
        );
        Ok(created)
    }

    /// Get a CA by ID.
    pub async fn get_ca_by_id(
        &self,
        actor: &ActorContext,
        ca_id: &str,
    ) -> AppResult<certificate_authority::Model> {
        self.load_ca(actor, ca_id, PermissionAction::Read).await
    }

    /// Update a CA's status.
    ///
    /// Toggles between active and disabled. A CA without an installed
    /// certificate cannot be activated this way.
    pub async fn update_ca_by_id(
        &self,
        actor: &ActorContext,
        input: UpdateCaInput,
    ) -> AppResult<certificate_authority::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let ca = self
            .load_ca(actor, &input.ca_id, PermissionAction::Edit)
            .await?;

        let Some(status) = input.status else {
            return Ok(ca);
        };
        match status {
            CaStatus::PendingCertificate => {
                return Err(AppError::BadRequest(
                    "CA status cannot be set to pending-certificate".to_string(),
                ));
            }
            CaStatus::Active if self.ca_repo.find_cert(&ca.id).await?.is_none() => {
                return Err(AppError::InvalidState(
                    "CA cannot be activated before a certificate is installed".to_string(),
                ));
            }
            _ => {}
        }

        let mut active: certificate_authority::ActiveModel = ca.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().into());
        let updated = self.ca_repo.update(self.db.as_ref(), active).await?;

        info!(ca_id = %updated.id, status = ?updated.status, "Updated certificate authority");
        Ok(updated)
    }

    /// Delete a CA with its certificate, key and CRL.
    ///
    /// Certificates it issued are kept and stay in whatever state they are in.
    pub async fn delete_ca_by_id(
        &self,
        actor: &ActorContext,
        ca_id: &str,
    ) -> AppResult<certificate_authority::Model> {
        let ca = self.load_ca(actor, ca_id, PermissionAction::Delete).await?;
        self.ca_repo.delete_by_id(&ca.id).await?;

        info!(ca_id = %ca.id, project_id = %ca.project_id, "Deleted certificate authority");
        Ok(ca)
    }

    /// PEM CSR for an intermediate CA still waiting for its certificate.
    pub async fn get_ca_csr(&self, actor: &ActorContext, ca_id: &str) -> AppResult<String> {
        let ca = self.load_ca(actor, ca_id, PermissionAction::Create).await?;

        if ca.ca_type == CaType::Root {
            return Err(AppError::InvalidState("Root CA cannot generate CSR".to_string()));
        }
        if self.ca_repo.find_cert(&ca.id).await?.is_some() {
            return Err(AppError::InvalidState(
                "CA already has a certificate installed".to_string(),
            ));
        }

        let kms_key_id = self
            .custody
            .project_certificate_key_id(&ca.project_id)
            .await?;
        let key = self.ca_private_key(&ca, &kms_key_id).await?;
        let algorithm: CertKeyAlgorithm = ca.key_algorithm.parse()?;

        let csr = x509::create_csr(&dn_of(&ca), &key, algorithm, CsrUsage::CertificateAuthority)?;
        x509::csr_to_pem(&csr)
    }

    /// The CA's certificate, the chain above it and its serial number.
    pub async fn get_ca_cert(&self, actor: &ActorContext, ca_id: &str) -> AppResult<CaCertificate> {
        let ca = self.load_ca(actor, ca_id, PermissionAction::Read).await?;
        let kms_key_id = self
            .custody
            .project_certificate_key_id(&ca.project_id)
            .await?;
        let installed = self.installed_ca(&ca, &kms_key_id).await?;

        Ok(CaCertificate {
            certificate: installed.certificate_pem,
            certificate_chain: installed.chain_pem,
            serial_number: installed.info.serial_number,
        })
    }

    /// Sign an intermediate CA's CSR with the CA `input.ca_id`.
    pub async fn sign_intermediate(
        &self,
        actor: &ActorContext,
        input: SignIntermediateInput,
    ) -> AppResult<SignedIntermediate> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let parent = self
            .load_ca(actor, &input.ca_id, PermissionAction::Create)
            .await?;
        ensure_not_disabled(&parent)?;

        let kms_key_id = self
            .custody
            .project_certificate_key_id(&parent.project_id)
            .await?;
        let installed = self.installed_ca(&parent, &kms_key_id).await?;

        x509::check_path_length(installed.info.path_length, input.max_path_length)?;
        let validity = Validity::new(input.not_before.unwrap_or_else(Utc::now), input.not_after)?;
        validity.ensure_within(&installed.info.validity)?;
        let csr = x509::parse_csr(&input.csr)?;
        debug!(
            ca_id = %parent.id,
            max_path_length = input.max_path_length,
            "Intermediate request validated"
        );

        let key = self.ca_private_key(&parent, &kms_key_id).await?;
        let algorithm: CertKeyAlgorithm = parent.key_algorithm.parse()?;
        let serial = x509::generate_serial_number();
        let certificate = x509::sign_csr(
            &csr,
            &CertIssuer {
                certificate: &installed.certificate,
                key: &key,
                key_algorithm: algorithm,
            },
            &serial,
            validity,
            IssuedProfile::IntermediateCa {
                max_path_length: input.max_path_length,
            },
        )?;

        let serial_number = hex::encode(serial);
        info!(
            ca_id = %parent.id,
            serial_number = %serial_number,
            "Signed intermediate CA certificate"
        );

        Ok(SignedIntermediate {
            certificate: x509::certificate_to_pem(&certificate)?,
            certificate_chain: x509::join_chain(&installed.certificate_pem, &installed.chain_pem),
            issuing_ca_certificate: installed.certificate_pem,
            serial_number,
        })
    }

    /// Install an externally signed certificate on a pending intermediate CA.
    pub async fn import_cert_to_ca(
        &self,
        actor: &ActorContext,
        input: ImportCaCertificateInput,
    ) -> AppResult<certificate_authority::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let ca = self
            .load_ca(actor, &input.ca_id, PermissionAction::Create)
            .await?;

        if self.ca_repo.find_cert(&ca.id).await?.is_some() {
            return Err(AppError::InvalidState("CA has already imported a certificate".to_string()));
        }

        let certificate = x509::parse_certificate(&input.certificate)?;
        let chain = x509::parse_certificate_chain(&input.certificate_chain)?;
        x509::verify_certificate_chain(&certificate, &chain)?;

        let kms_key_id = self
            .custody
            .project_certificate_key_id(&ca.project_id)
            .await?;
        let key = self.ca_private_key(&ca, &kms_key_id).await?;
        if !x509::certificate_matches_key(&certificate, &key)? {
            return Err(AppError::BadRequest(
                "Certificate public key does not match the CA's private key".to_string(),
            ));
        }
        drop(key);

        let cert_der = certificate.to_der()?;
        let info = x509::inspect_certificate(&cert_der)?;
        let max_path_length = stored_path_length(info.path_length)?;
        let chain_pem = chain
            .iter()
            .map(x509::certificate_to_pem)
            .collect::<AppResult<Vec<_>>>()?
            .iter()
            .map(|pem| pem.trim())
            .collect::<Vec<_>>()
            .join("\n");

        let parent_ca_id = self
            .ca_repo
            .find_by_dn(&ca.project_id, &x509::issuer_dn_string(&certificate))
            .await?
            .filter(|parent| parent.id != ca.id)
            .map(|parent| parent.id);

        let now = Utc::now();
        let ca_cert = certificate_authority_cert::ActiveModel {
            id: Set(self.id_gen.generate()),
            ca_id: Set(ca.id.clone()),
            encrypted_certificate: Set(self.custody.encrypt(&kms_key_id, &cert_der).await?),
            encrypted_certificate_chain: Set(self
                .custody
                .encrypt(&kms_key_id, chain_pem.as_bytes())
                .await?),
            created_at: Set(now.into()),
        };

        let mut active: certificate_authority::ActiveModel = ca.into();
        active.status = Set(CaStatus::Active);
        active.max_path_length = Set(max_path_length);
        active.serial_number = Set(Some(info.serial_number));
        active.not_before = Set(Some(info.validity.not_before.into()));
        active.not_after = Set(Some(info.validity.not_after.into()));
        active.parent_ca_id = Set(parent_ca_id);
        active.updated_at = Set(now.into());

        let repo = self.ca_repo.clone();
        let updated = certvault_db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                repo.create_cert(txn, ca_cert).await?;
                repo.update(txn, active).await
            })
        })
        .await?;

        info!(
            ca_id = %updated.id,
            parent_ca_id = ?updated.parent_ca_id,
            max_path_length = updated.max_path_length,
            "Imported certificate to certificate authority"
        );
        Ok(updated)
    }

    /// Issue a leaf certificate with a freshly generated key.
    pub async fn issue_cert_from_ca(
        &self,
        actor: &ActorContext,
        input: IssueCertificateInput,
    ) -> AppResult<IssuedCertificate> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let ca = self.get_ca(&input.ca_id).await?;
        enforce(
            self.permissions.as_ref(),
            actor,
            &ca.project_id,
            PermissionAction::Create,
            PermissionSubject::Certificates,
        )
        .await?;
        ensure_not_disabled(&ca)?;

        let kms_key_id = self
            .custody
            .project_certificate_key_id(&ca.project_id)
            .await?;
        let installed = self.installed_ca(&ca, &kms_key_id).await?;

        let now = Utc::now();
        let not_after = match (input.not_after, input.ttl) {
            (Some(not_after), _) => not_after,
            (None, Some(ttl)) => Duration::try_seconds(ttl)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| AppError::BadRequest("ttl out of range".to_string()))?,
            (None, None) => days_after(now, self.config.default_leaf_validity_days)?,
        };
        let validity = Validity::new(input.not_before.unwrap_or(now), not_after)?;
        validity.ensure_within(&installed.info.validity)?;

        let ca_key = self.ca_private_key(&ca, &kms_key_id).await?;
        let algorithm: CertKeyAlgorithm = ca.key_algorithm.parse()?;

        let leaf_key = x509::generate_key_pair(algorithm)?;
        let subject = DistinguishedName {
            common_name: input.common_name.clone(),
            ..DistinguishedName::default()
        };
        let csr = x509::create_csr(&subject, &leaf_key, algorithm, CsrUsage::EndEntity)?;
        let serial = x509::generate_serial_number();
        let leaf = x509::sign_csr(
            &csr,
            &CertIssuer {
                certificate: &installed.certificate,
                key: &ca_key,
                key_algorithm: algorithm,
            },
            &serial,
            validity,
            IssuedProfile::Leaf,
        )?;
        drop(ca_key);

        let leaf_der = leaf.to_der()?;
        let info = x509::inspect_certificate(&leaf_der)?;
        let cert_id = self.id_gen.generate();
        let record = certificate::ActiveModel {
            id: Set(cert_id.clone()),
            project_id: Set(ca.project_id.clone()),
            ca_id: Set(Some(ca.id.clone())),
            status: Set(CertStatus::Active),
            serial_number: Set(info.serial_number.clone()),
            common_name: Set(input.common_name.clone()),
            not_before: Set(info.validity.not_before.into()),
            not_after: Set(info.validity.not_after.into()),
            revoked_at: Set(None),
            revocation_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let body = certificate_body::ActiveModel {
            id: Set(self.id_gen.generate()),
            cert_id: Set(cert_id),
            encrypted_certificate: Set(self.custody.encrypt(&kms_key_id, &leaf_der).await?),
            created_at: Set(now.into()),
        };

        let repo = self.cert_repo.clone();
        certvault_db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                repo.create(txn, record).await?;
                repo.create_body(txn, body).await?;
                Ok(())
            })
        })
        .await?;

        info!(
            ca_id = %ca.id,
            serial_number = %info.serial_number,
            common_name = %input.common_name,
            "Issued certificate"
        );

        Ok(IssuedCertificate {
            certificate: x509::certificate_to_pem(&leaf)?,
            certificate_chain: x509::join_chain(&installed.certificate_pem, &installed.chain_pem),
            issuing_ca_certificate: installed.certificate_pem,
            private_key: x509::private_key_to_pem(&leaf_key)?,
            serial_number: info.serial_number,
        })
    }

    /// The CA's current CRL as PEM.
    pub async fn get_ca_crl(&self, actor: &ActorContext, ca_id: &str) -> AppResult<String> {
        let ca = self.load_ca(actor, ca_id, PermissionAction::Read).await?;
        let kms_key_id = self
            .custody
            .project_certificate_key_id(&ca.project_id)
            .await?;

        let crl = self.ca_repo.get_crl(&ca.id).await?;
        let crl_der = self.custody.decrypt(&kms_key_id, &crl.encrypted_crl).await?;
        x509::crl_der_to_pem(&crl_der)
    }

    /// Rebuild the CA's CRL from every revoked certificate it issued and
    /// replace the stored one. Returns the new CRL as PEM.
    pub async fn rotate_ca_crl(&self, actor: &ActorContext, ca_id: &str) -> AppResult<String> {
        let ca = self.load_ca(actor, ca_id, PermissionAction::Edit).await?;
        let kms_key_id = self
            .custody
            .project_certificate_key_id(&ca.project_id)
            .await?;

        let current = self.ca_repo.get_crl(&ca.id).await?;
        let entries = self
            .cert_repo
            .find_revoked_by_ca(&ca.id)
            .await?
            .into_iter()
            .map(|cert| CrlEntry {
                revoked_at: cert
                    .revoked_at
                    .map_or(cert.updated_at.to_utc(), |at| at.to_utc()),
                reason: RevocationReason::from_code(cert.revocation_reason.unwrap_or_default()),
                serial_number: cert.serial_number,
            })
            .collect::<Vec<_>>();

        let secret = self.ca_repo.get_secret(&ca.id).await?;
        let key_der = self
            .custody
            .decrypt(&kms_key_id, &secret.encrypted_private_key)
            .await?;
        let crl_number = current.crl_number + 1;

        let crl_der = match self.ca_repo.find_cert(&ca.id).await? {
            Some(ca_cert) => {
                let cert_der = self
                    .custody
                    .decrypt(&kms_key_id, &ca_cert.encrypted_certificate)
                    .await?;
                self.sign_crl(
                    CrlSigner::Certificate(&cert_der),
                    &key_der,
                    crl_number as u64,
                    &entries,
                )?
            }
            None => self.sign_crl(
                CrlSigner::Subject(&dn_of(&ca)),
                &key_der,
                crl_number as u64,
                &entries,
            )?,
        };
        drop(key_der);

        let mut active: certificate_authority_crl::ActiveModel = current.into();
        active.encrypted_crl = Set(self.custody.encrypt(&kms_key_id, &crl_der).await?);
        active.crl_number = Set(crl_number);
        active.updated_at = Set(Utc::now().into());

        let repo = self.ca_repo.clone();
        certvault_db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move { repo.update_crl(txn, active).await })
        })
        .await?;

        info!(ca_id = %ca.id, crl_number, revoked = entries.len(), "Rotated CRL");
        x509::crl_der_to_pem(&crl_der)
    }

    async fn get_ca(&self, ca_id: &str) -> AppResult<certificate_authority::Model> {
        self.ca_repo.get_by_id(ca_id).await
    }

    async fn load_ca(
        &self,
        actor: &ActorContext,
        ca_id: &str,
        action: PermissionAction,
    ) -> AppResult<certificate_authority::Model> {
        let ca = self.get_ca(ca_id).await?;
        enforce(
            self.permissions.as_ref(),
            actor,
            &ca.project_id,
            action,
            PermissionSubject::CertificateAuthorities,
        )
        .await?;
        Ok(ca)
    }

    async fn installed_ca(
        &self,
        ca: &certificate_authority::Model,
        kms_key_id: &str,
    ) -> AppResult<InstalledCa> {
        let ca_cert = self.ca_repo.find_cert(&ca.id).await?.ok_or_else(|| {
            AppError::InvalidState(format!(
                "CA '{}' does not have a certificate installed",
                ca.id
            ))
        })?;

        let cert_der = self
            .custody
            .decrypt(kms_key_id, &ca_cert.encrypted_certificate)
            .await?;
        let chain_pem = self
            .custody
            .decrypt_to_string(kms_key_id, &ca_cert.encrypted_certificate_chain)
            .await?;

        Ok(InstalledCa {
            certificate: X509::from_der(&cert_der)?,
            certificate_pem: x509::certificate_der_to_pem(&cert_der)?,
            chain_pem: chain_pem.to_string(),
            info: x509::inspect_certificate(&cert_der)?,
        })
    }

    async fn ca_private_key(
        &self,
        ca: &certificate_authority::Model,
        kms_key_id: &str,
    ) -> AppResult<PKey<Private>> {
        let secret = self.ca_repo.get_secret(&ca.id).await?;
        let key_der = self
            .custody
            .decrypt(kms_key_id, &secret.encrypted_private_key)
            .await?;
        x509::private_key_from_der(&key_der)
    }

    fn sign_crl(
        &self,
        signer: CrlSigner<'_>,
        private_key_der: &[u8],
        crl_number: u64,
        entries: &[CrlEntry],
    ) -> AppResult<Vec<u8>> {
        let now = Utc::now();
        x509::create_crl(&CrlParams {
            signer,
            private_key_der,
            crl_number,
            this_update: now,
            next_update: days_after(now, self.config.crl_validity_days)?,
            entries,
        })
    }
}

/// Basic Constraints path length as stored on the CA; `-1` when absent.
fn stored_path_length(path_length: Option<u32>) -> AppResult<i32> {
    path_length.map_or(Ok(-1), |len| {
        i32::try_from(len).map_err(|_| {
            AppError::BadRequest(format!("Path length constraint {len} is out of range"))
        })
    })
}

fn days_after(at: DateTime<Utc>, days: i64) -> AppResult<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|days| at.checked_add_signed(days))
        .ok_or_else(|| AppError::Config(format!("Validity of {days} days is out of range")))
}

fn dn_of(ca: &certificate_authority::Model) -> DistinguishedName {
    DistinguishedName {
        common_name: ca.common_name.clone(),
        organization: ca.organization.clone(),
        ou: ca.ou.clone(),
        country: ca.country.clone(),
        province: ca.province.clone(),
        locality: ca.locality.clone(),
    }
}

fn ensure_not_disabled(ca: &certificate_authority::Model) -> AppResult<()> {
    if ca.status == CaStatus::Disabled {
        return Err(AppError::BadRequest(format!("CA '{}' is disabled", ca.id)));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ca_model(status: CaStatus) -> certificate_authority::Model {
        certificate_authority::Model {
            id: "ca1".to_string(),
            project_id: "proj1".to_string(),
            parent_ca_id: None,
            ca_type: CaType::Intermediate,
            status,
            dn: "O=Acme, CN=Acme Issuing".to_string(),
            common_name: "Acme Issuing".to_string(),
            organization: "Acme".to_string(),
            ou: String::new(),
            country: String::new(),
            province: String::new(),
            locality: String::new(),
            key_algorithm: "EC_prime256v1".to_string(),
            max_path_length: -1,
            serial_number: None,
            not_before: None,
            not_after: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_dn_of_matches_stored_dn() {
        let ca = ca_model(CaStatus::Active);
        assert_eq!(dn_of(&ca).to_dn_string(), ca.dn);
    }

    #[test]
    fn test_stored_path_length() {
        assert_eq!(stored_path_length(None).unwrap(), -1);
        assert_eq!(stored_path_length(Some(3)).unwrap(), 3);
        assert!(matches!(
            stored_path_length(Some(u32::MAX)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_days_after_rejects_overflow() {
        let now = Utc::now();
        assert_eq!(days_after(now, 1).unwrap() - now, Duration::days(1));
        assert!(matches!(
            days_after(now, i64::MAX),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_disabled_ca_is_rejected() {
        assert!(ensure_not_disabled(&ca_model(CaStatus::Active)).is_ok());
        assert!(ensure_not_disabled(&ca_model(CaStatus::PendingCertificate)).is_ok());
        assert!(matches!(
            ensure_not_disabled(&ca_model(CaStatus::Disabled)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_create_input_validation() {
        let input: CreateCaInput = serde_json::from_value(serde_json::json!({
            "projectId": "proj1",
            "type": "root",
            "commonName": "",
            "country": "USA",
            "keyAlgorithm": "RSA_2048"
        }))
        .unwrap();

        assert_eq!(input.max_path_length, -1);
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("common_name"));
        assert!(fields.contains_key("country"));
    }
}
