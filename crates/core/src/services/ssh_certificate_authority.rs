//! SSH certificate authority service.
//!
//! SSH CAs hold only an encrypted OpenSSH private key; the public key is
//! derived from it on demand. Issuance is gated by a named template whose
//! policy is checked before the CA key is decrypted.

use std::sync::Arc;

use certvault_common::{
    AppError, AppResult, CertKeyAlgorithm, IdGenerator, SshCertType,
    config::SshConfig,
    ssh::{self, SshCertParams, SignedSshCert},
};
use certvault_db::{
    entities::{
        ssh_certificate, ssh_certificate_authority,
        ssh_certificate_authority::SshStatus,
        ssh_certificate_authority_secret, ssh_certificate_body, ssh_certificate_template,
    },
    repositories::{
        SshCertificateAuthorityRepository, SshCertificateRepository,
        SshCertificateTemplateRepository,
    },
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;
use zeroize::Zeroizing;

use super::kms::KeyCustody;
use super::permission::{
    ActorContext, PermissionAction, PermissionChecker, PermissionSubject, enforce,
};
use super::ssh_policy;

/// Input for creating an SSH CA.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSshCaInput {
    #[validate(length(min = 1, max = 64))]
    pub project_id: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub friendly_name: String,
    /// Falls back to the configured default.
    pub key_algorithm: Option<CertKeyAlgorithm>,
}

/// Input for updating an SSH CA.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSshCaInput {
    pub ssh_ca_id: String,
    #[validate(length(max = 255))]
    pub friendly_name: Option<String>,
    pub status: Option<SshStatus>,
}

/// Input for issuing SSH credentials: a new client key pair plus its certificate.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueSshCredsInput {
    #[validate(length(min = 1, max = 64))]
    pub project_id: String,
    #[validate(length(min = 1))]
    pub template_name: String,
    /// Algorithm of the generated client key. Falls back to the configured default.
    pub key_algorithm: Option<CertKeyAlgorithm>,
    pub cert_type: SshCertType,
    pub principals: Vec<String>,
    /// Seconds. Falls back to the template default.
    pub ttl: Option<u64>,
    #[validate(length(max = 255))]
    pub key_id: Option<String>,
}

/// Input for signing a caller-supplied SSH public key.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignSshKeyInput {
    #[validate(length(min = 1, max = 64))]
    pub project_id: String,
    #[validate(length(min = 1))]
    pub template_name: String,
    #[validate(length(min = 1))]
    pub public_key: String,
    pub cert_type: SshCertType,
    pub principals: Vec<String>,
    pub ttl: Option<u64>,
    #[validate(length(max = 255))]
    pub key_id: Option<String>,
}

/// A created SSH CA together with its public key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshCaWithPublicKey {
    #[serde(flatten)]
    pub ca: ssh_certificate_authority::Model,
    pub public_key: String,
}

/// A signed SSH certificate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedSshKey {
    pub serial_number: String,
    pub signed_key: String,
}

/// Issued SSH credentials. The private key is never stored.
pub struct IssuedSshCreds {
    pub serial_number: String,
    pub signed_key: String,
    pub private_key: Zeroizing<String>,
    pub public_key: String,
    pub key_algorithm: CertKeyAlgorithm,
}

/// Resolved and checked request, ready to be signed.
struct SigningPlan {
    ssh_ca: ssh_certificate_authority::Model,
    template: ssh_certificate_template::Model,
    key_id: String,
    ttl: u64,
}

/// Service for managing SSH certificate authorities and issuing SSH certificates.
#[derive(Clone)]
pub struct SshCertificateAuthorityService {
    db: Arc<DatabaseConnection>,
    ssh_ca_repo: SshCertificateAuthorityRepository,
    template_repo: SshCertificateTemplateRepository,
    ssh_cert_repo: SshCertificateRepository,
    custody: KeyCustody,
    permissions: Arc<dyn PermissionChecker>,
    config: SshConfig,
    id_gen: IdGenerator,
}

impl SshCertificateAuthorityService {
    /// Create a new SSH certificate authority service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        custody: KeyCustody,
        permissions: Arc<dyn PermissionChecker>,
        config: SshConfig,
    ) -> Self {
        Self {
            ssh_ca_repo: SshCertificateAuthorityRepository::new(Arc::clone(&db)),
            template_repo: SshCertificateTemplateRepository::new(Arc::clone(&db)),
            ssh_cert_repo: SshCertificateRepository::new(Arc::clone(&db)),
            db,
            custody,
            permissions,
            config,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an SSH CA with a fresh key pair. The CA starts active.
    pub async fn create_ssh_ca(
        &self,
        actor: &ActorContext,
        input: CreateSshCaInput,
    ) -> AppResult<SshCaWithPublicKey> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        enforce(
            self.permissions.as_ref(),
            actor,
            &input.project_id,
            PermissionAction::Create,
            PermissionSubject::SshCertificateAuthorities,
        )
        .await?;

        let key_algorithm = self.key_algorithm_or_default(input.key_algorithm)?;
        let key_pair = ssh::create_ssh_key_pair(key_algorithm)?;
        let kms_key_id = self.custody.project_ssh_key_id(&input.project_id).await?;
        let encrypted_private_key = self
            .custody
            .encrypt(&kms_key_id, key_pair.private_key.as_bytes())
            .await?;

        let now = Utc::now();
        let ssh_ca_id = self.id_gen.generate();
        let ca = ssh_certificate_authority::ActiveModel {
            id: Set(ssh_ca_id.clone()),
            project_id: Set(input.project_id),
            friendly_name: Set(input.friendly_name),
            status: Set(SshStatus::Active),
            key_algorithm: Set(key_algorithm.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let secret = ssh_certificate_authority_secret::ActiveModel {
            id: Set(self.id_gen.generate()),
            ssh_ca_id: Set(ssh_ca_id),
            encrypted_private_key: Set(encrypted_private_key),
            created_at: Set(now.into()),
        };

        let repo = self.ssh_ca_repo.clone();
        let created = certvault_db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                let created = repo.create(txn, ca).await?;
                repo.create_secret(txn, secret).await?;
                Ok(created)
            })
        })
        .await?;

        info!(
            ssh_ca_id = %created.id,
            project_id = %created.project_id,
            key_algorithm = %created.key_algorithm,
            "Created SSH CA"
        );
        Ok(SshCaWithPublicKey {
            ca: created,
            public_key: key_pair.public_key,
        })
    }

    /// Get an SSH CA with its public key.
    pub async fn get_ssh_ca_by_id(
        &self,
        actor: &ActorContext,
        ssh_ca_id: &str,
    ) -> AppResult<SshCaWithPublicKey> {
        let ca = self
            .load_ssh_ca(actor, ssh_ca_id, PermissionAction::Read)
            .await?;
        let public_key = self.public_key_of(&ca).await?;
        Ok(SshCaWithPublicKey { ca, public_key })
    }

    /// The SSH CA's public key in OpenSSH encoding.
    pub async fn get_ssh_ca_public_key(&self, ssh_ca_id: &str) -> AppResult<String> {
        let ca = self.ssh_ca_repo.get_by_id(ssh_ca_id).await?;
        self.public_key_of(&ca).await
    }

    /// Rename an SSH CA or change its status.
    pub async fn update_ssh_ca_by_id(
        &self,
        actor: &ActorContext,
        input: UpdateSshCaInput,
    ) -> AppResult<SshCaWithPublicKey> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let ca = self
            .load_ssh_ca(actor, &input.ssh_ca_id, PermissionAction::Edit)
            .await?;

        let mut active: ssh_certificate_authority::ActiveModel = ca.into();
        if let Some(friendly_name) = input.friendly_name {
            active.friendly_name = Set(friendly_name);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = self.ssh_ca_repo.update(active).await?;

        info!(ssh_ca_id = %updated.id, status = ?updated.status, "Updated SSH CA");
        let public_key = self.public_key_of(&updated).await?;
        Ok(SshCaWithPublicKey {
            ca: updated,
            public_key,
        })
    }

    /// Delete an SSH CA with its key and templates. Issued certificates are kept.
    pub async fn delete_ssh_ca_by_id(
        &self,
        actor: &ActorContext,
        ssh_ca_id: &str,
    ) -> AppResult<SshCaWithPublicKey> {
        let ca = self
            .load_ssh_ca(actor, ssh_ca_id, PermissionAction::Delete)
            .await?;
        let public_key = self.public_key_of(&ca).await?;
        self.ssh_ca_repo.delete_by_id(&ca.id).await?;

        info!(ssh_ca_id = %ca.id, project_id = %ca.project_id, "Deleted SSH CA");
        Ok(SshCaWithPublicKey { ca, public_key })
    }

    /// Templates of an SSH CA.
    pub async fn get_ssh_ca_certificate_templates(
        &self,
        actor: &ActorContext,
        ssh_ca_id: &str,
    ) -> AppResult<Vec<ssh_certificate_template::Model>> {
        let ca = self.ssh_ca_repo.get_by_id(ssh_ca_id).await?;
        enforce(
            self.permissions.as_ref(),
            actor,
            &ca.project_id,
            PermissionAction::Read,
            PermissionSubject::SshCertificateTemplates,
        )
        .await?;
        self.template_repo.find_by_ca(&ca.id).await
    }

    /// Generate a client key pair and sign its public key under a template.
    pub async fn issue_ssh_creds(
        &self,
        actor: &ActorContext,
        input: IssueSshCredsInput,
    ) -> AppResult<IssuedSshCreds> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let plan = self
            .plan_signing(
                actor,
                &input.project_id,
                &input.template_name,
                input.cert_type,
                &input.principals,
                input.ttl,
                input.key_id.as_deref(),
            )
            .await?;

        let key_algorithm = self.key_algorithm_or_default(input.key_algorithm)?;
        let key_pair = ssh::create_ssh_key_pair(key_algorithm)?;
        let signed = self
            .sign_and_store(&plan, &key_pair.public_key, input.cert_type, &input.principals)
            .await?;

        Ok(IssuedSshCreds {
            serial_number: signed.serial_number.to_string(),
            signed_key: signed.signed_key,
            private_key: key_pair.private_key,
            public_key: key_pair.public_key,
            key_algorithm,
        })
    }

    /// Sign a caller-supplied public key under a template.
    pub async fn sign_ssh_key(
        &self,
        actor: &ActorContext,
        input: SignSshKeyInput,
    ) -> AppResult<SignedSshKey> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let plan = self
            .plan_signing(
                actor,
                &input.project_id,
                &input.template_name,
                input.cert_type,
                &input.principals,
                input.ttl,
                input.key_id.as_deref(),
            )
            .await?;
        ssh::parse_public_key(&input.public_key)?;

        let signed = self
            .sign_and_store(&plan, &input.public_key, input.cert_type, &input.principals)
            .await?;

        Ok(SignedSshKey {
            serial_number: signed.serial_number.to_string(),
            signed_key: signed.signed_key,
        })
    }

    /// Everything that can be checked without key material.
    #[allow(clippy::too_many_arguments)]
    async fn plan_signing(
        &self,
        actor: &ActorContext,
        project_id: &str,
        template_name: &str,
        cert_type: SshCertType,
        principals: &[String],
        ttl: Option<u64>,
        requested_key_id: Option<&str>,
    ) -> AppResult<SigningPlan> {
        enforce(
            self.permissions.as_ref(),
            actor,
            project_id,
            PermissionAction::Create,
            PermissionSubject::SshCertificates,
        )
        .await?;

        let (template, ssh_ca) = self
            .template_repo
            .find_by_name_in_project(project_id, template_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "SSH certificate template '{template_name}' not found"
                ))
            })?;

        if ssh_ca.status == SshStatus::Disabled {
            return Err(AppError::BadRequest("SSH CA is disabled".to_string()));
        }
        if template.status == SshStatus::Disabled {
            return Err(AppError::BadRequest("SSH certificate template is disabled".to_string()));
        }

        ssh_policy::validate_ssh_certificate_type(&template, cert_type)?;
        ssh_policy::validate_ssh_certificate_principals(cert_type, &template, principals)?;
        let ttl = ssh_policy::validate_ssh_certificate_ttl(&template, ttl)?;

        let key_id = match requested_key_id {
            Some(key_id) if template.allow_custom_key_ids && !key_id.is_empty() => {
                key_id.to_string()
            }
            _ => actor.key_id(),
        };

        debug!(
            template_id = %template.id,
            ssh_ca_id = %ssh_ca.id,
            ttl,
            %key_id,
            "SSH signing request accepted"
        );
        Ok(SigningPlan {
            ssh_ca,
            template,
            key_id,
            ttl,
        })
    }

    async fn sign_and_store(
        &self,
        plan: &SigningPlan,
        public_key: &str,
        cert_type: SshCertType,
        principals: &[String],
    ) -> AppResult<SignedSshCert> {
        let kms_key_id = self
            .custody
            .project_ssh_key_id(&plan.ssh_ca.project_id)
            .await?;
        let secret = self.ssh_ca_repo.get_secret(&plan.ssh_ca.id).await?;
        let ca_private_key = self
            .custody
            .decrypt_to_string(&kms_key_id, &secret.encrypted_private_key)
            .await?;

        let signed = ssh::create_ssh_cert(&SshCertParams {
            ca_private_key: &ca_private_key,
            client_public_key: public_key,
            key_id: &plan.key_id,
            principals,
            cert_type,
            ttl: plan.ttl,
        })?;
        drop(ca_private_key);

        let encrypted_certificate = self
            .custody
            .encrypt(&kms_key_id, signed.signed_key.as_bytes())
            .await?;

        let now = Utc::now();
        let ssh_cert_id = self.id_gen.generate();
        let record = ssh_certificate::ActiveModel {
            id: Set(ssh_cert_id.clone()),
            ssh_ca_id: Set(Some(plan.ssh_ca.id.clone())),
            ssh_certificate_template_id: Set(Some(plan.template.id.clone())),
            serial_number: Set(signed.serial_number.to_string()),
            cert_type: Set(cert_type.into()),
            principals: Set(serde_json::json!(principals)),
            key_id: Set(plan.key_id.clone()),
            not_before: Set(signed.not_before.into()),
            not_after: Set(signed.not_after.into()),
            created_at: Set(now.into()),
        };
        let body = ssh_certificate_body::ActiveModel {
            id: Set(self.id_gen.generate()),
            ssh_cert_id: Set(ssh_cert_id),
            encrypted_certificate: Set(encrypted_certificate),
            created_at: Set(now.into()),
        };

        let repo = self.ssh_cert_repo.clone();
        certvault_db::transaction(self.db.as_ref(), move |txn| {
            Box::pin(async move {
                repo.create(txn, record).await?;
                repo.create_body(txn, body).await?;
                Ok(())
            })
        })
        .await?;

        info!(
            ssh_ca_id = %plan.ssh_ca.id,
            template = %plan.template.name,
            serial_number = signed.serial_number,
            key_id = %plan.key_id,
            cert_type = ?cert_type,
            "Signed SSH certificate"
        );
        Ok(signed)
    }

    async fn load_ssh_ca(
        &self,
        actor: &ActorContext,
        ssh_ca_id: &str,
        action: PermissionAction,
    ) -> AppResult<ssh_certificate_authority::Model> {
        let ca = self.ssh_ca_repo.get_by_id(ssh_ca_id).await?;
        enforce(
            self.permissions.as_ref(),
            actor,
            &ca.project_id,
            action,
            PermissionSubject::SshCertificateAuthorities,
        )
        .await?;
        Ok(ca)
    }

    async fn public_key_of(&self, ca: &ssh_certificate_authority::Model) -> AppResult<String> {
        let kms_key_id = self.custody.project_ssh_key_id(&ca.project_id).await?;
        let secret = self.ssh_ca_repo.get_secret(&ca.id).await?;
        let private_key = self
            .custody
            .decrypt_to_string(&kms_key_id, &secret.encrypted_private_key)
            .await?;
        ssh::get_ssh_public_key(&private_key)
    }

    fn key_algorithm_or_default(
        &self,
        requested: Option<CertKeyAlgorithm>,
    ) -> AppResult<CertKeyAlgorithm> {
        match requested {
            Some(algorithm) => Ok(algorithm),
            None => self
                .config
                .default_key_algorithm
                .parse()
                .map_err(|_| {
                    AppError::Config(format!(
                        "Invalid default SSH key algorithm '{}'",
                        self.config.default_key_algorithm
                    ))
                }),
        }
    }
}
