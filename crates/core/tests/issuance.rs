//! End-to-end issuance flows against an in-memory `SQLite` database.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use certvault_common::{
    AppError, AppResult, CertKeyAlgorithm, RevocationReason, SshCertType, SymmetricCipher,
    config::{PkiConfig, SshConfig},
    crypto, ssh, x509,
};
use certvault_core::{
    ActorContext, ActorType, AllowAllPermissions, CertificateAuthorityService, CertificateService,
    CreateCaInput, CreateSshCaInput, CreateSshTemplateInput, ImportCaCertificateInput,
    IssueCertificateInput, IssueSshCredsInput, KeyCustody, LocalKmsService, PermissionAction,
    PermissionChecker, PermissionDecision, PermissionSubject, RevokeCertificateInput,
    SignIntermediateInput, SignSshKeyInput, SshCertificateAuthorityService,
    SshCertificateTemplateService, UpdateCaInput, UpdateSshTemplateInput,
};
use certvault_db::{
    entities::{
        certificate::CertStatus,
        certificate_authority::{self, CaStatus, CaType},
        ssh_certificate_authority::SshStatus,
    },
    test_utils::TestDatabase,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;

struct DenyAll;

#[async_trait]
impl PermissionChecker for DenyAll {
    async fn check(
        &self,
        _actor: &ActorContext,
        _project_id: &str,
        _action: PermissionAction,
        _subject: PermissionSubject,
    ) -> AppResult<PermissionDecision> {
        Ok(PermissionDecision::Deny {
            reason: "not a project member".to_string(),
        })
    }
}

struct Harness {
    ca: CertificateAuthorityService,
    certs: CertificateService,
    ssh: SshCertificateAuthorityService,
    templates: SshCertificateTemplateService,
    custody: KeyCustody,
    actor: ActorContext,
}

async fn harness_with(permissions: Arc<dyn PermissionChecker>) -> Harness {
    let db: Arc<DatabaseConnection> = Arc::new(TestDatabase::sqlite().await.unwrap().conn);
    let root = SymmetricCipher::new(&[7u8; crypto::KEY_LEN]).unwrap();
    let kms = Arc::new(LocalKmsService::new(Arc::clone(&db), root));
    let custody = KeyCustody::new(Arc::clone(&db), kms);

    Harness {
        ca: CertificateAuthorityService::new(
            Arc::clone(&db),
            custody.clone(),
            Arc::clone(&permissions),
            PkiConfig::default(),
        ),
        certs: CertificateService::new(Arc::clone(&db), custody.clone(), Arc::clone(&permissions)),
        ssh: SshCertificateAuthorityService::new(
            Arc::clone(&db),
            custody.clone(),
            Arc::clone(&permissions),
            SshConfig {
                default_key_algorithm: "EC_prime256v1".to_string(),
            },
        ),
        templates: SshCertificateTemplateService::new(Arc::clone(&db), permissions),
        custody,
        actor: ActorContext {
            actor: ActorType::User,
            actor_id: "u1".to_string(),
            actor_auth_method: Some("email".to_string()),
            actor_org_id: Some("org1".to_string()),
        },
    }
}

async fn harness() -> Harness {
    harness_with(Arc::new(AllowAllPermissions)).await
}

fn ca_input(ca_type: CaType, common_name: &str, max_path_length: i32) -> CreateCaInput {
    CreateCaInput {
        project_id: "proj1".to_string(),
        ca_type,
        common_name: common_name.to_string(),
        organization: "Acme".to_string(),
        ou: String::new(),
        country: "US".to_string(),
        province: String::new(),
        locality: String::new(),
        not_before: None,
        not_after: Some(Utc::now() + Duration::days(365)),
        max_path_length,
        key_algorithm: CertKeyAlgorithm::EcPrime256v1,
    }
}

fn not_after_of(ca: &certificate_authority::Model) -> DateTime<Utc> {
    ca.not_after.unwrap().to_utc()
}

/// Create a pending intermediate and have `parent_id` sign it.
async fn sign_under(
    h: &Harness,
    parent_id: &str,
    common_name: &str,
    max_path_length: i32,
) -> (certificate_authority::Model, AppResult<certvault_core::SignedIntermediate>) {
    let pending = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Intermediate, common_name, -1))
        .await
        .unwrap();
    let csr = h.ca.get_ca_csr(&h.actor, &pending.id).await.unwrap();

    let signed = h
        .ca
        .sign_intermediate(
            &h.actor,
            SignIntermediateInput {
                ca_id: parent_id.to_string(),
                csr,
                not_before: None,
                not_after: Utc::now() + Duration::days(180),
                max_path_length,
            },
        )
        .await;
    (pending, signed)
}

#[tokio::test]
async fn test_root_ca_is_self_signed_with_path_length() {
    let h = harness().await;

    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", 1))
        .await
        .unwrap();
    assert_eq!(root.status, CaStatus::Active);
    assert_eq!(root.max_path_length, 1);
    assert_eq!(root.dn, "C=US, O=Acme, CN=Acme Root");

    let ca_cert = h.ca.get_ca_cert(&h.actor, &root.id).await.unwrap();
    assert!(ca_cert.certificate_chain.is_empty());
    assert_eq!(Some(ca_cert.serial_number.clone()), root.serial_number);

    let cert = x509::parse_certificate(&ca_cert.certificate).unwrap();
    assert!(cert.verify(&cert.public_key().unwrap()).unwrap());
    assert_eq!(x509::issuer_dn_string(&cert), root.dn);

    let info = x509::inspect_certificate(&cert.to_der().unwrap()).unwrap();
    assert!(info.is_ca);
    assert_eq!(info.path_length, Some(1));
}

#[tokio::test]
async fn test_intermediate_path_length_is_enforced() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", 1))
        .await
        .unwrap();

    let (intermediate, signed) = sign_under(&h, &root.id, "Acme Issuing", 0).await;
    let signed = signed.unwrap();
    assert_eq!(intermediate.status, CaStatus::PendingCertificate);

    let imported = h
        .ca
        .import_cert_to_ca(
            &h.actor,
            ImportCaCertificateInput {
                ca_id: intermediate.id.clone(),
                certificate: signed.certificate,
                certificate_chain: signed.certificate_chain,
            },
        )
        .await
        .unwrap();
    assert_eq!(imported.status, CaStatus::Active);
    assert_eq!(imported.max_path_length, 0);
    assert_eq!(imported.parent_ca_id.as_deref(), Some(root.id.as_str()));

    let (_, refused) = sign_under(&h, &intermediate.id, "Acme Sub Issuing", -1).await;
    match refused {
        Err(AppError::BadRequest(message)) => assert!(message.contains("path length")),
        other => panic!("expected path length error, got {:?}", other.map(|s| s.serial_number)),
    }
}

#[tokio::test]
async fn test_child_path_length_must_be_below_parent() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", 1))
        .await
        .unwrap();

    let (_, same) = sign_under(&h, &root.id, "Acme Issuing", 1).await;
    assert!(matches!(same, Err(AppError::BadRequest(_))));
    let (_, unlimited) = sign_under(&h, &root.id, "Acme Issuing 2", -1).await;
    assert!(matches!(unlimited, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn test_second_import_is_rejected() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let (intermediate, signed) = sign_under(&h, &root.id, "Acme Issuing", 0).await;
    let signed = signed.unwrap();

    let import = || ImportCaCertificateInput {
        ca_id: intermediate.id.clone(),
        certificate: signed.certificate.clone(),
        certificate_chain: signed.certificate_chain.clone(),
    };
    h.ca.import_cert_to_ca(&h.actor, import()).await.unwrap();
    assert!(matches!(
        h.ca.import_cert_to_ca(&h.actor, import()).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_import_rejects_broken_chain_and_foreign_key() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let other_root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Other Root", -1))
        .await
        .unwrap();
    let other_root_pem = h
        .ca
        .get_ca_cert(&h.actor, &other_root.id)
        .await
        .unwrap()
        .certificate;

    let (intermediate, signed) = sign_under(&h, &root.id, "Acme Issuing", 0).await;
    let signed = signed.unwrap();

    let wrong_chain = h
        .ca
        .import_cert_to_ca(
            &h.actor,
            ImportCaCertificateInput {
                ca_id: intermediate.id.clone(),
                certificate: signed.certificate.clone(),
                certificate_chain: other_root_pem,
            },
        )
        .await;
    assert!(matches!(wrong_chain, Err(AppError::BadRequest(_))));

    let (other_pending, _) = sign_under(&h, &root.id, "Acme Issuing 2", 0).await;
    let foreign_key = h
        .ca
        .import_cert_to_ca(
            &h.actor,
            ImportCaCertificateInput {
                ca_id: other_pending.id,
                certificate: signed.certificate,
                certificate_chain: signed.certificate_chain,
            },
        )
        .await;
    assert!(matches!(foreign_key, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn test_leaf_must_nest_within_ca_window() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let ca_expiry = not_after_of(&root);

    let request = |not_after| IssueCertificateInput {
        ca_id: root.id.clone(),
        common_name: "www.example.com".to_string(),
        ttl: None,
        not_before: None,
        not_after: Some(not_after),
    };

    let too_long = h
        .ca
        .issue_cert_from_ca(&h.actor, request(ca_expiry + Duration::days(1)))
        .await;
    assert!(matches!(too_long, Err(AppError::BadRequest(_))));

    let issued = h
        .ca
        .issue_cert_from_ca(&h.actor, request(ca_expiry - Duration::days(1)))
        .await
        .unwrap();
    assert!(issued.private_key.contains("PRIVATE KEY"));

    let record = h
        .certs
        .get_cert_by_serial(&h.actor, &issued.serial_number)
        .await
        .unwrap();
    assert_eq!(record.status, CertStatus::Active);
    assert_eq!(record.ca_id.as_deref(), Some(root.id.as_str()));
    assert_eq!(record.common_name, "www.example.com");

    let body = h
        .certs
        .get_cert_body(&h.actor, &issued.serial_number)
        .await
        .unwrap();
    assert_eq!(body.trim(), issued.certificate.trim());
}

#[tokio::test]
async fn test_leaf_chain_verifies_through_intermediate() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let (intermediate, signed) = sign_under(&h, &root.id, "Acme Issuing", 0).await;
    let signed = signed.unwrap();
    h.ca.import_cert_to_ca(
        &h.actor,
        ImportCaCertificateInput {
            ca_id: intermediate.id.clone(),
            certificate: signed.certificate,
            certificate_chain: signed.certificate_chain,
        },
    )
    .await
    .unwrap();

    let issued = h
        .ca
        .issue_cert_from_ca(
            &h.actor,
            IssueCertificateInput {
                ca_id: intermediate.id.clone(),
                common_name: "api.example.com".to_string(),
                ttl: Some(3600),
                not_before: None,
                not_after: None,
            },
        )
        .await
        .unwrap();

    let leaf = x509::parse_certificate(&issued.certificate).unwrap();
    let chain = x509::parse_certificate_chain(&issued.certificate_chain).unwrap();
    assert_eq!(chain.len(), 2);
    x509::verify_certificate_chain(&leaf, &chain).unwrap();

    let info = x509::inspect_certificate(&leaf.to_der().unwrap()).unwrap();
    assert!(!info.is_ca);
    let lifetime = info.validity.not_after - info.validity.not_before;
    assert!((lifetime - Duration::seconds(3600)).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_custody_round_trip_is_byte_identical() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", 2))
        .await
        .unwrap();
    let pem = h.ca.get_ca_cert(&h.actor, &root.id).await.unwrap().certificate;
    let der = x509::parse_certificate(&pem).unwrap().to_der().unwrap();

    let key_id = h.custody.project_certificate_key_id("proj1").await.unwrap();
    assert_eq!(
        key_id,
        h.custody.project_certificate_key_id("proj1").await.unwrap()
    );
    let blob = h.custody.encrypt(&key_id, &der).await.unwrap();
    let decrypted = h.custody.decrypt(&key_id, &blob).await.unwrap();
    assert_eq!(&decrypted[..], &der[..]);

    let before = x509::inspect_certificate(&der).unwrap();
    let after = x509::inspect_certificate(&decrypted).unwrap();
    assert_eq!(before, after);
    let reparsed_pem = x509::certificate_der_to_pem(&decrypted).unwrap();
    let reparsed = x509::parse_certificate(&reparsed_pem).unwrap();
    assert_eq!(x509::issuer_dn_string(&reparsed), root.dn);
}

#[tokio::test]
async fn test_revocation_appears_after_crl_rotation() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let issued = h
        .ca
        .issue_cert_from_ca(
            &h.actor,
            IssueCertificateInput {
                ca_id: root.id.clone(),
                common_name: "www.example.com".to_string(),
                ttl: Some(86_400),
                not_before: None,
                not_after: None,
            },
        )
        .await
        .unwrap();

    let revoke = || RevokeCertificateInput {
        serial_number: issued.serial_number.clone(),
        revocation_reason: RevocationReason::KeyCompromise,
    };
    let revoked = h.certs.revoke_cert(&h.actor, revoke()).await.unwrap();
    assert_eq!(revoked.status, CertStatus::Revoked);
    assert_eq!(revoked.revocation_reason, Some(1));
    assert!(matches!(
        h.certs.revoke_cert(&h.actor, revoke()).await,
        Err(AppError::InvalidState(_))
    ));

    let normalize = |hex: &str| hex.trim_start_matches('0').to_lowercase();
    let revoked_serials = |pem: &str| {
        let crl = openssl::x509::X509Crl::from_pem(pem.as_bytes()).unwrap();
        crl.get_revoked()
            .map(|stack| {
                stack
                    .iter()
                    .map(|r| normalize(&r.serial_number().to_bn().unwrap().to_hex_str().unwrap()))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default()
    };

    let stale = h.ca.get_ca_crl(&h.actor, &root.id).await.unwrap();
    assert!(revoked_serials(&stale).is_empty());

    let rotated = h.ca.rotate_ca_crl(&h.actor, &root.id).await.unwrap();
    assert_eq!(revoked_serials(&rotated), vec![normalize(&issued.serial_number)]);
    assert_eq!(h.ca.get_ca_crl(&h.actor, &root.id).await.unwrap(), rotated);
}

#[tokio::test]
async fn test_ca_status_transitions() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let pending = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Intermediate, "Acme Issuing", -1))
        .await
        .unwrap();

    let set_status = |ca_id: &str, status| UpdateCaInput {
        ca_id: ca_id.to_string(),
        status: Some(status),
    };

    assert!(matches!(
        h.ca.update_ca_by_id(&h.actor, set_status(&pending.id, CaStatus::Active)).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(matches!(
        h.ca.update_ca_by_id(&h.actor, set_status(&root.id, CaStatus::PendingCertificate)).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        h.ca.get_ca_csr(&h.actor, &root.id).await,
        Err(AppError::InvalidState(_))
    ));

    let disabled = h
        .ca
        .update_ca_by_id(&h.actor, set_status(&root.id, CaStatus::Disabled))
        .await
        .unwrap();
    assert_eq!(disabled.status, CaStatus::Disabled);

    let refused = h
        .ca
        .issue_cert_from_ca(
            &h.actor,
            IssueCertificateInput {
                ca_id: root.id.clone(),
                common_name: "www.example.com".to_string(),
                ttl: Some(60),
                not_before: None,
                not_after: None,
            },
        )
        .await;
    assert!(matches!(refused, Err(AppError::BadRequest(_))));

    // Pending intermediates still publish an (empty) CRL.
    assert!(
        h.ca.get_ca_crl(&h.actor, &pending.id)
            .await
            .unwrap()
            .contains("BEGIN X509 CRL")
    );
}

#[tokio::test]
async fn test_deleting_ca_keeps_issued_certificates() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let issued = h
        .ca
        .issue_cert_from_ca(
            &h.actor,
            IssueCertificateInput {
                ca_id: root.id.clone(),
                common_name: "www.example.com".to_string(),
                ttl: Some(600),
                not_before: None,
                not_after: None,
            },
        )
        .await
        .unwrap();

    h.ca.delete_ca_by_id(&h.actor, &root.id).await.unwrap();
    assert!(matches!(
        h.ca.get_ca_by_id(&h.actor, &root.id).await,
        Err(AppError::NotFound(_))
    ));

    let record = h
        .certs
        .get_cert_by_serial(&h.actor, &issued.serial_number)
        .await
        .unwrap();
    assert_eq!(record.ca_id, None);
    assert_eq!(record.status, CertStatus::Active);
}

#[tokio::test]
async fn test_denied_actor_is_forbidden() {
    let h = harness_with(Arc::new(DenyAll)).await;

    let result = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await;
    match result {
        Err(AppError::Forbidden(reason)) => assert_eq!(reason, "not a project member"),
        other => panic!("expected Forbidden, got {:?}", other.map(|ca| ca.id)),
    }

    let ssh = h
        .ssh
        .create_ssh_ca(
            &h.actor,
            CreateSshCaInput {
                project_id: "proj1".to_string(),
                friendly_name: "ops".to_string(),
                key_algorithm: None,
            },
        )
        .await;
    assert!(matches!(ssh, Err(AppError::Forbidden(_))));
}

async fn ssh_ca_with_template(h: &Harness, allow_custom_key_ids: bool) -> String {
    let ssh_ca = h
        .ssh
        .create_ssh_ca(
            &h.actor,
            CreateSshCaInput {
                project_id: "proj1".to_string(),
                friendly_name: "ops".to_string(),
                key_algorithm: Some(CertKeyAlgorithm::EcPrime256v1),
            },
        )
        .await
        .unwrap();
    assert_eq!(ssh_ca.ca.status, SshStatus::Active);
    assert!(ssh_ca.public_key.starts_with("ecdsa-sha2-nistp256 "));

    let template = h
        .templates
        .create_template(
            &h.actor,
            CreateSshTemplateInput {
                ssh_ca_id: ssh_ca.ca.id.clone(),
                name: "engineers".to_string(),
                status: SshStatus::Active,
                ttl: 3600,
                min_ttl: 60,
                max_ttl: 3600,
                allowed_users: vec!["alice".to_string()],
                allowed_hosts: vec!["*.example.com".to_string()],
                allow_user_certificates: true,
                allow_host_certificates: false,
                allow_custom_key_ids,
            },
        )
        .await
        .unwrap();
    template.id
}

fn creds_request(ttl: Option<u64>, key_id: Option<&str>) -> IssueSshCredsInput {
    IssueSshCredsInput {
        project_id: "proj1".to_string(),
        template_name: "engineers".to_string(),
        key_algorithm: Some(CertKeyAlgorithm::EcPrime256v1),
        cert_type: SshCertType::User,
        principals: vec!["alice".to_string()],
        ttl,
        key_id: key_id.map(ToString::to_string),
    }
}

#[tokio::test]
async fn test_ssh_ttl_bounds_and_validity() {
    let h = harness().await;
    ssh_ca_with_template(&h, false).await;

    assert!(matches!(
        h.ssh.issue_ssh_creds(&h.actor, creds_request(Some(7200), None)).await,
        Err(AppError::BadRequest(_))
    ));

    let issued = h
        .ssh
        .issue_ssh_creds(&h.actor, creds_request(Some(1800), None))
        .await
        .unwrap();
    assert!(issued.private_key.contains("OPENSSH PRIVATE KEY"));

    let cert = ssh_key::Certificate::from_openssh(&issued.signed_key).unwrap();
    assert_eq!(cert.valid_before() - cert.valid_after(), 1800);
    let now = u64::try_from(Utc::now().timestamp()).unwrap();
    assert!(cert.valid_after().abs_diff(now) <= 5);
    assert_eq!(cert.valid_principals(), ["alice".to_string()]);
    assert_eq!(cert.serial().to_string(), issued.serial_number);
}

#[tokio::test]
async fn test_ssh_key_id_cannot_be_forged() {
    let h = harness().await;
    ssh_ca_with_template(&h, false).await;

    let issued = h
        .ssh
        .issue_ssh_creds(&h.actor, creds_request(None, Some("root")))
        .await
        .unwrap();
    let cert = ssh_key::Certificate::from_openssh(&issued.signed_key).unwrap();
    assert_eq!(cert.key_id(), "user-u1");
    assert_eq!(cert.valid_before() - cert.valid_after(), 3600);
}

#[tokio::test]
async fn test_ssh_custom_key_id_when_template_allows() {
    let h = harness().await;
    let template_id = ssh_ca_with_template(&h, true).await;

    let issued = h
        .ssh
        .issue_ssh_creds(&h.actor, creds_request(None, Some("deploy-bot")))
        .await
        .unwrap();
    let cert = ssh_key::Certificate::from_openssh(&issued.signed_key).unwrap();
    assert_eq!(cert.key_id(), "deploy-bot");

    let fallback = h
        .ssh
        .issue_ssh_creds(&h.actor, creds_request(None, None))
        .await
        .unwrap();
    let cert = ssh_key::Certificate::from_openssh(&fallback.signed_key).unwrap();
    assert_eq!(cert.key_id(), "user-u1");

    h.templates
        .update_template(
            &h.actor,
            UpdateSshTemplateInput {
                template_id,
                status: Some(SshStatus::Disabled),
                ..UpdateSshTemplateInput::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(
        h.ssh.issue_ssh_creds(&h.actor, creds_request(None, None)).await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn test_sign_ssh_key_enforces_policy() {
    let h = harness().await;
    ssh_ca_with_template(&h, false).await;
    let client = ssh::create_ssh_key_pair(CertKeyAlgorithm::EcPrime256v1).unwrap();

    let request = |cert_type, principals: &[&str], template_name: &str| SignSshKeyInput {
        project_id: "proj1".to_string(),
        template_name: template_name.to_string(),
        public_key: client.public_key.clone(),
        cert_type,
        principals: principals.iter().map(ToString::to_string).collect(),
        ttl: Some(600),
        key_id: None,
    };

    assert!(matches!(
        h.ssh
            .sign_ssh_key(&h.actor, request(SshCertType::User, &["alice"], "missing"))
            .await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        h.ssh
            .sign_ssh_key(&h.actor, request(SshCertType::Host, &["web.example.com"], "engineers"))
            .await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        h.ssh
            .sign_ssh_key(&h.actor, request(SshCertType::User, &["mallory"], "engineers"))
            .await,
        Err(AppError::BadRequest(_))
    ));

    let signed = h
        .ssh
        .sign_ssh_key(&h.actor, request(SshCertType::User, &["alice"], "engineers"))
        .await
        .unwrap();
    let cert = ssh_key::Certificate::from_openssh(&signed.signed_key).unwrap();
    assert_eq!(
        cert.public_key(),
        ssh_key::PublicKey::from_openssh(&client.public_key)
            .unwrap()
            .key_data()
    );
}

#[tokio::test]
async fn test_ssh_ca_lifecycle() {
    let h = harness().await;
    ssh_ca_with_template(&h, false).await;
    let ssh_ca = h
        .ssh
        .create_ssh_ca(
            &h.actor,
            CreateSshCaInput {
                project_id: "proj1".to_string(),
                friendly_name: "spare".to_string(),
                key_algorithm: None,
            },
        )
        .await
        .unwrap();

    let public_key = h.ssh.get_ssh_ca_public_key(&ssh_ca.ca.id).await.unwrap();
    assert_eq!(public_key, ssh_ca.public_key);

    let updated = h
        .ssh
        .update_ssh_ca_by_id(
            &h.actor,
            certvault_core::UpdateSshCaInput {
                ssh_ca_id: ssh_ca.ca.id.clone(),
                friendly_name: Some("renamed".to_string()),
                status: Some(SshStatus::Disabled),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.ca.friendly_name, "renamed");
    assert_eq!(updated.ca.status, SshStatus::Disabled);
    assert_eq!(updated.public_key, public_key);

    assert!(
        h.ssh
            .get_ssh_ca_certificate_templates(&h.actor, &ssh_ca.ca.id)
            .await
            .unwrap()
            .is_empty()
    );

    h.ssh.delete_ssh_ca_by_id(&h.actor, &ssh_ca.ca.id).await.unwrap();
    assert!(matches!(
        h.ssh.get_ssh_ca_by_id(&h.actor, &ssh_ca.ca.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_template_names_are_unique_per_ca() {
    let h = harness().await;
    let template_id = ssh_ca_with_template(&h, false).await;
    let template = h
        .templates
        .get_template_by_id(&h.actor, &template_id)
        .await
        .unwrap();

    let duplicate = h
        .templates
        .create_template(
            &h.actor,
            CreateSshTemplateInput {
                ssh_ca_id: template.ssh_ca_id.clone(),
                name: "engineers".to_string(),
                status: SshStatus::Active,
                ttl: 60,
                min_ttl: 60,
                max_ttl: 60,
                allowed_users: vec![],
                allowed_hosts: vec![],
                allow_user_certificates: true,
                allow_host_certificates: false,
                allow_custom_key_ids: false,
            },
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let bad_bounds = h
        .templates
        .update_template(
            &h.actor,
            UpdateSshTemplateInput {
                template_id: template_id.clone(),
                ttl: Some(7200),
                ..UpdateSshTemplateInput::default()
            },
        )
        .await;
    assert!(matches!(bad_bounds, Err(AppError::BadRequest(_))));

    h.templates
        .delete_template(&h.actor, &template_id)
        .await
        .unwrap();
    assert!(matches!(
        h.templates.get_template_by_id(&h.actor, &template_id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_oversized_leaf_ttl_is_rejected() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();

    for ttl in [i64::MAX, i64::MAX / 1000] {
        let result = h
            .ca
            .issue_cert_from_ca(
                &h.actor,
                IssueCertificateInput {
                    ca_id: root.id.clone(),
                    common_name: "www.example.com".to_string(),
                    ttl: Some(ttl),
                    not_before: None,
                    not_after: None,
                },
            )
            .await;
        match result {
            Err(AppError::BadRequest(message)) => assert_eq!(message, "ttl out of range"),
            other => panic!("expected BadRequest, got {:?}", other.map(|c| c.serial_number)),
        }
    }
}

#[tokio::test]
async fn test_import_accepts_chain_ending_below_root() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();

    let (issuing, signed) = sign_under(&h, &root.id, "Acme Issuing", 1).await;
    let signed = signed.unwrap();
    let issuing = h
        .ca
        .import_cert_to_ca(
            &h.actor,
            ImportCaCertificateInput {
                ca_id: issuing.id.clone(),
                certificate: signed.certificate,
                certificate_chain: signed.certificate_chain,
            },
        )
        .await
        .unwrap();

    let sub = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Intermediate, "Acme Sub Issuing", -1))
        .await
        .unwrap();
    let csr = h.ca.get_ca_csr(&h.actor, &sub.id).await.unwrap();
    let sub_signed = h
        .ca
        .sign_intermediate(
            &h.actor,
            SignIntermediateInput {
                ca_id: issuing.id.clone(),
                csr,
                not_before: None,
                not_after: not_after_of(&issuing) - Duration::days(1),
                max_path_length: 0,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        x509::parse_certificate_chain(&sub_signed.certificate_chain)
            .unwrap()
            .len(),
        2
    );

    // Only the issuing CA, without the root above it.
    let imported = h
        .ca
        .import_cert_to_ca(
            &h.actor,
            ImportCaCertificateInput {
                ca_id: sub.id.clone(),
                certificate: sub_signed.certificate,
                certificate_chain: sub_signed.issuing_ca_certificate,
            },
        )
        .await
        .unwrap();
    assert_eq!(imported.status, CaStatus::Active);
    assert_eq!(imported.max_path_length, 0);
    assert_eq!(imported.parent_ca_id.as_deref(), Some(issuing.id.as_str()));
}

#[tokio::test]
async fn test_import_rejects_empty_chain() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let (pending, signed) = sign_under(&h, &root.id, "Acme Issuing", 0).await;

    let result = h
        .ca
        .import_cert_to_ca(
            &h.actor,
            ImportCaCertificateInput {
                ca_id: pending.id,
                certificate: signed.unwrap().certificate,
                certificate_chain: String::new(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn test_disabled_parent_cannot_sign_intermediate() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    h.ca.update_ca_by_id(
        &h.actor,
        UpdateCaInput {
            ca_id: root.id.clone(),
            status: Some(CaStatus::Disabled),
        },
    )
    .await
    .unwrap();

    let (_, refused) = sign_under(&h, &root.id, "Acme Issuing", 0).await;
    match refused {
        Err(AppError::BadRequest(message)) => assert!(message.contains("disabled")),
        other => panic!("expected BadRequest, got {:?}", other.map(|s| s.serial_number)),
    }
}

#[tokio::test]
async fn test_intermediate_window_must_nest_within_parent() {
    let h = harness().await;
    let root = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Root, "Acme Root", -1))
        .await
        .unwrap();
    let root_not_before = root.not_before.unwrap().to_utc();
    let root_not_after = not_after_of(&root);

    let pending = h
        .ca
        .create_ca(&h.actor, ca_input(CaType::Intermediate, "Acme Issuing", -1))
        .await
        .unwrap();
    let csr = h.ca.get_ca_csr(&h.actor, &pending.id).await.unwrap();
    let request = |not_before, not_after| SignIntermediateInput {
        ca_id: root.id.clone(),
        csr: csr.clone(),
        not_before,
        not_after,
        max_path_length: 0,
    };

    let starts_early = h
        .ca
        .sign_intermediate(
            &h.actor,
            request(
                Some(root_not_before - Duration::days(1)),
                root_not_after - Duration::days(1),
            ),
        )
        .await;
    assert!(matches!(starts_early, Err(AppError::BadRequest(_))));

    let ends_late = h
        .ca
        .sign_intermediate(&h.actor, request(None, root_not_after + Duration::days(1)))
        .await;
    assert!(matches!(ends_late, Err(AppError::BadRequest(_))));

    let nested = h
        .ca
        .sign_intermediate(&h.actor, request(None, root_not_after - Duration::days(1)))
        .await
        .unwrap();
    let info = x509::inspect_certificate(
        &x509::parse_certificate(&nested.certificate)
            .unwrap()
            .to_der()
            .unwrap(),
    )
    .unwrap();
    assert!(info.validity.not_after <= root_not_after);
}

#[tokio::test]
async fn test_disabled_ssh_ca_blocks_issuance() {
    let h = harness().await;
    let template_id = ssh_ca_with_template(&h, false).await;
    let template = h
        .templates
        .get_template_by_id(&h.actor, &template_id)
        .await
        .unwrap();

    h.ssh
        .issue_ssh_creds(&h.actor, creds_request(None, None))
        .await
        .unwrap();

    h.ssh
        .update_ssh_ca_by_id(
            &h.actor,
            certvault_core::UpdateSshCaInput {
                ssh_ca_id: template.ssh_ca_id.clone(),
                friendly_name: None,
                status: Some(SshStatus::Disabled),
            },
        )
        .await
        .unwrap();

    match h.ssh.issue_ssh_creds(&h.actor, creds_request(None, None)).await {
        Err(AppError::BadRequest(message)) => assert_eq!(message, "SSH CA is disabled"),
        other => panic!("expected BadRequest, got {:?}", other.map(|c| c.serial_number)),
    }
}
