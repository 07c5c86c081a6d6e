//! Schema tests against an in-memory `SQLite` database.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use certvault_common::AppError;
use certvault_db::{
    entities::{
        certificate::{self, CertStatus},
        certificate_authority::{self, CaStatus, CaType},
        certificate_authority_cert,
        kms_key,
    },
    repositories::{CertificateAuthorityRepository, CertificateRepository, KmsKeyRepository},
    test_utils::TestDatabase,
};
use chrono::Utc;
use sea_orm::Set;

fn ca_model(id: &str) -> certificate_authority::ActiveModel {
    let now = Utc::now();
    certificate_authority::ActiveModel {
        id: Set(id.to_string()),
        project_id: Set("proj1".to_string()),
        parent_ca_id: Set(None),
        ca_type: Set(CaType::Root),
        status: Set(CaStatus::Active),
        dn: Set("CN=Test Root".to_string()),
        common_name: Set("Test Root".to_string()),
        organization: Set(String::new()),
        ou: Set(String::new()),
        country: Set(String::new()),
        province: Set(String::new()),
        locality: Set(String::new()),
        key_algorithm: Set("RSA_2048".to_string()),
        max_path_length: Set(-1),
        serial_number: Set(None),
        not_before: Set(None),
        not_after: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

#[tokio::test]
async fn test_migrations_create_schema() {
    let db = TestDatabase::sqlite().await.unwrap();
    let conn = Arc::new(db.conn);

    let repo = KmsKeyRepository::new(Arc::clone(&conn));
    let key = kms_key::ActiveModel {
        id: Set("key1".to_string()),
        encrypted_data_key: Set(vec![1, 2, 3]),
        created_at: Set(Utc::now().into()),
    };
    repo.create(conn.as_ref(), key).await.unwrap();

    let found = repo.get_by_id("key1").await.unwrap();
    assert_eq!(found.encrypted_data_key, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_error() {
    let db = TestDatabase::sqlite().await.unwrap();
    let conn = Arc::new(db.conn);
    let repo = CertificateAuthorityRepository::new(Arc::clone(&conn));

    let txn_repo = repo.clone();
    let result: Result<(), AppError> = certvault_db::transaction(conn.as_ref(), move |txn| {
        Box::pin(async move {
            txn_repo.create(txn, ca_model("ca1")).await?;
            Err(AppError::Internal("abort".to_string()))
        })
    })
    .await;

    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(repo.find_by_id("ca1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleting_ca_cascades_children_and_keeps_certificates() {
    let db = TestDatabase::sqlite().await.unwrap();
    let conn = Arc::new(db.conn);
    let ca_repo = CertificateAuthorityRepository::new(Arc::clone(&conn));
    let cert_repo = CertificateRepository::new(Arc::clone(&conn));
    let now = Utc::now();

    ca_repo.create(conn.as_ref(), ca_model("ca1")).await.unwrap();
    ca_repo
        .create_cert(
            conn.as_ref(),
            certificate_authority_cert::ActiveModel {
                id: Set("cacert1".to_string()),
                ca_id: Set("ca1".to_string()),
                encrypted_certificate: Set(vec![0]),
                encrypted_certificate_chain: Set(vec![0]),
                created_at: Set(now.into()),
            },
        )
        .await
        .unwrap();
    cert_repo
        .create(
            conn.as_ref(),
            certificate::ActiveModel {
                id: Set("cert1".to_string()),
                project_id: Set("proj1".to_string()),
                ca_id: Set(Some("ca1".to_string())),
                status: Set(CertStatus::Active),
                serial_number: Set("0a".to_string()),
                common_name: Set("leaf".to_string()),
                not_before: Set(now.into()),
                not_after: Set(now.into()),
                revoked_at: Set(None),
                revocation_reason: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            },
        )
        .await
        .unwrap();

    ca_repo.delete_by_id("ca1").await.unwrap();

    assert!(ca_repo.find_cert("ca1").await.unwrap().is_none());
    let cert = cert_repo.get_by_serial("0a").await.unwrap();
    assert_eq!(cert.ca_id, None);
    assert_eq!(cert.status, CertStatus::Active);
}
