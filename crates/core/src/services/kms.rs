//! Key custody.
//!
//! Private keys, certificates and CRLs are stored encrypted under per-project
//! data keys. [`KmsService`] is the encrypt/decrypt capability;
//! [`KeyCustody`] resolves which key a project uses and hands out
//! decrypted material only as [`Zeroizing`] buffers.

use std::sync::Arc;

use async_trait::async_trait;
use certvault_common::{AppError, AppResult, IdGenerator, SymmetricCipher, crypto};
use certvault_db::{
    entities::{kms_key, project_kms_key, project_kms_key::KmsKeyPurpose},
    repositories::KmsKeyRepository,
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Encrypt/decrypt with a named key.
#[async_trait]
pub trait KmsService: Send + Sync {
    /// Create a new data key and return its id.
    async fn generate_kms_key(&self) -> AppResult<String>;

    /// Encrypt `plaintext` under `key_id`.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> AppResult<Vec<u8>>;

    /// Decrypt a blob produced by [`KmsService::encrypt`] with the same key.
    async fn decrypt(&self, key_id: &str, blob: &[u8]) -> AppResult<Zeroizing<Vec<u8>>>;
}

/// Database-backed KMS: random AES-256 data keys wrapped by a root key.
pub struct LocalKmsService {
    db: Arc<DatabaseConnection>,
    kms_repo: KmsKeyRepository,
    root: SymmetricCipher,
    id_gen: IdGenerator,
}

impl LocalKmsService {
    /// Create a KMS backed by `db`, wrapping data keys with `root`.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, root: SymmetricCipher) -> Self {
        Self {
            kms_repo: KmsKeyRepository::new(Arc::clone(&db)),
            db,
            root,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a KMS from a hex-encoded root key.
    pub fn from_hex_root_key(db: Arc<DatabaseConnection>, root_key: &str) -> AppResult<Self> {
        Ok(Self::new(db, SymmetricCipher::from_hex(root_key)?))
    }

    async fn data_key(&self, key_id: &str) -> AppResult<SymmetricCipher> {
        let key = self.kms_repo.get_by_id(key_id).await?;
        let data_key = self.root.open(&key.encrypted_data_key)?;
        SymmetricCipher::new(&data_key)
    }
}

#[async_trait]
impl KmsService for LocalKmsService {
    async fn generate_kms_key(&self) -> AppResult<String> {
        let data_key = crypto::generate_key();
        let model = kms_key::ActiveModel {
            id: Set(self.id_gen.generate_key_id()),
            encrypted_data_key: Set(self.root.seal(&data_key[..])?),
            created_at: Set(Utc::now().into()),
        };

        let key = self.kms_repo.create(self.db.as_ref(), model).await?;
        info!(kms_key_id = %key.id, "Generated KMS key");
        Ok(key.id)
    }

    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        self.data_key(key_id).await?.seal(plaintext)
    }

    async fn decrypt(&self, key_id: &str, blob: &[u8]) -> AppResult<Zeroizing<Vec<u8>>> {
        self.data_key(key_id).await?.open(blob)
    }
}

/// Per-project key resolution on top of a [`KmsService`].
#[derive(Clone)]
pub struct KeyCustody {
    db: Arc<DatabaseConnection>,
    kms: Arc<dyn KmsService>,
    kms_repo: KmsKeyRepository,
    id_gen: IdGenerator,
}

impl KeyCustody {
    /// Create a new key custody service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, kms: Arc<dyn KmsService>) -> Self {
        Self {
            kms_repo: KmsKeyRepository::new(Arc::clone(&db)),
            db,
            kms,
            id_gen: IdGenerator::new(),
        }
    }

    /// Key protecting a project's X.509 material, created on first use.
    pub async fn project_certificate_key_id(&self, project_id: &str) -> AppResult<String> {
        self.project_key_id(project_id, KmsKeyPurpose::Certificate)
            .await
    }

    /// Key protecting a project's SSH material, created on first use.
    pub async fn project_ssh_key_id(&self, project_id: &str) -> AppResult<String> {
        self.project_key_id(project_id, KmsKeyPurpose::Ssh).await
    }

    /// Encrypt `plaintext` under `key_id`.
    pub async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        self.kms.encrypt(key_id, plaintext).await
    }

    /// Decrypt `blob` with `key_id`.
    pub async fn decrypt(&self, key_id: &str, blob: &[u8]) -> AppResult<Zeroizing<Vec<u8>>> {
        self.kms.decrypt(key_id, blob).await
    }

    /// Decrypt `blob` and interpret it as UTF-8 text.
    pub async fn decrypt_to_string(
        &self,
        key_id: &str,
        blob: &[u8],
    ) -> AppResult<Zeroizing<String>> {
        let plaintext = self.decrypt(key_id, blob).await?;
        let text = std::str::from_utf8(&plaintext)
            .map_err(|e| AppError::crypto_failure("Decrypted payload is not UTF-8", e))?;
        Ok(Zeroizing::new(text.to_string()))
    }

    async fn project_key_id(&self, project_id: &str, purpose: KmsKeyPurpose) -> AppResult<String> {
        if let Some(existing) = self.kms_repo.find_project_key(project_id, purpose).await? {
            return Ok(existing.kms_key_id);
        }

        let kms_key_id = self.kms.generate_kms_key().await?;
        let model = project_kms_key::ActiveModel {
            id: Set(self.id_gen.generate()),
            project_id: Set(project_id.to_string()),
            purpose: Set(purpose),
            kms_key_id: Set(kms_key_id),
            created_at: Set(Utc::now().into()),
        };

        match self.kms_repo.create_project_key(self.db.as_ref(), model).await {
            Ok(created) => {
                debug!(project_id, ?purpose, "Assigned project KMS key");
                Ok(created.kms_key_id)
            }
            Err(e) => {
                // Lost a race with a concurrent first use; the winner's key stands.
                warn!(project_id, ?purpose, error = %e, "Project KMS key insert failed");
                self.kms_repo
                    .find_project_key(project_id, purpose)
                    .await?
                    .map(|existing| existing.kms_key_id)
                    .ok_or(e)
            }
        }
    }
}
