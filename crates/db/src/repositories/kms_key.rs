//! KMS key repository.

use std::sync::Arc;

use crate::entities::{
    KmsKey, ProjectKmsKey, kms_key,
    project_kms_key::{self, KmsKeyPurpose},
};
use certvault_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// KMS key repository for database operations.
#[derive(Clone)]
pub struct KmsKeyRepository {
    db: Arc<DatabaseConnection>,
}

impl KmsKeyRepository {
    /// Create a new KMS key repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a KMS key by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<kms_key::Model>> {
        KmsKey::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a KMS key by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<kms_key::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("KMS key {id} not found")))
    }

    /// Find the key a project uses for `purpose`.
    pub async fn find_project_key(
        &self,
        project_id: &str,
        purpose: KmsKeyPurpose,
    ) -> AppResult<Option<project_kms_key::Model>> {
        ProjectKmsKey::find()
            .filter(project_kms_key::Column::ProjectId.eq(project_id))
            .filter(project_kms_key::Column::Purpose.eq(purpose))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new KMS key.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: kms_key::ActiveModel,
    ) -> AppResult<kms_key::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Link a KMS key to a project.
    pub async fn create_project_key<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: project_kms_key::ActiveModel,
    ) -> AppResult<project_kms_key::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
