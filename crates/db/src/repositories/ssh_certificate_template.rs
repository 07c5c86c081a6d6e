//! SSH certificate template repository.

use std::sync::Arc;

use crate::entities::{
    SshCertificateAuthority, SshCertificateTemplate, ssh_certificate_authority,
    ssh_certificate_template,
};
use certvault_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// SSH certificate template repository for database operations.
#[derive(Clone)]
pub struct SshCertificateTemplateRepository {
    db: Arc<DatabaseConnection>,
}

impl SshCertificateTemplateRepository {
    /// Create a new SSH certificate template repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a template by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ssh_certificate_template::Model>> {
        SshCertificateTemplate::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a template by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<ssh_certificate_template::Model> {
        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("SSH certificate template with ID '{id}' not found"))
        })
    }

    /// Find a template by name among the SSH CAs of a project, together with its CA.
    pub async fn find_by_name_in_project(
        &self,
        project_id: &str,
        name: &str,
    ) -> AppResult<
        Option<(
            ssh_certificate_template::Model,
            ssh_certificate_authority::Model,
        )>,
    > {
        let found = SshCertificateTemplate::find()
            .find_also_related(SshCertificateAuthority)
            .filter(ssh_certificate_template::Column::Name.eq(name))
            .filter(ssh_certificate_authority::Column::ProjectId.eq(project_id))
            .order_by_asc(ssh_certificate_template::Column::CreatedAt)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.and_then(|(template, ca)| ca.map(|ca| (template, ca))))
    }

    /// Find a template by name under one SSH CA.
    pub async fn find_by_ca_and_name(
        &self,
        ssh_ca_id: &str,
        name: &str,
    ) -> AppResult<Option<ssh_certificate_template::Model>> {
        SshCertificateTemplate::find()
            .filter(ssh_certificate_template::Column::SshCaId.eq(ssh_ca_id))
            .filter(ssh_certificate_template::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List the templates of an SSH CA, oldest first.
    pub async fn find_by_ca(
        &self,
        ssh_ca_id: &str,
    ) -> AppResult<Vec<ssh_certificate_template::Model>> {
        SshCertificateTemplate::find()
            .filter(ssh_certificate_template::Column::SshCaId.eq(ssh_ca_id))
            .order_by_asc(ssh_certificate_template::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new template.
    pub async fn create(
        &self,
        model: ssh_certificate_template::ActiveModel,
    ) -> AppResult<ssh_certificate_template::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a template.
    pub async fn update(
        &self,
        model: ssh_certificate_template::ActiveModel,
    ) -> AppResult<ssh_certificate_template::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a template.
    pub async fn delete_by_id(&self, id: &str) -> AppResult<()> {
        SshCertificateTemplate::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
