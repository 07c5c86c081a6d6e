//! SSH certificate template service.

use std::sync::Arc;

use certvault_common::{AppError, AppResult, IdGenerator};
use certvault_db::{
    entities::{ssh_certificate_authority::SshStatus, ssh_certificate_template},
    repositories::{SshCertificateAuthorityRepository, SshCertificateTemplateRepository},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::permission::{
    ActorContext, PermissionAction, PermissionChecker, PermissionSubject, enforce,
};

fn active() -> SshStatus {
    SshStatus::Active
}

/// Input for creating a template.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSshTemplateInput {
    pub ssh_ca_id: String,
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    #[serde(default = "active")]
    pub status: SshStatus,
    #[validate(range(min = 1))]
    pub ttl: i64,
    #[validate(range(min = 1))]
    pub min_ttl: i64,
    #[validate(range(min = 1))]
    pub max_ttl: i64,
    #[serde(default)]
    pub allowed_users: Vec<String>,
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    #[serde(default)]
    pub allow_user_certificates: bool,
    #[serde(default)]
    pub allow_host_certificates: bool,
    #[serde(default)]
    pub allow_custom_key_ids: bool,
}

/// Input for updating a template. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSshTemplateInput {
    pub template_id: String,
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    pub status: Option<SshStatus>,
    pub ttl: Option<i64>,
    pub min_ttl: Option<i64>,
    pub max_ttl: Option<i64>,
    pub allowed_users: Option<Vec<String>>,
    pub allowed_hosts: Option<Vec<String>>,
    pub allow_user_certificates: Option<bool>,
    pub allow_host_certificates: Option<bool>,
    pub allow_custom_key_ids: Option<bool>,
}

/// Service for SSH certificate templates.
#[derive(Clone)]
pub struct SshCertificateTemplateService {
    ssh_ca_repo: SshCertificateAuthorityRepository,
    template_repo: SshCertificateTemplateRepository,
    permissions: Arc<dyn PermissionChecker>,
    id_gen: IdGenerator,
}

impl SshCertificateTemplateService {
    /// Create a new SSH certificate template service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            ssh_ca_repo: SshCertificateAuthorityRepository::new(Arc::clone(&db)),
            template_repo: SshCertificateTemplateRepository::new(db),
            permissions,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a template under an SSH CA.
    pub async fn create_template(
        &self,
        actor: &ActorContext,
        input: CreateSshTemplateInput,
    ) -> AppResult<ssh_certificate_template::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let ssh_ca = self.ssh_ca_repo.get_by_id(&input.ssh_ca_id).await?;
        self.check(actor, &ssh_ca.project_id, PermissionAction::Create)
            .await?;

        validate_ttl_bounds(input.ttl, input.min_ttl, input.max_ttl)?;
        self.ensure_name_free(&ssh_ca.id, &input.name, None).await?;

        let now = Utc::now();
        let model = ssh_certificate_template::ActiveModel {
            id: Set(self.id_gen.generate()),
            ssh_ca_id: Set(ssh_ca.id),
            status: Set(input.status),
            name: Set(input.name),
            ttl: Set(input.ttl),
            min_ttl: Set(input.min_ttl),
            max_ttl: Set(input.max_ttl),
            allowed_users: Set(serde_json::json!(input.allowed_users)),
            allowed_hosts: Set(serde_json::json!(input.allowed_hosts)),
            allow_user_certificates: Set(input.allow_user_certificates),
            allow_host_certificates: Set(input.allow_host_certificates),
            allow_custom_key_ids: Set(input.allow_custom_key_ids),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let created = self.template_repo.create(model).await?;

        info!(
            template_id = %created.id,
            ssh_ca_id = %created.ssh_ca_id,
            name = %created.name,
            "Created SSH certificate template"
        );
        Ok(created)
    }

    /// Get a template by ID.
    pub async fn get_template_by_id(
        &self,
        actor: &ActorContext,
        template_id: &str,
    ) -> AppResult<ssh_certificate_template::Model> {
        self.load(actor, template_id, PermissionAction::Read).await
    }

    /// Update a template.
    pub async fn update_template(
        &self,
        actor: &ActorContext,
        input: UpdateSshTemplateInput,
    ) -> AppResult<ssh_certificate_template::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let template = self
            .load(actor, &input.template_id, PermissionAction::Edit)
            .await?;

        validate_ttl_bounds(
            input.ttl.unwrap_or(template.ttl),
            input.min_ttl.unwrap_or(template.min_ttl),
            input.max_ttl.unwrap_or(template.max_ttl),
        )?;
        if let Some(name) = &input.name {
            self.ensure_name_free(&template.ssh_ca_id, name, Some(&template.id))
                .await?;
        }

        let mut model: ssh_certificate_template::ActiveModel = template.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(status) = input.status {
            model.status = Set(status);
        }
        if let Some(ttl) = input.ttl {
            model.ttl = Set(ttl);
        }
        if let Some(min_ttl) = input.min_ttl {
            model.min_ttl = Set(min_ttl);
        }
        if let Some(max_ttl) = input.max_ttl {
            model.max_ttl = Set(max_ttl);
        }
        if let Some(users) = input.allowed_users {
            model.allowed_users = Set(serde_json::json!(users));
        }
        if let Some(hosts) = input.allowed_hosts {
            model.allowed_hosts = Set(serde_json::json!(hosts));
        }
        if let Some(allow) = input.allow_user_certificates {
            model.allow_user_certificates = Set(allow);
        }
        if let Some(allow) = input.allow_host_certificates {
            model.allow_host_certificates = Set(allow);
        }
        if let Some(allow) = input.allow_custom_key_ids {
            model.allow_custom_key_ids = Set(allow);
        }
        model.updated_at = Set(Utc::now().into());

        let updated = self.template_repo.update(model).await?;
        info!(template_id = %updated.id, "Updated SSH certificate template");
        Ok(updated)
    }

    /// Delete a template.
    pub async fn delete_template(
        &self,
        actor: &ActorContext,
        template_id: &str,
    ) -> AppResult<ssh_certificate_template::Model> {
        let template = self
            .load(actor, template_id, PermissionAction::Delete)
            .await?;
        self.template_repo.delete_by_id(&template.id).await?;

        info!(
            template_id = %template.id,
            ssh_ca_id = %template.ssh_ca_id,
            "Deleted SSH certificate template"
        );
        Ok(template)
    }

    async fn load(
        &self,
        actor: &ActorContext,
        template_id: &str,
        action: PermissionAction,
    ) -> AppResult<ssh_certificate_template::Model> {
        let template = self.template_repo.get_by_id(template_id).await?;
        let ssh_ca = self.ssh_ca_repo.get_by_id(&template.ssh_ca_id).await?;
        self.check(actor, &ssh_ca.project_id, action).await?;
        Ok(template)
    }

    async fn check(
        &self,
        actor: &ActorContext,
        project_id: &str,
        action: PermissionAction,
    ) -> AppResult<()> {
        enforce(
            self.permissions.as_ref(),
            actor,
            project_id,
            action,
            PermissionSubject::SshCertificateTemplates,
        )
        .await
    }

    async fn ensure_name_free(
        &self,
        ssh_ca_id: &str,
        name: &str,
        except_id: Option<&str>,
    ) -> AppResult<()> {
        let taken = self
            .template_repo
            .find_by_ca_and_name(ssh_ca_id, name)
            .await?
            .is_some_and(|existing| Some(existing.id.as_str()) != except_id);
        if taken {
            return Err(AppError::BadRequest(format!(
                "Template named '{name}' already exists for this SSH CA"
            )));
        }
        Ok(())
    }
}

fn validate_ttl_bounds(ttl: i64, min_ttl: i64, max_ttl: i64) -> AppResult<()> {
    if min_ttl <= 0 || min_ttl > ttl || ttl > max_ttl {
        return Err(AppError::BadRequest(format!(
            "TTL bounds must satisfy 0 < minTtl <= ttl <= maxTtl (got {min_ttl}, {ttl}, {max_ttl})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_bounds() {
        assert!(validate_ttl_bounds(1800, 60, 3600).is_ok());
        assert!(validate_ttl_bounds(60, 60, 60).is_ok());
        assert!(validate_ttl_bounds(30, 60, 3600).is_err());
        assert!(validate_ttl_bounds(7200, 60, 3600).is_err());
        assert!(validate_ttl_bounds(10, 0, 3600).is_err());
    }
}
