//! Permission checking.
//!
//! The authorization engine lives outside this crate; services only see a
//! [`PermissionChecker`] and call it before touching anything.

use std::fmt;

use async_trait::async_trait;
use certvault_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Kind of principal making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    User,
    Service,
    Identity,
}

impl ActorType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Service => "service",
            Self::Identity => "identity",
        }
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is calling, as established by the caller's authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorContext {
    pub actor: ActorType,
    pub actor_id: String,
    pub actor_auth_method: Option<String>,
    pub actor_org_id: Option<String>,
}

impl ActorContext {
    /// Identity string stamped into SSH certificates: `{actor}-{actor_id}`.
    #[must_use]
    pub fn key_id(&self) -> String {
        format!("{}-{}", self.actor, self.actor_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Read,
    Create,
    Edit,
    Delete,
}

/// What a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionSubject {
    CertificateAuthorities,
    Certificates,
    SshCertificateAuthorities,
    SshCertificateTemplates,
    SshCertificates,
}

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionDecision {
    Allow,
    Deny { reason: String },
}

/// Policy check consulted before every operation.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check(
        &self,
        actor: &ActorContext,
        project_id: &str,
        action: PermissionAction,
        subject: PermissionSubject,
    ) -> AppResult<PermissionDecision>;
}

/// Ask `checker` and turn a denial into [`AppError::Forbidden`].
pub async fn enforce(
    checker: &dyn PermissionChecker,
    actor: &ActorContext,
    project_id: &str,
    action: PermissionAction,
    subject: PermissionSubject,
) -> AppResult<()> {
    match checker.check(actor, project_id, action, subject).await? {
        PermissionDecision::Allow => Ok(()),
        PermissionDecision::Deny { reason } => {
            warn!(
                actor = %actor.actor,
                actor_id = %actor.actor_id,
                project_id,
                ?action,
                ?subject,
                %reason,
                "Permission denied"
            );
            Err(AppError::Forbidden(reason))
        }
    }
}

/// Checker that allows everything. For single-tenant deployments and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPermissions;

#[async_trait]
impl PermissionChecker for AllowAllPermissions {
    async fn check(
        &self,
        _actor: &ActorContext,
        _project_id: &str,
        _action: PermissionAction,
        _subject: PermissionSubject,
    ) -> AppResult<PermissionDecision> {
        Ok(PermissionDecision::Allow)
    }
}
