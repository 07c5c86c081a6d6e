//! SSH certificate template policy.
//!
//! Checks a signing request against a template before any key material is
//! touched. Callers run them in order: type, principals, TTL.

use certvault_common::{AppError, AppResult, SshCertType};
use certvault_db::entities::ssh_certificate_template;

const WILDCARD: &str = "*";

/// Fail unless the template allows certificates of `cert_type`.
pub fn validate_ssh_certificate_type(
    template: &ssh_certificate_template::Model,
    cert_type: SshCertType,
) -> AppResult<()> {
    let allowed = match cert_type {
        SshCertType::User => template.allow_user_certificates,
        SshCertType::Host => template.allow_host_certificates,
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Failed to validate {} certificate type against template policy",
            cert_type_name(cert_type)
        )))
    }
}

/// Fail unless every principal is allowed for `cert_type`.
///
/// User principals must be listed in `allowed_users` unless it contains `*`.
/// Host principals may not contain wildcards themselves and must be listed in
/// `allowed_hosts`, either exactly or under a `*.domain` entry.
pub fn validate_ssh_certificate_principals(
    cert_type: SshCertType,
    template: &ssh_certificate_template::Model,
    principals: &[String],
) -> AppResult<()> {
    if principals.is_empty() {
        return Err(AppError::BadRequest("At least one principal is required".to_string()));
    }
    if principals.iter().any(|p| p.trim().is_empty()) {
        return Err(AppError::BadRequest("Principals must not be blank".to_string()));
    }

    match cert_type {
        SshCertType::User => {
            let allowed = template.allowed_users();
            if allowed.iter().any(|u| u == WILDCARD) {
                return Ok(());
            }
            if let Some(denied) = principals.iter().find(|p| !allowed.contains(p)) {
                return Err(AppError::BadRequest(format!(
                    "Principal '{denied}' is not in the list of allowed users"
                )));
            }
        }
        SshCertType::Host => {
            let allowed = template.allowed_hosts();
            for principal in principals {
                if principal.contains(WILDCARD) {
                    return Err(AppError::BadRequest(format!(
                        "Principal '{principal}' must not contain wildcards"
                    )));
                }
                if !allowed.iter().any(|host| host_matches(host, principal)) {
                    return Err(AppError::BadRequest(format!(
                        "Principal '{principal}' is not in the list of allowed hosts"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Effective TTL in seconds: the template default when none is requested,
/// otherwise `requested` if it lies within `[min_ttl, max_ttl]`.
pub fn validate_ssh_certificate_ttl(
    template: &ssh_certificate_template::Model,
    requested: Option<u64>,
) -> AppResult<u64> {
    let Some(ttl) = requested else {
        return u64::try_from(template.ttl).map_err(|_| {
            AppError::InvalidState(format!("Template '{}' has a negative TTL", template.name))
        });
    };

    let within = i64::try_from(ttl)
        .is_ok_and(|ttl| ttl >= template.min_ttl && ttl <= template.max_ttl);
    if !within {
        return Err(AppError::BadRequest(format!(
            "TTL {ttl}s is outside the allowed range [{}, {}]",
            template.min_ttl, template.max_ttl
        )));
    }
    Ok(ttl)
}

fn host_matches(allowed: &str, principal: &str) -> bool {
    if allowed == WILDCARD || allowed == principal {
        return true;
    }
    // `*.example.com` covers `a.example.com` and `a.b.example.com`, not `example.com`
    allowed
        .strip_prefix('*')
        .filter(|suffix| suffix.starts_with('.'))
        .is_some_and(|suffix| principal.len() > suffix.len() && principal.ends_with(suffix))
}

const fn cert_type_name(cert_type: SshCertType) -> &'static str {
    match cert_type {
        SshCertType::User => "user",
        SshCertType::Host => "host",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use certvault_db::entities::ssh_certificate_authority::SshStatus;
    use chrono::Utc;
    use serde_json::json;

    fn template() -> ssh_certificate_template::Model {
        ssh_certificate_template::Model {
            id: "tpl1".to_string(),
            ssh_ca_id: "sshca1".to_string(),
            status: SshStatus::Active,
            name: "default".to_string(),
            ttl: 3600,
            min_ttl: 60,
            max_ttl: 3600,
            allowed_users: json!(["alice", "bob"]),
            allowed_hosts: json!(["db.internal", "*.example.com"]),
            allow_user_certificates: true,
            allow_host_certificates: false,
            allow_custom_key_ids: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn principals(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_cert_type_gate() {
        let tpl = template();
        assert!(validate_ssh_certificate_type(&tpl, SshCertType::User).is_ok());
        assert!(matches!(
            validate_ssh_certificate_type(&tpl, SshCertType::Host),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_user_principals() {
        let tpl = template();
        let check = |tpl: &ssh_certificate_template::Model, values: &[&str]| {
            validate_ssh_certificate_principals(SshCertType::User, tpl, &principals(values))
        };
        assert!(check(&tpl, &["alice"]).is_ok());
        assert!(check(&tpl, &["alice", "mallory"]).is_err());

        let mut open = template();
        open.allowed_users = json!(["*"]);
        assert!(check(&open, &["anyone"]).is_ok());
    }

    #[test]
    fn test_empty_or_blank_principals_rejected() {
        let tpl = template();
        assert!(validate_ssh_certificate_principals(SshCertType::User, &tpl, &[]).is_err());
        let blank = principals(&["alice", " "]);
        assert!(validate_ssh_certificate_principals(SshCertType::User, &tpl, &blank).is_err());
    }

    #[test]
    fn test_host_principals() {
        let tpl = template();
        let check = |tpl: &ssh_certificate_template::Model, values: &[&str]| {
            validate_ssh_certificate_principals(SshCertType::Host, tpl, &principals(values))
        };

        assert!(check(&tpl, &["db.internal"]).is_ok());
        assert!(check(&tpl, &["web.example.com", "a.b.example.com"]).is_ok());
        assert!(check(&tpl, &["example.com"]).is_err());
        assert!(check(&tpl, &["*.example.com"]).is_err());
        assert!(check(&tpl, &["web.example.org"]).is_err());

        let mut open = template();
        open.allowed_hosts = json!(["*"]);
        assert!(check(&open, &["any.host"]).is_ok());
        assert!(check(&open, &["*"]).is_err());
    }

    #[test]
    fn test_ttl_bounds() {
        let tpl = template();
        assert_eq!(validate_ssh_certificate_ttl(&tpl, None).unwrap(), 3600);
        assert_eq!(validate_ssh_certificate_ttl(&tpl, Some(1800)).unwrap(), 1800);
        assert_eq!(validate_ssh_certificate_ttl(&tpl, Some(60)).unwrap(), 60);
        assert!(matches!(
            validate_ssh_certificate_ttl(&tpl, Some(7200)),
            Err(AppError::BadRequest(_))
        ));
        assert!(validate_ssh_certificate_ttl(&tpl, Some(59)).is_err());
        assert!(validate_ssh_certificate_ttl(&tpl, Some(u64::MAX)).is_err());
    }
}
