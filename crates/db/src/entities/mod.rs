//! Database entities.
//!
//! Fields mirror table columns one to one; sea-orm derives the rest.

#![allow(missing_docs)]

pub mod certificate;
pub mod certificate_authority;
pub mod certificate_authority_cert;
pub mod certificate_authority_crl;
pub mod certificate_authority_secret;
pub mod certificate_body;
pub mod kms_key;
pub mod project_kms_key;
pub mod ssh_certificate;
pub mod ssh_certificate_authority;
pub mod ssh_certificate_authority_secret;
pub mod ssh_certificate_body;
pub mod ssh_certificate_template;

pub use certificate::Entity as Certificate;
pub use certificate_authority::Entity as CertificateAuthority;
pub use certificate_authority_cert::Entity as CertificateAuthorityCert;
pub use certificate_authority_crl::Entity as CertificateAuthorityCrl;
pub use certificate_authority_secret::Entity as CertificateAuthoritySecret;
pub use certificate_body::Entity as CertificateBody;
pub use kms_key::Entity as KmsKey;
pub use project_kms_key::Entity as ProjectKmsKey;
pub use ssh_certificate::Entity as SshCertificate;
pub use ssh_certificate_authority::Entity as SshCertificateAuthority;
pub use ssh_certificate_authority_secret::Entity as SshCertificateAuthoritySecret;
pub use ssh_certificate_body::Entity as SshCertificateBody;
pub use ssh_certificate_template::Entity as SshCertificateTemplate;
