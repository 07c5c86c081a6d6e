//! Database repositories.

mod certificate;
mod certificate_authority;
mod kms_key;
mod ssh_certificate;
mod ssh_certificate_authority;
mod ssh_certificate_template;

pub use certificate::CertificateRepository;
pub use certificate_authority::CertificateAuthorityRepository;
pub use kms_key::KmsKeyRepository;
pub use ssh_certificate::SshCertificateRepository;
pub use ssh_certificate_authority::SshCertificateAuthorityRepository;
pub use ssh_certificate_template::SshCertificateTemplateRepository;
