//! Business logic services.

#![allow(missing_docs)]

pub mod certificate;
pub mod certificate_authority;
pub mod kms;
pub mod permission;
pub mod ssh_certificate_authority;
pub mod ssh_certificate_template;
pub mod ssh_policy;

pub use certificate::{CertificateService, RevokeCertificateInput};
pub use certificate_authority::{
    CaCertificate, CertificateAuthorityService, CreateCaInput, ImportCaCertificateInput,
    IssueCertificateInput, IssuedCertificate, SignIntermediateInput, SignedIntermediate,
    UpdateCaInput,
};
pub use kms::{KeyCustody, KmsService, LocalKmsService};
pub use permission::{
    ActorContext, ActorType, AllowAllPermissions, PermissionAction, PermissionChecker,
    PermissionDecision, PermissionSubject,
};
pub use ssh_certificate_authority::{
    CreateSshCaInput, IssueSshCredsInput, IssuedSshCreds, SignSshKeyInput, SignedSshKey,
    SshCaWithPublicKey, SshCertificateAuthorityService, UpdateSshCaInput,
};
pub use ssh_certificate_template::{
    CreateSshTemplateInput, SshCertificateTemplateService, UpdateSshTemplateInput,
};
