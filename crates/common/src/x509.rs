//! X.509 primitives used by the certificate authority engine.
//!
//! Certificates and CSRs are built with `openssl`; CRLs are signed with `rcgen`
//! because `openssl` has no CRL builder; certificate inspection goes through
//! `x509-parser`.
//!
//! Private keys travel between this module and its callers as PKCS#8 DER
//! wrapped in [`Zeroizing`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::stack::Stack;
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectKeyIdentifier,
};
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{
    X509, X509Crl, X509Name, X509NameRef, X509Ref, X509Req, X509StoreContext, X509VerifyResult,
};
use rand::RngCore;
use rand::rngs::OsRng;
use rustls_pki_types::CertificateDer;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{AppError, AppResult};

/// Length of generated certificate serial numbers in bytes.
pub const SERIAL_NUMBER_LEN: usize = 32;

/// Extended key usages placed on root certificates. Neither is a TLS usage, so a
/// root can only ever sign.
const ROOT_EXTENDED_KEY_USAGES: [&str; 2] = ["1.2.3.4.5.6.7", "2.3.4.5.6.7.8"];

/// Key algorithms supported for CA and leaf keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertKeyAlgorithm {
    /// RSA, 2048-bit modulus.
    #[serde(rename = "RSA_2048")]
    Rsa2048,
    /// RSA, 4096-bit modulus.
    #[serde(rename = "RSA_4096")]
    Rsa4096,
    /// ECDSA over P-256.
    #[serde(rename = "EC_prime256v1")]
    EcPrime256v1,
    /// ECDSA over P-384.
    #[serde(rename = "EC_secp384r1")]
    EcSecp384r1,
}

impl CertKeyAlgorithm {
    /// Stable name stored alongside the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rsa2048 => "RSA_2048",
            Self::Rsa4096 => "RSA_4096",
            Self::EcPrime256v1 => "EC_prime256v1",
            Self::EcSecp384r1 => "EC_secp384r1",
        }
    }

    /// Digest used when signing with a key of this algorithm.
    #[must_use]
    pub fn digest(self) -> MessageDigest {
        match self {
            Self::EcSecp384r1 => MessageDigest::sha384(),
            _ => MessageDigest::sha256(),
        }
    }
}

impl fmt::Display for CertKeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertKeyAlgorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RSA_2048" => Ok(Self::Rsa2048),
            "RSA_4096" => Ok(Self::Rsa4096),
            "EC_prime256v1" => Ok(Self::EcPrime256v1),
            "EC_secp384r1" => Ok(Self::EcSecp384r1),
            other => Err(AppError::BadRequest(format!(
                "Unsupported key algorithm: {other}"
            ))),
        }
    }
}

/// Subject fields of a certificate authority.
///
/// Empty fields are left out of both the DN string and the X.509 name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    /// `CN`
    pub common_name: String,
    /// `O`
    pub organization: String,
    /// `OU`
    pub ou: String,
    /// `C`, two letters.
    pub country: String,
    /// `ST`
    pub province: String,
    /// `L`
    pub locality: String,
}

impl DistinguishedName {
    /// Attributes in the order they are written into the name.
    fn attributes(&self) -> [(Nid, rcgen::DnType, &'static str, &str); 6] {
        [
            (
                Nid::COUNTRYNAME,
                rcgen::DnType::CountryName,
                "C",
                self.country.as_str(),
            ),
            (
                Nid::ORGANIZATIONNAME,
                rcgen::DnType::OrganizationName,
                "O",
                self.organization.as_str(),
            ),
            (
                Nid::ORGANIZATIONALUNITNAME,
                rcgen::DnType::OrganizationalUnitName,
                "OU",
                self.ou.as_str(),
            ),
            (
                Nid::STATEORPROVINCENAME,
                rcgen::DnType::StateOrProvinceName,
                "ST",
                self.province.as_str(),
            ),
            (
                Nid::COMMONNAME,
                rcgen::DnType::CommonName,
                "CN",
                self.common_name.as_str(),
            ),
            (
                Nid::LOCALITYNAME,
                rcgen::DnType::LocalityName,
                "L",
                self.locality.as_str(),
            ),
        ]
    }

    /// DN string such as `C=US, O=Acme, CN=Acme Root`.
    #[must_use]
    pub fn to_dn_string(&self) -> String {
        self.attributes()
            .iter()
            .filter(|(_, _, _, value)| !value.is_empty())
            .map(|(_, _, key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Build the `openssl` name.
    pub fn to_x509_name(&self) -> AppResult<X509Name> {
        let mut builder = X509Name::builder()?;
        for (nid, _, _, value) in self.attributes() {
            if !value.is_empty() {
                builder.append_entry_by_nid(nid, value)?;
            }
        }
        Ok(builder.build())
    }

    fn to_rcgen_name(&self) -> rcgen::DistinguishedName {
        let mut name = rcgen::DistinguishedName::new();
        for (_, dn_type, _, value) in self.attributes() {
            if !value.is_empty() {
                name.push(dn_type, value);
            }
        }
        name
    }
}

/// Render an `openssl` name in the same `KEY=value, ...` form as
/// [`DistinguishedName::to_dn_string`].
#[must_use]
pub fn name_to_dn_string(name: &X509NameRef) -> String {
    name.entries()
        .filter_map(|entry| {
            let key = entry.object().nid().short_name().ok()?;
            let value = std::str::from_utf8(entry.data().as_slice()).ok()?;
            Some(format!("{key}={value}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validity window of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    /// Start of the window, inclusive.
    pub not_before: DateTime<Utc>,
    /// End of the window, inclusive.
    pub not_after: DateTime<Utc>,
}

impl Validity {
    /// Create a window, rejecting one that ends before it starts.
    pub fn new(not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> AppResult<Self> {
        if not_before > not_after {
            return Err(AppError::BadRequest(
                "notBefore date must not be after notAfter date".to_string(),
            ));
        }
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Fail unless this window lies entirely inside `issuer`. Nothing is clamped.
    pub fn ensure_within(&self, issuer: &Self) -> AppResult<()> {
        if self.not_before < issuer.not_before {
            return Err(AppError::BadRequest(
                "notBefore date is before CA certificate's notBefore date".to_string(),
            ));
        }
        if self.not_after > issuer.not_after {
            return Err(AppError::BadRequest(
                "notAfter date is after CA certificate's notAfter date".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check a requested `max_path_length` against the issuing certificate's
/// Basic Constraints path length (`None` means unlimited).
///
/// `-1` requests an unlimited path length.
pub fn check_path_length(issuer_path_length: Option<u32>, requested: i32) -> AppResult<()> {
    if requested < -1 {
        return Err(AppError::Validation(
            "maxPathLength must be -1 or a non-negative integer".to_string(),
        ));
    }

    if let Some(issuer_len) = issuer_path_length {
        if issuer_len == 0 {
            return Err(AppError::BadRequest(
                "Failed to issue intermediate certificate due to CA path length constraint"
                    .to_string(),
            ));
        }
        if requested == -1 || requested as u32 >= issuer_len {
            return Err(AppError::BadRequest(
                "The requested path length constraint exceeds the CA's allowed path length"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

/// Generate a private key for `algorithm`.
pub fn generate_key_pair(algorithm: CertKeyAlgorithm) -> AppResult<PKey<Private>> {
    let key = match algorithm {
        CertKeyAlgorithm::Rsa2048 => PKey::from_rsa(Rsa::generate(2048)?)?,
        CertKeyAlgorithm::Rsa4096 => PKey::from_rsa(Rsa::generate(4096)?)?,
        CertKeyAlgorithm::EcPrime256v1 => {
            let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
            PKey::from_ec_key(EcKey::generate(&group)?)?
        }
        CertKeyAlgorithm::EcSecp384r1 => {
            let group = EcGroup::from_curve_name(Nid::SECP384R1)?;
            PKey::from_ec_key(EcKey::generate(&group)?)?
        }
    };
    Ok(key)
}

/// Encode a private key as PKCS#8 DER.
pub fn private_key_to_der(key: &PKey<Private>) -> AppResult<Zeroizing<Vec<u8>>> {
    Ok(Zeroizing::new(key.private_key_to_pkcs8()?))
}

/// Decode a PKCS#8 DER private key.
pub fn private_key_from_der(der: &[u8]) -> AppResult<PKey<Private>> {
    Ok(PKey::private_key_from_pkcs8(der)?)
}

/// Encode a private key as PKCS#8 PEM.
pub fn private_key_to_pem(key: &PKey<Private>) -> AppResult<Zeroizing<String>> {
    let pem = Zeroizing::new(key.private_key_to_pem_pkcs8()?);
    String::from_utf8(pem.to_vec())
        .map(Zeroizing::new)
        .map_err(|e| AppError::Crypto(format!("Private key PEM is not UTF-8: {e}")))
}

/// Generate a positive 32-byte serial number.
///
/// The high bit is cleared so the DER INTEGER needs no padding byte, and the
/// first byte is kept non-zero so the encoded serial keeps all 32 bytes.
#[must_use]
pub fn generate_serial_number() -> [u8; SERIAL_NUMBER_LEN] {
    let mut serial = [0u8; SERIAL_NUMBER_LEN];
    OsRng.fill_bytes(&mut serial);
    serial[0] = (serial[0] & 0x7f).max(1);
    serial
}

/// Parameters for a self-signed root certificate.
pub struct RootCertParams<'a> {
    /// Subject and issuer name.
    pub subject: &'a DistinguishedName,
    /// Root key; signs its own certificate.
    pub key: &'a PKey<Private>,
    /// Picks the signature digest.
    pub key_algorithm: CertKeyAlgorithm,
    /// Raw serial bytes.
    pub serial_number: &'a [u8],
    /// Certificate validity.
    pub validity: Validity,
    /// Basic Constraints path length, `-1` for none.
    pub max_path_length: i32,
}

/// Build a self-signed root CA certificate.
pub fn create_root_certificate(params: &RootCertParams<'_>) -> AppResult<X509> {
    let name = params.subject.to_x509_name()?;

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    builder.set_serial_number(&*BigNum::from_slice(params.serial_number)?.to_asn1_integer()?)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(params.key)?;
    builder.set_not_before(&*asn1_time(params.validity.not_before)?)?;
    builder.set_not_after(&*asn1_time(params.validity.not_after)?)?;

    builder.append_extension(ca_basic_constraints(params.max_path_length)?)?;

    let mut eku = ExtendedKeyUsage::new();
    eku.critical();
    for oid in ROOT_EXTENDED_KEY_USAGES {
        eku.other(oid);
    }
    builder.append_extension(eku.build()?)?;

    builder.append_extension(KeyUsage::new().critical().key_cert_sign().crl_sign().build()?)?;

    let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(None, None))?;
    builder.append_extension(ski)?;

    builder.sign(params.key, params.key_algorithm.digest())?;
    Ok(builder.build())
}

/// What a CSR is going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrUsage {
    /// An intermediate CA asking its parent for a certificate.
    CertificateAuthority,
    /// A leaf certificate.
    EndEntity,
}

/// Build and sign a PKCS#10 request for `subject`.
pub fn create_csr(
    subject: &DistinguishedName,
    key: &PKey<Private>,
    key_algorithm: CertKeyAlgorithm,
    usage: CsrUsage,
) -> AppResult<X509Req> {
    let mut builder = X509Req::builder()?;
    builder.set_version(0)?;
    let name = subject.to_x509_name()?;
    builder.set_subject_name(&name)?;
    builder.set_pubkey(key)?;

    let mut key_usage = KeyUsage::new();
    match usage {
        CsrUsage::CertificateAuthority => {
            key_usage
                .key_cert_sign()
                .crl_sign()
                .digital_signature()
                .key_encipherment();
        }
        CsrUsage::EndEntity => {
            key_usage.digital_signature().key_encipherment();
        }
    }
    let mut extensions = Stack::new()?;
    extensions.push(key_usage.build()?)?;
    builder.add_extensions(&extensions)?;

    builder.sign(key, key_algorithm.digest())?;
    Ok(builder.build())
}

/// Parse a PEM CSR and verify its self-signature.
pub fn parse_csr(pem: &str) -> AppResult<X509Req> {
    let csr = X509Req::from_pem(pem.trim().as_bytes())
        .map_err(|e| AppError::rejected("Invalid certificate signing request", e))?;
    let public_key = csr.public_key()?;
    if !csr.verify(&public_key)? {
        return Err(AppError::BadRequest("Invalid CSR: signature verification failed".to_string()));
    }
    Ok(csr)
}

/// Profile of a certificate issued by a CA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuedProfile {
    /// Subordinate CA with the given path length (`-1` for unlimited).
    IntermediateCa {
        /// Basic Constraints path length.
        max_path_length: i32,
    },
    /// End-entity certificate.
    Leaf,
}

/// Issuer side of a signing operation.
pub struct CertIssuer<'a> {
    /// Issuing CA certificate; supplies the issuer name and AKI.
    pub certificate: &'a X509,
    /// Issuing CA private key.
    pub key: &'a PKey<Private>,
    /// Algorithm of `key`.
    pub key_algorithm: CertKeyAlgorithm,
}

/// Sign `csr` with `issuer`, taking subject and public key from the request.
pub fn sign_csr(
    csr: &X509Req,
    issuer: &CertIssuer<'_>,
    serial_number: &[u8],
    validity: Validity,
    profile: IssuedProfile,
) -> AppResult<X509> {
    let public_key = csr.public_key()?;

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    builder.set_serial_number(&*BigNum::from_slice(serial_number)?.to_asn1_integer()?)?;
    builder.set_subject_name(csr.subject_name())?;
    builder.set_issuer_name(issuer.certificate.subject_name())?;
    builder.set_pubkey(&public_key)?;
    builder.set_not_before(&*asn1_time(validity.not_before)?)?;
    builder.set_not_after(&*asn1_time(validity.not_after)?)?;

    match profile {
        IssuedProfile::IntermediateCa { max_path_length } => {
            builder.append_extension(
                KeyUsage::new()
                    .critical()
                    .key_cert_sign()
                    .crl_sign()
                    .digital_signature()
                    .key_encipherment()
                    .build()?,
            )?;
            builder.append_extension(ca_basic_constraints(max_path_length)?)?;
        }
        IssuedProfile::Leaf => {
            builder.append_extension(
                KeyUsage::new()
                    .critical()
                    .digital_signature()
                    .key_encipherment()
                    .build()?,
            )?;
            builder.append_extension(BasicConstraints::new().build()?)?;
        }
    }

    let issuer_cert: &X509Ref = issuer.certificate;
    let aki = AuthorityKeyIdentifier::new()
        .keyid(false)
        .build(&builder.x509v3_context(Some(issuer_cert), None))?;
    builder.append_extension(aki)?;
    let ski = SubjectKeyIdentifier::new().build(&builder.x509v3_context(None, None))?;
    builder.append_extension(ski)?;

    builder.sign(issuer.key, issuer.key_algorithm.digest())?;
    Ok(builder.build())
}

fn ca_basic_constraints(max_path_length: i32) -> AppResult<openssl::x509::X509Extension> {
    let mut constraints = BasicConstraints::new();
    constraints.critical().ca();
    if max_path_length >= 0 {
        constraints.pathlen(max_path_length as u32);
    }
    Ok(constraints.build()?)
}

fn asn1_time(at: DateTime<Utc>) -> AppResult<Asn1Time> {
    Ok(Asn1Time::from_unix(at.timestamp())?)
}

/// Fields read back out of an encoded certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Lower-case hex of the serial's DER content bytes.
    pub serial_number: String,
    /// Validity window.
    pub validity: Validity,
    /// Basic Constraints `CA` flag.
    pub is_ca: bool,
    /// Basic Constraints path length; `None` when absent (unlimited).
    pub path_length: Option<u32>,
}

/// Inspect a DER certificate.
pub fn inspect_certificate(der: &[u8]) -> AppResult<CertificateInfo> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| AppError::crypto_failure("Failed to parse certificate", e))?;

    let validity = cert.validity();
    let not_before = DateTime::from_timestamp(validity.not_before.timestamp(), 0)
        .ok_or_else(|| AppError::Crypto("Certificate notBefore out of range".to_string()))?;
    let not_after = DateTime::from_timestamp(validity.not_after.timestamp(), 0)
        .ok_or_else(|| AppError::Crypto("Certificate notAfter out of range".to_string()))?;

    let constraints = cert
        .basic_constraints()
        .map_err(|e| AppError::crypto_failure("Invalid basic constraints", e))?;
    let (is_ca, path_length) = constraints.map_or((false, None), |ext| {
        (ext.value.ca, ext.value.path_len_constraint)
    });

    Ok(CertificateInfo {
        serial_number: hex::encode(cert.raw_serial()),
        validity: Validity {
            not_before,
            not_after,
        },
        is_ca,
        path_length,
    })
}

/// Parse a single PEM certificate.
pub fn parse_certificate(pem: &str) -> AppResult<X509> {
    X509::from_pem(pem.trim().as_bytes())
        .map_err(|e| AppError::rejected("Invalid certificate", e))
}

/// Parse every certificate block in a PEM bundle.
pub fn parse_certificate_chain(pem: &str) -> AppResult<Vec<X509>> {
    if pem.trim().is_empty() {
        return Ok(Vec::new());
    }
    X509::stack_from_pem(pem.as_bytes())
        .map_err(|e| AppError::rejected("Invalid certificate chain", e))
}

/// Encode a certificate as PEM text.
pub fn certificate_to_pem(cert: &X509) -> AppResult<String> {
    String::from_utf8(cert.to_pem()?)
        .map_err(|e| AppError::Crypto(format!("Certificate PEM is not UTF-8: {e}")))
}

/// Re-encode a DER certificate as PEM text.
pub fn certificate_der_to_pem(der: &[u8]) -> AppResult<String> {
    certificate_to_pem(&X509::from_der(der)?)
}

/// Encode a CSR as PEM text.
pub fn csr_to_pem(csr: &X509Req) -> AppResult<String> {
    String::from_utf8(csr.to_pem()?)
        .map_err(|e| AppError::Crypto(format!("CSR PEM is not UTF-8: {e}")))
}

/// Whether `cert` carries the public half of `key`.
pub fn certificate_matches_key(cert: &X509Ref, key: &PKey<Private>) -> AppResult<bool> {
    Ok(cert.public_key()?.public_eq(key))
}

/// Issuer DN of `cert` in [`DistinguishedName::to_dn_string`] form.
#[must_use]
pub fn issuer_dn_string(cert: &X509Ref) -> String {
    name_to_dn_string(cert.issuer_name())
}

/// Join a certificate with the chain above it, newest first.
#[must_use]
pub fn join_chain(certificate_pem: &str, chain_pem: &str) -> String {
    format!("{}\n{}", certificate_pem.trim(), chain_pem.trim())
        .trim()
        .to_string()
}

/// Verify that `chain` links `certificate` to an anchor and that the built
/// path uses every supplied certificate.
///
/// The anchor is the self-signed certificate in `chain` if there is one,
/// otherwise the last (top-most) supplied certificate.
pub fn verify_certificate_chain(certificate: &X509, chain: &[X509]) -> AppResult<()> {
    let is_self_signed = |cert: &X509| cert.issued(cert) == X509VerifyResult::OK;
    let Some(anchor) = chain
        .iter()
        .position(is_self_signed)
        .or_else(|| chain.len().checked_sub(1))
    else {
        return Err(AppError::BadRequest("Certificate chain is empty".to_string()));
    };

    let mut store = X509StoreBuilder::new()?;
    let mut untrusted = Stack::new()?;
    for (index, cert) in chain.iter().enumerate() {
        if index == anchor {
            store.add_cert(cert.clone())?;
        } else {
            untrusted.push(cert.clone())?;
        }
    }
    if !is_self_signed(&chain[anchor]) {
        store.set_flags(X509VerifyFlags::PARTIAL_CHAIN)?;
    }
    let store = store.build();

    let mut context = X509StoreContext::new()?;
    let (verified, built_len, error) = context.init(&store, certificate, &untrusted, |ctx| {
        let verified = ctx.verify_cert()?;
        let built_len = ctx.chain().map_or(0, |c| c.len());
        Ok((verified, built_len, ctx.error()))
    })?;

    if !verified {
        return Err(AppError::rejected(
            "Failed to verify certificate chain",
            error.error_string(),
        ));
    }
    if built_len != chain.len() + 1 {
        return Err(AppError::BadRequest(
            "Certificate chain does not match the supplied certificates".to_string(),
        ));
    }
    Ok(())
}

/// Signer of a CRL.
pub enum CrlSigner<'a> {
    /// A CA with an installed certificate (DER).
    Certificate(&'a [u8]),
    /// A CA still waiting for its certificate; the CRL issuer is its subject.
    Subject(&'a DistinguishedName),
}

/// One revoked certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlEntry {
    /// Hex-encoded serial number.
    pub serial_number: String,
    /// Revocation time.
    pub revoked_at: DateTime<Utc>,
    /// Reason code written into the entry.
    pub reason: RevocationReason,
}

/// RFC 5280 CRL reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RevocationReason {
    /// `unspecified` (0)
    Unspecified,
    /// `keyCompromise` (1)
    KeyCompromise,
    /// `cACompromise` (2)
    CaCompromise,
    /// `affiliationChanged` (3)
    AffiliationChanged,
    /// `superseded` (4)
    Superseded,
    /// `cessationOfOperation` (5)
    CessationOfOperation,
    /// `certificateHold` (6)
    CertificateHold,
    /// `privilegeWithdrawn` (9)
    PrivilegeWithdrawn,
    /// `aACompromise` (10)
    AaCompromise,
}

impl RevocationReason {
    /// RFC 5280 numeric reason code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Unspecified => 0,
            Self::KeyCompromise => 1,
            Self::CaCompromise => 2,
            Self::AffiliationChanged => 3,
            Self::Superseded => 4,
            Self::CessationOfOperation => 5,
            Self::CertificateHold => 6,
            Self::PrivilegeWithdrawn => 9,
            Self::AaCompromise => 10,
        }
    }

    /// Reverse of [`Self::code`]; unknown codes read as `Unspecified`.
    #[must_use]
    pub const fn from_code(code: i16) -> Self {
        match code {
            1 => Self::KeyCompromise,
            2 => Self::CaCompromise,
            3 => Self::AffiliationChanged,
            4 => Self::Superseded,
            5 => Self::CessationOfOperation,
            6 => Self::CertificateHold,
            9 => Self::PrivilegeWithdrawn,
            10 => Self::AaCompromise,
            _ => Self::Unspecified,
        }
    }

    const fn to_rcgen(self) -> rcgen::RevocationReason {
        match self {
            Self::Unspecified => rcgen::RevocationReason::Unspecified,
            Self::KeyCompromise => rcgen::RevocationReason::KeyCompromise,
            Self::CaCompromise => rcgen::RevocationReason::CaCompromise,
            Self::AffiliationChanged => rcgen::RevocationReason::AffiliationChanged,
            Self::Superseded => rcgen::RevocationReason::Superseded,
            Self::CessationOfOperation => rcgen::RevocationReason::CessationOfOperation,
            Self::CertificateHold => rcgen::RevocationReason::CertificateHold,
            Self::PrivilegeWithdrawn => rcgen::RevocationReason::PrivilegeWithdrawn,
            Self::AaCompromise => rcgen::RevocationReason::AaCompromise,
        }
    }
}

/// Input to [`create_crl`].
pub struct CrlParams<'a> {
    /// Issuer of the CRL.
    pub signer: CrlSigner<'a>,
    /// PKCS#8 DER of the CA key.
    pub private_key_der: &'a [u8],
    /// Value of the CRL Number extension.
    pub crl_number: u64,
    /// `thisUpdate`
    pub this_update: DateTime<Utc>,
    /// `nextUpdate`
    pub next_update: DateTime<Utc>,
    /// Revoked certificates.
    pub entries: &'a [CrlEntry],
}

/// Sign a CRL and return it as DER.
pub fn create_crl(params: &CrlParams<'_>) -> AppResult<Vec<u8>> {
    let key_pair = rcgen::KeyPair::try_from(params.private_key_der)?;

    let revoked_certs = params
        .entries
        .iter()
        .map(|entry| {
            let serial = hex::decode(&entry.serial_number).map_err(|e| {
                AppError::Internal(format!("Stored serial number is not hex: {e}"))
            })?;
            Ok(rcgen::RevokedCertParams {
                serial_number: rcgen::SerialNumber::from_slice(&serial),
                revocation_time: offset_date_time(entry.revoked_at)?,
                reason_code: Some(entry.reason.to_rcgen()),
                invalidity_date: None,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let crl_params = rcgen::CertificateRevocationListParams {
        this_update: offset_date_time(params.this_update)?,
        next_update: offset_date_time(params.next_update)?,
        crl_number: rcgen::SerialNumber::from(params.crl_number),
        issuing_distribution_point: None,
        revoked_certs,
        key_identifier_method: rcgen::KeyIdMethod::Sha256,
    };

    let crl = match params.signer {
        CrlSigner::Certificate(der) => {
            let issuer = rcgen::Issuer::from_ca_cert_der(&CertificateDer::from(der), key_pair)?;
            crl_params.signed_by(&issuer)?
        }
        CrlSigner::Subject(subject) => {
            let mut ca_params = rcgen::CertificateParams::default();
            ca_params.distinguished_name = subject.to_rcgen_name();
            ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
            ca_params.key_usages = vec![
                rcgen::KeyUsagePurpose::KeyCertSign,
                rcgen::KeyUsagePurpose::CrlSign,
            ];
            let issuer = rcgen::Issuer::new(ca_params, key_pair);
            crl_params.signed_by(&issuer)?
        }
    };

    Ok(crl.der().as_ref().to_vec())
}

/// Re-encode a DER CRL as PEM (`-----BEGIN X509 CRL-----`).
pub fn crl_der_to_pem(der: &[u8]) -> AppResult<String> {
    let crl = X509Crl::from_der(der)?;
    String::from_utf8(crl.to_pem()?)
        .map_err(|e| AppError::Crypto(format!("CRL PEM is not UTF-8: {e}")))
}

fn offset_date_time(at: DateTime<Utc>) -> AppResult<time::OffsetDateTime> {
    time::OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| AppError::Internal(format!("Timestamp out of range: {e}")))
}
