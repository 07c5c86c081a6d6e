//! Common utilities and shared types for certvault.
//!
//! This crate provides foundational components used across all certvault crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Envelope encryption**: AES-256-GCM sealing via [`SymmetricCipher`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **X.509**: key generation, CSRs, certificate signing, chain verification and CRLs
//! - **SSH**: key pairs and certificate signing
//!
//! # Example
//!
//! ```no_run
//! use certvault_common::{AppResult, Config, IdGenerator, SymmetricCipher};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let cipher = SymmetricCipher::from_hex(&config.kms.root_key)?;
//!     let sealed = cipher.seal(b"data key")?;
//!     let id = IdGenerator::new().generate();
//!     println!("{id}: {} bytes sealed", sealed.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod id;
pub mod ssh;
pub mod x509;

pub use config::Config;
pub use crypto::SymmetricCipher;
pub use error::{AppError, AppResult, ErrorBody};
pub use id::IdGenerator;
pub use ssh::SshCertType;
pub use x509::{CertKeyAlgorithm, DistinguishedName, RevocationReason, Validity};
