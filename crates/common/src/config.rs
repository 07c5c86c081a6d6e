//! Application configuration.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Key management configuration.
    pub kms: KmsConfig,
    /// X.509 issuance defaults.
    #[serde(default)]
    pub pki: PkiConfig,
    /// SSH issuance defaults.
    #[serde(default)]
    pub ssh: SshConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Key management configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KmsConfig {
    /// Hex-encoded 256-bit root key that wraps every data key.
    pub root_key: String,
}

/// X.509 issuance defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct PkiConfig {
    /// Validity of a root CA when no `not_after` is given.
    #[serde(default = "default_ca_validity_days")]
    pub default_ca_validity_days: i64,
    /// Validity of a leaf certificate when neither `ttl` nor `not_after` is given.
    #[serde(default = "default_leaf_validity_days")]
    pub default_leaf_validity_days: i64,
    /// Distance between `thisUpdate` and `nextUpdate` of a generated CRL.
    #[serde(default = "default_crl_validity_days")]
    pub crl_validity_days: i64,
}

impl Default for PkiConfig {
    fn default() -> Self {
        Self {
            default_ca_validity_days: default_ca_validity_days(),
            default_leaf_validity_days: default_leaf_validity_days(),
            crl_validity_days: default_crl_validity_days(),
        }
    }
}

/// SSH issuance defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    /// Key algorithm used for SSH CAs and issued client keys when none is requested.
    #[serde(default = "default_ssh_key_algorithm")]
    pub default_key_algorithm: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            default_key_algorithm: default_ssh_key_algorithm(),
        }
    }
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_ca_validity_days() -> i64 {
    3650
}

const fn default_leaf_validity_days() -> i64 {
    365
}

const fn default_crl_validity_days() -> i64 {
    30
}

fn default_ssh_key_algorithm() -> String {
    "RSA_2048".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `CERTVAULT_ENV`)
    /// 4. Environment variables with `CERTVAULT__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("CERTVAULT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CERTVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
