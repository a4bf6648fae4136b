//! Service configuration
//!
//! Values come from environment variables with defaults for everything but
//! the signing keys.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::{hashing::HashConfig, jwt::JwtConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to read {name} from {path}: {source}")]
    Key {
        name: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Settings {
    bind_address: String,
    jwt_private_key: String,
    jwt_public_key: String,
    hash_memory_kib: u32,
    hash_iterations: u32,
    hash_parallelism: u32,
}

/// Profile service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server listens on
    pub bind_address: String,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
}

impl ServiceConfig {
    /// Load the configuration from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDRESS`: listen address (default: `0.0.0.0:1323`)
    /// - `JWT_PRIVATE_KEY`: RSA private key (PEM) or path to a PEM file
    /// - `JWT_PUBLIC_KEY`: RSA public key (PEM) or path to a PEM file
    /// - `HASH_MEMORY_KIB`, `HASH_ITERATIONS`, `HASH_PARALLELISM`: Argon2 work factor
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = HashConfig::default();

        let settings: Settings = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:1323")?
            .set_default("hash_memory_kib", i64::from(defaults.memory_kib))?
            .set_default("hash_iterations", i64::from(defaults.iterations))?
            .set_default("hash_parallelism", i64::from(defaults.parallelism))?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(Self {
            bind_address: settings.bind_address,
            jwt: JwtConfig {
                private_key: load_pem("JWT_PRIVATE_KEY", &settings.jwt_private_key)?,
                public_key: load_pem("JWT_PUBLIC_KEY", &settings.jwt_public_key)?,
            },
            hash: HashConfig {
                memory_kib: settings.hash_memory_kib,
                iterations: settings.hash_iterations,
                parallelism: settings.hash_parallelism,
            },
        })
    }
}

/// Accept either the PEM text itself or a path to a file holding it
fn load_pem(name: &'static str, value: &str) -> Result<String, ConfigError> {
    if value.trim_start().starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    let path = PathBuf::from(value);
    std::fs::read_to_string(&path)
        .map(|pem| pem.trim().to_string())
        .map_err(|source| ConfigError::Key {
            name,
            path: path.display().to_string(),
            source,
        })
}
