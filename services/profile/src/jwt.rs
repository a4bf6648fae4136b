//! Bearer token issuance and verification
//!
//! Tokens are RS256 JWTs carrying an opaque `dat` claim next to the standard
//! `iat` and `exp` claims. Verification failures of any kind are reported as
//! [`TokenError::Invalid`] so callers cannot tell why a token was refused.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

/// Token lifetime: 24 hours
pub const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

const ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,

    #[error("failed to generate token: {0}")]
    Generation(String),
}

/// Signs and verifies bearer tokens
pub trait TokenIssuer: Send + Sync {
    fn generate(&self, payload: &Value) -> Result<String, TokenError>;
    fn validate(&self, token: &str) -> Result<Value, TokenError>;
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Caller-defined payload
    dat: Value,
    /// Issued at time
    iat: i64,
    /// Expiration time
    exp: i64,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens (PEM)
    pub private_key: String,
    /// Public key for verifying tokens (PEM)
    pub public_key: String,
}

/// RS256 implementation of [`TokenIssuer`]
///
/// Keys are parsed once on construction. A key that fails to parse is kept
/// as its error: generation then fails and every token is invalid, instead
/// of the service refusing to start.
#[derive(Clone)]
pub struct Rs256TokenIssuer {
    encoding_key: Result<EncodingKey, String>,
    decoding_key: Option<DecodingKey>,
    now: fn() -> DateTime<Utc>,
}

impl Rs256TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes()).map_err(|e| {
            error!(error = %e, "failed to parse private key");
            e.to_string()
        });

        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())
            .inspect_err(|e| error!(error = %e, "failed to parse public key"))
            .ok();

        Self {
            encoding_key,
            decoding_key,
            now: Utc::now,
        }
    }

    /// Replace the clock used for `iat`, `exp` and expiry checks
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

impl TokenIssuer for Rs256TokenIssuer {
    fn generate(&self, payload: &Value) -> Result<String, TokenError> {
        let key = self
            .encoding_key
            .as_ref()
            .map_err(|e| TokenError::Generation(e.clone()))?;

        let now = (self.now)();
        let claims = Claims {
            dat: payload.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECONDS)).timestamp(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, key)
            .map_err(|e| TokenError::Generation(e.to_string()))?;
        Ok(token)
    }

    fn validate(&self, token: &str) -> Result<Value, TokenError> {
        let key = self.decoding_key.as_ref().ok_or(TokenError::Invalid)?;

        // Expiry is checked against our own clock below.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iat"]);

        let data = decode::<Claims>(token, key, &validation).map_err(|e| {
            debug!(error = %e, "token rejected");
            TokenError::Invalid
        })?;

        if data.claims.exp <= (self.now)().timestamp() {
            debug!("token expired");
            return Err(TokenError::Invalid);
        }

        Ok(data.claims.dat)
    }
}
