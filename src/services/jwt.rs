use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{JwtAlgorithm, JwtConfig};
use crate::errors::AuthError;
use crate::services::TokenValidator;

/// Claims carried by tokens the user service issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HMAC-signed JWT check: signature, expiry and optionally issuer.
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(config: &JwtConfig) -> Self {
        let algorithm = match config.algorithm {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    pub fn claims(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

impl TokenValidator for JwtValidator {
    fn validate(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.claims(token)?;
        tracing::trace!(subject = ?claims.sub, "JWT validated");
        Ok(())
    }
}
