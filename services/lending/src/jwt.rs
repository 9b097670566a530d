//! JWT service for token generation and validation
//!
//! The lending service both issues and verifies its own tokens, so tokens
//! are signed with an HS256 shared secret instead of an RSA key pair. The
//! `remember` flag at login selects the longer expiry.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Token expiration time in seconds (default: 1 day)
    pub token_expiry: u64,
    /// Token expiration time for "remember me" logins (default: 30 days)
    pub remember_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: shared signing secret
    /// - `JWT_TOKEN_EXPIRY`: token expiry in seconds (default: 86400)
    /// - `JWT_REMEMBER_TOKEN_EXPIRY`: remember-me expiry in seconds
    ///   (default: 2592000)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        let token_expiry = std::env::var("JWT_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);

        let remember_token_expiry = std::env::var("JWT_REMEMBER_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "2592000".to_string())
            .parse()
            .unwrap_or(2592000);

        Ok(JwtConfig {
            secret,
            token_expiry,
            remember_token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Username, carried for log lines
    pub username: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Generate a token for a user
    pub fn generate_token(&self, user: &User, remember: bool) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat: now,
            exp: now + self.token_expiry(remember),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the token expiry for the given remember preference
    pub fn token_expiry(&self, remember: bool) -> u64 {
        if remember {
            self.config.remember_token_expiry
        } else {
            self.config.token_expiry
        }
    }
}
