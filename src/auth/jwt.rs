use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Claims carried inside an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The username the token was issued to
    pub sub: String,
    /// Expiry as a unix timestamp in seconds
    pub exp: i64,
}

/// Signing configuration for [TokenAuthority]
pub struct TokenConfig {
    pub secret: String,
    pub ttl: Duration,
}

impl TokenConfig {
    /// Token configuration with the standard 30 minute lifetime
    pub fn new(secret: String) -> TokenConfig {
        TokenConfig {
            secret,
            ttl: Duration::minutes(30),
        }
    }

    /// Token configuration with a custom lifetime
    pub fn with_ttl(secret: String, ttl: Duration) -> TokenConfig {
        TokenConfig { secret, ttl }
    }
}

/// Failure modes for issuing and verifying access tokens
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("could not sign an access token: {0}")]
    Signing(String),

    /// Deliberately carries no detail. Callers cannot distinguish a bad signature
    /// from an expired or garbled token.
    #[error("the token was not accepted")]
    Rejected,
}

/// Issues and verifies the HS256-signed bearer tokens handed out at login
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(config: TokenConfig) -> TokenAuthority {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is a hard cutoff, no grace window
        validation.leeway = 0;

        TokenAuthority {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
        }
    }

    /// Issues a signed token for [username] which expires one configured lifetime from now
    pub fn issue(&self, username: &str) -> Result<String, TokenError> {
        self.issue_at(username, Utc::now())
    }

    /// Issues a signed token anchored at a caller-provided instant. Lets tests
    /// control the clock.
    pub fn issue_at(&self, username: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: username.to_owned(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|sign_err| TokenError::Signing(sign_err.to_string()))
    }

    /// Verifies a token's signature and expiry, producing its claims. Every
    /// rejection collapses into [TokenError::Rejected].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|decode_err| {
                match decode_err.kind() {
                    ErrorKind::ExpiredSignature => debug!("rejected an expired token"),
                    other_cause => debug!(cause = ?other_cause, "rejected an invalid token"),
                }
                TokenError::Rejected
            })?;

        Ok(token_data.claims)
    }
}
