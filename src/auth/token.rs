//! Signing and verifying the JSON Web Tokens used for bearer authentication.
//!
//! Access and refresh tokens are signed with different secrets and carry
//! their kind in the claims, so one can never be used in place of the other.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, TokenConfig, database_id::UserId, db::now_utc};

/// Which of the two tokens a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived credential sent with every request.
    Access,
    /// Long-lived credential exchanged for new access tokens.
    Refresh,
}

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: UserId,
    /// Whether this is an access or refresh token.
    pub kind: TokenKind,
    /// When the token was issued, as a Unix timestamp.
    pub iat: i64,
    /// When the token expires, as a Unix timestamp.
    pub exp: i64,
    /// A random ID so that tokens issued in the same second differ.
    pub jti: String,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedToken {
    /// The encoded JWT.
    pub token: String,
    /// When the token stops being valid.
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
struct KeyPair {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// The keys and lifetimes for issuing and verifying tokens.
#[derive(Clone)]
pub struct TokenKeys {
    access: KeyPair,
    refresh: KeyPair,
    access_token_duration: Duration,
    refresh_token_duration: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("access_token_duration", &self.access_token_duration)
            .field("refresh_token_duration", &self.refresh_token_duration)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Derive the signing keys from the configured secrets.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access: KeyPair::from_secret(&config.access_secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            access_token_duration: config.access_token_duration,
            refresh_token_duration: config.refresh_token_duration,
        }
    }

    /// Sign a new access token for `user_id`.
    ///
    /// # Errors
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue_access_token(&self, user_id: UserId) -> Result<SignedToken, Error> {
        self.issue(user_id, TokenKind::Access, now_utc())
    }

    /// Sign a new refresh token for `user_id`.
    ///
    /// # Errors
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn issue_refresh_token(&self, user_id: UserId) -> Result<SignedToken, Error> {
        self.issue(user_id, TokenKind::Refresh, now_utc())
    }

    fn issue(
        &self,
        user_id: UserId,
        kind: TokenKind,
        issued_at: OffsetDateTime,
    ) -> Result<SignedToken, Error> {
        let (keys, duration) = match kind {
            TokenKind::Access => (&self.access, self.access_token_duration),
            TokenKind::Refresh => (&self.refresh, self.refresh_token_duration),
        };
        let expires_at = issued_at + duration;
        let claims = Claims {
            sub: user_id,
            kind,
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
            .map_err(|error| Error::TokenCreation(error.to_string()))?;

        Ok(SignedToken { token, expires_at })
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    /// Returns [Error::InvalidToken] if the token is malformed, expired, signed
    /// with another key, or is not an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, Error> {
        verify(token, &self.access.decoding_key, TokenKind::Access).ok_or(Error::InvalidToken)
    }

    /// Verify a refresh token's signature, expiry and kind and return its claims.
    ///
    /// This does not check whether the token has been revoked.
    ///
    /// # Errors
    /// Returns [Error::InvalidRefreshToken] if the token fails verification.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, Error> {
        verify(token, &self.refresh.decoding_key, TokenKind::Refresh)
            .ok_or(Error::InvalidRefreshToken)
    }
}

fn verify(token: &str, decoding_key: &DecodingKey, expected_kind: TokenKind) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<Claims>(token, decoding_key, &validation)
        .inspect_err(|error| tracing::debug!("Rejected {expected_kind:?} token: {error}"))
        .ok()?
        .claims;

    (claims.kind == expected_kind).then_some(claims)
}
