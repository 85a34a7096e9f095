//! Signed access tokens: HS256 JWTs carrying the report id, owner email
//! and purpose. Only `HS256` is accepted.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use zeroize::Zeroize;

use super::keys::KEY_LENGTH;

/// Clock skew tolerated when checking expiry
const EXPIRY_LEEWAY_SECS: u64 = 30;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm,

    #[error("Token signature invalid")]
    BadSignature,

    #[error("Token issued for a different purpose")]
    WrongPurpose,

    #[error("Token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnsupportedAlgorithm
            }
            _ => Self::Malformed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Read or erase one stored report
    ReportAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Report id
    pub sub: Uuid,
    pub email: String,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl TokenClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

pub struct TokenSigner {
    key: [u8; KEY_LENGTH],
}

impl TokenSigner {
    pub fn new(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    pub fn issue(
        &self,
        sub: Uuid,
        email: &str,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(sub, email, purpose, ttl, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        sub: Uuid,
        email: &str,
        purpose: TokenPurpose,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let claims = TokenClaims {
            sub,
            email: email.to_string(),
            purpose,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.key),
        )?;

        Ok(IssuedToken { token, claims })
    }

    /// Checks signature, algorithm and expiry (with leeway), then purpose.
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = EXPIRY_LEEWAY_SECS;

        let key = DecodingKey::from_secret(&self.key);
        let claims = decode::<TokenClaims>(token, &key, &validation)?.claims;

        if claims.purpose != purpose {
            return Err(TokenError::WrongPurpose);
        }
        Ok(claims)
    }
}

impl Drop for TokenSigner {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}
