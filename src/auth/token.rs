//! Token claims, errors and the [`TokenMaker`] abstraction.
//!
//! A token is an opaque string that carries a [`Payload`]. Makers are
//! stateless apart from their key, so one instance is shared by every
//! request handler behind an `Arc<dyn TokenMaker>`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors produced while issuing or verifying tokens.
///
/// `Invalid` and `Expired` are the only verification outcomes a caller can
/// observe. Their messages never describe which cryptographic check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Decryption, authentication or deserialization failed.
    #[error("token is invalid")]
    Invalid,

    /// The token authenticated but its expiry is in the past.
    #[error("token has expired")]
    Expired,

    /// Serialization or sealing failed while issuing a token.
    #[error("failed to encode token: {0}")]
    Encoding(String),

    /// The caller asked for a token that cannot be issued.
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),

    /// The symmetric key has the wrong length.
    #[error("invalid key size: must be exactly {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Required key length in bytes
        expected: usize,
        /// Supplied key length in bytes
        actual: usize,
    },
}

/// Claims embedded in every token.
///
/// Fields are private so a payload cannot change after it is issued or
/// decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    id: Uuid,
    username: String,
    issued_at: DateTime<Utc>,
    expired_at: DateTime<Utc>,
}

impl Payload {
    /// Builds a fresh payload for `username` valid for `duration` from `now`.
    pub fn new(username: &str, duration: Duration, now: DateTime<Utc>) -> Result<Self, TokenError> {
        if username.is_empty() {
            return Err(TokenError::InvalidClaims(
                "username must not be empty".to_string(),
            ));
        }
        if duration <= Duration::zero() {
            return Err(TokenError::InvalidClaims(
                "duration must be positive".to_string(),
            ));
        }

        let expired_at = now
            .checked_add_signed(duration)
            .ok_or_else(|| TokenError::InvalidClaims("duration is out of range".to_string()))?;

        Ok(Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            issued_at: now,
            expired_at,
        })
    }

    /// Unique token identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subject of the token.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expired_at(&self) -> DateTime<Utc> {
        self.expired_at
    }

    /// Checks the validity window against `now`.
    ///
    /// The token is still valid at the exact instant of `expired_at`.
    pub fn valid_at(&self, now: DateTime<Utc>) -> Result<(), TokenError> {
        if now > self.expired_at {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

/// Issues and verifies session tokens.
///
/// Implementations must be safe to share across threads and must not keep
/// per-call state: verifying the same token twice yields the same payload.
pub trait TokenMaker: Send + Sync {
    /// Creates a token for `username` that expires after `duration`.
    fn create_token(&self, username: &str, duration: Duration)
        -> Result<(String, Payload), TokenError>;

    /// Verifies `token` and returns its payload.
    fn verify_token(&self, token: &str) -> Result<Payload, TokenError>;
}

/// Source of the current time for token makers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub(crate) use manual::ManualClock;
