//! Symmetric `v2.local` tokens sealed with XChaCha20-Poly1305.
//!
//! Wire layout follows PASETO v2.local:
//!
//! ```text
//! v2.local.<base64url(nonce[24] || ciphertext || tag[16])>
//! ```
//!
//! The header, the nonce and the (always empty) footer are bound to the
//! ciphertext through pre-authentication encoding, so any change to the
//! string is caught by the single AEAD open.

use super::token::{Clock, Payload, SystemClock, TokenError, TokenMaker};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload as AeadPayload},
    XChaCha20Poly1305, XNonce,
};
use chrono::Duration;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Required symmetric key length in bytes.
pub const SYMMETRIC_KEY_LEN: usize = 32;

const HEADER: &str = "v2.local.";
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;

/// Token maker backed by a single AEAD construction.
pub struct LocalTokenMaker {
    cipher: XChaCha20Poly1305,
    clock: Arc<dyn Clock>,
}

impl LocalTokenMaker {
    /// Creates a maker that reads the wall clock.
    ///
    /// Fails with [`TokenError::InvalidKeySize`] unless `key` is exactly
    /// [`SYMMETRIC_KEY_LEN`] bytes long.
    pub fn new(key: &[u8]) -> Result<Self, TokenError> {
        Self::with_clock(key, Arc::new(SystemClock))
    }

    /// Creates a maker with an explicit time source.
    pub fn with_clock(key: &[u8], clock: Arc<dyn Clock>) -> Result<Self, TokenError> {
        if key.len() != SYMMETRIC_KEY_LEN {
            return Err(TokenError::InvalidKeySize {
                expected: SYMMETRIC_KEY_LEN,
                actual: key.len(),
            });
        }

        let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| {
            TokenError::InvalidKeySize {
                expected: SYMMETRIC_KEY_LEN,
                actual: key.len(),
            }
        })?;

        Ok(Self { cipher, clock })
    }
}

impl fmt::Debug for LocalTokenMaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTokenMaker")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl TokenMaker for LocalTokenMaker {
    fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, Payload), TokenError> {
        let payload = Payload::new(username, duration, self.clock.now())?;

        let message =
            serde_json::to_vec(&payload).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let aad = pre_auth_encode(&[HEADER.as_bytes(), &nonce, b""]);
        let sealed = self
            .cipher
            .encrypt(
                XNonce::from_slice(&nonce),
                AeadPayload {
                    msg: &message,
                    aad: &aad,
                },
            )
            .map_err(|_| TokenError::Encoding("encryption failed".to_string()))?;

        let mut raw = Vec::with_capacity(NONCE_LEN + sealed.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&sealed);

        debug!(
            token_id = %payload.id(),
            username = payload.username(),
            expires_at = %payload.expired_at(),
            "issued token"
        );

        Ok((format!("{HEADER}{}", URL_SAFE_NO_PAD.encode(raw)), payload))
    }

    fn verify_token(&self, token: &str) -> Result<Payload, TokenError> {
        let encoded = token.strip_prefix(HEADER).ok_or(TokenError::Invalid)?;
        let raw = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Invalid)?;

        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(TokenError::Invalid);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let aad = pre_auth_encode(&[HEADER.as_bytes(), nonce, b""]);
        let message = self
            .cipher
            .decrypt(
                XNonce::from_slice(nonce),
                AeadPayload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| TokenError::Invalid)?;

        let payload: Payload =
            serde_json::from_slice(&message).map_err(|_| TokenError::Invalid)?;
        payload.valid_at(self.clock.now())?;

        Ok(payload)
    }
}

/// PASETO pre-authentication encoding: a little-endian piece count followed
/// by each piece prefixed with its little-endian length. The top bit of
/// every length word is cleared.
fn pre_auth_encode(pieces: &[&[u8]]) -> Vec<u8> {
    fn le64(n: usize) -> [u8; 8] {
        ((n as u64) & (u64::MAX >> 1)).to_le_bytes()
    }

    let mut out = Vec::with_capacity(8 + pieces.iter().map(|p| 8 + p.len()).sum::<usize>());
    out.extend_from_slice(&le64(pieces.len()));
    for piece in pieces {
        out.extend_from_slice(&le64(piece.len()));
        out.extend_from_slice(piece);
    }
    out
}
