//! Request signature verification.
//!
//! Slack signs every request with HMAC-SHA256 over the canonical message
//! `v0:<timestamp>:<body>`, keyed by the app's signing secret, and sends the
//! result as `X-Slack-Signature: v0=<hex digest>` alongside
//! `X-Slack-Request-Timestamp`.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request timestamp (seconds since epoch).
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Header carrying the versioned signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// The only signature version Slack uses today.
pub const SIGNATURE_VERSION: &str = "v0";

/// Minimum plausible timestamp length (10 digits covers 2001..2286).
const MIN_TIMESTAMP_LEN: usize = 10;

/// Length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Signed view over an inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope<'a> {
    /// Request timestamp, as sent.
    pub timestamp: &'a str,
    /// Signature version tag.
    pub version: &'a str,
    /// Decoded signature digest.
    pub digest: Vec<u8>,
    /// Raw request body.
    pub body: &'a [u8],
}

impl<'a> SignedEnvelope<'a> {
    /// Extract the signature headers, applying the cheap validity checks that
    /// must pass before any cryptographic work is done.
    pub fn from_headers(headers: &'a HeaderMap, body: &'a [u8]) -> Result<Self, AuthError> {
        let timestamp = header_str(headers, TIMESTAMP_HEADER).ok_or(AuthError::MissingHeaders)?;
        if timestamp.len() < MIN_TIMESTAMP_LEN || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::MissingHeaders);
        }

        let signature = header_str(headers, SIGNATURE_HEADER).ok_or(AuthError::MissingHeaders)?;
        let (version, digest_hex) = signature
            .split_once('=')
            .ok_or(AuthError::MissingHeaders)?;
        if version != SIGNATURE_VERSION || digest_hex.len() != DIGEST_HEX_LEN {
            return Err(AuthError::MissingHeaders);
        }
        // Well-formed length but not hex: authentic requests never look like this.
        let digest = hex::decode(digest_hex).map_err(|_| AuthError::InvalidSignature)?;

        Ok(Self {
            timestamp,
            version,
            digest,
            body,
        })
    }

    /// Verify this envelope against the signing secret.
    pub fn verify(&self, secret: &[u8]) -> bool {
        verify(self.body, self.timestamp, &self.digest, secret)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn compute(body: &[u8], timestamp: &str, secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Check `provided` against the HMAC of the canonical message.
///
/// Inputs are assumed well formed; header validation happens in
/// [`SignedEnvelope::from_headers`]. The comparison is constant time.
pub fn verify(body: &[u8], timestamp: &str, provided: &[u8], secret: &[u8]) -> bool {
    let expected = compute(body, timestamp, secret);
    expected.as_slice().ct_eq(provided).into()
}

/// Produce the `X-Slack-Signature` header value for a body.
pub fn sign(body: &[u8], timestamp: &str, secret: &[u8]) -> String {
    format!(
        "{}={}",
        SIGNATURE_VERSION,
        hex::encode(compute(body, timestamp, secret))
    )
}
