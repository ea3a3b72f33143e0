//! Inbound webhook signature verification.
//!
//! LipaChat signs each delivery with HMAC-SHA256 over `"{t}.{body}"` and
//! sends the result as:
//!
//! ```text
//! X-LipaChat-Signature: t=<unix seconds>,v1=<hex digest>
//! ```

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-LipaChat-Signature";

/// Future timestamps within this many seconds are accepted as clock skew.
const MAX_FUTURE_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("missing X-LipaChat-Signature header")]
    MissingSignature,

    #[error("malformed signature header: {0}")]
    MalformedSignature(&'static str),

    #[error("signature timestamp outside the accepted window")]
    Stale,

    #[error("signature does not match payload")]
    Mismatch,
}

/// Parsed `t=..,v1=..` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub digest: Vec<u8>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut digest = None;

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                return Err(WebhookError::MalformedSignature("expected key=value pairs"));
            };
            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| WebhookError::MalformedSignature("bad timestamp"))?,
                    )
                }
                "v1" => {
                    digest = Some(
                        hex::decode(value.trim())
                            .map_err(|_| WebhookError::MalformedSignature("bad digest"))?,
                    )
                }
                _ => {}
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(WebhookError::MalformedSignature("missing t"))?,
            digest: digest.ok_or(WebhookError::MalformedSignature("missing v1"))?,
        })
    }
}

/// Checks inbound webhook signatures against a shared secret.
pub struct WebhookVerifier {
    secret: Secret<String>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>, tolerance_secs: u64) -> Self {
        Self {
            secret: Secret::new(secret.into()),
            tolerance_secs: i64::try_from(tolerance_secs).unwrap_or(i64::MAX),
        }
    }

    /// Verifies `header` for `body` as seen at `now` (unix seconds).
    pub fn verify(&self, header: Option<&str>, body: &[u8], now: i64) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(header.ok_or(WebhookError::MissingSignature)?)?;

        let age = now.saturating_sub(header.timestamp);
        if age > self.tolerance_secs || age < -MAX_FUTURE_SKEW_SECS {
            tracing::warn!(
                signature_timestamp = header.timestamp,
                age_secs = age,
                "webhook signature outside window"
            );
            return Err(WebhookError::Stale);
        }

        let expected = self.digest(header.timestamp, body);
        if expected.as_slice().ct_eq(header.digest.as_slice()).unwrap_u8() != 1 {
            tracing::warn!("webhook signature mismatch");
            return Err(WebhookError::Mismatch);
        }
        Ok(())
    }

    /// Header value a sender would attach for `body` at `timestamp`.
    pub fn sign(&self, body: &[u8], timestamp: i64) -> String {
        format!("t={},v1={}", timestamp, hex::encode(self.digest(timestamp, body)))
    }

    fn digest(&self, timestamp: i64, body: &[u8]) -> Vec<u8> {
        // HMAC accepts keys of any length, so this never fails.
        let mut mac = match HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return Vec::new(),
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}
