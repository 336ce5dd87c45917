//! Svix-style webhook signature scheme (HMAC-SHA256).
//!
//! The provider signs `"{id}.{timestamp}.{body}"` with a shared secret of the
//! form `whsec_<base64 key>` and sends the result in a header holding one or
//! more space-separated `v1,<base64 signature>` candidates. Verification
//! recomputes the MAC, compares each candidate in constant time, and rejects
//! timestamps outside a tolerance window to blunt replayed deliveries.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Prefix the provider puts on signing secrets.
const SECRET_PREFIX: &str = "whsec_";
/// Signature scheme version accepted from the signature header.
const SIGNATURE_VERSION: &str = "v1";
/// Default tolerance for the timestamp header, in both directions.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("signing secret is not valid base64")]
    InvalidSecret(#[from] base64::DecodeError),

    #[error("timestamp header is not a unix timestamp")]
    InvalidTimestamp,

    #[error("timestamp is outside the accepted window")]
    StaleTimestamp,

    #[error("no signature candidate matched the payload")]
    Mismatch,
}

/// Verifier (and signer, for tests and outbound use) bound to one secret.
pub struct SignatureScheme {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl SignatureScheme {
    /// Builds a scheme from a `whsec_`-prefixed (or bare) base64 secret.
    ///
    /// A malformed secret is a deployment error and must fail at startup,
    /// never per request.
    pub fn new(secret: &str) -> Result<Self, SignatureError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = BASE64.decode(encoded)?;
        Ok(Self { key, tolerance_secs: DEFAULT_TOLERANCE_SECS })
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Produces a `v1,<base64>` signature for the given message parts.
    pub fn sign(&self, id: &str, timestamp: i64, payload: &[u8]) -> String {
        format!("{SIGNATURE_VERSION},{}", BASE64.encode(self.mac(id, timestamp, payload)))
    }

    /// Verifies a delivery against the current wall clock.
    pub fn verify(
        &self,
        id: &str,
        timestamp: &str,
        signature_header: &str,
        payload: &[u8],
    ) -> Result<(), SignatureError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        self.verify_at(id, timestamp, signature_header, payload, now)
    }

    /// Verification with an injected clock.
    pub fn verify_at(
        &self,
        id: &str,
        timestamp: &str,
        signature_header: &str,
        payload: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        let ts: i64 = timestamp.trim().parse().map_err(|_| SignatureError::InvalidTimestamp)?;
        // The timestamp is attacker-controlled until the MAC check passes, so
        // the distance must be computed without signed overflow.
        if now.abs_diff(ts) > self.tolerance_secs.unsigned_abs() {
            return Err(SignatureError::StaleTimestamp);
        }

        let expected = self.mac(id, ts, payload);

        let prefix = format!("{SIGNATURE_VERSION},");
        for candidate in signature_header.split_ascii_whitespace() {
            let Some(encoded) = candidate.strip_prefix(&prefix) else {
                continue;
            };
            let Ok(provided) = BASE64.decode(encoded) else {
                continue;
            };
            if expected.ct_eq(&provided).into() {
                return Ok(());
            }
        }

        Err(SignatureError::Mismatch)
    }

    fn mac(&self, id: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any size");
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
