//! Verification of Stripe webhook signatures.
//!
//! Stripe signs every webhook delivery with a `Stripe-Signature` header of the form
//! `t=<unix ts>,v1=<hex hmac>[,v1=<hex hmac>...]`, where each `v1` value is an HMAC-SHA256 over the string
//! `"{t}.{raw body}"` using the endpoint's `whsec_` secret. Multiple `v1` entries appear while a secret is being
//! rolled, and any one of them matching is sufficient.
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("Signature header is malformed: {0}")]
    MalformedHeader(String),
    #[error("Signature timestamp is outside the allowed tolerance")]
    TimestampOutOfTolerance,
    #[error("No signature matched the payload")]
    NoMatchingSignature,
}

#[derive(Debug, Clone)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| SignatureError::MalformedHeader(header.to_string()))?;
            match key {
                "t" => {
                    let ts = value.parse::<i64>().map_err(|e| {
                        SignatureError::MalformedHeader(format!("invalid timestamp '{value}': {e}"))
                    })?;
                    timestamp = Some(ts);
                },
                "v1" => signatures.push(value.to_string()),
                // Stripe also sends v0 signatures for legacy endpoints. Ignore them.
                _ => {},
            }
        }
        let timestamp = timestamp.ok_or_else(|| SignatureError::MalformedHeader("missing timestamp".to_string()))?;
        if signatures.is_empty() {
            return Err(SignatureError::MalformedHeader("no v1 signatures".to_string()));
        }
        Ok(Self { timestamp, signatures })
    }
}

fn signed_payload_mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Compute the expected `v1` signature for the given payload, as lowercase hex.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(signed_payload_mac(secret, timestamp, payload).finalize().into_bytes())
}

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// `tolerance` is the maximum age, in seconds, of the signature timestamp relative to `now`. Stripe recommends
/// five minutes. Each candidate signature is decoded and checked with the MAC's constant-time verifier; undecodable
/// candidates simply never match.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    tolerance: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let parsed = SignatureHeader::parse(header)?;
    if (now - parsed.timestamp).abs() > tolerance {
        return Err(SignatureError::TimestampOutOfTolerance);
    }
    let verified = parsed.signatures.iter().any(|sig| {
        let Ok(decoded) = hex::decode(sig) else { return false };
        signed_payload_mac(secret, parsed.timestamp, payload).verify_slice(&decoded).is_ok()
    });
    if verified {
        Ok(())
    } else {
        Err(SignatureError::NoMatchingSignature)
    }
}
