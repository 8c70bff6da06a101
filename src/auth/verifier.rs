//! Verification of the signed init-data payload issued by the Telegram
//! Mini App platform.
//!
//! This is the trust boundary between an untrusted client payload and the
//! rest of the system: pure, storage-free, and failing closed on any
//! ambiguity. The scheme must stay bit-exact with the provider's published
//! validation algorithm: the payload is a URL-encoded pair set whose
//! `hash` field is an HMAC-SHA256 over the remaining pairs, sorted by key
//! and joined as `key=value` lines, keyed by a signing key derived from
//! the bot token under the `WebAppData` domain-separation constant.

use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use time::OffsetDateTime;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// Domain-separation constant fixed by the provider's scheme.
const SIGNING_KEY_DOMAIN: &[u8] = b"WebAppData";
/// Reserved payload key carrying the signature.
const HASH_KEY: &str = "hash";
/// Payload key carrying the epoch-seconds issuance stamp.
const AUTH_DATE_KEY: &str = "auth_date";
/// Payload key carrying the URL-encoded user JSON object.
const USER_KEY: &str = "user";

/// Why a payload was rejected. The distinction is for logs and HTTP class
/// mapping only; response bodies stay generic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The payload is structurally unusable (client error).
    #[error("malformed payload: {0}")]
    MalformedPayload(&'static str),
    /// The signature does not match the payload content.
    #[error("payload signature mismatch")]
    InvalidSignature,
    /// The payload is older than the freshness window, or stamped too far
    /// in the future.
    #[error("payload outside the freshness window")]
    Expired,
}

/// Bounds on payload age, injected from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    /// Maximum accepted age.
    pub max_age: Duration,
    /// Accepted forward clock skew.
    pub clock_skew: Duration,
}

/// Identity extracted from a successfully verified payload; attached to
/// the request by the identity gate and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedCaller {
    /// Numeric Telegram user id embedded in the payload.
    pub telegram_id: i64,
    /// Issuance instant the freshness check accepted.
    pub auth_date: OffsetDateTime,
}

/// Minimal projection of the embedded `user` JSON object.
#[derive(Debug, Deserialize)]
struct InitDataUser {
    id: i64,
}

/// Verify a raw init-data payload against the bot token.
///
/// Checks run in the provider's order: structure, signature, freshness,
/// user extraction. Absence of evidence is rejection, never implicit
/// trust.
pub fn verify(
    init_data: &str,
    bot_token: &str,
    now: OffsetDateTime,
    policy: &FreshnessPolicy,
) -> Result<VerifiedCaller, AuthError> {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(init_data.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if pairs.is_empty() {
        return Err(AuthError::MalformedPayload("empty payload"));
    }

    let hash_index = pairs
        .iter()
        .position(|(key, _)| key == HASH_KEY)
        .ok_or(AuthError::MalformedPayload("missing hash field"))?;
    let (_, provided_hash) = pairs.remove(hash_index);

    verify_signature(&pairs, &provided_hash, bot_token)?;

    let auth_date = field(&pairs, AUTH_DATE_KEY)
        .ok_or(AuthError::MalformedPayload("missing auth_date field"))?
        .parse::<i64>()
        .map_err(|_| AuthError::MalformedPayload("auth_date is not numeric"))?;
    check_freshness(auth_date, now, policy)?;

    let user_json =
        field(&pairs, USER_KEY).ok_or(AuthError::MalformedPayload("missing user field"))?;
    let user: InitDataUser = serde_json::from_str(user_json)
        .map_err(|_| AuthError::MalformedPayload("user field is not a valid user object"))?;

    let auth_date = OffsetDateTime::from_unix_timestamp(auth_date)
        .map_err(|_| AuthError::MalformedPayload("auth_date out of range"))?;

    Ok(VerifiedCaller {
        telegram_id: user.id,
        auth_date,
    })
}

/// Recompute the expected HMAC over the canonical check string and compare
/// it to the provided hash in constant time.
fn verify_signature(
    pairs: &[(String, String)],
    provided_hash: &str,
    bot_token: &str,
) -> Result<(), AuthError> {
    let provided = hex::decode(provided_hash).map_err(|_| AuthError::InvalidSignature)?;

    let signing_key = hmac_sha256(SIGNING_KEY_DOMAIN, bot_token.as_bytes());
    let mut mac = HmacSha256::new_from_slice(&signing_key)
        .expect("hmac accepts keys of any length");
    mac.update(check_string(pairs).as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| AuthError::InvalidSignature)
}

/// Canonical representation signed by the provider: pairs sorted by key,
/// rendered as `key=value` lines separated by a single newline.
fn check_string(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn check_freshness(
    auth_date: i64,
    now: OffsetDateTime,
    policy: &FreshnessPolicy,
) -> Result<(), AuthError> {
    let age = now.unix_timestamp().saturating_sub(auth_date);
    let max_age = policy.max_age.as_secs() as i64;
    let skew = policy.clock_skew.as_secs() as i64;

    if age > max_age || age < -skew {
        return Err(AuthError::Expired);
    }
    Ok(())
}

fn field<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(candidate, _)| candidate == key)
        .map(|(_, value)| value.as_str())
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}
