//! Fetching provider key sets.
//!
//! Providers publish their signing keys either as a JWKS document
//! (`{"keys": [...]}`) or as a plain key id → PEM map. The format is detected
//! from the document itself.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use jsonwebtoken::DecodingKey;
use reqwest::header::{HeaderMap, CACHE_CONTROL, EXPIRES};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{PublicKeyCache, VerificationFailure};

/// Lease applied to keys fetched from a certs endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLease {
    /// Keys live for a fixed duration after the fetch.
    Fixed(Duration),
    /// Honor `Cache-Control: max-age`, then `Expires`, else `fallback`.
    FromHeaders {
        /// Lease used when the response carries no usable header.
        fallback: Duration,
    },
}

impl Default for KeyLease {
    fn default() -> Self {
        KeyLease::Fixed(Duration::from_secs(3600))
    }
}

impl KeyLease {
    /// Computes the expiry instant for a response received at `now`.
    ///
    /// Header-derived expiries that are already due, or that overflow the
    /// calendar, are replaced by the fallback lease.
    pub fn expires_at(&self, headers: &HeaderMap, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            KeyLease::Fixed(lease) => extend(now, *lease).unwrap_or(DateTime::<Utc>::MAX_UTC),
            KeyLease::FromHeaders { fallback } => {
                let advertised = match max_age(headers) {
                    Some(max_age) => extend(now, max_age),
                    None => expires(headers),
                };
                advertised
                    .filter(|at| *at > now)
                    .or_else(|| extend(now, *fallback))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC)
            },
        }
    }
}

fn extend(now: DateTime<Utc>, lease: Duration) -> Option<DateTime<Utc>> {
    now.checked_add_signed(chrono::Duration::from_std(lease).ok()?)
}

/// Parses `max-age` out of a `Cache-Control` header.
fn max_age(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Parses an HTTP-date `Expires` header (`Mon, 02 Jan 2006 15:04:05 GMT`).
fn expires(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let value = headers.get(EXPIRES)?.to_str().ok()?.trim();
    let naive = value
        .strip_suffix("GMT")
        .or_else(|| value.strip_suffix("UTC"))?
        .trim_end();
    NaiveDateTime::parse_from_str(naive, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|dt| Utc.from_utc_datetime(&dt))
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kty: String,
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

/// Parses a key set document into `(key id, key)` pairs.
///
/// Entries that are not RSA keys or fail to parse are skipped.
pub(crate) fn parse_key_set(body: &[u8]) -> Result<Vec<(String, DecodingKey)>, VerificationFailure> {
    let document: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| VerificationFailure::KeyFetch(format!("invalid key set document: {e}")))?;

    if document.get("keys").is_some_and(|k| k.is_array()) {
        let jwks: Jwks = serde_json::from_value(document)
            .map_err(|e| VerificationFailure::KeyFetch(format!("invalid JWKS: {e}")))?;
        return Ok(jwks.keys.into_iter().filter_map(jwk_to_key).collect());
    }

    let pems: HashMap<String, String> = serde_json::from_value(document)
        .map_err(|e| VerificationFailure::KeyFetch(format!("invalid PEM key map: {e}")))?;

    Ok(pems
        .into_iter()
        .filter_map(|(kid, pem)| match DecodingKey::from_rsa_pem(pem.as_bytes()) {
            Ok(key) => Some((kid, key)),
            Err(e) => {
                warn!(kid = %kid, error = %e, "Skipping unparsable PEM key");
                None
            },
        })
        .collect())
}

fn jwk_to_key(jwk: Jwk) -> Option<(String, DecodingKey)> {
    let kid = jwk.kid?;
    if jwk.kty != "RSA" {
        warn!(kid = %kid, kty = %jwk.kty, "Skipping non-RSA key");
        return None;
    }
    let (n, e) = (jwk.n?, jwk.e?);
    match DecodingKey::from_rsa_components(&n, &e) {
        Ok(key) => Some((kid, key)),
        Err(err) => {
            warn!(kid = %kid, error = %err, "Skipping unparsable JWK");
            None
        },
    }
}

/// Fetches the key set at `certs_url` and stores every key in `cache`.
///
/// Returns how many keys were cached. Concurrent misses may each trigger a
/// fetch; refilling is idempotent so the only cost is the duplicate request.
#[instrument(skip_all, fields(url = %certs_url))]
pub(crate) async fn refill(
    client: &Client,
    certs_url: &str,
    lease: KeyLease,
    cache: &PublicKeyCache,
) -> Result<usize, VerificationFailure> {
    let response = client
        .get(certs_url)
        .send()
        .await
        .map_err(|e| VerificationFailure::KeyFetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(VerificationFailure::KeyFetch(format!(
            "certs endpoint returned {status}"
        )));
    }

    let expires_at = lease.expires_at(response.headers(), Utc::now());
    let body = response
        .bytes()
        .await
        .map_err(|e| VerificationFailure::KeyFetch(e.to_string()))?;

    let keys = parse_key_set(&body)?;
    let count = keys.len();
    for (kid, key) in keys {
        cache.add(kid, key, expires_at);
    }

    debug!(keys = count, %expires_at, "Public keys refreshed");
    Ok(count)
}
