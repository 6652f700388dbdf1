//! Shared fixtures for unit tests.

#![allow(clippy::disallowed_methods)]

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;

pub const TRUSTED_KID: &str = "trusted-kid";

pub const TRUSTED_PRIVATE_PEM: &str = include_str!("../testdata/trusted_private.pem");
pub const TRUSTED_PUBLIC_PEM: &str = include_str!("../testdata/trusted_public.pem");
pub const ROGUE_PRIVATE_PEM: &str = include_str!("../testdata/rogue_private.pem");
const TRUSTED_JWKS: &str = include_str!("../testdata/trusted_jwks.json");

/// JWKS document publishing the trusted key.
pub fn jwks_body() -> Value {
    serde_json::from_str(TRUSTED_JWKS).unwrap()
}

/// Key id → PEM document publishing the trusted key.
pub fn pem_map_body() -> Value {
    let mut map = serde_json::Map::new();
    map.insert(TRUSTED_KID.to_string(), Value::from(TRUSTED_PUBLIC_PEM));
    Value::Object(map)
}

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims accepted by a verifier configured with `issuer` and `audience`.
pub fn valid_claims(issuer: &str, audience: &str, subject: &str) -> Value {
    let now = now_secs();
    serde_json::json!({
        "iss": issuer,
        "aud": audience,
        "sub": subject,
        "iat": now,
        "exp": now + 600,
    })
}

/// Signs `claims` with RS256 using `private_pem`, tagging the header with `kid`.
pub fn sign_with(claims: &Value, kid: Option<&str>, private_pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// Signs `claims` with the trusted key.
pub fn sign_trusted(claims: &Value) -> String {
    sign_with(claims, Some(TRUSTED_KID), TRUSTED_PRIVATE_PEM)
}
