//! Test helper for minting unsigned compact-JWS strings.
//!
//! Signature verification is a collaborator concern, so unit tests only
//! need structurally valid tokens; the signature part is a placeholder.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Builds `header.claims.sig` from JSON values, base64url without padding.
pub(crate) fn mint(header: &serde_json::Value, claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).unwrap());
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{claims}.c2ln")
}

/// Mints a token with the given algorithm and claims.
pub(crate) fn mint_with_alg(alg: &str, claims: &serde_json::Value) -> String {
    mint(&serde_json::json!({"alg": alg, "typ": "JWT"}), claims)
}
