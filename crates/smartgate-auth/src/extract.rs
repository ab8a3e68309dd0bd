//! Bearer token extraction from request headers.
//!
//! A deployment may accept the token under more than one header convention:
//! the standard `Authorization: Bearer <token>` plus, for example, the
//! header an API gateway re-homes the token into after terminating auth
//! upstream. Candidates are tried in configured priority order and the
//! first match wins.

use http::HeaderMap;

use crate::config::HeaderCandidate;
use crate::error::AuthError;

/// Extracts the raw bearer token from `headers`.
///
/// Each candidate is tried in order: if its header is present and the value
/// starts with the candidate's prefix, the prefix is stripped and the
/// remainder returned. Pure function of the header map.
///
/// # Errors
///
/// - [`AuthError::MissingCredentials`] if none of the candidate headers is
///   present at all.
/// - [`AuthError::MalformedCredentials`] if at least one candidate header is
///   present but no candidate's prefix matches its value.
pub fn extract_bearer_token<'h>(
    headers: &'h HeaderMap,
    candidates: &[HeaderCandidate],
) -> Result<&'h str, AuthError> {
    let mut header_seen = false;

    for candidate in candidates {
        tracing::debug!(
            header = %candidate.name,
            prefix = %candidate.prefix,
            "probing auth header"
        );

        let Some(value) = headers.get(candidate.name.as_str()) else {
            continue;
        };
        header_seen = true;

        // Non-UTF-8 header values cannot carry a compact JWS.
        let Ok(value) = value.to_str() else {
            continue;
        };

        if let Some(token) = value.strip_prefix(candidate.prefix.as_str()) {
            tracing::debug!(header = %candidate.name, "bearer token extracted");
            return Ok(token);
        }
    }

    if header_seen {
        Err(AuthError::MalformedCredentials)
    } else {
        Err(AuthError::MissingCredentials)
    }
}
