//! Unverified token parsing and claim types.
//!
//! Tokens arrive in the standard compact three-part signed-claims format
//! (`header.claims.signature`, base64url without padding). Signature
//! verification is delegated to an external collaborator keyed by the
//! issuer's key-set location, so parsing here is structural only: it
//! establishes the declared algorithm and the claim set without trusting
//! either until the validator has run every gate.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

// ============================================================================
// Raw Claims
// ============================================================================

/// The claim set carried by a bearer token, as parsed (not yet validated).
///
/// All fields are optional at this stage; the validator decides which are
/// mandatory. Timestamps are Unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer: the identity provider that signed this token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Expiration time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not-before time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issued-at time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Space-delimited authorization scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Patient context (FHIR Patient resource id, bare or typed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
}

// ============================================================================
// Unverified Token
// ============================================================================

/// A structurally parsed token whose signature and claims are not yet
/// trusted.
///
/// Holds the original compact serialization so the signature-verification
/// collaborator can operate on the exact bytes that were signed.
#[derive(Debug, Clone)]
pub struct UnverifiedToken {
    raw: String,
    algorithm: Algorithm,
    claims: TokenClaims,
}

impl UnverifiedToken {
    /// Parses the compact three-part form.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidTokenFormat`] if the input is not three
    /// dot-separated parts, the header is not a valid JOSE header, or the
    /// claims part is not base64url-encoded JSON.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let mut parts = raw.split('.');
        let (Some(_header), Some(claims), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidTokenFormat);
        };

        let header = jsonwebtoken::decode_header(raw).map_err(|err| {
            tracing::debug!(error = %err, "failed to parse token header");
            AuthError::InvalidTokenFormat
        })?;

        let claims_json = URL_SAFE_NO_PAD
            .decode(claims)
            .map_err(|_| AuthError::InvalidTokenFormat)?;
        let claims: TokenClaims = serde_json::from_slice(&claims_json).map_err(|err| {
            tracing::debug!(error = %err, "failed to parse token claims");
            AuthError::InvalidTokenFormat
        })?;

        Ok(Self {
            raw: raw.to_string(),
            algorithm: header.alg,
            claims,
        })
    }

    /// The original compact serialization.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The algorithm declared in the token header.
    ///
    /// Declared, not proven: the header is attacker-controlled until the
    /// signature has been verified.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The parsed (unvalidated) claim set.
    #[must_use]
    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// Returns `true` if the declared algorithm is symmetric
    /// (shared-secret HMAC). Such tokens are rejected unconditionally: the
    /// gate only trusts asymmetric, publicly-keyed signatures.
    #[must_use]
    pub fn has_symmetric_algorithm(&self) -> bool {
        matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        )
    }
}

// ============================================================================
// Bearer Token
// ============================================================================

/// A fully validated bearer token.
///
/// Produced only by [`ClaimValidator`](crate::token::ClaimValidator) after
/// every gate has passed. Immutable; owned by one request's pipeline run and
/// discarded with it.
#[derive(Debug, Clone)]
pub struct BearerToken {
    issuer: String,
    algorithm: Algorithm,
    expires_at: i64,
    not_before: Option<i64>,
    issued_at: i64,
    scope: Option<String>,
    patient: Option<String>,
}

impl BearerToken {
    pub(crate) fn new(
        issuer: String,
        algorithm: Algorithm,
        expires_at: i64,
        not_before: Option<i64>,
        issued_at: i64,
        scope: Option<String>,
        patient: Option<String>,
    ) -> Self {
        Self {
            issuer,
            algorithm,
            expires_at,
            not_before,
            issued_at,
            scope,
            patient,
        }
    }

    /// The issuer that signed this token.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The verified signature algorithm.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Expiration time (Unix timestamp).
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Not-before time (Unix timestamp), if the claim was present.
    #[must_use]
    pub fn not_before(&self) -> Option<i64> {
        self.not_before
    }

    /// Issued-at time (Unix timestamp).
    #[must_use]
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// The raw space-delimited scope claim; empty if the claim was absent.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.scope.as_deref().unwrap_or("")
    }

    /// The patient context claim, if present.
    #[must_use]
    pub fn patient(&self) -> Option<&str> {
        self.patient.as_deref()
    }
}
