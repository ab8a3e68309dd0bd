//! Authentication and authorization error types.
//!
//! Every error in this crate maps to "deny this request", never to a process
//! fault: the pipeline converts each of these into a deny rule whose reason
//! string is the error's display text. Collaborator unavailability (issuer
//! lookup, signature validation) is folded into the same catalogue rather
//! than surfaced as a system error.

use std::fmt;

/// Errors produced while authenticating a bearer token or deriving policy.
///
/// Validation stops at the first failure; errors are never aggregated. The
/// display text of each variant is what the enforcement layer surfaces to
/// the caller as the denial reason, so messages stay human-readable and
/// carry no internal detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No configured authorization header was present on the request.
    #[error("Not authorized (no authorization header found in request)")]
    MissingCredentials,

    /// An authorization header was present but no accepted prefix matched.
    #[error("Not authorized (authorization header does not contain a bearer token)")]
    MalformedCredentials,

    /// The raw token is not a parseable compact-JWS (header.claims.signature).
    #[error("Not authorized (bearer token could not be validated)")]
    InvalidTokenFormat,

    /// No issuer configuration could be resolved for the token's `iss` claim.
    #[error("Not authorized (no server configuration found for issuer {issuer})")]
    UnknownIssuer {
        /// The issuer claim that failed to resolve.
        issuer: String,
    },

    /// The token is signed with a symmetric (shared-secret) algorithm.
    /// Only asymmetric, publicly-keyed signatures are trusted.
    #[error("Not authorized (signature algorithm not supported)")]
    UnsupportedAlgorithm {
        /// The declared algorithm name.
        algorithm: String,
    },

    /// Signature verification against the issuer's key set failed.
    #[error("Not authorized (signature validation failed)")]
    SignatureInvalid,

    /// No signature validator could be obtained for the issuer's key set.
    #[error("Not authorized (can't determine signature validator)")]
    ValidatorUnavailable,

    /// The `exp` claim is missing or lies outside the skew-adjusted window.
    #[error("Not authorized (token is expired)")]
    TokenExpired,

    /// The `nbf` claim lies beyond the skew-adjusted present.
    #[error("Not authorized (token not valid yet)")]
    TokenNotYetValid,

    /// The mandatory `iat` claim is absent.
    #[error("Not authorized (token does not have required issued-at claim)")]
    MissingIssuedAt,

    /// The `iat` claim lies beyond the skew-adjusted present.
    #[error("Not authorized (token was issued in the future)")]
    TokenIssuedInFuture,

    /// The token carried no scope matching the SMART grammar.
    #[error("No scope found")]
    NoScopesFound,

    /// A patient-level scope was granted but the token carries no usable
    /// patient claim.
    #[error("No patient claim found")]
    MissingPatientClaim,
}

impl AuthError {
    /// Creates a new `UnknownIssuer` error.
    #[must_use]
    pub fn unknown_issuer(issuer: impl Into<String>) -> Self {
        Self::UnknownIssuer {
            issuer: issuer.into(),
        }
    }

    /// Creates a new `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Returns `true` if the failure occurred before the token was parsed
    /// (no credentials, or credentials in an unrecognized shape).
    #[must_use]
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::MalformedCredentials)
    }

    /// Returns `true` if the failure concerns the token itself (format,
    /// issuer, signature, or time-bound claims).
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTokenFormat
                | Self::UnknownIssuer { .. }
                | Self::UnsupportedAlgorithm { .. }
                | Self::SignatureInvalid
                | Self::ValidatorUnavailable
                | Self::TokenExpired
                | Self::TokenNotYetValid
                | Self::MissingIssuedAt
                | Self::TokenIssuedInFuture
        )
    }

    /// Returns `true` if authentication succeeded but the granted scopes
    /// could not be turned into a usable policy.
    #[must_use]
    pub fn is_scope_error(&self) -> bool {
        matches!(self, Self::NoScopesFound | Self::MissingPatientClaim)
    }

    /// Returns `true` if the failure came from an external collaborator
    /// being unable to answer rather than from the token's content.
    #[must_use]
    pub fn is_collaborator_error(&self) -> bool {
        matches!(self, Self::UnknownIssuer { .. } | Self::ValidatorUnavailable)
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingCredentials | Self::MalformedCredentials => ErrorCategory::Credentials,
            Self::InvalidTokenFormat
            | Self::UnknownIssuer { .. }
            | Self::UnsupportedAlgorithm { .. }
            | Self::SignatureInvalid
            | Self::ValidatorUnavailable => ErrorCategory::Token,
            Self::TokenExpired
            | Self::TokenNotYetValid
            | Self::MissingIssuedAt
            | Self::TokenIssuedInFuture => ErrorCategory::Temporal,
            Self::NoScopesFound | Self::MissingPatientClaim => ErrorCategory::Scope,
        }
    }
}

/// Categories of gate failures for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Credential extraction failures (before any token exists).
    Credentials,
    /// Token parsing, issuer, and signature failures.
    Token,
    /// Time-bound claim failures (exp/nbf/iat).
    Temporal,
    /// Scope and launch-context failures.
    Scope,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials => write!(f, "credentials"),
            Self::Token => write!(f, "token"),
            Self::Temporal => write!(f, "temporal"),
            Self::Scope => write!(f, "scope"),
        }
    }
}
