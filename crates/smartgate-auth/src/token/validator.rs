//! Ordered claim validation against an external identity provider.
//!
//! The validator runs a fixed sequence of gates over a raw bearer token;
//! the first failing gate wins and no further checks run. Issuer metadata
//! resolution and signature verification are external collaborators behind
//! the [`IssuerConfigService`] and [`SignatureValidatorFactory`] traits —
//! any caching, retry, or network policy lives on their side, and their
//! unavailability is converted into a denial-producing error rather than a
//! fault.
//!
//! # Gate order
//!
//! 1. Structural parse of the compact form
//! 2. Issuer configuration lookup
//! 3. Algorithm gate (symmetric algorithms rejected) and signature check
//! 4. `exp` (mandatory, skew-widened into the past)
//! 5. `nbf` (optional, skew-widened into the future)
//! 6. `iat` (mandatory, skew-widened into the future)
//!
//! Skew is applied asymmetrically on purpose: each check moves by the skew
//! allowance in the direction that keeps a drifting-but-honest clock valid.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use url::Url;

use crate::config::DEFAULT_SKEW_ALLOWANCE;
use crate::error::AuthError;
use crate::token::claims::{BearerToken, UnverifiedToken};

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Per-issuer metadata resolved from the identity provider's discovery
/// document, typically cached upstream of this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuerConfig {
    /// Location of the issuer's public key set.
    pub jwks_uri: Url,
}

impl IssuerConfig {
    /// Creates a config for an issuer whose keys live at `jwks_uri`.
    #[must_use]
    pub fn new(jwks_uri: Url) -> Self {
        Self { jwks_uri }
    }
}

/// Resolves issuer strings to their configuration.
///
/// Returning `None` covers both "issuer not known" and "lookup service
/// cannot answer right now"; the validator treats either as
/// [`AuthError::UnknownIssuer`].
#[async_trait]
pub trait IssuerConfigService: Send + Sync {
    /// Looks up the configuration for `issuer`.
    async fn lookup(&self, issuer: &str) -> Option<IssuerConfig>;
}

/// Verifies a token's signature against a specific key set.
pub trait SignatureValidator: Send + Sync {
    /// Returns `true` if the token's signature verifies against this key
    /// set.
    fn verify(&self, token: &UnverifiedToken) -> bool;
}

/// Produces signature validators bound to a key-set location.
///
/// Returning `None` means no validator could be obtained (key set
/// unreachable, unparsable, empty); the validator maps this to
/// [`AuthError::ValidatorUnavailable`].
#[async_trait]
pub trait SignatureValidatorFactory: Send + Sync {
    /// Obtains a validator for the key set at `jwks_uri`.
    async fn for_key_set(&self, jwks_uri: &Url) -> Option<Arc<dyn SignatureValidator>>;
}

// ============================================================================
// Claim Validator
// ============================================================================

/// Validates raw bearer tokens into [`BearerToken`]s.
///
/// Stateless across requests; the collaborators are shared read-only and
/// may be used concurrently from many simultaneous pipeline runs.
pub struct ClaimValidator {
    issuer_configs: Arc<dyn IssuerConfigService>,
    validators: Arc<dyn SignatureValidatorFactory>,
    skew_allowance: Duration,
}

impl ClaimValidator {
    /// Creates a validator with the default skew allowance (300 seconds).
    pub fn new(
        issuer_configs: Arc<dyn IssuerConfigService>,
        validators: Arc<dyn SignatureValidatorFactory>,
    ) -> Self {
        Self {
            issuer_configs,
            validators,
            skew_allowance: DEFAULT_SKEW_ALLOWANCE,
        }
    }

    /// Sets the clock-skew allowance.
    #[must_use]
    pub fn with_skew_allowance(mut self, skew: Duration) -> Self {
        self.skew_allowance = skew;
        self
    }

    /// The configured clock-skew allowance.
    #[must_use]
    pub fn skew_allowance(&self) -> Duration {
        self.skew_allowance
    }

    /// Validates `raw` against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns the first failing gate's error; see [`AuthError`] for the
    /// full catalogue.
    pub async fn validate(&self, raw: &str) -> Result<BearerToken, AuthError> {
        self.validate_at(raw, OffsetDateTime::now_utc()).await
    }

    /// Validates `raw` as of `now`. Exposed for deterministic testing of
    /// the time-bound gates.
    ///
    /// # Errors
    ///
    /// Returns the first failing gate's error.
    pub async fn validate_at(
        &self,
        raw: &str,
        now: OffsetDateTime,
    ) -> Result<BearerToken, AuthError> {
        // Gate 1: structural parse.
        let token = UnverifiedToken::parse(raw)?;
        let claims = token.claims().clone();

        // Gate 2: issuer configuration.
        let issuer = claims.iss.clone().unwrap_or_default();
        tracing::debug!(issuer = %issuer, "resolving issuer configuration");
        let issuer_config = self
            .issuer_configs
            .lookup(&issuer)
            .await
            .ok_or_else(|| {
                tracing::warn!(issuer = %issuer, "no configuration found for issuer");
                AuthError::unknown_issuer(issuer.as_str())
            })?;

        // Gate 3: algorithm and signature. Shared-secret algorithms are
        // rejected outright; only publicly-keyed signatures are trusted.
        if token.has_symmetric_algorithm() {
            tracing::warn!(algorithm = ?token.algorithm(), "rejecting symmetric signature algorithm");
            return Err(AuthError::unsupported_algorithm(format!(
                "{:?}",
                token.algorithm()
            )));
        }

        tracing::debug!(jwks_uri = %issuer_config.jwks_uri, "checking signature using public key set");
        let validator = self
            .validators
            .for_key_set(&issuer_config.jwks_uri)
            .await
            .ok_or_else(|| {
                tracing::warn!(jwks_uri = %issuer_config.jwks_uri, "no signature validator available");
                AuthError::ValidatorUnavailable
            })?;
        if !validator.verify(&token) {
            return Err(AuthError::SignatureInvalid);
        }

        // Gates 4-6: time-bound claims. now_with_skew widens the window in
        // the future direction; min_allowable_expiry narrows it in the past.
        let now = now.unix_timestamp();
        let skew = self.skew_allowance.as_secs() as i64;

        let Some(expires_at) = claims.exp else {
            return Err(AuthError::TokenExpired);
        };
        let min_allowable_expiry = now - skew;
        if expires_at < min_allowable_expiry {
            tracing::debug!(expires_at, min_allowable_expiry, "token expired");
            return Err(AuthError::TokenExpired);
        }

        let now_with_skew = now + skew;
        if let Some(not_before) = claims.nbf
            && now_with_skew < not_before
        {
            tracing::debug!(not_before, now_with_skew, "token not yet valid");
            return Err(AuthError::TokenNotYetValid);
        }

        let Some(issued_at) = claims.iat else {
            return Err(AuthError::MissingIssuedAt);
        };
        if now_with_skew < issued_at {
            tracing::debug!(issued_at, now_with_skew, "token issued in the future");
            return Err(AuthError::TokenIssuedInFuture);
        }

        Ok(BearerToken::new(
            issuer,
            token.algorithm(),
            expires_at,
            claims.nbf,
            issued_at,
            claims.scope,
            claims.patient,
        ))
    }
}
