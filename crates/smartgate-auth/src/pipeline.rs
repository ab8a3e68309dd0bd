//! The end-to-end request gate.
//!
//! [`SmartGate`] wires the extractor, claim validator, scope parser, and
//! policy deriver into one configurable pipeline:
//!
//! ```text
//! headers -> extract -> validate -> parse scopes -> derive rules
//! ```
//!
//! The gate never returns an error: every failure short-circuits into a
//! "metadata reachable, everything else denied" policy carrying the failure
//! reason, so the enforcement layer always receives an ordered rule list.
//! One pipeline run per inbound request; the gate holds no per-request
//! state and is safe to share across concurrent requests.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use smartgate_auth::{GateConfig, SmartGate};
//!
//! let gate = SmartGate::new(GateConfig::default(), issuer_configs, validators);
//! let rules = gate.rule_list(request.headers()).await;
//! enforcement.apply(&rules, &request);
//! ```

use std::sync::Arc;

use http::HeaderMap;
use time::OffsetDateTime;

use crate::config::GateConfig;
use crate::error::AuthError;
use crate::extract::extract_bearer_token;
use crate::policy::deriver;
use crate::policy::rules::Rule;
use crate::smart::ScopeSet;
use crate::token::claims::BearerToken;
use crate::token::validator::{ClaimValidator, IssuerConfigService, SignatureValidatorFactory};

/// The bearer-token gate: authenticates a request's token and derives the
/// access policy its scopes grant.
pub struct SmartGate {
    config: GateConfig,
    validator: ClaimValidator,
}

impl SmartGate {
    /// Creates a gate from configuration and the two external
    /// collaborators. The validator inherits the configured skew allowance.
    pub fn new(
        config: GateConfig,
        issuer_configs: Arc<dyn IssuerConfigService>,
        validators: Arc<dyn SignatureValidatorFactory>,
    ) -> Self {
        let validator = ClaimValidator::new(issuer_configs, validators)
            .with_skew_allowance(config.skew_allowance);
        Self { config, validator }
    }

    /// The gate's configuration.
    #[must_use]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Derives the ordered rule list for a request, as of the current wall
    /// clock.
    pub async fn rule_list(&self, headers: &HeaderMap) -> Vec<Rule> {
        self.rule_list_at(headers, OffsetDateTime::now_utc()).await
    }

    /// Derives the ordered rule list as of `now`. Exposed for
    /// deterministic testing of the time-bound validation gates.
    pub async fn rule_list_at(&self, headers: &HeaderMap, now: OffsetDateTime) -> Vec<Rule> {
        if !self.config.enabled {
            tracing::debug!("authorization checking disabled, allowing everything");
            return deriver::unrestricted();
        }

        let token = match self.authenticate_at(headers, now).await {
            Ok(token) => token,
            Err(err) => {
                tracing::info!(category = %err.category(), reason = %err, "authentication failed");
                return deriver::deny_with_metadata(err.to_string());
            }
        };

        if self.config.admin_mode {
            tracing::debug!(issuer = %token.issuer(), "admin mode, valid token grants full access");
            return deriver::unrestricted();
        }

        let scopes = ScopeSet::parse(token.scope());
        deriver::from_scopes(&scopes, token.patient())
    }

    /// Runs extraction and claim validation only, yielding the validated
    /// token. Callers that need the claims themselves (audit, launch
    /// context) use this; [`rule_list`](Self::rule_list) is the policy
    /// entry point.
    ///
    /// # Errors
    ///
    /// Returns the first failing gate's [`AuthError`].
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<BearerToken, AuthError> {
        self.authenticate_at(headers, OffsetDateTime::now_utc()).await
    }

    async fn authenticate_at(
        &self,
        headers: &HeaderMap,
        now: OffsetDateTime,
    ) -> Result<BearerToken, AuthError> {
        let raw = extract_bearer_token(headers, &self.config.header_candidates)?;
        self.validator.validate_at(raw, now).await
    }
}
