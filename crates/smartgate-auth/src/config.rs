//! Gate configuration.
//!
//! Configuration for the token gate: whether checking is enabled at all,
//! which header conventions carry the bearer token, how much clock skew to
//! absorb when checking time-bound claims, and whether the deployment runs
//! in admin mode (any valid token grants full access, scopes ignored).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default clock-skew allowance between the token issuer and this gate.
pub const DEFAULT_SKEW_ALLOWANCE: Duration = Duration::from_secs(300);

/// Root configuration for the bearer-token gate.
///
/// # Example (TOML)
///
/// ```toml
/// [gate]
/// enabled = true
/// admin_mode = false
/// skew_allowance = "5m"
///
/// [[gate.header_candidates]]
/// name = "authorization"
/// prefix = "Bearer "
///
/// # API-gateway deployments that re-home the token into their own header
/// # can add a fallback convention, tried after the standard one:
/// [[gate.header_candidates]]
/// name = "x-access-token"
/// prefix = "Bearer "
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Enable/disable authorization checking entirely.
    ///
    /// When disabled the gate emits a single allow-all rule for every
    /// request regardless of headers or token content. This is an
    /// operational escape hatch for test deployments, not a security check.
    pub enabled: bool,

    /// Treat any successfully validated token as fully privileged,
    /// skipping scope evaluation. Collapses the legacy "admin interceptor"
    /// deployment into a flag on the single pipeline.
    pub admin_mode: bool,

    /// Tolerance window absorbing clock drift between the token issuer and
    /// this gate when checking `exp`, `nbf`, and `iat`.
    #[serde(with = "humantime_serde")]
    pub skew_allowance: Duration,

    /// Header conventions carrying the bearer token, tried in order.
    /// The first present header whose value starts with the candidate's
    /// prefix wins.
    pub header_candidates: Vec<HeaderCandidate>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_mode: false,
            skew_allowance: DEFAULT_SKEW_ALLOWANCE,
            header_candidates: vec![HeaderCandidate::standard_bearer()],
        }
    }
}

impl GateConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables authorization checking (allow-all mode).
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Enables admin mode (any valid token grants full access).
    #[must_use]
    pub fn with_admin_mode(mut self, admin_mode: bool) -> Self {
        self.admin_mode = admin_mode;
        self
    }

    /// Sets the clock-skew allowance.
    #[must_use]
    pub fn with_skew_allowance(mut self, skew: Duration) -> Self {
        self.skew_allowance = skew;
        self
    }

    /// Replaces the header candidate list.
    #[must_use]
    pub fn with_header_candidates(mut self, candidates: Vec<HeaderCandidate>) -> Self {
        self.header_candidates = candidates;
        self
    }

    /// Appends a fallback header convention after the existing ones.
    #[must_use]
    pub fn with_fallback_header(mut self, candidate: HeaderCandidate) -> Self {
        self.header_candidates.push(candidate);
        self
    }
}

/// One header/prefix convention that may carry the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeaderCandidate {
    /// Header name, matched case-insensitively as HTTP headers are.
    pub name: String,

    /// Required value prefix, stripped to obtain the raw token.
    /// Matched case-sensitively, including any trailing space.
    pub prefix: String,
}

impl HeaderCandidate {
    /// Creates a new header candidate.
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
        }
    }

    /// The standard `Authorization: Bearer <token>` convention.
    #[must_use]
    pub fn standard_bearer() -> Self {
        Self::new("authorization", "Bearer ")
    }
}
