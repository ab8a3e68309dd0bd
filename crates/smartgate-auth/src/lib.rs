//! # smartgate-auth
//!
//! Request-time bearer-token gate for FHIR resource servers.
//!
//! This crate authenticates an inbound OIDC bearer token issued by an
//! external identity provider and derives a fine-grained, per-request
//! access policy from the token's SMART scopes. The output is an ordered
//! list of allow/deny rules, always terminated by an unconditional deny,
//! consumed by the server's enforcement layer.
//!
//! The crate owns no HTTP handling, no key retrieval, and no cryptography:
//! issuer metadata resolution and signature verification sit behind the
//! [`IssuerConfigService`] and [`SignatureValidatorFactory`] traits so the
//! embedding server can supply its own cached JWKS plumbing.
//!
//! ## Modules
//!
//! - [`config`] - Gate configuration (header conventions, skew, modes)
//! - [`error`] - The denial-producing error catalogue
//! - [`extract`] - Bearer token extraction from request headers
//! - [`token`] - Token parsing and ordered claim validation
//! - [`smart`] - SMART scope parsing
//! - [`policy`] - Rule model and scope-to-rule derivation
//! - [`pipeline`] - The assembled [`SmartGate`] pipeline

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod policy;
pub mod smart;
pub mod token;

#[cfg(test)]
pub(crate) mod test_jwt;

pub use config::{DEFAULT_SKEW_ALLOWANCE, GateConfig, HeaderCandidate};
pub use error::{AuthError, ErrorCategory};
pub use extract::extract_bearer_token;
pub use pipeline::SmartGate;
pub use policy::{Action, Compartment, Effect, Rule};
pub use smart::{ResourceTarget, ScopeSet, ScopeSpecificity, SmartScope};
pub use token::{
    BearerToken, ClaimValidator, IssuerConfig, IssuerConfigService, SignatureValidator,
    SignatureValidatorFactory, TokenClaims, UnverifiedToken,
};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
