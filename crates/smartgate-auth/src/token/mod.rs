//! Bearer token parsing and claim validation.
//!
//! - [`claims`] - Unverified compact-JWS parsing and claim types
//! - [`validator`] - The ordered claim-validation gates and the issuer
//!   lookup / signature verification collaborator traits

pub mod claims;
pub mod validator;

pub use claims::{BearerToken, TokenClaims, UnverifiedToken};
pub use validator::{
    ClaimValidator, IssuerConfig, IssuerConfigService, SignatureValidator,
    SignatureValidatorFactory,
};
