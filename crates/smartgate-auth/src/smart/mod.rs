//! SMART on FHIR scope parsing.

pub mod scopes;

pub use scopes::{ResourceTarget, ScopeSet, ScopeSpecificity, SmartScope};
