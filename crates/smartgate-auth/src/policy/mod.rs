//! Policy rule model and scope-to-rule derivation.
//!
//! - [`rules`] - The immutable [`Rule`](rules::Rule) model consumed by the
//!   enforcement layer
//! - [`deriver`] - Derivation of ordered rule lists from parsed SMART
//!   scopes

pub mod deriver;
pub mod rules;

pub use rules::{Action, Compartment, Effect, Rule};
