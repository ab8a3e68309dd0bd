//! Derivation of ordered rule lists from parsed SMART scopes.
//!
//! The deriver walks the token's scope entries in order and emits one allow
//! rule per granted operation, then terminates the list with a metadata
//! allow followed by an unconditional deny. Capability discovery must stay
//! reachable even for principals with no matching scope, while every other
//! access defaults closed; the enforcement layer applies the first matching
//! rule, so order is part of the contract.

use crate::error::AuthError;
use crate::policy::rules::{Compartment, Rule};
use crate::smart::{ScopeSet, SmartScope};

/// The policy when authorization checking is administratively disabled or
/// the deployment runs in admin mode: one allow-all rule.
#[must_use]
pub fn unrestricted() -> Vec<Rule> {
    vec![Rule::allow_all()]
}

/// The policy for a request that failed authentication or produced no
/// usable scopes: metadata stays reachable, everything else is denied with
/// `reason`.
#[must_use]
pub fn deny_with_metadata(reason: impl Into<String>) -> Vec<Rule> {
    vec![Rule::allow_metadata(), Rule::deny_all(reason)]
}

/// Derives the rule list for a validated token's scopes.
///
/// `patient_claim` is consulted lazily, only when a patient-level scope
/// actually needs a compartment. An absent or unusable claim aborts the
/// whole derivation in favor of a metadata-plus-deny policy: emitting the
/// other entries' rules anyway would widen a patient-scoped grant.
#[must_use]
pub fn from_scopes(scopes: &ScopeSet, patient_claim: Option<&str>) -> Vec<Rule> {
    if scopes.is_empty() {
        tracing::debug!("token carries no SMART scopes");
        return deny_with_metadata(AuthError::NoScopesFound.to_string());
    }

    // Resolved on first use; None once resolution has failed.
    let mut patient_compartment: Option<Option<Compartment>> = None;
    let mut rules = Vec::new();

    for scope in scopes {
        for rule in [
            scope.grants_read().then(|| Rule::allow_read(scope.resource.clone())),
            scope.grants_write().then(|| Rule::allow_write(scope.resource.clone())),
        ]
        .into_iter()
        .flatten()
        {
            if scope.is_patient() {
                let compartment = patient_compartment
                    .get_or_insert_with(|| resolve_patient_compartment(patient_claim));
                let Some(compartment) = compartment else {
                    tracing::debug!(scope = %scope, "patient-level scope without patient claim");
                    return deny_with_metadata(AuthError::MissingPatientClaim.to_string());
                };
                rules.push(rule.in_compartment(compartment.clone()));
            } else {
                rules.push(rule);
            }
        }
        trace_scope(scope);
    }

    rules.push(Rule::allow_metadata());
    rules.push(Rule::deny_all("Access denied by default policy"));
    rules
}

fn resolve_patient_compartment(patient_claim: Option<&str>) -> Option<Compartment> {
    patient_claim.and_then(Compartment::parse_patient_claim)
}

fn trace_scope(scope: &SmartScope) {
    tracing::debug!(
        scope = %scope,
        read = scope.grants_read(),
        write = scope.grants_write(),
        "derived rules for scope"
    );
}
