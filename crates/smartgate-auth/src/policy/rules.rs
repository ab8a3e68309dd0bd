//! The access rule model.
//!
//! A policy is an ordered list of [`Rule`] values, evaluated top-down by
//! the enforcement layer: the first rule matching a request decides the
//! outcome. Every list the deriver produces ends in an unconditional deny,
//! so allow rules must precede it and anything unmatched defaults closed.
//!
//! Rules are plain immutable values built per request; there is no shared
//! builder state and no existence beyond the single authorization decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::smart::ResourceTarget;

// ============================================================================
// Effect and Action
// ============================================================================

/// Whether a rule allows or denies matching requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Matching requests are permitted.
    Allow,
    /// Matching requests are refused.
    Deny,
}

/// The class of operations a rule covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Read-class operations.
    Read,
    /// Write-class operations.
    Write,
    /// Only the capability/metadata endpoint.
    MetadataOnly,
    /// Every operation.
    All,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::MetadataOnly => write!(f, "metadata-only"),
            Self::All => write!(f, "all"),
        }
    }
}

// ============================================================================
// Compartment
// ============================================================================

/// A compartment constraint: the rule applies only to records belonging to
/// the identified subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compartment {
    /// The compartment-defining resource type (e.g. `Patient`).
    pub resource_type: String,

    /// The subject id within that compartment.
    pub id: String,
}

impl Compartment {
    /// Creates a Patient compartment for `id`.
    #[must_use]
    pub fn patient(id: impl Into<String>) -> Self {
        Self {
            resource_type: "Patient".to_string(),
            id: id.into(),
        }
    }

    /// Parses a patient claim into a Patient compartment.
    ///
    /// Accepts either a bare id (`123`) or a typed reference
    /// (`Patient/123`). Returns `None` for blank claims, references typed
    /// to anything other than `Patient`, or references with an empty id.
    #[must_use]
    pub fn parse_patient_claim(claim: &str) -> Option<Self> {
        let claim = claim.trim();
        if claim.is_empty() {
            return None;
        }

        match claim.split_once('/') {
            None => Some(Self::patient(claim)),
            Some(("Patient", id)) if !id.is_empty() && !id.contains('/') => {
                Some(Self::patient(id))
            }
            Some(_) => None,
        }
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

// ============================================================================
// Rule
// ============================================================================

/// One entry in an ordered access policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Allow or deny.
    pub effect: Effect,

    /// The operation class this rule covers.
    pub action: Action,

    /// The resource types this rule covers.
    pub resource: ResourceTarget,

    /// Optional compartment constraint; `None` means any resource id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compartment: Option<Compartment>,

    /// Human-readable reason, surfaced to the caller on denial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Rule {
    /// Allows read-class operations on `resource`.
    #[must_use]
    pub fn allow_read(resource: ResourceTarget) -> Self {
        Self {
            effect: Effect::Allow,
            action: Action::Read,
            resource,
            compartment: None,
            reason: None,
        }
    }

    /// Allows write-class operations on `resource`.
    #[must_use]
    pub fn allow_write(resource: ResourceTarget) -> Self {
        Self {
            effect: Effect::Allow,
            action: Action::Write,
            resource,
            compartment: None,
            reason: None,
        }
    }

    /// Allows unauthenticated access to the capability/metadata endpoint.
    #[must_use]
    pub fn allow_metadata() -> Self {
        Self {
            effect: Effect::Allow,
            action: Action::MetadataOnly,
            resource: ResourceTarget::All,
            compartment: None,
            reason: None,
        }
    }

    /// Allows everything. Emitted only when checking is administratively
    /// disabled or the deployment runs in admin mode.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            effect: Effect::Allow,
            action: Action::All,
            resource: ResourceTarget::All,
            compartment: None,
            reason: None,
        }
    }

    /// Denies everything, carrying `reason` to the caller.
    #[must_use]
    pub fn deny_all(reason: impl Into<String>) -> Self {
        Self {
            effect: Effect::Deny,
            action: Action::All,
            resource: ResourceTarget::All,
            compartment: None,
            reason: Some(reason.into()),
        }
    }

    /// Constrains this rule to a compartment.
    #[must_use]
    pub fn in_compartment(mut self, compartment: Compartment) -> Self {
        self.compartment = Some(compartment);
        self
    }

    /// Returns `true` for allow rules.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        self.effect == Effect::Allow
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let effect = match self.effect {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        };
        write!(f, "{effect} {} {}", self.action, self.resource)?;
        if let Some(compartment) = &self.compartment {
            write!(f, " in {compartment}")?;
        }
        if let Some(reason) = &self.reason {
            write!(f, " ({reason})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patient_claim_bare_id() {
        let compartment = Compartment::parse_patient_claim("123").unwrap();
        assert_eq!(compartment, Compartment::patient("123"));
    }

    #[test]
    fn test_parse_patient_claim_typed_reference() {
        let compartment = Compartment::parse_patient_claim("Patient/123").unwrap();
        assert_eq!(compartment, Compartment::patient("123"));
    }

    #[test]
    fn test_parse_patient_claim_rejects_unusable() {
        for claim in ["", "   ", "Observation/123", "Patient/", "Patient/1/extra"] {
            assert!(
                Compartment::parse_patient_claim(claim).is_none(),
                "{claim:?} must not parse"
            );
        }
    }

    #[test]
    fn test_rule_constructors() {
        let rule = Rule::allow_read(ResourceTarget::Type("Observation".to_string()))
            .in_compartment(Compartment::patient("123"));
        assert!(rule.is_allow());
        assert_eq!(rule.action, Action::Read);
        assert_eq!(rule.compartment, Some(Compartment::patient("123")));

        let rule = Rule::deny_all("No scope found");
        assert!(!rule.is_allow());
        assert_eq!(rule.reason.as_deref(), Some("No scope found"));

        assert_eq!(Rule::allow_metadata().action, Action::MetadataOnly);
        assert_eq!(Rule::allow_all().action, Action::All);
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::allow_read(ResourceTarget::Type("Observation".to_string()))
            .in_compartment(Compartment::patient("123"));
        assert_eq!(rule.to_string(), "allow read Observation in Patient/123");

        assert_eq!(
            Rule::deny_all("No scope found").to_string(),
            "deny all * (No scope found)"
        );
    }

    #[test]
    fn test_rule_serialization() {
        let rule = Rule::allow_write(ResourceTarget::All);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["effect"], "allow");
        assert_eq!(json["action"], "write");
        assert!(json.get("compartment").is_none());

        let back: Rule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }
}
