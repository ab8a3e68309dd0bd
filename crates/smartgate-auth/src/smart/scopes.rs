//! SMART on FHIR scope parsing.
//!
//! This module parses the v1 SMART scope syntax used by OIDC access tokens:
//! `context/ResourceType.operation`, where context is `patient` or `user`,
//! the resource type may be `*` for all resources, and the operation is
//! `read`, `write`, or `*` for both.
//!
//! Parsing is deliberately lenient at the set level: scope claims routinely
//! carry non-resource scopes (`openid`, `launch`, `offline_access`, ...)
//! alongside the SMART ones, so tokens that do not match the grammar are
//! dropped silently rather than treated as errors.
//!
//! # Examples
//!
//! ```
//! use smartgate_auth::smart::{ScopeSet, ScopeSpecificity};
//!
//! let scopes = ScopeSet::parse("openid patient/Observation.read offline_access");
//! assert_eq!(scopes.len(), 1);
//!
//! let scope = scopes.iter().next().unwrap();
//! assert_eq!(scope.specificity, ScopeSpecificity::Patient);
//! assert!(scope.grants_read());
//! assert!(!scope.grants_write());
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Grammar for a SMART resource scope: `(patient|user)/<resource>.<operation>`.
static SCOPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(patient|user)/([^.]+)\.(.+)$").expect("valid scope pattern"));

// ============================================================================
// Scope Specificity
// ============================================================================

/// Whether a scope grants patient-level or user-level access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeSpecificity {
    /// Patient-level access (`patient/*`): restricted to the compartment of
    /// the patient named by the token's patient claim.
    Patient,

    /// User-level access (`user/*`): applies to any resource id.
    User,
}

impl ScopeSpecificity {
    /// Returns the string representation of the specificity.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::User => "user",
        }
    }
}

impl fmt::Display for ScopeSpecificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Resource Target
// ============================================================================

/// The FHIR resource type targeted by a scope or policy rule.
///
/// Serializes as the scope-syntax string: `*` or the type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceTarget {
    /// Wildcard (`*`) matching all resource types.
    All,

    /// A specific FHIR resource type (e.g. `Patient`, `Observation`).
    Type(String),
}

impl From<String> for ResourceTarget {
    fn from(value: String) -> Self {
        if value == "*" {
            Self::All
        } else {
            Self::Type(value)
        }
    }
}

impl From<ResourceTarget> for String {
    fn from(value: ResourceTarget) -> Self {
        value.to_string()
    }
}

impl ResourceTarget {
    /// Returns `true` for the wildcard target.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for ResourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::Type(name) => write!(f, "{name}"),
        }
    }
}

// ============================================================================
// Smart Scope
// ============================================================================

/// One parsed SMART resource scope.
///
/// Invariant: every `SmartScope` comes from exactly one raw scope string
/// matching the grammar; strings outside the grammar produce no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartScope {
    /// Patient- or user-level access.
    pub specificity: ScopeSpecificity,

    /// The targeted resource type, possibly the wildcard.
    pub resource: ResourceTarget,

    /// The granted operation, verbatim from the scope string. Recognized
    /// values are `read`, `write`, and `*`; anything else parses but grants
    /// nothing.
    pub operation: String,
}

impl SmartScope {
    /// Parses one scope string, returning `None` when it does not match the
    /// SMART grammar.
    #[must_use]
    pub fn parse(scope: &str) -> Option<Self> {
        let captures = SCOPE_PATTERN.captures(scope)?;

        let specificity = match &captures[1] {
            "patient" => ScopeSpecificity::Patient,
            "user" => ScopeSpecificity::User,
            _ => unreachable!("pattern only admits patient|user"),
        };
        let resource = match &captures[2] {
            "*" => ResourceTarget::All,
            name => ResourceTarget::Type(name.to_string()),
        };

        Some(Self {
            specificity,
            resource,
            operation: captures[3].to_string(),
        })
    }

    /// Returns `true` if this scope grants read access.
    #[must_use]
    pub fn grants_read(&self) -> bool {
        self.operation == "read" || self.operation == "*"
    }

    /// Returns `true` if this scope grants write access.
    #[must_use]
    pub fn grants_write(&self) -> bool {
        self.operation == "write" || self.operation == "*"
    }

    /// Returns `true` for patient-level scopes.
    #[must_use]
    pub fn is_patient(&self) -> bool {
        self.specificity == ScopeSpecificity::Patient
    }
}

impl fmt::Display for SmartScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.specificity, self.resource, self.operation)
    }
}

// ============================================================================
// Scope Set
// ============================================================================

/// The ordered SMART scopes parsed from a token's scope claim.
///
/// Order is the original claim order; duplicates are retained. Scope
/// strings outside the grammar are dropped without error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
    scopes: Vec<SmartScope>,
}

impl ScopeSet {
    /// Parses a space-delimited scope claim.
    #[must_use]
    pub fn parse(claim: &str) -> Self {
        let scopes: Vec<SmartScope> = claim
            .split_whitespace()
            .filter_map(SmartScope::parse)
            .collect();

        tracing::debug!(
            total = claim.split_whitespace().count(),
            smart = scopes.len(),
            "parsed scope claim"
        );

        Self { scopes }
    }

    /// Returns `true` when no scope matched the SMART grammar.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Number of parsed SMART scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Iterates the scopes in original claim order.
    pub fn iter(&self) -> impl Iterator<Item = &SmartScope> {
        self.scopes.iter()
    }
}

impl<'a> IntoIterator for &'a ScopeSet {
    type Item = &'a SmartScope;
    type IntoIter = std::slice::Iter<'a, SmartScope>;

    fn into_iter(self) -> Self::IntoIter {
        self.scopes.iter()
    }
}
