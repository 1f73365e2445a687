//! Decisions and the evaluation result accumulator.

use serde::{Deserialize, Serialize};
use verdict_core::{AttributeValue, Identifier, Status, Version};

/// Outcome of evaluating a rule, policy or policy set
///
/// The three `Indeterminate*` subkinds record which decisions could have
/// been reached had the error not occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Access permitted
    Permit,
    /// Access denied
    Deny,
    /// Nothing applied
    NotApplicable,
    /// Error with no further information
    Indeterminate,
    /// Error where only Permit was possible
    IndeterminatePermit,
    /// Error where only Deny was possible
    IndeterminateDeny,
    /// Error where both Permit and Deny were possible
    IndeterminateDenyPermit,
}

impl Decision {
    /// Check whether this is one of the Indeterminate decisions
    #[must_use]
    pub const fn is_indeterminate(&self) -> bool {
        matches!(
            self,
            Self::Indeterminate
                | Self::IndeterminatePermit
                | Self::IndeterminateDeny
                | Self::IndeterminateDenyPermit
        )
    }

    /// Check whether this is Permit or Deny
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Permit | Self::Deny)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Permit => "Permit",
            Self::Deny => "Deny",
            Self::NotApplicable => "NotApplicable",
            Self::Indeterminate => "Indeterminate",
            Self::IndeterminatePermit => "Indeterminate{P}",
            Self::IndeterminateDeny => "Indeterminate{D}",
            Self::IndeterminateDenyPermit => "Indeterminate{DP}",
        };
        f.write_str(name)
    }
}

/// Effect of a rule; also selects which obligations and advice apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Permit
    Permit,
    /// Deny
    Deny,
}

impl Effect {
    /// Decision produced when the effect applies
    #[must_use]
    pub const fn decision(&self) -> Decision {
        match self {
            Self::Permit => Decision::Permit,
            Self::Deny => Decision::Deny,
        }
    }

    /// Indeterminate subkind for an error while this effect was in flight
    #[must_use]
    pub const fn indeterminate(&self) -> Decision {
        match self {
            Self::Permit => Decision::IndeterminatePermit,
            Self::Deny => Decision::IndeterminateDeny,
        }
    }

    /// The other effect
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Permit => Self::Deny,
            Self::Deny => Self::Permit,
        }
    }

    /// Effect matching a final decision
    #[must_use]
    pub const fn from_decision(decision: Decision) -> Option<Self> {
        match decision {
            Decision::Permit => Some(Self::Permit),
            Decision::Deny => Some(Self::Deny),
            _ => None,
        }
    }
}

/// Attribute carried by an obligation or advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeAssignment {
    /// Attribute id
    pub attribute_id: Identifier,
    /// Attribute category
    pub category: Option<Identifier>,
    /// Issuer
    pub issuer: Option<String>,
    /// Value
    pub value: AttributeValue,
}

/// Obligation returned with a Permit or Deny
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    /// Obligation id
    pub id: Identifier,
    /// Attached attributes
    pub attribute_assignments: Vec<AttributeAssignment>,
}

/// Advice returned with a Permit or Deny
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    /// Advice id
    pub id: Identifier,
    /// Attached attributes
    pub attribute_assignments: Vec<AttributeAssignment>,
}

/// Reference to a policy or policy set that contributed to a decision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdReference {
    /// Policy or policy set id
    pub id: Identifier,
    /// Its version
    pub version: Version,
}

/// Decision plus status, obligations, advice and contributing policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Decision
    pub decision: Decision,
    /// Status
    pub status: Status,
    /// Obligations
    pub obligations: Vec<Obligation>,
    /// Advice
    pub advice: Vec<Advice>,
    /// Contributing policies
    pub policy_identifiers: Vec<IdReference>,
    /// Contributing policy sets
    pub policy_set_identifiers: Vec<IdReference>,
}

impl EvaluationResult {
    /// Create a result with OK status
    #[must_use]
    pub fn new(decision: Decision) -> Self {
        Self::with_status(decision, Status::OK)
    }

    /// Create a result with the given status
    #[must_use]
    pub fn with_status(decision: Decision, status: Status) -> Self {
        Self {
            decision,
            status,
            obligations: Vec::new(),
            advice: Vec::new(),
            policy_identifiers: Vec::new(),
            policy_set_identifiers: Vec::new(),
        }
    }

    /// NotApplicable result
    #[must_use]
    pub fn not_applicable() -> Self {
        Self::new(Decision::NotApplicable)
    }

    /// Plain Indeterminate carrying a status
    #[must_use]
    pub fn indeterminate(status: Status) -> Self {
        Self::with_status(Decision::Indeterminate, status)
    }

    /// Append obligations, advice and identifiers of a contributing result
    ///
    /// The decision is left untouched. A non-OK status is adopted only if
    /// this result is still OK.
    pub fn merge(&mut self, other: EvaluationResult) {
        if self.status.is_ok() && !other.status.is_ok() {
            self.status = other.status;
        }
        self.obligations.extend(other.obligations);
        self.advice.extend(other.advice);
        self.policy_identifiers.extend(other.policy_identifiers);
        self.policy_set_identifiers.extend(other.policy_set_identifiers);
    }

    /// Replace the decision
    #[must_use]
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decision = decision;
        self
    }

    /// Turn the result into an Indeterminate, dropping what a final
    /// decision would have carried
    pub fn fail(&mut self, decision: Decision, status: Status) {
        self.decision = decision;
        self.status = status;
        self.obligations.clear();
        self.advice.clear();
    }
}
