//! Combining algorithms.
//!
//! An algorithm reduces the results of a node's children, evaluated in
//! list order, to one `EvaluationResult`. Every final Permit or Deny carries
//! the obligations, advice and identifiers of the children that produced
//! it, merged in evaluation order.

mod first_applicable;
mod legacy;
mod only_one;
mod overrides;
mod registry;
mod unless;

pub use first_applicable::FirstApplicable;
pub use legacy::{LegacyDenyOverridesPolicy, LegacyOverridesRule, LegacyPermitOverridesPolicy};
pub use only_one::OnlyOneApplicable;
pub use overrides::Overrides;
pub use registry::{CombiningAlgorithmRegistry, PolicyCombiningAlgorithm, RuleCombiningAlgorithm};
pub use unless::Unless;

use crate::context::EvaluationContext;
use crate::decision::{Decision, EvaluationResult};
use crate::error::EvaluationOutcome;
use crate::target::MatchResult;
use crate::tree::Evaluatable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use verdict_core::{AttributeValue, Identifier, Status};

/// Named value passed to a combining algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinerParameter {
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: AttributeValue,
}

impl CombinerParameter {
    /// Create a new parameter
    #[must_use]
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Parameter addressed to one child by its id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetedCombinerParameter {
    /// Id of the rule, policy or policy set the parameter belongs to
    pub target_id: String,
    /// The parameter
    pub parameter: CombinerParameter,
}

impl TargetedCombinerParameter {
    /// Create a new targeted parameter
    #[must_use]
    pub fn new(target_id: impl Into<String>, parameter: CombinerParameter) -> Self {
        Self {
            target_id: target_id.into(),
            parameter,
        }
    }
}

/// Child of a node together with the parameters targeted at it
#[derive(Debug)]
pub struct CombiningElement<T> {
    /// The child
    pub element: Arc<T>,
    /// Parameters addressed to this child
    pub parameters: Vec<CombinerParameter>,
}

impl<T> Clone for CombiningElement<T> {
    fn clone(&self) -> Self {
        Self {
            element: Arc::clone(&self.element),
            parameters: self.parameters.clone(),
        }
    }
}

impl<T: Evaluatable> CombiningElement<T> {
    /// Wrap a child without parameters
    #[must_use]
    pub fn new(element: Arc<T>) -> Self {
        Self {
            element,
            parameters: Vec::new(),
        }
    }

    /// Wrap a child, picking out the parameters targeted at it
    #[must_use]
    pub fn with_targeted(element: Arc<T>, targeted: &[TargetedCombinerParameter]) -> Self {
        let parameters = targeted
            .iter()
            .filter(|t| t.target_id == element.combiner_id())
            .map(|t| t.parameter.clone())
            .collect();
        Self { element, parameters }
    }

    /// Evaluate the child
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<EvaluationResult> {
        self.element.evaluate(ctx)
    }

    /// Match the child's target without evaluating it
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn match_target(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult> {
        self.element.match_target(ctx)
    }
}

/// Algorithm reducing the results of a node's children
pub trait CombiningAlgorithm<T: Evaluatable>: Send + Sync + std::fmt::Debug {
    /// Algorithm id
    fn id(&self) -> &Identifier;

    /// Combine the children's results
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    fn combine(
        &self,
        ctx: &dyn EvaluationContext,
        elements: &[CombiningElement<T>],
        parameters: &[CombinerParameter],
    ) -> EvaluationOutcome<EvaluationResult>;
}

/// First Indeterminate seen while combining, kept for its status
#[derive(Debug, Default)]
pub(crate) struct FirstFailure(Option<Status>);

impl FirstFailure {
    pub(crate) fn record(&mut self, result: &EvaluationResult) {
        if self.0.is_none() {
            self.0 = Some(result.status.clone());
        }
    }

    pub(crate) fn into_result(self, decision: Decision) -> EvaluationResult {
        EvaluationResult::with_status(decision, self.0.unwrap_or(Status::OK))
    }
}
