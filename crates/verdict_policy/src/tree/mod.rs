//! Decision tree: rules, policies and policy sets.
//!
//! Every node runs the same steps per request: validate (cached), match
//! the target, combine, then attach obligations, advice and, on request,
//! its own identifier.

mod component;
mod policy;
mod policy_set;
mod rule;

pub use policy::Policy;
pub use policy_set::PolicySet;
pub use rule::Rule;

pub(crate) use component::Validity;

use crate::context::{EvaluationContext, TraceEvent};
use crate::decision::{Decision, EvaluationResult};
use crate::error::EvaluationOutcome;
use crate::target::MatchResult;
use verdict_core::Status;

/// Node of the decision tree
pub trait Evaluatable: Send + Sync + std::fmt::Debug {
    /// Id used to address combiner parameters to this node
    fn combiner_id(&self) -> &str;

    /// Structural check, computed once and cached
    fn validate(&self) -> Status;

    /// Match the node's target
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    fn match_target(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult>;

    /// Evaluate the node
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<EvaluationResult>;
}

/// Child of a policy set
#[derive(Debug)]
pub enum PolicySetChild {
    /// Policy
    Policy(Policy),
    /// Nested policy set
    PolicySet(PolicySet),
}

impl Evaluatable for PolicySetChild {
    fn combiner_id(&self) -> &str {
        match self {
            Self::Policy(policy) => policy.combiner_id(),
            Self::PolicySet(set) => set.combiner_id(),
        }
    }

    fn validate(&self) -> Status {
        match self {
            Self::Policy(policy) => policy.validate(),
            Self::PolicySet(set) => set.validate(),
        }
    }

    fn match_target(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult> {
        match self {
            Self::Policy(policy) => policy.match_target(ctx),
            Self::PolicySet(set) => set.match_target(ctx),
        }
    }

    fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<EvaluationResult> {
        match self {
            Self::Policy(policy) => policy.evaluate(ctx),
            Self::PolicySet(set) => set.evaluate(ctx),
        }
    }
}

impl From<Policy> for PolicySetChild {
    fn from(value: Policy) -> Self {
        Self::Policy(value)
    }
}

impl From<PolicySet> for PolicySetChild {
    fn from(value: PolicySet) -> Self {
        Self::PolicySet(value)
    }
}

/// Emit the `Match` trace event of a node
pub(crate) fn trace_match(ctx: &dyn EvaluationContext, node: &str, result: &MatchResult) {
    if ctx.is_tracing() {
        let message = match result {
            MatchResult::Match => "Match".to_string(),
            MatchResult::NoMatch => "NoMatch".to_string(),
            MatchResult::Indeterminate(status) => format!("Indeterminate: {}", status),
        };
        ctx.trace(TraceEvent::new("Match", node, message));
    }
}

/// Emit the `Result` trace event of a node and log its decision
pub(crate) fn trace_result(ctx: &dyn EvaluationContext, node: &str, result: &EvaluationResult) {
    tracing::trace!(node = %node, decision = %result.decision, "node evaluated");
    if ctx.is_tracing() {
        ctx.trace(TraceEvent::new("Result", node, result.decision.to_string()));
    }
}

/// Map a target outcome to the early result of a node, if any
///
/// `on_error` is the decision a failed target turns into.
pub(crate) fn target_outcome(result: MatchResult, on_error: Decision) -> Option<EvaluationResult> {
    match result {
        MatchResult::Match => None,
        MatchResult::NoMatch => Some(EvaluationResult::not_applicable()),
        MatchResult::Indeterminate(status) => Some(EvaluationResult::with_status(on_error, status)),
    }
}
