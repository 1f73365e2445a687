//! VERDICT Policy Decision Engine
//!
//! Evaluates attribute-based access requests against a tree of rules,
//! policies and policy sets. Errors met along the way become Indeterminate
//! decisions with a status; only a failing attribute source aborts an
//! evaluation, and the engine facade reports even that as a decision.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combining;
pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod expression;
pub mod function;
pub mod obligation;
pub mod target;
pub mod tree;
pub mod variable;

#[cfg(test)]
pub(crate) mod testing;

pub use combining::{
    CombinerParameter, CombiningAlgorithm, CombiningAlgorithmRegistry, CombiningElement,
    PolicyCombiningAlgorithm, RuleCombiningAlgorithm, TargetedCombinerParameter,
};
pub use context::{
    Attribute, EvaluationContext, PipError, PipFinder, PipRequest, PipResponse, Request, RequestContext,
    RequestSettings, TraceEvent,
};
pub use decision::{Advice, AttributeAssignment, Decision, Effect, EvaluationResult, IdReference, Obligation};
pub use engine::{EngineConfig, PdpEngine};
pub use error::{EvaluationError, EvaluationOutcome, PolicyError};
pub use expression::{
    Apply, AttributeDesignator, AttributeSelector, Expression, ExpressionResult, VariableReference,
};
pub use function::{Arity, FunctionArgument, FunctionDefinition, FunctionRegistry};
pub use obligation::{AdviceExpression, AttributeAssignmentExpression, ObligationExpression};
pub use target::{AllOf, AnyOf, Match, MatchResult, Target};
pub use tree::{Evaluatable, Policy, PolicySet, PolicySetChild, Rule};
pub use variable::{VariableDefinition, VariableMap};
