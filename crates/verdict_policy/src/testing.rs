//! Test helpers shared by the unit tests of this crate.

use crate::combining::{CombiningAlgorithm, CombiningElement};
use crate::context::{EvaluationContext, Request, RequestContext};
use crate::decision::{Decision, EvaluationResult, Obligation};
use crate::error::EvaluationOutcome;
use crate::expression::{Expression, ExpressionResult};
use crate::function::{FunctionArgument, FunctionDefinition, FunctionRegistry};
use crate::target::MatchResult;
use crate::tree::Evaluatable;
use std::sync::Arc;
use verdict_core::{Identifier, Status};

/// Call a function with already evaluated arguments and an empty request
pub(crate) fn call(function: &dyn FunctionDefinition, args: Vec<FunctionArgument>) -> ExpressionResult {
    let request = Request::new();
    let ctx = RequestContext::new(&request);
    function.evaluate(&ctx, &args)
}

/// Wrap a string bag expression in string-one-and-only
pub(crate) fn one_and_only(functions: &FunctionRegistry, bag: Expression) -> Expression {
    functions
        .apply("urn:oasis:names:tc:xacml:1.0:function:string-one-and-only", vec![bag])
        .unwrap()
}

/// Node with a fixed target outcome and a fixed result
#[derive(Debug, Clone)]
pub(crate) struct Fixed {
    id: String,
    matched: MatchResult,
    result: Option<EvaluationResult>,
}

impl Fixed {
    pub(crate) fn new(decision: Decision) -> Self {
        Self::named("fixed", decision)
    }

    pub(crate) fn named(id: &str, decision: Decision) -> Self {
        Self {
            id: id.to_string(),
            matched: MatchResult::Match,
            result: Some(EvaluationResult::new(decision)),
        }
    }

    /// Result carrying a processing error with `message`
    pub(crate) fn failing(decision: Decision, message: &str) -> Self {
        Self {
            id: "failing".to_string(),
            matched: MatchResult::Match,
            result: Some(EvaluationResult::with_status(decision, Status::processing_error(message))),
        }
    }

    /// Node that must never be evaluated
    pub(crate) fn panicking() -> Self {
        Self {
            id: "panicking".to_string(),
            matched: MatchResult::Match,
            result: None,
        }
    }

    pub(crate) fn with_obligation(mut self, id: &str) -> Self {
        if let Some(result) = &mut self.result {
            result.obligations.push(Obligation {
                id: Identifier::new(id),
                attribute_assignments: Vec::new(),
            });
        }
        self
    }

    pub(crate) fn with_match(mut self, matched: MatchResult) -> Self {
        self.matched = matched;
        self
    }
}

impl Evaluatable for Fixed {
    fn combiner_id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Status {
        Status::OK
    }

    fn match_target(&self, _ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult> {
        Ok(self.matched.clone())
    }

    fn evaluate(&self, _ctx: &dyn EvaluationContext) -> EvaluationOutcome<EvaluationResult> {
        match &self.result {
            Some(result) => Ok(result.clone()),
            None => panic!("node {} evaluated after the result was settled", self.id),
        }
    }
}

/// Combine children with the given decisions
pub(crate) fn combine(algorithm: &dyn CombiningAlgorithm<Fixed>, decisions: &[Decision]) -> EvaluationResult {
    combine_fixed(algorithm, decisions.iter().map(|d| Fixed::new(*d)).collect())
}

/// Combine the given children
pub(crate) fn combine_fixed(algorithm: &dyn CombiningAlgorithm<Fixed>, children: Vec<Fixed>) -> EvaluationResult {
    let elements: Vec<CombiningElement<Fixed>> = children
        .into_iter()
        .map(|child| CombiningElement::new(Arc::new(child)))
        .collect();
    let request = Request::new();
    let ctx = RequestContext::new(&request);
    algorithm.combine(&ctx, &elements, &[]).unwrap()
}
