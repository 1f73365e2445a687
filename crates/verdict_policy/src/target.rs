//! Targets: applicability tests of rules, policies and policy sets.
//!
//! A `Target` is a conjunction of `AnyOf`s, an `AnyOf` a disjunction of
//! `AllOf`s and an `AllOf` a conjunction of `Match`es. An empty target
//! matches every request.

use crate::context::EvaluationContext;
use crate::error::EvaluationOutcome;
use crate::expression::{Expression, ExpressionResult};
use crate::function::{FunctionArgument, FunctionDefinition};
use std::sync::Arc;
use verdict_core::{AttributeValue, Status};

/// Outcome of matching a target against a request
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// The target applies
    Match,
    /// The target does not apply
    NoMatch,
    /// Matching failed
    Indeterminate(Status),
}

impl MatchResult {
    /// Check whether the target applies
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Match)
    }
}

/// Comparison of a literal against the values of an attribute
#[derive(Debug, Clone)]
pub struct Match {
    /// Boolean function applied as `function(literal, attribute value)`
    pub function: Arc<dyn FunctionDefinition>,
    /// Literal
    pub value: AttributeValue,
    /// Designator or selector producing the attribute values
    pub expression: Expression,
}

impl Match {
    /// Create a new match
    #[must_use]
    pub fn new(
        function: Arc<dyn FunctionDefinition>,
        value: AttributeValue,
        expression: impl Into<Expression>,
    ) -> Self {
        Self {
            function,
            value,
            expression: expression.into(),
        }
    }

    /// Match if the function holds for some attribute value
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult> {
        let values = match self.expression.evaluate(ctx)? {
            ExpressionResult::Error(status) => return Ok(MatchResult::Indeterminate(status)),
            ExpressionResult::Value(value) => vec![value],
            ExpressionResult::Bag(bag) => bag.into_values(),
        };

        let mut failure = None;
        for value in values {
            let args = [
                FunctionArgument::Value(self.value.clone()),
                FunctionArgument::Value(value),
            ];
            match self.function.evaluate(ctx, &args) {
                ExpressionResult::Value(AttributeValue::Boolean(true)) => return Ok(MatchResult::Match),
                ExpressionResult::Value(AttributeValue::Boolean(false)) => {}
                ExpressionResult::Error(status) => {
                    failure.get_or_insert(status);
                }
                _ => {
                    failure.get_or_insert_with(|| {
                        Status::processing_error(format!(
                            "Match function {} did not return a boolean",
                            self.function.id()
                        ))
                    });
                }
            }
        }
        Ok(failure.map_or(MatchResult::NoMatch, MatchResult::Indeterminate))
    }
}

/// Conjunction of matches
#[derive(Debug, Clone, Default)]
pub struct AllOf {
    /// Matches, all of which must hold
    pub matches: Vec<Match>,
}

impl AllOf {
    /// Create a new conjunction
    #[must_use]
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    /// NoMatch as soon as a match fails; otherwise Indeterminate if a match
    /// errored, else Match
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult> {
        let mut failure = None;
        for m in &self.matches {
            match m.evaluate(ctx)? {
                MatchResult::Match => {}
                MatchResult::NoMatch => return Ok(MatchResult::NoMatch),
                MatchResult::Indeterminate(status) => {
                    failure.get_or_insert(status);
                }
            }
        }
        Ok(failure.map_or(MatchResult::Match, MatchResult::Indeterminate))
    }
}

/// Disjunction of conjunctions
#[derive(Debug, Clone, Default)]
pub struct AnyOf {
    /// Alternatives, one of which must hold
    pub all_of: Vec<AllOf>,
}

impl AnyOf {
    /// Create a new disjunction
    #[must_use]
    pub fn new(all_of: Vec<AllOf>) -> Self {
        Self { all_of }
    }

    /// Match as soon as an alternative matches; otherwise Indeterminate if
    /// one errored, else NoMatch
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult> {
        let mut failure = None;
        for all_of in &self.all_of {
            match all_of.evaluate(ctx)? {
                MatchResult::Match => return Ok(MatchResult::Match),
                MatchResult::NoMatch => {}
                MatchResult::Indeterminate(status) => {
                    failure.get_or_insert(status);
                }
            }
        }
        Ok(failure.map_or(MatchResult::NoMatch, MatchResult::Indeterminate))
    }
}

/// Applicability test of a node
#[derive(Debug, Clone, Default)]
pub struct Target {
    /// Requirements, all of which must hold
    pub any_of: Vec<AnyOf>,
}

impl Target {
    /// Target matching every request
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Create a new target
    #[must_use]
    pub fn new(any_of: Vec<AnyOf>) -> Self {
        Self { any_of }
    }

    /// Target holding a single match
    #[must_use]
    pub fn single(m: Match) -> Self {
        Self::new(vec![AnyOf::new(vec![AllOf::new(vec![m])])])
    }

    /// Check whether the target matches every request
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.any_of.is_empty()
    }

    /// NoMatch as soon as a requirement fails; otherwise Indeterminate if
    /// one errored, else Match
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult> {
        let mut failure = None;
        for any_of in &self.any_of {
            match any_of.evaluate(ctx)? {
                MatchResult::Match => {}
                MatchResult::NoMatch => return Ok(MatchResult::NoMatch),
                MatchResult::Indeterminate(status) => {
                    failure.get_or_insert(status);
                }
            }
        }
        Ok(failure.map_or(MatchResult::Match, MatchResult::Indeterminate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Attribute, Request, RequestContext};
    use crate::expression::AttributeDesignator;
    use crate::function::FunctionRegistry;
    use verdict_core::{DataType, Identifier, StatusCode, xacml};

    const STRING_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:string-equal";
    const INTEGER_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:integer-equal";

    fn function(id: &str) -> Arc<dyn FunctionDefinition> {
        FunctionRegistry::standard().function(&Identifier::new(id)).unwrap()
    }

    fn action_is(action: &str) -> Match {
        Match::new(
            function(STRING_EQUAL),
            AttributeValue::string(action),
            AttributeDesignator::new(xacml::CATEGORY_ACTION, xacml::ATTRIBUTE_ACTION_ID, DataType::String),
        )
    }

    fn subject_required() -> Match {
        Match::new(
            function(STRING_EQUAL),
            AttributeValue::string("alice"),
            AttributeDesignator::new(
                xacml::CATEGORY_ACCESS_SUBJECT,
                xacml::ATTRIBUTE_SUBJECT_ID,
                DataType::String,
            )
            .must_be_present(true),
        )
    }

    fn request(actions: &[&str]) -> Request {
        actions.iter().fold(Request::new(), |request, action| {
            request.with_attribute(Attribute::new(
                xacml::CATEGORY_ACTION,
                xacml::ATTRIBUTE_ACTION_ID,
                AttributeValue::string(*action),
            ))
        })
    }

    fn eval(target: &Target, request: &Request) -> MatchResult {
        let ctx = RequestContext::new(request);
        target.evaluate(&ctx).unwrap()
    }

    #[test]
    fn test_empty_target_matches() {
        assert_eq!(eval(&Target::any(), &Request::new()), MatchResult::Match);
    }

    #[test]
    fn test_match_any_bag_member() {
        let target = Target::single(action_is("write"));
        assert_eq!(eval(&target, &request(&["read", "write"])), MatchResult::Match);
        assert_eq!(eval(&target, &request(&["read"])), MatchResult::NoMatch);
        assert_eq!(eval(&target, &request(&[])), MatchResult::NoMatch);
    }

    #[test]
    fn test_missing_required_attribute_is_indeterminate() {
        let target = Target::single(subject_required());
        let MatchResult::Indeterminate(status) = eval(&target, &request(&["read"])) else {
            panic!("expected indeterminate");
        };
        assert_eq!(status.code, StatusCode::MissingAttribute);
    }

    #[test]
    fn test_function_error_is_indeterminate() {
        let m = Match::new(
            function(INTEGER_EQUAL),
            AttributeValue::integer(1),
            AttributeDesignator::new(xacml::CATEGORY_ACTION, xacml::ATTRIBUTE_ACTION_ID, DataType::String),
        );
        let MatchResult::Indeterminate(status) = eval(&Target::single(m), &request(&["read"])) else {
            panic!("expected indeterminate");
        };
        assert_eq!(status.code, StatusCode::ProcessingError);
    }

    #[test]
    fn test_all_of_no_match_wins_over_error() {
        let all_of = AllOf::new(vec![subject_required(), action_is("delete")]);
        let target = Target::new(vec![AnyOf::new(vec![all_of])]);
        assert_eq!(eval(&target, &request(&["read"])), MatchResult::NoMatch);
    }

    #[test]
    fn test_any_of_match_wins_over_error() {
        let any_of = AnyOf::new(vec![
            AllOf::new(vec![subject_required()]),
            AllOf::new(vec![action_is("read")]),
        ]);
        assert_eq!(eval(&Target::new(vec![any_of]), &request(&["read"])), MatchResult::Match);
    }

    #[test]
    fn test_any_of_error_without_match() {
        let any_of = AnyOf::new(vec![
            AllOf::new(vec![subject_required()]),
            AllOf::new(vec![action_is("write")]),
        ]);
        assert!(matches!(
            eval(&Target::new(vec![any_of]), &request(&["read"])),
            MatchResult::Indeterminate(_)
        ));
    }

    #[test]
    fn test_target_is_conjunction() {
        let target = Target::new(vec![
            AnyOf::new(vec![AllOf::new(vec![action_is("read")])]),
            AnyOf::new(vec![AllOf::new(vec![action_is("write")])]),
        ]);
        assert_eq!(eval(&target, &request(&["read", "write"])), MatchResult::Match);
        assert_eq!(eval(&target, &request(&["read"])), MatchResult::NoMatch);
    }

    #[test]
    fn test_empty_any_of_never_matches() {
        let target = Target::new(vec![AnyOf::default()]);
        assert_eq!(eval(&target, &request(&["read"])), MatchResult::NoMatch);
    }
}
