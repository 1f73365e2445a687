//! Rules: the leaves of the decision tree.

use super::{Evaluatable, Validity, target_outcome, trace_match, trace_result};
use crate::context::EvaluationContext;
use crate::decision::{Effect, EvaluationResult};
use crate::error::EvaluationOutcome;
use crate::expression::{Expression, ExpressionResult};
use crate::obligation::{AdviceExpression, ObligationExpression, apply_obligations};
use crate::target::{MatchResult, Target};
use verdict_core::{AttributeValue, DataType, Status};

/// Rule: a target, an optional condition and the effect they lead to
#[derive(Debug, Clone)]
pub struct Rule {
    /// Rule id, unique within its policy
    pub id: String,
    /// Effect produced when the rule applies
    pub effect: Effect,
    /// Description
    pub description: Option<String>,
    /// Id of the enclosing policy, used in trace labels
    pub parent_id: Option<String>,
    /// Applicability test
    pub target: Target,
    /// Boolean condition; absent means true
    pub condition: Option<Expression>,
    /// Obligation expressions
    pub obligations: Vec<ObligationExpression>,
    /// Advice expressions
    pub advice: Vec<AdviceExpression>,
    validity: Validity,
}

impl Rule {
    /// Create a rule that applies to every request
    #[must_use]
    pub fn new(id: impl Into<String>, effect: Effect) -> Self {
        Self {
            id: id.into(),
            effect,
            description: None,
            parent_id: None,
            target: Target::any(),
            condition: None,
            obligations: Vec::new(),
            advice: Vec::new(),
            validity: Validity::default(),
        }
    }

    /// Set the target
    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self.validity.reset();
        self
    }

    /// Set the condition
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<Expression>) -> Self {
        self.condition = Some(condition.into());
        self.validity.reset();
        self
    }

    /// Add an obligation expression
    #[must_use]
    pub fn with_obligation(mut self, obligation: ObligationExpression) -> Self {
        self.obligations.push(obligation);
        self
    }

    /// Add an advice expression
    #[must_use]
    pub fn with_advice(mut self, advice: AdviceExpression) -> Self {
        self.advice.push(advice);
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Force the validation verdict
    pub fn set_status(&mut self, status: Status) {
        self.validity.set(status);
    }

    /// Drop the cached validation verdict
    pub fn reset_status(&mut self) {
        self.validity.reset();
    }

    /// Variable ids referenced by the condition
    #[must_use]
    pub fn variable_references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(condition) = &self.condition {
            condition.variable_references(&mut out);
        }
        out
    }

    pub(crate) fn set_parent(&mut self, parent_id: &str) {
        self.parent_id = Some(parent_id.to_string());
    }

    fn label(&self) -> String {
        match &self.parent_id {
            Some(parent) => format!("{}/{}", parent, self.id),
            None => self.id.clone(),
        }
    }

    fn check(&self) -> Status {
        if self.id.is_empty() {
            return Status::syntax_error("Missing rule id");
        }
        match self.condition.as_ref().and_then(Expression::static_type) {
            Some((DataType::Boolean, false)) | None => Status::OK,
            Some((data_type, bag)) => Status::syntax_error(format!(
                "Condition of rule {} must be a boolean, found {}{}",
                self.id,
                data_type.short_name(),
                if bag { " bag" } else { "" }
            )),
        }
    }

    fn evaluate_condition(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<EvaluationResult> {
        let Some(condition) = &self.condition else {
            return Ok(EvaluationResult::new(self.effect.decision()));
        };
        let result = match condition.evaluate(ctx)? {
            ExpressionResult::Value(AttributeValue::Boolean(true)) => {
                EvaluationResult::new(self.effect.decision())
            }
            ExpressionResult::Value(AttributeValue::Boolean(false)) => EvaluationResult::not_applicable(),
            ExpressionResult::Error(status) => EvaluationResult::with_status(self.effect.indeterminate(), status),
            _ => EvaluationResult::with_status(
                self.effect.indeterminate(),
                Status::processing_error(format!("Condition of rule {} did not return a boolean", self.id)),
            ),
        };
        Ok(result)
    }
}

impl Evaluatable for Rule {
    fn combiner_id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Status {
        self.validity.get_or_check(|| self.check())
    }

    fn match_target(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<MatchResult> {
        self.target.evaluate(ctx)
    }

    fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<EvaluationResult> {
        let label = self.label();
        let status = self.validate();
        if !status.is_ok() {
            tracing::debug!(rule = %label, "invalid rule");
            let result = EvaluationResult::indeterminate(status);
            trace_result(ctx, &label, &result);
            return Ok(result);
        }

        let matched = self.match_target(ctx)?;
        trace_match(ctx, &label, &matched);
        let mut result = match target_outcome(matched, self.effect.indeterminate()) {
            Some(early) => early,
            None => self.evaluate_condition(ctx)?,
        };
        apply_obligations(ctx, &mut result, &self.obligations, &self.advice)?;
        trace_result(ctx, &label, &result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Attribute, Request, RequestContext};
    use crate::decision::Decision;
    use crate::expression::AttributeDesignator;
    use crate::function::FunctionRegistry;
    use crate::obligation::AttributeAssignmentExpression;
    use crate::target::Match;
    use verdict_core::{StatusCode, xacml};

    const STRING_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:string-equal";
    const INTEGER_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:integer-equal";

    fn subject_id() -> AttributeDesignator {
        AttributeDesignator::new(
            xacml::CATEGORY_ACCESS_SUBJECT,
            xacml::ATTRIBUTE_SUBJECT_ID,
            DataType::String,
        )
    }

    fn alice() -> Request {
        Request::new().with_attribute(Attribute::new(
            xacml::CATEGORY_ACCESS_SUBJECT,
            xacml::ATTRIBUTE_SUBJECT_ID,
            AttributeValue::string("alice"),
        ))
    }

    fn subject_target(functions: &FunctionRegistry, name: &str) -> Target {
        let equal = functions
            .function(&verdict_core::Identifier::new(STRING_EQUAL))
            .unwrap();
        Target::single(Match::new(equal, AttributeValue::string(name), subject_id()))
    }

    #[test]
    fn test_condition_drives_decision() {
        let request = Request::new();
        let ctx = RequestContext::new(&request);

        let rule = Rule::new("r1", Effect::Permit);
        assert_eq!(rule.evaluate(&ctx).unwrap().decision, Decision::Permit);

        let rule = Rule::new("r2", Effect::Deny).with_condition(Expression::boolean(true));
        assert_eq!(rule.evaluate(&ctx).unwrap().decision, Decision::Deny);

        let rule = Rule::new("r3", Effect::Deny).with_condition(Expression::boolean(false));
        assert_eq!(rule.evaluate(&ctx).unwrap().decision, Decision::NotApplicable);
    }

    #[test]
    fn test_target_selects_rule() {
        let functions = FunctionRegistry::standard();
        let request = alice();
        let ctx = RequestContext::new(&request);

        let rule = Rule::new("r1", Effect::Permit).with_target(subject_target(&functions, "alice"));
        assert_eq!(rule.evaluate(&ctx).unwrap().decision, Decision::Permit);

        let rule = Rule::new("r2", Effect::Permit).with_target(subject_target(&functions, "bob"));
        assert_eq!(rule.evaluate(&ctx).unwrap().decision, Decision::NotApplicable);
    }

    #[test]
    fn test_type_mismatch_is_indeterminate_of_effect() {
        let functions = FunctionRegistry::standard();
        let condition = functions
            .apply(
                INTEGER_EQUAL,
                vec![
                    Expression::Value(AttributeValue::string("1")),
                    Expression::Value(AttributeValue::integer(1)),
                ],
            )
            .unwrap();
        let rule = Rule::new("r1", Effect::Deny).with_condition(condition);
        let request = Request::new();
        let result = rule.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::IndeterminateDeny);
        assert_eq!(result.status.code, StatusCode::ProcessingError);
    }

    #[test]
    fn test_missing_attribute_is_indeterminate_of_effect() {
        let functions = FunctionRegistry::standard();
        let one_and_only = functions
            .apply(
                "urn:oasis:names:tc:xacml:1.0:function:string-one-and-only",
                vec![subject_id().must_be_present(true).into()],
            )
            .unwrap();
        let condition = functions
            .apply(STRING_EQUAL, vec![one_and_only, AttributeValue::string("alice").into()])
            .unwrap();
        let rule = Rule::new("r1", Effect::Permit).with_condition(condition);
        let request = Request::new();
        let result = rule.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::IndeterminatePermit);
        assert_eq!(result.status.code, StatusCode::MissingAttribute);

        let request = alice();
        let result = rule.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Permit);
    }

    #[test]
    fn test_non_boolean_condition_rejected() {
        let rule = Rule::new("r1", Effect::Permit).with_condition(AttributeValue::integer(3));
        let status = rule.validate();
        assert_eq!(status.code, StatusCode::SyntaxError);

        let request = Request::new();
        let result = rule.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Indeterminate);
        assert_eq!(result.status, status);
    }

    #[test]
    fn test_missing_id_invalid() {
        let rule = Rule::new("", Effect::Permit);
        assert_eq!(rule.validate().message.as_deref(), Some("Missing rule id"));
    }

    #[test]
    fn test_status_override_and_reset() {
        let mut rule = Rule::new("r1", Effect::Permit);
        rule.set_status(Status::syntax_error("disabled"));
        let request = Request::new();
        let ctx = RequestContext::new(&request);
        assert_eq!(rule.evaluate(&ctx).unwrap().decision, Decision::Indeterminate);

        rule.reset_status();
        assert_eq!(rule.evaluate(&ctx).unwrap().decision, Decision::Permit);
    }

    #[test]
    fn test_obligations_follow_effect() {
        let rule = Rule::new("r1", Effect::Permit)
            .with_obligation(
                ObligationExpression::new("urn:example:obligation:audit", Effect::Permit).with_assignment(
                    AttributeAssignmentExpression::new("urn:example:attribute:who", subject_id()),
                ),
            )
            .with_advice(AdviceExpression::new("urn:example:advice:warn", Effect::Deny));
        let request = alice();
        let result = rule.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Permit);
        assert_eq!(result.obligations.len(), 1);
        assert_eq!(
            result.obligations[0].attribute_assignments[0].value,
            AttributeValue::string("alice")
        );
        assert!(result.advice.is_empty());
    }

    #[test]
    fn test_trace_events_labelled_with_parent() {
        let mut rule = Rule::new("r1", Effect::Permit);
        rule.set_parent("urn:example:policy");
        let request = Request::new();
        let ctx = RequestContext::new(&request).with_tracing(true);
        rule.evaluate(&ctx).unwrap();
        let events = ctx.take_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].label, "Match");
        assert_eq!(events[1].node, "urn:example:policy/r1");
        assert_eq!(events[1].message, "Permit");
    }
}
