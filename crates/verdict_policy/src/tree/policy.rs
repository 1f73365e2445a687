//! Policies: rules combined under a rule-combining algorithm.

use super::{Evaluatable, Rule, Validity, target_outcome, trace_match, trace_result};
use crate::combining::{
    CombinerParameter, CombiningElement, RuleCombiningAlgorithm, TargetedCombinerParameter,
};
use crate::context::EvaluationContext;
use crate::decision::{Decision, EvaluationResult, IdReference};
use crate::error::{EvaluationError, EvaluationOutcome};
use crate::obligation::{AdviceExpression, ObligationExpression, apply_obligations};
use crate::target::{MatchResult, Target};
use crate::variable::{VariableDefinition, VariableMap, VariableScope};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use verdict_core::{Identifier, Status, Version};

/// Policy: a target, variables, rules and the algorithm combining them
#[derive(Debug, Clone)]
pub struct Policy {
    /// Policy id
    pub id: Identifier,
    /// Policy version
    pub version: Version,
    /// Description
    pub description: Option<String>,
    /// Id of the enclosing policy set, used in trace labels
    pub parent_id: Option<String>,
    /// Applicability test
    pub target: Target,
    /// Rule-combining algorithm
    pub combining_algorithm: Option<RuleCombiningAlgorithm>,
    /// Parameters passed to the algorithm
    pub combiner_parameters: Vec<CombinerParameter>,
    /// Parameters addressed to individual rules
    pub rule_combiner_parameters: Vec<TargetedCombinerParameter>,
    /// Variable definitions visible to the rules
    pub variables: VariableMap,
    /// Rules, in combining order
    pub rules: Vec<Arc<Rule>>,
    /// Obligation expressions
    pub obligations: Vec<ObligationExpression>,
    /// Advice expressions
    pub advice: Vec<AdviceExpression>,
    validity: Validity,
    elements: OnceCell<Vec<CombiningElement<Rule>>>,
}

impl Policy {
    /// Create an empty policy
    #[must_use]
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self {
            id: id.into(),
            version: Version::default(),
            description: None,
            parent_id: None,
            target: Target::any(),
            combining_algorithm: None,
            combiner_parameters: Vec::new(),
            rule_combiner_parameters: Vec::new(),
            variables: VariableMap::new(),
            rules: Vec::new(),
            obligations: Vec::new(),
            advice: Vec::new(),
            validity: Validity::default(),
            elements: OnceCell::new(),
        }
    }

    /// Set the version
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the target
    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Set the rule-combining algorithm
    #[must_use]
    pub fn with_combining_algorithm(mut self, algorithm: RuleCombiningAlgorithm) -> Self {
        self.combining_algorithm = Some(algorithm);
        self.invalidate();
        self
    }

    /// Add a parameter for the algorithm
    #[must_use]
    pub fn with_combiner_parameter(mut self, parameter: CombinerParameter) -> Self {
        self.combiner_parameters.push(parameter);
        self
    }

    /// Add a parameter addressed to one rule
    #[must_use]
    pub fn with_rule_combiner_parameter(mut self, parameter: TargetedCombinerParameter) -> Self {
        self.rule_combiner_parameters.push(parameter);
        self.invalidate();
        self
    }

    /// Add a variable definition
    #[must_use]
    pub fn with_variable(mut self, variable: VariableDefinition) -> Self {
        self.variables.insert(variable.id.clone(), Arc::new(variable));
        self.invalidate();
        self
    }

    /// Append a rule
    #[must_use]
    pub fn with_rule(mut self, mut rule: Rule) -> Self {
        rule.set_parent(self.id.as_str());
        self.rules.push(Arc::new(rule));
        self.invalidate();
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

    /// Force the validation verdict
    pub fn set_status(&mut self, status: Status) {
        self.validity.set(status);
    }

    /// Drop the cached validation verdict
    pub fn reset_status(&mut self) {
        self.validity.reset();
    }

    pub(crate) fn set_parent(&mut self, parent_id: &str) {
        self.parent_id = Some(parent_id.to_string());
    }

    fn invalidate(&mut self) {
        self.validity.reset();
        self.elements = OnceCell::new();
    }

    fn label(&self) -> String {
        match &self.parent_id {
            Some(parent) => format!("{}/{}", parent, self.id),
            None => self.id.to_string(),
        }
    }

    fn check(&self) -> Status {
        if self.combining_algorithm.is_none() {
            return Status::syntax_error("Missing rule combining algorithm");
        }

        let mut references = Vec::new();
        for rule in &self.rules {
            references.extend(rule.variable_references());
        }
        for variable in self.variables.values() {
            variable.expression.variable_references(&mut references);
        }
        match references.iter().find(|id| !self.variables.contains_key(**id)) {
            Some(missing) => Status::syntax_error(format!(
                "Undefined variable {} in policy {}",
                missing, self.id
            )),
            None => Status::OK,
        }
    }

    fn elements(&self) -> &[CombiningElement<Rule>] {
        self.elements.get_or_init(|| {
            self.rules
                .iter()
                .map(|rule| CombiningElement::with_targeted(Arc::clone(rule), &self.rule_combiner_parameters))
                .collect()
        })
    }
}

impl Evaluatable for Policy {
    fn combiner_id(&self) -> &str {
        self.id.as_str()
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
            tracing::debug!(policy = %label, "invalid policy");
            let result = EvaluationResult::indeterminate(status);
            trace_result(ctx, &label, &result);
            return Ok(result);
        }

        let matched = self.match_target(ctx)?;
        trace_match(ctx, &label, &matched);
        if let Some(early) = target_outcome(matched, Decision::Indeterminate) {
            trace_result(ctx, &label, &early);
            return Ok(early);
        }

        let algorithm = self
            .combining_algorithm
            .as_ref()
            .ok_or_else(|| EvaluationError::MissingCombiningAlgorithm { node: label.clone() })?;
        let scope = VariableScope::new(ctx, &self.variables);
        let mut result = algorithm.combine(&scope, self.elements(), &self.combiner_parameters)?;
        apply_obligations(&scope, &mut result, &self.obligations, &self.advice)?;

        if result.decision.is_final() && ctx.request().return_policy_id_list {
            result.policy_identifiers.push(IdReference {
                id: self.id.clone(),
                version: self.version.clone(),
            });
        }
        trace_result(ctx, &label, &result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::CombiningAlgorithmRegistry;
    use crate::context::{Attribute, Request, RequestContext};
    use crate::decision::Effect;
    use crate::expression::{AttributeDesignator, Expression, VariableReference};
    use crate::function::FunctionRegistry;
    use verdict_core::{AttributeValue, DataType, StatusCode, xacml};

    const STRING_EQUAL: &str = "urn:oasis:names:tc:xacml:1.0:function:string-equal";
    const STRING_ONE_AND_ONLY: &str = "urn:oasis:names:tc:xacml:1.0:function:string-one-and-only";

    fn rule_algorithm(name: &str) -> RuleCombiningAlgorithm {
        CombiningAlgorithmRegistry::standard()
            .rule(&xacml::rule_combining_algorithm("3.0", name))
            .unwrap()
    }

    fn required_subject_is(functions: &FunctionRegistry, name: &str) -> Expression {
        let subject = AttributeDesignator::new(
            xacml::CATEGORY_ACCESS_SUBJECT,
            xacml::ATTRIBUTE_SUBJECT_ID,
            DataType::String,
        )
        .must_be_present(true);
        let single = functions.apply(STRING_ONE_AND_ONLY, vec![subject.into()]).unwrap();
        functions
            .apply(STRING_EQUAL, vec![single, AttributeValue::string(name).into()])
            .unwrap()
    }

    fn two_rule_policy(algorithm: &str, deny_condition: Expression) -> Policy {
        Policy::new("urn:example:policy:two-rules")
            .with_combining_algorithm(rule_algorithm(algorithm))
            .with_rule(Rule::new("rule1", Effect::Permit).with_condition(Expression::boolean(true)))
            .with_rule(Rule::new("rule2", Effect::Deny).with_condition(deny_condition))
    }

    #[test]
    fn test_permit_rule_wins_when_deny_rule_not_applicable() {
        let policy = two_rule_policy("deny-overrides", Expression::boolean(false));
        let request = Request::new();
        let result = policy.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Permit);
    }

    #[test]
    fn test_missing_attribute_under_deny_overrides() {
        let functions = FunctionRegistry::standard();
        let policy = two_rule_policy("deny-overrides", required_subject_is(&functions, "mallory"));
        let request = Request::new();
        let ctx = RequestContext::new(&request);

        let rule2 = &policy.rules[1];
        assert_eq!(rule2.evaluate(&ctx).unwrap().decision, Decision::IndeterminateDeny);

        let result = policy.evaluate(&ctx).unwrap();
        assert_eq!(result.decision, Decision::IndeterminateDenyPermit);
        assert_eq!(result.status.code, StatusCode::MissingAttribute);
    }

    #[test]
    fn test_missing_attribute_under_permit_unless_deny() {
        let functions = FunctionRegistry::standard();
        let policy = two_rule_policy("permit-unless-deny", required_subject_is(&functions, "mallory"));
        let request = Request::new();
        let result = policy.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Permit);
    }

    #[test]
    fn test_missing_algorithm_is_syntax_error() {
        let policy = Policy::new("urn:example:policy:broken").with_rule(Rule::new("r1", Effect::Permit));
        let request = Request::new();
        let result = policy.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Indeterminate);
        assert_eq!(result.status.code, StatusCode::SyntaxError);
        assert_eq!(result.status.message.as_deref(), Some("Missing rule combining algorithm"));
    }

    #[test]
    fn test_variables_resolved_through_policy() {
        let policy = Policy::new("urn:example:policy:vars")
            .with_combining_algorithm(rule_algorithm("deny-overrides"))
            .with_variable(VariableDefinition::new("always", Expression::boolean(true)))
            .with_rule(
                Rule::new("r1", Effect::Deny).with_condition(Expression::Variable(VariableReference::new("always"))),
            );
        assert!(policy.validate().is_ok());
        let request = Request::new();
        let result = policy.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Deny);
    }

    #[test]
    fn test_undefined_variable_invalid() {
        let policy = Policy::new("urn:example:policy:vars")
            .with_combining_algorithm(rule_algorithm("deny-overrides"))
            .with_rule(
                Rule::new("r1", Effect::Deny).with_condition(Expression::Variable(VariableReference::new("nope"))),
            );
        let status = policy.validate();
        assert_eq!(status.code, StatusCode::SyntaxError);
        assert!(status.message.unwrap_or_default().contains("nope"));
    }

    #[test]
    fn test_policy_identifier_returned_on_request() {
        let policy = Policy::new("urn:example:policy:ids")
            .with_version(Version::parse("2.1").unwrap())
            .with_combining_algorithm(rule_algorithm("deny-overrides"))
            .with_rule(Rule::new("r1", Effect::Permit));

        let request = Request::new();
        let result = policy.evaluate(&RequestContext::new(&request)).unwrap();
        assert!(result.policy_identifiers.is_empty());

        let request = Request::new().with_return_policy_id_list(true);
        let result = policy.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.policy_identifiers.len(), 1);
        assert_eq!(result.policy_identifiers[0].id.as_str(), "urn:example:policy:ids");
        assert_eq!(result.policy_identifiers[0].version.to_string(), "2.1");
    }

    #[test]
    fn test_not_applicable_carries_no_identifier() {
        let policy = Policy::new("urn:example:policy:empty").with_combining_algorithm(rule_algorithm("deny-overrides"));
        let request = Request::new().with_return_policy_id_list(true);
        let result = policy.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::NotApplicable);
        assert!(result.policy_identifiers.is_empty());
    }

    #[test]
    fn test_target_mismatch_skips_rules() {
        let functions = FunctionRegistry::standard();
        let equal = functions.function(&Identifier::new(STRING_EQUAL)).unwrap();
        let target = Target::single(crate::target::Match::new(
            equal,
            AttributeValue::string("bob"),
            AttributeDesignator::new(
                xacml::CATEGORY_ACCESS_SUBJECT,
                xacml::ATTRIBUTE_SUBJECT_ID,
                DataType::String,
            ),
        ));
        let policy = Policy::new("urn:example:policy:bob")
            .with_target(target)
            .with_combining_algorithm(rule_algorithm("deny-overrides"))
            .with_rule(Rule::new("r1", Effect::Permit));
        let request = Request::new().with_attribute(Attribute::new(
            xacml::CATEGORY_ACCESS_SUBJECT,
            xacml::ATTRIBUTE_SUBJECT_ID,
            AttributeValue::string("alice"),
        ));
        let ctx = RequestContext::new(&request).with_tracing(true);
        let result = policy.evaluate(&ctx).unwrap();
        assert_eq!(result.decision, Decision::NotApplicable);
        let events = ctx.take_events();
        assert_eq!(events[0].message, "NoMatch");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_rules_know_their_policy() {
        let policy = two_rule_policy("deny-overrides", Expression::boolean(false));
        assert_eq!(policy.rules[0].parent_id.as_deref(), Some("urn:example:policy:two-rules"));
    }
}
