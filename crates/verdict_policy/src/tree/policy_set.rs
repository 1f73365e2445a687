//! Policy sets: policies and nested sets under a policy-combining algorithm.

use super::{Evaluatable, Policy, PolicySetChild, Validity, target_outcome, trace_match, trace_result};
use crate::combining::{
    CombinerParameter, CombiningElement, PolicyCombiningAlgorithm, TargetedCombinerParameter,
};
use crate::context::EvaluationContext;
use crate::decision::{Decision, EvaluationResult, IdReference};
use crate::error::{EvaluationError, EvaluationOutcome};
use crate::obligation::{AdviceExpression, ObligationExpression, apply_obligations};
use crate::target::{MatchResult, Target};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use verdict_core::{Identifier, Status, Version};

/// Policy set: a target and children combined under a policy-combining algorithm
#[derive(Debug, Clone)]
pub struct PolicySet {
    /// Policy set id
    pub id: Identifier,
    /// Policy set version
    pub version: Version,
    /// Description
    pub description: Option<String>,
    /// Id of the enclosing policy set, used in trace labels
    pub parent_id: Option<String>,
    /// Applicability test
    pub target: Target,
    /// Policy-combining algorithm
    pub combining_algorithm: Option<PolicyCombiningAlgorithm>,
    /// Parameters passed to the algorithm
    pub combiner_parameters: Vec<CombinerParameter>,
    /// Parameters addressed to individual children
    pub child_combiner_parameters: Vec<TargetedCombinerParameter>,
    /// Policies and policy sets, in combining order
    pub children: Vec<Arc<PolicySetChild>>,
    /// Obligation expressions
    pub obligations: Vec<ObligationExpression>,
    /// Advice expressions
    pub advice: Vec<AdviceExpression>,
    validity: Validity,
    elements: OnceCell<Vec<CombiningElement<PolicySetChild>>>,
}

impl PolicySet {
    /// Create an empty policy set
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
            child_combiner_parameters: Vec::new(),
            children: Vec::new(),
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

    /// Set the policy-combining algorithm
    #[must_use]
    pub fn with_combining_algorithm(mut self, algorithm: PolicyCombiningAlgorithm) -> Self {
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

    /// Add a parameter addressed to one child
    #[must_use]
    pub fn with_child_combiner_parameter(mut self, parameter: TargetedCombinerParameter) -> Self {
        self.child_combiner_parameters.push(parameter);
        self.invalidate();
        self
    }

    /// Append a policy
    #[must_use]
    pub fn with_policy(mut self, mut policy: Policy) -> Self {
        policy.set_parent(self.id.as_str());
        self.children.push(Arc::new(PolicySetChild::Policy(policy)));
        self.invalidate();
        self
    }

    /// Append a nested policy set
    #[must_use]
    pub fn with_policy_set(mut self, mut set: PolicySet) -> Self {
        set.parent_id = Some(self.id.to_string());
        self.children.push(Arc::new(PolicySetChild::PolicySet(set)));
        self.invalidate();
        self
    }

    /// Append a child shared with other trees
    #[must_use]
    pub fn with_child(mut self, child: Arc<PolicySetChild>) -> Self {
        self.children.push(child);
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
            return Status::syntax_error("Missing policy combining algorithm");
        }
        Status::OK
    }

    fn elements(&self) -> &[CombiningElement<PolicySetChild>] {
        self.elements.get_or_init(|| {
            self.children
                .iter()
                .map(|child| CombiningElement::with_targeted(Arc::clone(child), &self.child_combiner_parameters))
                .collect()
        })
    }
}

impl Evaluatable for PolicySet {
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
            tracing::debug!(policy_set = %label, "invalid policy set");
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
        let mut result = algorithm.combine(ctx, self.elements(), &self.combiner_parameters)?;
        apply_obligations(ctx, &mut result, &self.obligations, &self.advice)?;

        if result.decision.is_final() && ctx.request().return_policy_id_list {
            result.policy_set_identifiers.push(IdReference {
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
    use crate::context::{Request, RequestContext};
    use crate::decision::Effect;
    use crate::expression::Expression;
    use crate::tree::Rule;
    use verdict_core::{AttributeValue, StatusCode, xacml};

    fn policy_algorithm(version: &str, name: &str) -> PolicyCombiningAlgorithm {
        CombiningAlgorithmRegistry::standard()
            .policy(&xacml::policy_combining_algorithm(version, name))
            .unwrap()
    }

    fn single_rule_policy(id: &str, effect: Effect) -> Policy {
        let algorithm = CombiningAlgorithmRegistry::standard()
            .rule(xacml::RULE_DENY_OVERRIDES)
            .unwrap();
        Policy::new(id)
            .with_combining_algorithm(algorithm)
            .with_rule(Rule::new("r1", effect))
    }

    fn failing_policy(id: &str) -> Policy {
        // no algorithm: evaluates to Indeterminate
        Policy::new(id).with_rule(Rule::new("r1", Effect::Permit))
    }

    #[test]
    fn test_deny_overrides_across_policies() {
        let set = PolicySet::new("urn:example:set")
            .with_combining_algorithm(policy_algorithm("3.0", "deny-overrides"))
            .with_policy(single_rule_policy("urn:example:p1", Effect::Permit))
            .with_policy(failing_policy("urn:example:p2"))
            .with_policy(single_rule_policy("urn:example:p3", Effect::Deny));
        let request = Request::new();
        let result = set.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Deny);
    }

    #[test]
    fn test_legacy_deny_overrides_turns_error_into_deny() {
        let set = PolicySet::new("urn:example:set")
            .with_combining_algorithm(policy_algorithm("1.0", "deny-overrides"))
            .with_policy(single_rule_policy("urn:example:p1", Effect::Permit))
            .with_policy(failing_policy("urn:example:p2"));
        let request = Request::new();
        let result = set.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Deny);
    }

    #[test]
    fn test_identifiers_collected_in_order() {
        let inner = PolicySet::new("urn:example:inner")
            .with_combining_algorithm(policy_algorithm("1.0", "first-applicable"))
            .with_policy(single_rule_policy("urn:example:p2", Effect::Permit));
        let set = PolicySet::new("urn:example:outer")
            .with_combining_algorithm(policy_algorithm("3.0", "permit-unless-deny"))
            .with_policy(single_rule_policy("urn:example:p1", Effect::Permit))
            .with_policy_set(inner);

        let request = Request::new().with_return_policy_id_list(true);
        let result = set.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Permit);
        let policies: Vec<&str> = result.policy_identifiers.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(policies, vec!["urn:example:p1", "urn:example:p2"]);
        let sets: Vec<&str> = result.policy_set_identifiers.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(sets, vec!["urn:example:inner", "urn:example:outer"]);
    }

    #[test]
    fn test_only_one_applicable_with_two_matches() {
        let set = PolicySet::new("urn:example:set")
            .with_combining_algorithm(policy_algorithm("1.0", "only-one-applicable"))
            .with_policy(single_rule_policy("urn:example:p1", Effect::Permit))
            .with_policy(single_rule_policy("urn:example:p2", Effect::Deny));
        let request = Request::new();
        let result = set.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::Indeterminate);
        assert_eq!(result.status.code, StatusCode::SyntaxError);
    }

    #[test]
    fn test_missing_algorithm_is_syntax_error() {
        let set = PolicySet::new("urn:example:set").with_policy(single_rule_policy("urn:example:p1", Effect::Permit));
        assert_eq!(
            set.validate().message.as_deref(),
            Some("Missing policy combining algorithm")
        );
    }

    #[test]
    fn test_child_parameters_targeted_by_id() {
        let set = PolicySet::new("urn:example:set")
            .with_combining_algorithm(policy_algorithm("3.0", "deny-overrides"))
            .with_child_combiner_parameter(TargetedCombinerParameter::new(
                "urn:example:p2",
                CombinerParameter::new("weight", AttributeValue::integer(5)),
            ))
            .with_policy(single_rule_policy("urn:example:p1", Effect::Permit))
            .with_policy(single_rule_policy("urn:example:p2", Effect::Permit));
        let elements = set.elements();
        assert!(elements[0].parameters.is_empty());
        assert_eq!(elements[1].parameters.len(), 1);
    }

    #[test]
    fn test_shared_child_and_trace_label() {
        let shared = Arc::new(PolicySetChild::from(single_rule_policy("urn:example:p1", Effect::Deny)));
        let first = PolicySet::new("urn:example:a")
            .with_combining_algorithm(policy_algorithm("1.0", "first-applicable"))
            .with_child(Arc::clone(&shared));
        let second = PolicySet::new("urn:example:b")
            .with_combining_algorithm(policy_algorithm("1.0", "first-applicable"))
            .with_child(shared);

        let request = Request::new();
        let ctx = RequestContext::new(&request).with_tracing(true);
        assert_eq!(first.evaluate(&ctx).unwrap().decision, Decision::Deny);
        assert_eq!(second.evaluate(&ctx).unwrap().decision, Decision::Deny);
        let events = ctx.take_events();
        assert_eq!(events.last().map(|e| e.node.as_str()), Some("urn:example:b"));
    }

    #[test]
    fn test_condition_false_everywhere_is_not_applicable() {
        let algorithm = CombiningAlgorithmRegistry::standard()
            .rule(xacml::RULE_DENY_OVERRIDES)
            .unwrap();
        let policy = Policy::new("urn:example:p1")
            .with_combining_algorithm(algorithm)
            .with_rule(Rule::new("r1", Effect::Permit).with_condition(Expression::boolean(false)));
        let set = PolicySet::new("urn:example:set")
            .with_combining_algorithm(policy_algorithm("3.0", "deny-overrides"))
            .with_policy(policy);
        let request = Request::new();
        let result = set.evaluate(&RequestContext::new(&request)).unwrap();
        assert_eq!(result.decision, Decision::NotApplicable);
    }
}
