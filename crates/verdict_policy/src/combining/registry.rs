//! Registry of rule- and policy-combining algorithms.

use super::{
    CombiningAlgorithm, FirstApplicable, LegacyDenyOverridesPolicy, LegacyOverridesRule,
    LegacyPermitOverridesPolicy, OnlyOneApplicable, Overrides, Unless,
};
use crate::decision::Effect;
use crate::error::PolicyError;
use crate::tree::{PolicySetChild, Rule};
use indexmap::IndexMap;
use std::sync::Arc;
use verdict_core::Identifier;
use verdict_core::xacml::{policy_combining_algorithm, rule_combining_algorithm};

/// Rule-combining algorithm
pub type RuleCombiningAlgorithm = Arc<dyn CombiningAlgorithm<Rule>>;

/// Policy-combining algorithm
pub type PolicyCombiningAlgorithm = Arc<dyn CombiningAlgorithm<PolicySetChild>>;

/// Combining algorithms by id, rule and policy families kept apart
#[derive(Debug, Clone, Default)]
pub struct CombiningAlgorithmRegistry {
    rule: IndexMap<Identifier, RuleCombiningAlgorithm>,
    policy: IndexMap<Identifier, PolicyCombiningAlgorithm>,
}

impl CombiningAlgorithmRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard algorithms
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();

        for (version, prefix) in [("3.0", ""), ("3.0", "ordered-")] {
            for (name, overriding) in [("deny-overrides", Effect::Deny), ("permit-overrides", Effect::Permit)] {
                let name = format!("{}{}", prefix, name);
                registry.insert_rule(Arc::new(Overrides::new(
                    rule_combining_algorithm(version, &name).as_str(),
                    overriding,
                )));
                registry.insert_policy(Arc::new(Overrides::new(
                    policy_combining_algorithm(version, &name).as_str(),
                    overriding,
                )));
            }
        }

        for (name, overriding) in [("deny-unless-permit", Effect::Permit), ("permit-unless-deny", Effect::Deny)] {
            registry.insert_rule(Arc::new(Unless::new(
                rule_combining_algorithm("3.0", name).as_str(),
                overriding,
            )));
            registry.insert_policy(Arc::new(Unless::new(
                policy_combining_algorithm("3.0", name).as_str(),
                overriding,
            )));
        }

        registry.insert_rule(Arc::new(FirstApplicable::new(
            rule_combining_algorithm("1.0", "first-applicable").as_str(),
        )));
        registry.insert_policy(Arc::new(FirstApplicable::new(
            policy_combining_algorithm("1.0", "first-applicable").as_str(),
        )));
        registry.insert_policy(Arc::new(OnlyOneApplicable::new(
            policy_combining_algorithm("1.0", "only-one-applicable").as_str(),
        )));

        for (version, prefix) in [("1.0", ""), ("1.1", "ordered-")] {
            let deny = format!("{}deny-overrides", prefix);
            let permit = format!("{}permit-overrides", prefix);
            registry.insert_rule(Arc::new(LegacyOverridesRule::new(
                rule_combining_algorithm(version, &deny).as_str(),
                Effect::Deny,
            )));
            registry.insert_rule(Arc::new(LegacyOverridesRule::new(
                rule_combining_algorithm(version, &permit).as_str(),
                Effect::Permit,
            )));
            registry.insert_policy(Arc::new(LegacyDenyOverridesPolicy::new(
                policy_combining_algorithm(version, &deny).as_str(),
            )));
            registry.insert_policy(Arc::new(LegacyPermitOverridesPolicy::new(
                policy_combining_algorithm(version, &permit).as_str(),
            )));
        }

        registry
    }

    fn insert_rule(&mut self, algorithm: RuleCombiningAlgorithm) {
        self.rule.insert(algorithm.id().clone(), algorithm);
    }

    fn insert_policy(&mut self, algorithm: PolicyCombiningAlgorithm) {
        self.policy.insert(algorithm.id().clone(), algorithm);
    }

    /// Register a rule-combining algorithm
    ///
    /// # Errors
    ///
    /// Returns error if an algorithm with the same id is already registered
    pub fn register_rule(&mut self, algorithm: RuleCombiningAlgorithm) -> Result<(), PolicyError> {
        if self.rule.contains_key(algorithm.id()) {
            return Err(PolicyError::DuplicateAlgorithm(algorithm.id().clone()));
        }
        tracing::debug!(algorithm = %algorithm.id(), "registered rule-combining algorithm");
        self.insert_rule(algorithm);
        Ok(())
    }

    /// Register a policy-combining algorithm
    ///
    /// # Errors
    ///
    /// Returns error if an algorithm with the same id is already registered
    pub fn register_policy(&mut self, algorithm: PolicyCombiningAlgorithm) -> Result<(), PolicyError> {
        if self.policy.contains_key(algorithm.id()) {
            return Err(PolicyError::DuplicateAlgorithm(algorithm.id().clone()));
        }
        tracing::debug!(algorithm = %algorithm.id(), "registered policy-combining algorithm");
        self.insert_policy(algorithm);
        Ok(())
    }

    /// Look up a rule-combining algorithm
    ///
    /// # Errors
    ///
    /// Returns error if no rule-combining algorithm has this id
    pub fn rule(&self, id: &str) -> Result<RuleCombiningAlgorithm, PolicyError> {
        let id = Identifier::new(id);
        self.rule
            .get(&id)
            .cloned()
            .ok_or(PolicyError::UnknownAlgorithm(id))
    }

    /// Look up a policy-combining algorithm
    ///
    /// # Errors
    ///
    /// Returns error if no policy-combining algorithm has this id
    pub fn policy(&self, id: &str) -> Result<PolicyCombiningAlgorithm, PolicyError> {
        let id = Identifier::new(id);
        self.policy
            .get(&id)
            .cloned()
            .ok_or(PolicyError::UnknownAlgorithm(id))
    }

    /// Number of rule-combining algorithms
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rule.len()
    }

    /// Number of policy-combining algorithms
    #[must_use]
    pub fn policy_count(&self) -> usize {
        self.policy.len()
    }
}
