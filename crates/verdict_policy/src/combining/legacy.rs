//! XACML 1.x overrides algorithms, kept for policies that still name them.

use super::{CombinerParameter, CombiningAlgorithm, CombiningElement, FirstFailure};
use crate::context::EvaluationContext;
use crate::decision::{Decision, Effect, EvaluationResult};
use crate::error::EvaluationOutcome;
use crate::tree::Evaluatable;
use verdict_core::Identifier;

/// Legacy rule-combining overrides
///
/// An error that might have produced the overriding effect makes the whole
/// result Indeterminate, even when other rules produced the other effect.
#[derive(Debug, Clone)]
pub struct LegacyOverridesRule {
    id: Identifier,
    overriding: Effect,
}

impl LegacyOverridesRule {
    /// Create the algorithm registered under `id`
    #[must_use]
    pub fn new(id: impl Into<Identifier>, overriding: Effect) -> Self {
        Self {
            id: id.into(),
            overriding,
        }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for LegacyOverridesRule {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        ctx: &dyn EvaluationContext,
        elements: &[CombiningElement<T>],
        _parameters: &[CombinerParameter],
    ) -> EvaluationOutcome<EvaluationResult> {
        let over = self.overriding;
        let other = over.opposite();

        let mut combined = EvaluationResult::new(other.decision());
        let mut at_least_one_other = false;
        let mut potential_override = false;
        let mut at_least_one_error = false;
        let mut failure = FirstFailure::default();

        for element in elements {
            let result = element.evaluate(ctx)?;
            match result.decision {
                Decision::NotApplicable => {}
                d if d == over.decision() => return Ok(result),
                d if d == other.decision() => {
                    at_least_one_other = true;
                    combined.merge(result);
                }
                d if d == other.indeterminate() => {
                    at_least_one_error = true;
                    failure.record(&result);
                }
                _ => {
                    potential_override = true;
                    failure.record(&result);
                }
            }
        }

        let result = if potential_override {
            failure.into_result(Decision::Indeterminate)
        } else if at_least_one_other {
            combined
        } else if at_least_one_error {
            failure.into_result(Decision::Indeterminate)
        } else {
            EvaluationResult::not_applicable()
        };
        Ok(result)
    }
}

/// Legacy policy-combining deny-overrides
///
/// Any error collapses to Deny with OK status.
#[derive(Debug, Clone)]
pub struct LegacyDenyOverridesPolicy {
    id: Identifier,
}

impl LegacyDenyOverridesPolicy {
    /// Create the algorithm registered under `id`
    #[must_use]
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for LegacyDenyOverridesPolicy {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        ctx: &dyn EvaluationContext,
        elements: &[CombiningElement<T>],
        _parameters: &[CombinerParameter],
    ) -> EvaluationOutcome<EvaluationResult> {
        let mut combined = EvaluationResult::new(Decision::Permit);
        let mut at_least_one_permit = false;

        for element in elements {
            let result = element.evaluate(ctx)?;
            match result.decision {
                Decision::Deny => return Ok(result),
                Decision::Permit => {
                    at_least_one_permit = true;
                    combined.merge(result);
                }
                Decision::NotApplicable => {}
                _ => {
                    tracing::debug!(status = %result.status, "error folded into deny");
                    return Ok(EvaluationResult::new(Decision::Deny));
                }
            }
        }

        Ok(if at_least_one_permit {
            combined
        } else {
            EvaluationResult::not_applicable()
        })
    }
}

/// Legacy policy-combining permit-overrides
///
/// Permit wins outright. Otherwise the merged Deny wins over errors, and
/// the merged errors win over NotApplicable.
#[derive(Debug, Clone)]
pub struct LegacyPermitOverridesPolicy {
    id: Identifier,
}

impl LegacyPermitOverridesPolicy {
    /// Create the algorithm registered under `id`
    #[must_use]
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for LegacyPermitOverridesPolicy {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        ctx: &dyn EvaluationContext,
        elements: &[CombiningElement<T>],
        _parameters: &[CombinerParameter],
    ) -> EvaluationOutcome<EvaluationResult> {
        let mut combined = EvaluationResult::new(Decision::Deny);
        let mut at_least_one_deny = false;
        let mut indeterminate: Option<EvaluationResult> = None;

        for element in elements {
            let result = element.evaluate(ctx)?;
            match result.decision {
                Decision::Permit => return Ok(result),
                Decision::Deny => {
                    at_least_one_deny = true;
                    combined.merge(result);
                }
                Decision::NotApplicable => {}
                _ => match indeterminate.as_mut() {
                    Some(first) => first.merge(result),
                    None => indeterminate = Some(result),
                },
            }
        }

        Ok(if at_least_one_deny {
            combined
        } else {
            indeterminate.unwrap_or_else(EvaluationResult::not_applicable)
        })
    }
}
