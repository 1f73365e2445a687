//! deny-unless-permit and permit-unless-deny.

use super::{CombinerParameter, CombiningAlgorithm, CombiningElement};
use crate::context::EvaluationContext;
use crate::decision::{Effect, EvaluationResult};
use crate::error::EvaluationOutcome;
use crate::tree::Evaluatable;
use verdict_core::Identifier;

/// The first child deciding the overriding effect wins; otherwise the
/// result is the other effect, whatever the remaining children decided
///
/// Errors and NotApplicable are absorbed, so the result is never
/// Indeterminate or NotApplicable.
#[derive(Debug, Clone)]
pub struct Unless {
    id: Identifier,
    overriding: Effect,
}

impl Unless {
    /// Create the algorithm registered under `id`
    #[must_use]
    pub fn new(id: impl Into<Identifier>, overriding: Effect) -> Self {
        Self {
            id: id.into(),
            overriding,
        }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for Unless {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        ctx: &dyn EvaluationContext,
        elements: &[CombiningElement<T>],
        _parameters: &[CombinerParameter],
    ) -> EvaluationOutcome<EvaluationResult> {
        let default = self.overriding.opposite();
        let mut combined = EvaluationResult::new(default.decision());
        for element in elements {
            let result = element.evaluate(ctx)?;
            if result.decision == self.overriding.decision() {
                return Ok(result);
            }
            if result.decision == default.decision() {
                combined.merge(result);
            }
        }
        Ok(combined)
    }
}
