//! first-applicable.

use super::{CombinerParameter, CombiningAlgorithm, CombiningElement};
use crate::context::EvaluationContext;
use crate::decision::{Decision, EvaluationResult};
use crate::error::EvaluationOutcome;
use crate::tree::Evaluatable;
use verdict_core::Identifier;

/// Result of the first child that is not NotApplicable, unchanged
#[derive(Debug, Clone)]
pub struct FirstApplicable {
    id: Identifier,
}

impl FirstApplicable {
    /// Create the algorithm registered under `id`
    #[must_use]
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for FirstApplicable {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        ctx: &dyn EvaluationContext,
        elements: &[CombiningElement<T>],
        _parameters: &[CombinerParameter],
    ) -> EvaluationOutcome<EvaluationResult> {
        for element in elements {
            let result = element.evaluate(ctx)?;
            if result.decision != Decision::NotApplicable {
                return Ok(result);
            }
        }
        Ok(EvaluationResult::not_applicable())
    }
}
