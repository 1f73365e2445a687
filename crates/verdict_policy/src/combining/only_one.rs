//! only-one-applicable (policy combining only).

use super::{CombinerParameter, CombiningAlgorithm, CombiningElement};
use crate::context::EvaluationContext;
use crate::decision::EvaluationResult;
use crate::error::EvaluationOutcome;
use crate::target::MatchResult;
use crate::tree::Evaluatable;
use verdict_core::{Identifier, Status};

/// Evaluates the single child whose target matches
///
/// Children are selected by target alone. No match is NotApplicable; more
/// than one match, or a target that cannot be matched, is Indeterminate.
#[derive(Debug, Clone)]
pub struct OnlyOneApplicable {
    id: Identifier,
}

impl OnlyOneApplicable {
    /// Create the algorithm registered under `id`
    #[must_use]
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self { id: id.into() }
    }
}

impl<T: Evaluatable> CombiningAlgorithm<T> for OnlyOneApplicable {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        ctx: &dyn EvaluationContext,
        elements: &[CombiningElement<T>],
        _parameters: &[CombinerParameter],
    ) -> EvaluationOutcome<EvaluationResult> {
        let mut selected = None;
        for element in elements {
            match element.match_target(ctx)? {
                MatchResult::NoMatch => {}
                MatchResult::Indeterminate(status) => return Ok(EvaluationResult::indeterminate(status)),
                MatchResult::Match if selected.is_some() => {
                    tracing::debug!(child = element.element.combiner_id(), "second applicable child");
                    return Ok(EvaluationResult::indeterminate(Status::syntax_error(
                        "More than one applicable policy",
                    )));
                }
                MatchResult::Match => selected = Some(element),
            }
        }
        match selected {
            Some(element) => element.evaluate(ctx),
            None => Ok(EvaluationResult::not_applicable()),
        }
    }
}
