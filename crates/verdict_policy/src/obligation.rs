//! Obligation and advice expressions attached to rules, policies and
//! policy sets.

use crate::context::EvaluationContext;
use crate::decision::{Advice, AttributeAssignment, Effect, EvaluationResult, Obligation};
use crate::error::EvaluationOutcome;
use crate::expression::{Expression, ExpressionResult};
use verdict_core::{Identifier, Status};

/// Expression producing one or more attribute assignments
#[derive(Debug, Clone)]
pub struct AttributeAssignmentExpression {
    /// Attribute id of the produced assignments
    pub attribute_id: Identifier,
    /// Category of the produced assignments
    pub category: Option<Identifier>,
    /// Issuer of the produced assignments
    pub issuer: Option<String>,
    /// Value expression; a bag yields one assignment per member
    pub expression: Expression,
}

impl AttributeAssignmentExpression {
    /// Create a new assignment expression
    #[must_use]
    pub fn new(attribute_id: &str, expression: impl Into<Expression>) -> Self {
        Self {
            attribute_id: Identifier::new(attribute_id),
            category: None,
            issuer: None,
            expression: expression.into(),
        }
    }

    /// Set the category
    #[must_use]
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(Identifier::new(category));
        self
    }

    /// Set the issuer
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    fn evaluate(
        &self,
        ctx: &dyn EvaluationContext,
        out: &mut Vec<AttributeAssignment>,
    ) -> EvaluationOutcome<Result<(), Status>> {
        let values = match self.expression.evaluate(ctx)? {
            ExpressionResult::Error(status) => return Ok(Err(status)),
            ExpressionResult::Value(value) => vec![value],
            ExpressionResult::Bag(bag) => bag.into_values(),
        };
        out.extend(values.into_iter().map(|value| AttributeAssignment {
            attribute_id: self.attribute_id.clone(),
            category: self.category.clone(),
            issuer: self.issuer.clone(),
            value,
        }));
        Ok(Ok(()))
    }
}

fn assignments(
    ctx: &dyn EvaluationContext,
    expressions: &[AttributeAssignmentExpression],
) -> EvaluationOutcome<Result<Vec<AttributeAssignment>, Status>> {
    let mut out = Vec::new();
    for expression in expressions {
        if let Err(status) = expression.evaluate(ctx, &mut out)? {
            return Ok(Err(status));
        }
    }
    Ok(Ok(out))
}

/// Obligation returned when the node's decision equals `fulfill_on`
#[derive(Debug, Clone)]
pub struct ObligationExpression {
    /// Obligation id
    pub id: Identifier,
    /// Decision on which the obligation is returned
    pub fulfill_on: Effect,
    /// Attached attributes
    pub assignments: Vec<AttributeAssignmentExpression>,
}

impl ObligationExpression {
    /// Create a new obligation expression
    #[must_use]
    pub fn new(id: &str, fulfill_on: Effect) -> Self {
        Self {
            id: Identifier::new(id),
            fulfill_on,
            assignments: Vec::new(),
        }
    }

    /// Add an attribute assignment
    #[must_use]
    pub fn with_assignment(mut self, assignment: AttributeAssignmentExpression) -> Self {
        self.assignments.push(assignment);
        self
    }
}

/// Advice returned when the node's decision equals `applies_to`
#[derive(Debug, Clone)]
pub struct AdviceExpression {
    /// Advice id
    pub id: Identifier,
    /// Decision on which the advice is returned
    pub applies_to: Effect,
    /// Attached attributes
    pub assignments: Vec<AttributeAssignmentExpression>,
}

impl AdviceExpression {
    /// Create a new advice expression
    #[must_use]
    pub fn new(id: &str, applies_to: Effect) -> Self {
        Self {
            id: Identifier::new(id),
            applies_to,
            assignments: Vec::new(),
        }
    }

    /// Add an attribute assignment
    #[must_use]
    pub fn with_assignment(mut self, assignment: AttributeAssignmentExpression) -> Self {
        self.assignments.push(assignment);
        self
    }
}

/// Append the obligations and advice that apply to a final decision
///
/// Leaves non-final results alone. If an assignment fails the result turns
/// into the Indeterminate of its effect, carrying the failure.
///
/// # Errors
///
/// Returns error only for faults that abort the whole evaluation
pub(crate) fn apply_obligations(
    ctx: &dyn EvaluationContext,
    result: &mut EvaluationResult,
    obligations: &[ObligationExpression],
    advice: &[AdviceExpression],
) -> EvaluationOutcome<()> {
    let Some(effect) = Effect::from_decision(result.decision) else {
        return Ok(());
    };

    let mut produced_obligations = Vec::new();
    for expression in obligations.iter().filter(|o| o.fulfill_on == effect) {
        match assignments(ctx, &expression.assignments)? {
            Ok(attribute_assignments) => produced_obligations.push(Obligation {
                id: expression.id.clone(),
                attribute_assignments,
            }),
            Err(status) => {
                tracing::debug!(obligation = %expression.id, "obligation assignment failed");
                result.fail(effect.indeterminate(), status);
                return Ok(());
            }
        }
    }

    let mut produced_advice = Vec::new();
    for expression in advice.iter().filter(|a| a.applies_to == effect) {
        match assignments(ctx, &expression.assignments)? {
            Ok(attribute_assignments) => produced_advice.push(Advice {
                id: expression.id.clone(),
                attribute_assignments,
            }),
            Err(status) => {
                tracing::debug!(advice = %expression.id, "advice assignment failed");
                result.fail(effect.indeterminate(), status);
                return Ok(());
            }
        }
    }

    result.obligations.extend(produced_obligations);
    result.advice.extend(produced_advice);
    Ok(())
}
