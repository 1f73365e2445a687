//! Variable definitions and the policy-level scope that resolves them.

use crate::context::{EvaluationContext, PipError, PipRequest, PipResponse, RequestSettings, TraceEvent};
use crate::expression::{AttributeSelector, Expression};
use indexmap::IndexMap;
use std::sync::Arc;

/// Named expression shared by the rules of one policy
#[derive(Debug, Clone)]
pub struct VariableDefinition {
    /// Variable id
    pub id: String,
    /// Defining expression
    pub expression: Expression,
}

impl VariableDefinition {
    /// Create a new variable definition
    #[must_use]
    pub fn new(id: impl Into<String>, expression: Expression) -> Self {
        Self {
            id: id.into(),
            expression,
        }
    }
}

/// Variable definitions of a policy, in declaration order
pub type VariableMap = IndexMap<String, Arc<VariableDefinition>>;

/// Context wrapper exposing a policy's variables to its rules
pub(crate) struct VariableScope<'a> {
    parent: &'a dyn EvaluationContext,
    variables: &'a VariableMap,
}

impl<'a> VariableScope<'a> {
    pub(crate) fn new(parent: &'a dyn EvaluationContext, variables: &'a VariableMap) -> Self {
        Self { parent, variables }
    }
}

impl EvaluationContext for VariableScope<'_> {
    fn get_attributes(&self, request: &PipRequest) -> Result<PipResponse, PipError> {
        self.parent.get_attributes(request)
    }

    fn select_attributes(&self, selector: &AttributeSelector) -> Result<PipResponse, PipError> {
        self.parent.select_attributes(selector)
    }

    fn request(&self) -> &RequestSettings {
        self.parent.request()
    }

    fn is_tracing(&self) -> bool {
        self.parent.is_tracing()
    }

    fn trace(&self, event: TraceEvent) {
        self.parent.trace(event);
    }

    fn variable(&self, id: &str) -> Option<Arc<VariableDefinition>> {
        self.variables
            .get(id)
            .cloned()
            .or_else(|| self.parent.variable(id))
    }
}
