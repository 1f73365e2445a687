//! Evaluation context: the engine's view of the request and its attribute
//! sources.
//!
//! The engine never knows where attributes come from. Everything it needs
//! during evaluation goes through [`EvaluationContext`], which answers
//! attribute lookups, carries request-level settings and optionally
//! collects trace events.

use crate::expression::AttributeSelector;
use crate::variable::VariableDefinition;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::Arc;
use verdict_core::{AttributeValue, DataType, Identifier, Status};

/// Key of an attribute lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipRequest {
    /// Attribute category
    pub category: Identifier,
    /// Attribute id
    pub attribute_id: Identifier,
    /// Expected data type
    pub data_type: DataType,
    /// Required issuer
    pub issuer: Option<String>,
}

/// Answer to an attribute lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipResponse {
    /// Status of the lookup
    pub status: Status,
    /// Attributes found
    pub attributes: Vec<Attribute>,
}

impl PipResponse {
    /// Successful response
    #[must_use]
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            status: Status::OK,
            attributes,
        }
    }

    /// Failed response carrying a status
    #[must_use]
    pub fn error(status: Status) -> Self {
        Self {
            status,
            attributes: Vec::new(),
        }
    }
}

/// Attribute source failure that aborts the evaluation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PipError {
    /// What went wrong
    pub message: String,
}

impl PipError {
    /// Create a new PIP error
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Request attribute with its values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Category
    pub category: Identifier,
    /// Attribute id
    pub attribute_id: Identifier,
    /// Issuer
    #[serde(default)]
    pub issuer: Option<String>,
    /// Values, possibly of different data types
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    /// Create an attribute with one value
    #[must_use]
    pub fn new(category: &str, attribute_id: &str, value: AttributeValue) -> Self {
        Self {
            category: Identifier::new(category),
            attribute_id: Identifier::new(attribute_id),
            issuer: None,
            values: vec![value],
        }
    }

    /// Set the issuer
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Add a value
    #[must_use]
    pub fn with_value(mut self, value: AttributeValue) -> Self {
        self.values.push(value);
        self
    }

    /// Check whether the attribute answers the lookup key
    ///
    /// The data type is not checked here; mixed-type attributes are
    /// filtered value by value.
    #[must_use]
    pub fn matches(&self, request: &PipRequest) -> bool {
        self.category == request.category
            && self.attribute_id == request.attribute_id
            && request
                .issuer
                .as_ref()
                .is_none_or(|issuer| self.issuer.as_ref() == Some(issuer))
    }
}

/// Decision request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Request {
    /// Request attributes
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Whether contributing policy ids should be returned
    #[serde(default)]
    pub return_policy_id_list: Option<bool>,
}

impl Request {
    /// Create an empty request
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Ask for contributing policy ids
    #[must_use]
    pub fn with_return_policy_id_list(mut self, value: bool) -> Self {
        self.return_policy_id_list = Some(value);
        self
    }
}

/// Request-level settings visible to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestSettings {
    /// Whether contributing policy ids are collected
    pub return_policy_id_list: bool,
}

/// Trace record emitted during evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// What happened, e.g. `Match` or `Result`
    pub label: String,
    /// Node the event belongs to
    pub node: String,
    /// Rendered payload
    pub message: String,
}

impl TraceEvent {
    /// Create a new trace event
    #[must_use]
    pub fn new(label: &str, node: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            node: node.into(),
            message: message.into(),
        }
    }
}

/// Everything the evaluator may ask of its caller
pub trait EvaluationContext {
    /// Look up attributes
    ///
    /// # Errors
    ///
    /// Returns error if the attribute source failed outright. Ordinary
    /// lookup problems are reported through the response status.
    fn get_attributes(&self, request: &PipRequest) -> Result<PipResponse, PipError>;

    /// Select attributes from request content
    ///
    /// # Errors
    ///
    /// Returns error if the content source failed outright
    fn select_attributes(&self, selector: &AttributeSelector) -> Result<PipResponse, PipError> {
        Ok(PipResponse::error(Status::processing_error(format!(
            "Attribute selection is not supported: {}",
            selector.path
        ))))
    }

    /// Request-level settings
    fn request(&self) -> &RequestSettings;

    /// Whether trace events are wanted
    fn is_tracing(&self) -> bool {
        false
    }

    /// Record a trace event
    fn trace(&self, _event: TraceEvent) {}

    /// Resolve a variable definition visible at this point of the tree
    fn variable(&self, _id: &str) -> Option<Arc<VariableDefinition>> {
        None
    }
}

/// External attribute source consulted when the request lacks an attribute
pub trait PipFinder: Send + Sync {
    /// Look up attributes
    ///
    /// # Errors
    ///
    /// Returns error if the source failed outright
    fn get_attributes(&self, request: &PipRequest) -> Result<PipResponse, PipError>;
}

/// In-memory context over a [`Request`] and a list of finders
pub struct RequestContext<'a> {
    request: &'a Request,
    settings: RequestSettings,
    finders: &'a [Arc<dyn PipFinder>],
    tracing: bool,
    events: RefCell<Vec<TraceEvent>>,
}

impl<'a> RequestContext<'a> {
    /// Create a new context over a request
    #[must_use]
    pub fn new(request: &'a Request) -> Self {
        Self {
            request,
            settings: RequestSettings {
                return_policy_id_list: request.return_policy_id_list.unwrap_or(false),
            },
            finders: &[],
            tracing: false,
            events: RefCell::new(Vec::new()),
        }
    }

    /// Set the finders consulted after the request's own attributes
    #[must_use]
    pub fn with_finders(mut self, finders: &'a [Arc<dyn PipFinder>]) -> Self {
        self.finders = finders;
        self
    }

    /// Enable trace collection
    #[must_use]
    pub fn with_tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }

    /// Default for requests that do not say whether to return policy ids
    #[must_use]
    pub fn with_default_return_policy_id_list(mut self, value: bool) -> Self {
        self.settings.return_policy_id_list = self.request.return_policy_id_list.unwrap_or(value);
        self
    }

    /// Take the collected trace events
    #[must_use]
    pub fn take_events(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl EvaluationContext for RequestContext<'_> {
    fn get_attributes(&self, request: &PipRequest) -> Result<PipResponse, PipError> {
        let found: Vec<Attribute> = self
            .request
            .attributes
            .iter()
            .filter(|a| a.matches(request))
            .cloned()
            .collect();
        let typed = found
            .iter()
            .any(|a| a.values.iter().any(|v| v.data_type() == request.data_type));
        if typed {
            return Ok(PipResponse::new(found));
        }
        for finder in self.finders {
            let response = finder.get_attributes(request)?;
            if !response.status.is_ok() || !response.attributes.is_empty() {
                tracing::trace!(attribute = %request.attribute_id, "attribute supplied by finder");
                return Ok(response);
            }
        }
        Ok(PipResponse::new(Vec::new()))
    }

    fn request(&self) -> &RequestSettings {
        &self.settings
    }

    fn is_tracing(&self) -> bool {
        self.tracing
    }

    fn trace(&self, event: TraceEvent) {
        tracing::trace!(label = %event.label, node = %event.node, "{}", event.message);
        if self.tracing {
            self.events.borrow_mut().push(event);
        }
    }
}
