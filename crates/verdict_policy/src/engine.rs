//! Policy decision point facade.
//!
//! `PdpEngine` owns the root policies, the registries and the attribute
//! finders. It is the only place where an aborted evaluation turns into a
//! user-visible Indeterminate.

use crate::combining::{CombiningAlgorithmRegistry, CombiningElement, PolicyCombiningAlgorithm};
use crate::context::{EvaluationContext, PipFinder, Request, RequestContext, TraceEvent};
use crate::decision::EvaluationResult;
use crate::error::{EvaluationOutcome, PolicyError};
use crate::function::FunctionRegistry;
use crate::tree::PolicySetChild;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use verdict_core::{Identifier, Status, xacml};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether contexts created by the engine collect trace events
    pub trace_evaluation: bool,
    /// Policy-combining algorithm applied when there are several roots
    pub root_combining_algorithm: Identifier,
    /// Default for requests that do not say whether to return policy ids
    pub return_policy_id_list: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trace_evaluation: false,
            root_combining_algorithm: Identifier::new(xacml::POLICY_DENY_OVERRIDES),
            return_policy_id_list: false,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable trace collection
    #[must_use]
    pub fn with_trace_evaluation(mut self, value: bool) -> Self {
        self.trace_evaluation = value;
        self
    }

    /// Set the root combining algorithm
    #[must_use]
    pub fn with_root_combining_algorithm(mut self, id: impl Into<Identifier>) -> Self {
        self.root_combining_algorithm = id.into();
        self
    }

    /// Set the default for returning policy ids
    #[must_use]
    pub fn with_return_policy_id_list(mut self, value: bool) -> Self {
        self.return_policy_id_list = value;
        self
    }

    /// Load from JSON; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        serde_json::from_str(json).map_err(|e| PolicyError::Config(e.to_string()))
    }
}

/// Policy decision point
pub struct PdpEngine {
    config: EngineConfig,
    functions: FunctionRegistry,
    algorithms: CombiningAlgorithmRegistry,
    root_algorithm: PolicyCombiningAlgorithm,
    roots: Vec<CombiningElement<PolicySetChild>>,
    finders: Vec<Arc<dyn PipFinder>>,
}

impl PdpEngine {
    /// Create an engine with the standard registries and no policies
    ///
    /// # Errors
    ///
    /// Returns error if the root combining algorithm is unknown
    pub fn new(config: EngineConfig) -> Result<Self, PolicyError> {
        let algorithms = CombiningAlgorithmRegistry::standard();
        let root_algorithm = algorithms.policy(config.root_combining_algorithm.as_str())?;
        Ok(Self {
            config,
            functions: FunctionRegistry::standard(),
            algorithms,
            root_algorithm,
            roots: Vec::new(),
            finders: Vec::new(),
        })
    }

    /// Replace the combining algorithm registry
    ///
    /// # Errors
    ///
    /// Returns error if the new registry lacks the root combining algorithm
    pub fn with_algorithms(mut self, algorithms: CombiningAlgorithmRegistry) -> Result<Self, PolicyError> {
        self.root_algorithm = algorithms.policy(self.config.root_combining_algorithm.as_str())?;
        self.algorithms = algorithms;
        Ok(self)
    }

    /// Replace the function registry
    #[must_use]
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Add a root policy or policy set
    #[must_use]
    pub fn with_root(self, root: impl Into<PolicySetChild>) -> Self {
        self.with_shared_root(Arc::new(root.into()))
    }

    /// Add a root shared with other engines
    #[must_use]
    pub fn with_shared_root(mut self, root: Arc<PolicySetChild>) -> Self {
        self.roots.push(CombiningElement::new(root));
        self
    }

    /// Add an attribute finder, consulted in insertion order
    #[must_use]
    pub fn with_finder(mut self, finder: Arc<dyn PipFinder>) -> Self {
        self.finders.push(finder);
        self
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the function registry, for building policies
    #[must_use]
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Get the combining algorithm registry, for building policies
    #[must_use]
    pub fn algorithms(&self) -> &CombiningAlgorithmRegistry {
        &self.algorithms
    }

    /// Number of root policies and policy sets
    #[must_use]
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Decide a request
    #[must_use]
    pub fn decide(&self, request: &Request) -> EvaluationResult {
        self.decide_traced(request).0
    }

    /// Decide a request and return the trace events it produced
    ///
    /// Events are only collected when `trace_evaluation` is enabled.
    #[must_use]
    pub fn decide_traced(&self, request: &Request) -> (EvaluationResult, Vec<TraceEvent>) {
        let decision_id = Uuid::new_v4();
        let span = tracing::debug_span!("decide", decision_id = %decision_id);
        let _guard = span.enter();

        let ctx = RequestContext::new(request)
            .with_finders(&self.finders)
            .with_tracing(self.config.trace_evaluation)
            .with_default_return_policy_id_list(self.config.return_policy_id_list);
        let result = self.evaluate(&ctx);
        tracing::debug!(decision = %result.decision, "decision made");
        (result, ctx.take_events())
    }

    /// Evaluate the roots against a caller-supplied context
    ///
    /// Never fails: an aborted evaluation is reported as Indeterminate with
    /// a processing-error status.
    #[must_use]
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationResult {
        match self.evaluate_roots(ctx) {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(error = %err, "evaluation aborted");
                EvaluationResult::indeterminate(Status::processing_error(err.to_string()))
            }
        }
    }

    fn evaluate_roots(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<EvaluationResult> {
        match self.roots.as_slice() {
            [] => Ok(EvaluationResult::not_applicable()),
            [root] => root.evaluate(ctx),
            roots => self.root_algorithm.combine(ctx, roots, &[]),
        }
    }
}

impl std::fmt::Debug for PdpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdpEngine")
            .field("config", &self.config)
            .field("roots", &self.roots.len())
            .field("finders", &self.finders.len())
            .finish_non_exhaustive()
    }
}
