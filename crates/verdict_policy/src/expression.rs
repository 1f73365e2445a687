//! Expressions and their evaluation.

use crate::context::{EvaluationContext, PipRequest, PipResponse};
use crate::error::EvaluationOutcome;
use crate::function::{FunctionArgument, FunctionDefinition};
use std::sync::Arc;
use verdict_core::{
    AttributeValue, Bag, DataType, Identifier, MissingAttributeDetail, Status, StatusCode,
};

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionResult {
    /// Single value
    Value(AttributeValue),
    /// Bag of values
    Bag(Bag),
    /// Evaluation failed
    Error(Status),
}

impl ExpressionResult {
    /// Boolean result
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Value(AttributeValue::Boolean(value))
    }

    /// Processing-error result
    #[must_use]
    pub fn processing_error(message: impl Into<String>) -> Self {
        Self::Error(Status::processing_error(message))
    }

    /// Check whether evaluation succeeded
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Error(_))
    }

    /// Status of the result; OK unless it failed
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::Error(status) => status.clone(),
            _ => Status::OK,
        }
    }
}

/// Policy expression
#[derive(Debug, Clone)]
pub enum Expression {
    /// Literal value
    Value(AttributeValue),
    /// Attribute lookup by category and id
    Designator(AttributeDesignator),
    /// Attribute lookup by content path
    Selector(AttributeSelector),
    /// Function application
    Apply(Apply),
    /// Reference to a variable definition
    Variable(VariableReference),
    /// Function passed as an argument to a higher-order function
    Function(Arc<dyn FunctionDefinition>),
}

impl Expression {
    /// Literal boolean
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Value(AttributeValue::Boolean(value))
    }

    /// Evaluate the expression
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<ExpressionResult> {
        match self {
            Self::Value(value) => Ok(ExpressionResult::Value(value.clone())),
            Self::Designator(designator) => designator.evaluate(ctx),
            Self::Selector(selector) => selector.evaluate(ctx),
            Self::Apply(apply) => apply.evaluate(ctx),
            Self::Variable(reference) => reference.evaluate(ctx),
            Self::Function(function) => Ok(ExpressionResult::processing_error(format!(
                "Function {} cannot be evaluated outside an argument list",
                function.id()
            ))),
        }
    }

    /// Statically known result type, and whether it is a bag
    #[must_use]
    pub fn static_type(&self) -> Option<(DataType, bool)> {
        match self {
            Self::Value(value) => Some((value.data_type(), false)),
            Self::Designator(d) => Some((d.data_type, true)),
            Self::Selector(s) => Some((s.data_type, true)),
            Self::Apply(apply) => apply
                .function
                .return_type()
                .map(|dt| (dt, apply.function.returns_bag())),
            Self::Variable(_) | Self::Function(_) => None,
        }
    }

    /// Collect the ids of all variables this expression refers to
    pub fn variable_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Variable(reference) => out.push(&reference.variable_id),
            Self::Apply(apply) => {
                for argument in &apply.arguments {
                    argument.variable_references(out);
                }
            }
            _ => {}
        }
    }
}

impl From<AttributeValue> for Expression {
    fn from(value: AttributeValue) -> Self {
        Self::Value(value)
    }
}

impl From<AttributeDesignator> for Expression {
    fn from(value: AttributeDesignator) -> Self {
        Self::Designator(value)
    }
}

impl From<Apply> for Expression {
    fn from(value: Apply) -> Self {
        Self::Apply(value)
    }
}

/// Lookup of request attributes by category, id, data type and issuer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDesignator {
    /// Category
    pub category: Identifier,
    /// Attribute id
    pub attribute_id: Identifier,
    /// Data type of the collected values
    pub data_type: DataType,
    /// Required issuer
    pub issuer: Option<String>,
    /// Whether an empty result is an error
    pub must_be_present: bool,
}

impl AttributeDesignator {
    /// Create a new designator
    #[must_use]
    pub fn new(category: &str, attribute_id: &str, data_type: DataType) -> Self {
        Self {
            category: Identifier::new(category),
            attribute_id: Identifier::new(attribute_id),
            data_type,
            issuer: None,
            must_be_present: false,
        }
    }

    /// Set the issuer
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require at least one value
    #[must_use]
    pub fn must_be_present(mut self, value: bool) -> Self {
        self.must_be_present = value;
        self
    }

    /// Lookup key sent to the context
    #[must_use]
    pub fn pip_request(&self) -> PipRequest {
        PipRequest {
            category: self.category.clone(),
            attribute_id: self.attribute_id.clone(),
            data_type: self.data_type,
            issuer: self.issuer.clone(),
        }
    }

    /// Collect matching values into a bag
    ///
    /// # Errors
    ///
    /// Returns error if the attribute source failed outright
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<ExpressionResult> {
        let request = self.pip_request();
        let response = ctx.get_attributes(&request)?;
        if !response.status.is_ok() {
            return Ok(ExpressionResult::Error(response.status));
        }

        let mut bag = Bag::new(self.data_type);
        for attribute in response.attributes.iter().filter(|a| a.matches(&request)) {
            for value in &attribute.values {
                if value.data_type() == self.data_type {
                    bag.add(value.clone());
                }
            }
        }

        if bag.is_empty() && self.must_be_present {
            tracing::debug!(attribute = %self.attribute_id, "required attribute missing");
            return Ok(ExpressionResult::Error(Status::missing_attribute(
                "Missing required attribute",
                MissingAttributeDetail {
                    category: self.category.clone(),
                    attribute_id: self.attribute_id.clone(),
                    data_type: self.data_type.id(),
                    issuer: self.issuer.clone(),
                },
            )));
        }
        Ok(ExpressionResult::Bag(bag))
    }
}

/// Lookup of attribute values by a path into request content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// Category whose content is searched
    pub category: Identifier,
    /// Path expression
    pub path: String,
    /// Data type of the collected values
    pub data_type: DataType,
    /// Whether an empty result is an error
    pub must_be_present: bool,
}

impl AttributeSelector {
    /// Create a new selector
    #[must_use]
    pub fn new(category: &str, path: impl Into<String>, data_type: DataType) -> Self {
        Self {
            category: Identifier::new(category),
            path: path.into(),
            data_type,
            must_be_present: false,
        }
    }

    /// Require at least one value
    #[must_use]
    pub fn must_be_present(mut self, value: bool) -> Self {
        self.must_be_present = value;
        self
    }

    /// Collect selected values into a bag
    ///
    /// # Errors
    ///
    /// Returns error if the content source failed outright
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<ExpressionResult> {
        let PipResponse { status, attributes } = ctx.select_attributes(self)?;
        if !status.is_ok() {
            return Ok(ExpressionResult::Error(status));
        }
        let mut bag = Bag::new(self.data_type);
        for value in attributes.iter().flat_map(|a| a.values.iter()) {
            if value.data_type() == self.data_type {
                bag.add(value.clone());
            }
        }
        if bag.is_empty() && self.must_be_present {
            return Ok(ExpressionResult::Error(Status::new(
                StatusCode::MissingAttribute,
                format!("Selector path {} matched nothing", self.path),
            )));
        }
        Ok(ExpressionResult::Bag(bag))
    }
}

/// Application of a function to argument expressions
#[derive(Debug, Clone)]
pub struct Apply {
    /// Function to apply
    pub function: Arc<dyn FunctionDefinition>,
    /// Argument expressions, in order
    pub arguments: Vec<Expression>,
    /// Description
    pub description: Option<String>,
}

impl Apply {
    /// Create a new function application
    #[must_use]
    pub fn new(function: Arc<dyn FunctionDefinition>, arguments: Vec<Expression>) -> Self {
        Self {
            function,
            arguments,
            description: None,
        }
    }

    /// Evaluate arguments left to right, then call the function
    ///
    /// The first failing argument short-circuits: its status is returned and
    /// the remaining arguments are not evaluated.
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<ExpressionResult> {
        let mut arguments = Vec::with_capacity(self.arguments.len());
        for expression in &self.arguments {
            let argument = match expression {
                Expression::Function(function) => FunctionArgument::Function(Arc::clone(function)),
                other => match other.evaluate(ctx)? {
                    ExpressionResult::Value(value) => FunctionArgument::Value(value),
                    ExpressionResult::Bag(bag) => FunctionArgument::Bag(bag),
                    ExpressionResult::Error(status) => return Ok(ExpressionResult::Error(status)),
                },
            };
            arguments.push(argument);
        }
        Ok(self.function.evaluate(ctx, &arguments))
    }
}

/// Reference to a variable definition by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReference {
    /// Referenced variable id
    pub variable_id: String,
}

impl VariableReference {
    /// Create a new reference
    #[must_use]
    pub fn new(variable_id: impl Into<String>) -> Self {
        Self {
            variable_id: variable_id.into(),
        }
    }

    /// Evaluate the referenced definition
    ///
    /// # Errors
    ///
    /// Returns error only for faults that abort the whole evaluation
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> EvaluationOutcome<ExpressionResult> {
        match ctx.variable(&self.variable_id) {
            Some(definition) => definition.expression.evaluate(ctx),
            None => Ok(ExpressionResult::processing_error(format!(
                "Undefined variable: {}",
                self.variable_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Attribute, PipError, Request, RequestContext, RequestSettings};
    use crate::function::FunctionRegistry;
    use crate::testing;
    use verdict_core::xacml;

    fn subject_id() -> AttributeDesignator {
        AttributeDesignator::new(
            xacml::CATEGORY_ACCESS_SUBJECT,
            xacml::ATTRIBUTE_SUBJECT_ID,
            DataType::String,
        )
    }

    #[test]
    fn test_designator_collects_matching_type() {
        let request = Request::new().with_attribute(
            Attribute::new(
                xacml::CATEGORY_ACCESS_SUBJECT,
                xacml::ATTRIBUTE_SUBJECT_ID,
                AttributeValue::string("alice"),
            )
            .with_value(AttributeValue::integer(7))
            .with_value(AttributeValue::string("al")),
        );
        let ctx = RequestContext::new(&request);
        let ExpressionResult::Bag(bag) = subject_id().evaluate(&ctx).unwrap() else {
            panic!("expected a bag");
        };
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.data_type(), DataType::String);
    }

    #[test]
    fn test_designator_absent_not_required() {
        let request = Request::new();
        let ctx = RequestContext::new(&request);
        let result = subject_id().evaluate(&ctx).unwrap();
        assert_eq!(result, ExpressionResult::Bag(Bag::new(DataType::String)));
        assert!(result.is_ok());
    }

    #[test]
    fn test_designator_absent_required() {
        let request = Request::new();
        let ctx = RequestContext::new(&request);
        let result = subject_id().must_be_present(true).evaluate(&ctx).unwrap();
        let ExpressionResult::Error(status) = result else {
            panic!("expected an error");
        };
        assert_eq!(status.code, StatusCode::MissingAttribute);
        assert_eq!(status.message.as_deref(), Some("Missing required attribute"));
        let detail = &status.detail.unwrap().missing_attributes[0];
        assert_eq!(detail.attribute_id.as_str(), xacml::ATTRIBUTE_SUBJECT_ID);
        assert_eq!(detail.data_type, DataType::String.id());
    }

    #[test]
    fn test_designator_issuer_mismatch() {
        let request = Request::new().with_attribute(
            Attribute::new(
                xacml::CATEGORY_ACCESS_SUBJECT,
                xacml::ATTRIBUTE_SUBJECT_ID,
                AttributeValue::string("alice"),
            )
            .with_issuer("hr"),
        );
        let ctx = RequestContext::new(&request);
        let result = subject_id().with_issuer("it").evaluate(&ctx).unwrap();
        assert_eq!(result, ExpressionResult::Bag(Bag::new(DataType::String)));
    }

    struct AgeDirectory;

    impl crate::context::PipFinder for AgeDirectory {
        fn get_attributes(&self, request: &PipRequest) -> Result<PipResponse, PipError> {
            let age = Attribute::new(xacml::CATEGORY_ACCESS_SUBJECT, "urn:example:age", AttributeValue::integer(42));
            let found = if age.matches(request) { vec![age] } else { Vec::new() };
            Ok(PipResponse::new(found))
        }
    }

    #[test]
    fn test_designator_falls_back_to_finder_for_its_type() {
        let request = Request::new().with_attribute(Attribute::new(
            xacml::CATEGORY_ACCESS_SUBJECT,
            "urn:example:age",
            AttributeValue::string("42"),
        ));
        let finders: Vec<std::sync::Arc<dyn crate::context::PipFinder>> = vec![std::sync::Arc::new(AgeDirectory)];
        let ctx = RequestContext::new(&request).with_finders(&finders);
        let age = AttributeDesignator::new(xacml::CATEGORY_ACCESS_SUBJECT, "urn:example:age", DataType::Integer)
            .must_be_present(true);
        let ExpressionResult::Bag(bag) = age.evaluate(&ctx).unwrap() else {
            panic!("expected a bag");
        };
        assert_eq!(bag.single(), Some(&AttributeValue::integer(42)));
    }

    struct StatusContext(Status);

    impl EvaluationContext for StatusContext {
        fn get_attributes(&self, _request: &PipRequest) -> Result<PipResponse, PipError> {
            Ok(PipResponse::error(self.0.clone()))
        }

        fn request(&self) -> &RequestSettings {
            static SETTINGS: RequestSettings = RequestSettings {
                return_policy_id_list: false,
            };
            &SETTINGS
        }
    }

    #[test]
    fn test_designator_passes_pip_status_through() {
        let status = Status::processing_error("backend said no");
        let ctx = StatusContext(status.clone());
        let result = subject_id().must_be_present(true).evaluate(&ctx).unwrap();
        assert_eq!(result, ExpressionResult::Error(status));
    }

    #[test]
    fn test_selector_unsupported_by_default() {
        let request = Request::new();
        let ctx = RequestContext::new(&request);
        let selector = AttributeSelector::new(xacml::CATEGORY_RESOURCE, "/doc/owner", DataType::String);
        let result = selector.evaluate(&ctx).unwrap();
        assert!(!result.is_ok());
        assert_eq!(result.status().code, StatusCode::ProcessingError);
    }

    #[test]
    fn test_apply_short_circuits_on_first_error() {
        let functions = FunctionRegistry::standard();
        let missing = Expression::Designator(subject_id().must_be_present(true));
        let apply = functions
            .apply(
                "urn:oasis:names:tc:xacml:1.0:function:and",
                vec![Expression::boolean(true), testing::one_and_only(&functions, missing)],
            )
            .unwrap();
        let request = Request::new();
        let ctx = RequestContext::new(&request);
        let result = apply.evaluate(&ctx).unwrap();
        assert_eq!(result.status().code, StatusCode::MissingAttribute);
    }

    #[test]
    fn test_or_evaluates_every_argument() {
        let functions = FunctionRegistry::standard();
        let missing = Expression::Designator(subject_id().must_be_present(true));
        let apply = functions
            .apply(
                "urn:oasis:names:tc:xacml:1.0:function:or",
                vec![Expression::boolean(true), testing::one_and_only(&functions, missing)],
            )
            .unwrap();
        let request = Request::new();
        let ctx = RequestContext::new(&request);
        let result = apply.evaluate(&ctx).unwrap();
        assert_eq!(result.status().code, StatusCode::MissingAttribute);
    }

    #[test]
    fn test_undefined_variable() {
        let request = Request::new();
        let ctx = RequestContext::new(&request);
        let result = Expression::Variable(VariableReference::new("v1")).evaluate(&ctx).unwrap();
        assert_eq!(result.status().message.as_deref(), Some("Undefined variable: v1"));
    }

    #[test]
    fn test_bare_function_is_error() {
        let functions = FunctionRegistry::standard();
        let f = functions
            .get(&Identifier::new("urn:oasis:names:tc:xacml:1.0:function:string-equal"))
            .unwrap();
        let request = Request::new();
        let ctx = RequestContext::new(&request);
        assert!(!Expression::Function(f).evaluate(&ctx).unwrap().is_ok());
    }

    #[test]
    fn test_static_type_and_references() {
        let functions = FunctionRegistry::standard();
        let apply = functions
            .apply(
                "urn:oasis:names:tc:xacml:1.0:function:and",
                vec![
                    Expression::Variable(VariableReference::new("a")),
                    Expression::Variable(VariableReference::new("b")),
                ],
            )
            .unwrap();
        assert_eq!(apply.static_type(), Some((DataType::Boolean, false)));
        let mut refs = Vec::new();
        apply.variable_references(&mut refs);
        assert_eq!(refs, vec!["a", "b"]);
    }
}
