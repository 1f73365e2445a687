//! Function framework.
//!
//! Every function declares its id, return type, arity and (for homogeneous
//! functions) argument data type. Argument count and types are checked
//! before computing; failures come back as processing-error statuses whose
//! message starts with the short function id, e.g.
//! `function:time-in-range Expected 3 arguments, got 2`.

mod bag;
mod comparison;
mod equality;
mod higher_order;
mod logical;
mod matching;
mod registry;
mod set;

pub use bag::{BagFunction, BagOperation};
pub use comparison::{Comparison, ComparisonOperator, TimeInRange};
pub use equality::Equal;
pub use higher_order::{HigherOrder, Quantifier};
pub use logical::{Logical, LogicalOperator};
pub use matching::{RegexpMatch, Rfc822NameMatch, X500NameMatch};
pub use registry::FunctionRegistry;
pub use set::{SetFunction, SetOperation};

use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use std::sync::Arc;
use verdict_core::{AttributeValue, Bag, DataType, Identifier, Status};

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many
    Exactly(usize),
    /// This many or more
    AtLeast(usize),
}

impl Arity {
    /// Check whether `count` arguments are acceptable
    #[must_use]
    pub const fn accepts(&self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == *n,
            Self::AtLeast(n) => count >= *n,
        }
    }
}

/// Argument passed to a function
#[derive(Debug, Clone)]
pub enum FunctionArgument {
    /// Single value
    Value(AttributeValue),
    /// Bag of values
    Bag(Bag),
    /// Function, for higher-order functions
    Function(Arc<dyn FunctionDefinition>),
}

/// Callable mapping arguments to a value or bag
pub trait FunctionDefinition: Send + Sync + std::fmt::Debug {
    /// Function id
    fn id(&self) -> &Identifier;

    /// Data type of the result; `None` when it depends on the arguments
    fn return_type(&self) -> Option<DataType>;

    /// Whether the result is a bag
    fn returns_bag(&self) -> bool;

    /// Data type shared by all arguments, if the function is homogeneous
    fn argument_type(&self) -> Option<DataType> {
        None
    }

    /// Accepted argument count
    fn arity(&self) -> Arity;

    /// Apply the function
    fn evaluate(&self, ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult;
}

/// Intermediate result of a function body; the error is already prefixed
pub(crate) type Computed = Result<ExpressionResult, Status>;

/// Flatten a function body result
pub(crate) fn finish(computed: Computed) -> ExpressionResult {
    computed.unwrap_or_else(ExpressionResult::Error)
}

/// Processing error prefixed with the short function id
pub(crate) fn failure(id: &Identifier, message: impl Into<String>) -> Status {
    Status::processing_error(message).with_prefix(&format!("function:{}", id.short_name()))
}

/// Check the argument count
pub(crate) fn check_arity(id: &Identifier, arity: Arity, args: &[FunctionArgument]) -> Result<(), Status> {
    if arity.accepts(args.len()) {
        return Ok(());
    }
    let message = match arity {
        Arity::Exactly(n) => format!("Expected {} arguments, got {}", n, args.len()),
        Arity::AtLeast(n) => format!("Expected at least {} arguments, got {}", n, args.len()),
    };
    Err(failure(id, message))
}

fn type_mismatch(id: &Identifier, expected: DataType, actual: DataType, index: usize) -> Status {
    failure(
        id,
        format!(
            "Expected data type '{}' saw '{}' at arg index {}",
            expected, actual, index
        ),
    )
}

/// Single value of the expected type at `index`
pub(crate) fn value_at<'a>(
    id: &Identifier,
    args: &'a [FunctionArgument],
    index: usize,
    expected: DataType,
) -> Result<&'a AttributeValue, Status> {
    match args.get(index) {
        Some(FunctionArgument::Value(value)) if value.data_type() == expected => Ok(value),
        Some(FunctionArgument::Value(value)) => {
            Err(type_mismatch(id, expected, value.data_type(), index))
        }
        Some(_) => Err(failure(id, format!("Expected a single value at arg index {}", index))),
        None => Err(failure(id, format!("Missing argument at arg index {}", index))),
    }
}

/// Bag of the expected type at `index`
pub(crate) fn bag_at<'a>(
    id: &Identifier,
    args: &'a [FunctionArgument],
    index: usize,
    expected: DataType,
) -> Result<&'a Bag, Status> {
    match args.get(index) {
        Some(FunctionArgument::Bag(bag)) if bag.data_type() == expected => Ok(bag),
        Some(FunctionArgument::Bag(bag)) => Err(type_mismatch(id, expected, bag.data_type(), index)),
        Some(_) => Err(failure(id, format!("Expected a bag at arg index {}", index))),
        None => Err(failure(id, format!("Missing argument at arg index {}", index))),
    }
}

/// Boolean payload of a value already checked to be a boolean
pub(crate) fn boolean_at(id: &Identifier, args: &[FunctionArgument], index: usize) -> Result<bool, Status> {
    let value = value_at(id, args, index, DataType::Boolean)?;
    value
        .as_bool()
        .ok_or_else(|| type_mismatch(id, DataType::Boolean, value.data_type(), index))
}

/// Check whether `bag` holds a value equal to `value` under the data
/// type's equality
pub(crate) fn bag_contains(id: &Identifier, bag: &Bag, value: &AttributeValue) -> Result<bool, Status> {
    for member in bag {
        if member.equals(value).map_err(|e| failure(id, e.to_string()))? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Function id under the standard XACML prefix for `version`
pub(crate) fn standard_id(version: &str, name: &str) -> Identifier {
    Identifier::from(format!("{}{}", verdict_core::xacml::function_prefix(version), name))
}
