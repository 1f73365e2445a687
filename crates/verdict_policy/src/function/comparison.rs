//! Ordering comparisons and `time-in-range`.

use super::{Arity, Computed, FunctionArgument, FunctionDefinition, failure, finish, standard_id, value_at};
use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use std::cmp::Ordering;
use verdict_core::{AttributeValue, DataType, Identifier};

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
}

impl ComparisonOperator {
    /// All operators
    pub const ALL: [ComparisonOperator; 4] = [
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
    ];

    const fn suffix(&self) -> &'static str {
        match self {
            Self::GreaterThan => "greater-than",
            Self::GreaterThanOrEqual => "greater-than-or-equal",
            Self::LessThan => "less-than",
            Self::LessThanOrEqual => "less-than-or-equal",
        }
    }

    const fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::GreaterThan => matches!(ordering, Ordering::Greater),
            Self::GreaterThanOrEqual => !matches!(ordering, Ordering::Less),
            Self::LessThan => matches!(ordering, Ordering::Less),
            Self::LessThanOrEqual => !matches!(ordering, Ordering::Greater),
        }
    }
}

/// `<type>-<operator>` over one of the ordered data types
#[derive(Debug, Clone)]
pub struct Comparison {
    id: Identifier,
    data_type: DataType,
    operator: ComparisonOperator,
}

impl Comparison {
    /// Data types with a total ordering
    pub const ORDERED_TYPES: [DataType; 6] = [
        DataType::Integer,
        DataType::Double,
        DataType::String,
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
    ];

    /// Create a standard comparison function
    #[must_use]
    pub fn new(data_type: DataType, operator: ComparisonOperator) -> Self {
        Self {
            id: standard_id(
                "1.0",
                &format!("{}-{}", data_type.short_name(), operator.suffix()),
            ),
            data_type,
            operator,
        }
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let left = value_at(&self.id, args, 0, self.data_type)?;
        let right = value_at(&self.id, args, 1, self.data_type)?;
        let ordering = left
            .compare(right)
            .map_err(|e| failure(&self.id, e.to_string()))?;
        Ok(ExpressionResult::boolean(self.operator.holds(ordering)))
    }
}

impl FunctionDefinition for Comparison {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn return_type(&self) -> Option<DataType> {
        Some(DataType::Boolean)
    }

    fn returns_bag(&self) -> bool {
        false
    }

    fn argument_type(&self) -> Option<DataType> {
        Some(self.data_type)
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn evaluate(&self, _ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult {
        finish(self.compute(args))
    }
}

/// `time-in-range(time, lower, upper)`
///
/// True when `time` lies in `[lower, upper]`. An upper bound earlier than
/// the lower bound wraps the range past midnight.
#[derive(Debug, Clone)]
pub struct TimeInRange {
    id: Identifier,
}

impl TimeInRange {
    /// Create the function
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: standard_id("2.0", "time-in-range"),
        }
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let time = value_at(&self.id, args, 0, DataType::Time)?;
        let lower = value_at(&self.id, args, 1, DataType::Time)?;
        let upper = value_at(&self.id, args, 2, DataType::Time)?;
        let cmp = |a: &AttributeValue, b: &AttributeValue| {
            a.compare(b).map_err(|e| failure(&self.id, e.to_string()))
        };

        let after_lower = cmp(time, lower)? != Ordering::Less;
        let before_upper = cmp(time, upper)? != Ordering::Greater;
        let in_range = if cmp(lower, upper)? == Ordering::Greater {
            after_lower || before_upper
        } else {
            after_lower && before_upper
        };
        Ok(ExpressionResult::boolean(in_range))
    }
}

impl Default for TimeInRange {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionDefinition for TimeInRange {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn return_type(&self) -> Option<DataType> {
        Some(DataType::Boolean)
    }

    fn returns_bag(&self) -> bool {
        false
    }

    fn argument_type(&self) -> Option<DataType> {
        Some(DataType::Time)
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(3)
    }

    fn evaluate(&self, _ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult {
        finish(self.compute(args))
    }
}
