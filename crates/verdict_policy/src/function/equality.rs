//! `*-equal` functions.

use super::{Arity, Computed, FunctionArgument, FunctionDefinition, failure, finish, standard_id, value_at};
use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use verdict_core::{AttributeValue, DataType, Identifier};

/// Equality of two values of one data type
#[derive(Debug, Clone)]
pub struct Equal {
    id: Identifier,
    data_type: DataType,
    ignore_case: bool,
}

impl Equal {
    /// Standard `<type>-equal` function
    #[must_use]
    pub fn new(data_type: DataType) -> Self {
        Self {
            id: standard_id(
                data_type.function_version(),
                &format!("{}-equal", data_type.short_name()),
            ),
            data_type,
            ignore_case: false,
        }
    }

    /// `string-equal-ignore-case`
    #[must_use]
    pub fn string_ignore_case() -> Self {
        Self {
            id: standard_id("3.0", "string-equal-ignore-case"),
            data_type: DataType::String,
            ignore_case: true,
        }
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let left = value_at(&self.id, args, 0, self.data_type)?;
        let right = value_at(&self.id, args, 1, self.data_type)?;
        let equal = match (left, right) {
            (AttributeValue::String(l), AttributeValue::String(r)) if self.ignore_case => {
                l.to_lowercase() == r.to_lowercase()
            }
            _ => left
                .equals(right)
                .map_err(|e| failure(&self.id, e.to_string()))?,
        };
        Ok(ExpressionResult::boolean(equal))
    }
}

impl FunctionDefinition for Equal {
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
