//! Boolean connectives: `and`, `or`, `not`, `n-of`.

use super::{Arity, Computed, FunctionArgument, FunctionDefinition, boolean_at, failure, finish, standard_id, value_at};
use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use verdict_core::{DataType, Identifier};

/// Logical operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// True when every argument is true; true for no arguments
    And,
    /// True when some argument is true; false for no arguments
    Or,
    /// Negation of the single argument
    Not,
    /// True when at least `n` of the remaining arguments are true
    NOf,
}

impl LogicalOperator {
    /// All operators
    pub const ALL: [LogicalOperator; 4] = [Self::And, Self::Or, Self::Not, Self::NOf];

    const fn name(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::NOf => "n-of",
        }
    }
}

/// Logical function
#[derive(Debug, Clone)]
pub struct Logical {
    id: Identifier,
    operator: LogicalOperator,
}

impl Logical {
    /// Create a standard logical function
    #[must_use]
    pub fn new(operator: LogicalOperator) -> Self {
        Self {
            id: standard_id("1.0", operator.name()),
            operator,
        }
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let result = match self.operator {
            LogicalOperator::And => {
                let mut all = true;
                for index in 0..args.len() {
                    all &= boolean_at(&self.id, args, index)?;
                }
                all
            }
            LogicalOperator::Or => {
                let mut any = false;
                for index in 0..args.len() {
                    any |= boolean_at(&self.id, args, index)?;
                }
                any
            }
            LogicalOperator::Not => !boolean_at(&self.id, args, 0)?,
            LogicalOperator::NOf => {
                let required = value_at(&self.id, args, 0, DataType::Integer)?
                    .as_integer()
                    .unwrap_or_default();
                let available = args.len() - 1;
                let required = usize::try_from(required)
                    .map_err(|_| failure(&self.id, format!("Negative count {}", required)))?;
                if required > available {
                    return Err(failure(
                        &self.id,
                        format!("Count {} exceeds the {} remaining arguments", required, available),
                    ));
                }
                let mut satisfied = 0;
                for index in 1..args.len() {
                    if boolean_at(&self.id, args, index)? {
                        satisfied += 1;
                    }
                }
                satisfied >= required
            }
        };
        Ok(ExpressionResult::boolean(result))
    }
}

impl FunctionDefinition for Logical {
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
        match self.operator {
            LogicalOperator::NOf => None,
            _ => Some(DataType::Boolean),
        }
    }

    fn arity(&self) -> Arity {
        match self.operator {
            LogicalOperator::And | LogicalOperator::Or => Arity::AtLeast(0),
            LogicalOperator::Not => Arity::Exactly(1),
            LogicalOperator::NOf => Arity::AtLeast(1),
        }
    }

    fn evaluate(&self, _ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult {
        finish(self.compute(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use verdict_core::AttributeValue;

    fn bools(values: &[bool]) -> Vec<FunctionArgument> {
        values
            .iter()
            .map(|b| FunctionArgument::Value(AttributeValue::boolean(*b)))
            .collect()
    }

    #[test]
    fn test_and_or() {
        let and = Logical::new(LogicalOperator::And);
        let or = Logical::new(LogicalOperator::Or);
        assert_eq!(testing::call(&and, bools(&[])), ExpressionResult::boolean(true));
        assert_eq!(testing::call(&or, bools(&[])), ExpressionResult::boolean(false));
        assert_eq!(testing::call(&and, bools(&[true, false])), ExpressionResult::boolean(false));
        assert_eq!(testing::call(&or, bools(&[false, true])), ExpressionResult::boolean(true));
    }

    #[test]
    fn test_not() {
        let not = Logical::new(LogicalOperator::Not);
        assert_eq!(testing::call(&not, bools(&[true])), ExpressionResult::boolean(false));
        let result = testing::call(&not, bools(&[true, true]));
        assert_eq!(
            result.status().message.as_deref(),
            Some("function:not Expected 1 arguments, got 2")
        );
    }

    #[test]
    fn test_n_of() {
        let n_of = Logical::new(LogicalOperator::NOf);
        let call = |n: i64, rest: &[bool]| {
            let mut args = vec![FunctionArgument::Value(AttributeValue::integer(n))];
            args.extend(bools(rest));
            testing::call(&n_of, args)
        };
        assert_eq!(call(0, &[]), ExpressionResult::boolean(true));
        assert_eq!(call(2, &[true, false, true]), ExpressionResult::boolean(true));
        assert_eq!(call(3, &[true, false, true]), ExpressionResult::boolean(false));
        assert_eq!(
            call(4, &[true]).status().message.as_deref(),
            Some("function:n-of Count 4 exceeds the 1 remaining arguments")
        );
        assert!(!call(-1, &[true]).is_ok());
    }

    #[test]
    fn test_non_boolean_argument() {
        let and = Logical::new(LogicalOperator::And);
        let result = testing::call(
            &and,
            vec![
                FunctionArgument::Value(AttributeValue::boolean(true)),
                FunctionArgument::Value(AttributeValue::string("yes")),
            ],
        );
        assert_eq!(
            result.status().message.as_deref(),
            Some("function:and Expected data type 'boolean' saw 'string' at arg index 1")
        );
    }
}
