//! Bag functions: `*-one-and-only`, `*-bag-size`, `*-is-in`, `*-bag`.

use super::{
    Arity, Computed, FunctionArgument, FunctionDefinition, bag_at, bag_contains, failure, finish,
    standard_id, value_at,
};
use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use verdict_core::{AttributeValue, Bag, DataType, Identifier};

/// Bag operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BagOperation {
    /// Sole value of a single-element bag
    OneAndOnly,
    /// Number of values in a bag
    BagSize,
    /// Whether a value is in a bag
    IsIn,
    /// Bag built from the arguments
    Bag,
}

impl BagOperation {
    /// All operations
    pub const ALL: [BagOperation; 4] = [Self::OneAndOnly, Self::BagSize, Self::IsIn, Self::Bag];

    const fn suffix(&self) -> &'static str {
        match self {
            Self::OneAndOnly => "one-and-only",
            Self::BagSize => "bag-size",
            Self::IsIn => "is-in",
            Self::Bag => "bag",
        }
    }
}

/// `<type>-<operation>` bag function
#[derive(Debug, Clone)]
pub struct BagFunction {
    id: Identifier,
    data_type: DataType,
    operation: BagOperation,
}

impl BagFunction {
    /// Create a standard bag function
    #[must_use]
    pub fn new(data_type: DataType, operation: BagOperation) -> Self {
        Self {
            id: standard_id(
                data_type.function_version(),
                &format!("{}-{}", data_type.short_name(), operation.suffix()),
            ),
            data_type,
            operation,
        }
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        match self.operation {
            BagOperation::OneAndOnly => {
                let bag = bag_at(&self.id, args, 0, self.data_type)?;
                match bag.single() {
                    Some(value) => Ok(ExpressionResult::Value(value.clone())),
                    None => Err(failure(
                        &self.id,
                        format!("Expected a bag with a single value, got {}", bag.len()),
                    )),
                }
            }
            BagOperation::BagSize => {
                let bag = bag_at(&self.id, args, 0, self.data_type)?;
                let size = i64::try_from(bag.len())
                    .map_err(|_| failure(&self.id, "Bag size out of range"))?;
                Ok(ExpressionResult::Value(AttributeValue::integer(size)))
            }
            BagOperation::IsIn => {
                let value = value_at(&self.id, args, 0, self.data_type)?;
                let bag = bag_at(&self.id, args, 1, self.data_type)?;
                Ok(ExpressionResult::boolean(bag_contains(&self.id, bag, value)?))
            }
            BagOperation::Bag => {
                let mut bag = Bag::new(self.data_type);
                for index in 0..args.len() {
                    bag.add(value_at(&self.id, args, index, self.data_type)?.clone());
                }
                Ok(ExpressionResult::Bag(bag))
            }
        }
    }
}

impl FunctionDefinition for BagFunction {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn return_type(&self) -> Option<DataType> {
        Some(match self.operation {
            BagOperation::OneAndOnly | BagOperation::Bag => self.data_type,
            BagOperation::BagSize => DataType::Integer,
            BagOperation::IsIn => DataType::Boolean,
        })
    }

    fn returns_bag(&self) -> bool {
        self.operation == BagOperation::Bag
    }

    fn argument_type(&self) -> Option<DataType> {
        Some(self.data_type)
    }

    fn arity(&self) -> Arity {
        match self.operation {
            BagOperation::OneAndOnly | BagOperation::BagSize => Arity::Exactly(1),
            BagOperation::IsIn => Arity::Exactly(2),
            BagOperation::Bag => Arity::AtLeast(0),
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

    fn int_bag(values: &[i64]) -> FunctionArgument {
        FunctionArgument::Bag(
            Bag::from_values(
                DataType::Integer,
                values.iter().copied().map(AttributeValue::integer).collect(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_one_and_only() {
        let f = BagFunction::new(DataType::Integer, BagOperation::OneAndOnly);
        assert_eq!(
            f.id().as_str(),
            "urn:oasis:names:tc:xacml:1.0:function:integer-one-and-only"
        );
        assert_eq!(
            testing::call(&f, vec![int_bag(&[4])]),
            ExpressionResult::Value(AttributeValue::integer(4))
        );
        let result = testing::call(&f, vec![int_bag(&[4, 5])]);
        assert_eq!(
            result.status().message.as_deref(),
            Some("function:integer-one-and-only Expected a bag with a single value, got 2")
        );
        let result = testing::call(&f, vec![int_bag(&[])]);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_bag_size() {
        let f = BagFunction::new(DataType::Integer, BagOperation::BagSize);
        assert_eq!(
            testing::call(&f, vec![int_bag(&[1, 1, 2])]),
            ExpressionResult::Value(AttributeValue::integer(3))
        );
        assert_eq!(
            testing::call(&f, vec![int_bag(&[])]),
            ExpressionResult::Value(AttributeValue::integer(0))
        );
    }

    #[test]
    fn test_is_in() {
        let f = BagFunction::new(DataType::Integer, BagOperation::IsIn);
        let value = |v| FunctionArgument::Value(AttributeValue::integer(v));
        assert_eq!(
            testing::call(&f, vec![value(2), int_bag(&[1, 2])]),
            ExpressionResult::boolean(true)
        );
        assert_eq!(
            testing::call(&f, vec![value(3), int_bag(&[1, 2])]),
            ExpressionResult::boolean(false)
        );
        let result = testing::call(&f, vec![value(3), value(3)]);
        assert_eq!(
            result.status().message.as_deref(),
            Some("function:integer-is-in Expected a bag at arg index 1")
        );
    }

    #[test]
    fn test_bag_constructor() {
        let f = BagFunction::new(DataType::String, BagOperation::Bag);
        assert!(f.returns_bag());
        let result = testing::call(
            &f,
            vec![
                FunctionArgument::Value("b".into()),
                FunctionArgument::Value("a".into()),
            ],
        );
        let expected = Bag::from_values(DataType::String, vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(result, ExpressionResult::Bag(expected));
        assert_eq!(
            testing::call(&f, vec![]),
            ExpressionResult::Bag(Bag::new(DataType::String))
        );

        let result = testing::call(
            &f,
            vec![
                FunctionArgument::Value("a".into()),
                FunctionArgument::Value(AttributeValue::integer(1)),
            ],
        );
        assert_eq!(
            result.status().message.as_deref(),
            Some("function:string-bag Expected data type 'string' saw 'integer' at arg index 1")
        );
    }

    #[test]
    fn test_versioned_ids() {
        assert_eq!(
            BagFunction::new(DataType::IpAddress, BagOperation::Bag).id().as_str(),
            "urn:oasis:names:tc:xacml:2.0:function:ipAddress-bag"
        );
        assert_eq!(
            BagFunction::new(DataType::YearMonthDuration, BagOperation::BagSize).id().as_str(),
            "urn:oasis:names:tc:xacml:3.0:function:yearMonthDuration-bag-size"
        );
    }
}
