//! Set functions over bags, treating them as sets of distinct values.

use super::{
    Arity, Computed, FunctionArgument, FunctionDefinition, bag_at, bag_contains, finish,
    standard_id,
};
use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use verdict_core::{Bag, DataType, Identifier, Status};

/// Set operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperation {
    /// Distinct values present in both bags
    Intersection,
    /// Whether the bags share at least one value
    AtLeastOneMemberOf,
    /// Distinct values present in any bag
    Union,
    /// Whether every value of the first bag is in the second
    Subset,
    /// Whether both bags hold the same distinct values
    SetEquals,
}

impl SetOperation {
    /// All operations
    pub const ALL: [SetOperation; 5] = [
        Self::Intersection,
        Self::AtLeastOneMemberOf,
        Self::Union,
        Self::Subset,
        Self::SetEquals,
    ];

    const fn suffix(&self) -> &'static str {
        match self {
            Self::Intersection => "intersection",
            Self::AtLeastOneMemberOf => "at-least-one-member-of",
            Self::Union => "union",
            Self::Subset => "subset",
            Self::SetEquals => "set-equals",
        }
    }
}

/// `<type>-<operation>` set function
#[derive(Debug, Clone)]
pub struct SetFunction {
    id: Identifier,
    data_type: DataType,
    operation: SetOperation,
}

impl SetFunction {
    /// Create a standard set function
    #[must_use]
    pub fn new(data_type: DataType, operation: SetOperation) -> Self {
        Self {
            id: standard_id(
                data_type.function_version(),
                &format!("{}-{}", data_type.short_name(), operation.suffix()),
            ),
            data_type,
            operation,
        }
    }

    fn is_subset(&self, left: &Bag, right: &Bag) -> Result<bool, Status> {
        for value in left {
            if !bag_contains(&self.id, right, value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn insert_distinct(&self, out: &mut Bag, bag: &Bag) -> Result<(), Status> {
        for value in bag {
            if !bag_contains(&self.id, out, value)? {
                out.add(value.clone());
            }
        }
        Ok(())
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let mut bags = Vec::with_capacity(args.len());
        for index in 0..args.len() {
            bags.push(bag_at(&self.id, args, index, self.data_type)?);
        }
        let (left, right) = (bags[0], bags[1]);

        match self.operation {
            SetOperation::Intersection => {
                let mut out = Bag::new(self.data_type);
                for value in left {
                    if bag_contains(&self.id, right, value)? && !bag_contains(&self.id, &out, value)? {
                        out.add(value.clone());
                    }
                }
                Ok(ExpressionResult::Bag(out))
            }
            SetOperation::AtLeastOneMemberOf => {
                for value in left {
                    if bag_contains(&self.id, right, value)? {
                        return Ok(ExpressionResult::boolean(true));
                    }
                }
                Ok(ExpressionResult::boolean(false))
            }
            SetOperation::Union => {
                let mut out = Bag::new(self.data_type);
                for bag in bags {
                    self.insert_distinct(&mut out, bag)?;
                }
                Ok(ExpressionResult::Bag(out))
            }
            SetOperation::Subset => Ok(ExpressionResult::boolean(self.is_subset(left, right)?)),
            SetOperation::SetEquals => Ok(ExpressionResult::boolean(
                self.is_subset(left, right)? && self.is_subset(right, left)?,
            )),
        }
    }
}

impl FunctionDefinition for SetFunction {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn return_type(&self) -> Option<DataType> {
        Some(match self.operation {
            SetOperation::Intersection | SetOperation::Union => self.data_type,
            _ => DataType::Boolean,
        })
    }

    fn returns_bag(&self) -> bool {
        matches!(self.operation, SetOperation::Intersection | SetOperation::Union)
    }

    fn argument_type(&self) -> Option<DataType> {
        Some(self.data_type)
    }

    fn arity(&self) -> Arity {
        match self.operation {
            SetOperation::Union => Arity::AtLeast(2),
            _ => Arity::Exactly(2),
        }
    }

    fn evaluate(&self, _ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult {
        finish(self.compute(args))
    }
}
