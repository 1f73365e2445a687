//! Higher-order bag functions.
//!
//! The first argument is the function applied to bag members. `any-of`,
//! `all-of` and `map` take further single values plus exactly one bag, in
//! any position; the bag's members are substituted into that position one
//! at a time.

use super::{Arity, Computed, FunctionArgument, FunctionDefinition, failure, finish, standard_id};
use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use std::sync::Arc;
use verdict_core::{AttributeValue, Bag, DataType, Identifier, Status};

/// How member results are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// True if the predicate holds for some member
    AnyOf,
    /// True if the predicate holds for every member
    AllOf,
    /// True if the predicate holds for some combination of members
    AnyOfAny,
    /// Every member of the first bag satisfies the predicate with some
    /// member of the second
    AllOfAny,
    /// Some member of the first bag satisfies the predicate with every
    /// member of the second
    AnyOfAll,
    /// Every pair of members satisfies the predicate
    AllOfAll,
    /// Bag of the function applied to each member
    Map,
}

impl Quantifier {
    /// All quantifiers
    pub const ALL: [Quantifier; 7] = [
        Self::AnyOf,
        Self::AllOf,
        Self::AnyOfAny,
        Self::AllOfAny,
        Self::AnyOfAll,
        Self::AllOfAll,
        Self::Map,
    ];

    const fn name(&self) -> &'static str {
        match self {
            Self::AnyOf => "any-of",
            Self::AllOf => "all-of",
            Self::AnyOfAny => "any-of-any",
            Self::AllOfAny => "all-of-any",
            Self::AnyOfAll => "any-of-all",
            Self::AllOfAll => "all-of-all",
            Self::Map => "map",
        }
    }

    const fn version(&self) -> &'static str {
        match self {
            Self::AllOfAny | Self::AnyOfAll | Self::AllOfAll => "1.0",
            _ => "3.0",
        }
    }
}

/// Higher-order function
#[derive(Debug, Clone)]
pub struct HigherOrder {
    id: Identifier,
    quantifier: Quantifier,
}

impl HigherOrder {
    /// Create a standard higher-order function
    #[must_use]
    pub fn new(quantifier: Quantifier) -> Self {
        Self {
            id: standard_id(quantifier.version(), quantifier.name()),
            quantifier,
        }
    }

    fn function_arg<'a>(&self, args: &'a [FunctionArgument]) -> Result<&'a Arc<dyn FunctionDefinition>, Status> {
        match args.first() {
            Some(FunctionArgument::Function(function)) => Ok(function),
            _ => Err(failure(&self.id, "Expected a function at arg index 0")),
        }
    }

    fn bag_arg<'a>(&self, args: &'a [FunctionArgument], index: usize) -> Result<&'a Bag, Status> {
        match args.get(index) {
            Some(FunctionArgument::Bag(bag)) => Ok(bag),
            _ => Err(failure(&self.id, format!("Expected a bag at arg index {}", index))),
        }
    }

    fn predicate(
        &self,
        ctx: &dyn EvaluationContext,
        function: &Arc<dyn FunctionDefinition>,
        args: &[FunctionArgument],
    ) -> Result<bool, Status> {
        match function.evaluate(ctx, args) {
            ExpressionResult::Error(status) => Err(status),
            ExpressionResult::Value(value) => value.as_bool().ok_or_else(|| self.not_boolean(function)),
            ExpressionResult::Bag(_) => Err(self.not_boolean(function)),
        }
    }

    fn not_boolean(&self, function: &Arc<dyn FunctionDefinition>) -> Status {
        failure(
            &self.id,
            format!("Expected a boolean result from {}", function.id().short_name()),
        )
    }

    /// The single bag among the non-function arguments, and its position
    fn single_bag<'a>(&self, rest: &'a [FunctionArgument]) -> Result<(usize, &'a Bag), Status> {
        let bags: Vec<(usize, &Bag)> = rest
            .iter()
            .enumerate()
            .filter_map(|(i, a)| match a {
                FunctionArgument::Bag(bag) => Some((i, bag)),
                _ => None,
            })
            .collect();
        match bags.as_slice() {
            [single] => Ok(*single),
            other => Err(failure(
                &self.id,
                format!("Expected exactly one bag argument, got {}", other.len()),
            )),
        }
    }

    /// Argument lists with each member of the bag substituted in turn
    fn substitutions(&self, rest: &[FunctionArgument]) -> Result<Vec<Vec<FunctionArgument>>, Status> {
        let (position, bag) = self.single_bag(rest)?;
        Ok(bag
            .iter()
            .map(|member| {
                let mut call = rest.to_vec();
                call[position] = FunctionArgument::Value(member.clone());
                call
            })
            .collect())
    }

    fn any_combination(
        &self,
        ctx: &dyn EvaluationContext,
        function: &Arc<dyn FunctionDefinition>,
        remaining: &[FunctionArgument],
        index: usize,
        current: &mut Vec<FunctionArgument>,
    ) -> Result<bool, Status> {
        let Some((first, rest)) = remaining.split_first() else {
            return self.predicate(ctx, function, current);
        };
        let members: Vec<_> = match first {
            FunctionArgument::Value(value) => vec![value.clone()],
            FunctionArgument::Bag(bag) => bag.iter().cloned().collect(),
            FunctionArgument::Function(_) => {
                return Err(failure(
                    &self.id,
                    format!("Expected a value or bag at arg index {}", index),
                ));
            }
        };
        for member in members {
            current.push(FunctionArgument::Value(member));
            let found = self.any_combination(ctx, function, rest, index + 1, current);
            current.pop();
            if found? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn compute(&self, ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let function = self.function_arg(args)?;
        let rest = &args[1..];

        let holds = match self.quantifier {
            Quantifier::AnyOf => {
                let mut any = false;
                for call in self.substitutions(rest)? {
                    if self.predicate(ctx, function, &call)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            Quantifier::AllOf => {
                let mut all = true;
                for call in self.substitutions(rest)? {
                    if !self.predicate(ctx, function, &call)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            Quantifier::AnyOfAny => self.any_combination(ctx, function, rest, 1, &mut Vec::new())?,
            Quantifier::AllOfAny | Quantifier::AnyOfAll | Quantifier::AllOfAll => {
                let left = self.bag_arg(args, 1)?;
                let right = self.bag_arg(args, 2)?;
                self.pairwise(ctx, function, left, right)?
            }
            Quantifier::Map => return self.map(ctx, function, rest),
        };
        Ok(ExpressionResult::boolean(holds))
    }

    fn pairwise(
        &self,
        ctx: &dyn EvaluationContext,
        function: &Arc<dyn FunctionDefinition>,
        left: &Bag,
        right: &Bag,
    ) -> Result<bool, Status> {
        let holds = |a: &AttributeValue, b: &AttributeValue| {
            self.predicate(
                ctx,
                function,
                &[FunctionArgument::Value(a.clone()), FunctionArgument::Value(b.clone())],
            )
        };
        for a in left {
            let mut any = false;
            let mut all = true;
            for b in right {
                if holds(a, b)? {
                    any = true;
                } else {
                    all = false;
                }
            }
            match self.quantifier {
                Quantifier::AllOfAny if !any => return Ok(false),
                Quantifier::AnyOfAll if all => return Ok(true),
                Quantifier::AllOfAll if !all => return Ok(false),
                _ => {}
            }
        }
        Ok(self.quantifier != Quantifier::AnyOfAll)
    }

    fn map(
        &self,
        ctx: &dyn EvaluationContext,
        function: &Arc<dyn FunctionDefinition>,
        rest: &[FunctionArgument],
    ) -> Computed {
        let calls = self.substitutions(rest)?;
        let mut values = Vec::with_capacity(calls.len());
        for call in calls {
            match function.evaluate(ctx, &call) {
                ExpressionResult::Value(value) => values.push(value),
                ExpressionResult::Error(status) => return Err(status),
                ExpressionResult::Bag(_) => {
                    return Err(failure(
                        &self.id,
                        format!("Expected a single value from {}", function.id().short_name()),
                    ));
                }
            }
        }
        let data_type = values
            .first()
            .map(|v| v.data_type())
            .or_else(|| function.return_type())
            .unwrap_or(DataType::String);
        let bag = Bag::from_values(data_type, values).map_err(|e| failure(&self.id, e.to_string()))?;
        Ok(ExpressionResult::Bag(bag))
    }
}

impl FunctionDefinition for HigherOrder {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn return_type(&self) -> Option<DataType> {
        match self.quantifier {
            Quantifier::Map => None,
            _ => Some(DataType::Boolean),
        }
    }

    fn returns_bag(&self) -> bool {
        self.quantifier == Quantifier::Map
    }

    fn arity(&self) -> Arity {
        match self.quantifier {
            Quantifier::AllOfAny | Quantifier::AnyOfAll | Quantifier::AllOfAll => Arity::Exactly(3),
            _ => Arity::AtLeast(2),
        }
    }

    fn evaluate(&self, ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult {
        finish(self.compute(ctx, args))
    }
}
