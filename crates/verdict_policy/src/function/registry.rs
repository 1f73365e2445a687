//! Function registry keyed by function id.

use super::{
    BagFunction, BagOperation, Comparison, ComparisonOperator, Equal, FunctionDefinition,
    HigherOrder, Logical, LogicalOperator, Quantifier, RegexpMatch, Rfc822NameMatch, SetFunction,
    SetOperation, TimeInRange, X500NameMatch,
};
use crate::error::PolicyError;
use crate::expression::{Apply, Expression};
use indexmap::IndexMap;
use std::sync::Arc;
use verdict_core::{DataType, Identifier};

/// Registry of functions available to policies
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: IndexMap<Identifier, Arc<dyn FunctionDefinition>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
        }
    }

    /// Registry holding every standard function shape
    #[must_use]
    pub fn standard() -> Self {
        let mut functions: Vec<Arc<dyn FunctionDefinition>> = Vec::new();

        for data_type in DataType::ALL {
            let has_equality = !matches!(data_type, DataType::IpAddress | DataType::DnsName);
            if has_equality {
                functions.push(Arc::new(Equal::new(data_type)));
            }
            for operation in BagOperation::ALL {
                functions.push(Arc::new(BagFunction::new(data_type, operation)));
            }
            if has_equality {
                for operation in SetOperation::ALL {
                    functions.push(Arc::new(SetFunction::new(data_type, operation)));
                }
            }
        }
        functions.push(Arc::new(Equal::string_ignore_case()));

        for data_type in Comparison::ORDERED_TYPES {
            for operator in ComparisonOperator::ALL {
                functions.push(Arc::new(Comparison::new(data_type, operator)));
            }
        }
        functions.push(Arc::new(TimeInRange::new()));

        for quantifier in Quantifier::ALL {
            functions.push(Arc::new(HigherOrder::new(quantifier)));
        }
        for operator in LogicalOperator::ALL {
            functions.push(Arc::new(Logical::new(operator)));
        }

        for data_type in RegexpMatch::MATCHABLE_TYPES {
            functions.push(Arc::new(RegexpMatch::new(data_type)));
        }
        functions.push(Arc::new(Rfc822NameMatch::new()));
        functions.push(Arc::new(X500NameMatch::new()));

        let mut registry = Self::new();
        for function in functions {
            registry
                .functions
                .insert(function.id().clone(), function);
        }
        registry
    }

    /// Register a function
    ///
    /// # Errors
    ///
    /// Returns error if a function with the same id is already registered
    pub fn register(&mut self, function: Arc<dyn FunctionDefinition>) -> Result<(), PolicyError> {
        if self.functions.contains_key(function.id()) {
            return Err(PolicyError::DuplicateFunction(function.id().clone()));
        }
        tracing::debug!(function = %function.id(), "registered function");
        self.functions.insert(function.id().clone(), function);
        Ok(())
    }

    /// Look up a function
    #[must_use]
    pub fn get(&self, id: &Identifier) -> Option<Arc<dyn FunctionDefinition>> {
        self.functions.get(id).cloned()
    }

    /// Look up a function that must exist
    ///
    /// # Errors
    ///
    /// Returns error if no function has this id
    pub fn function(&self, id: &Identifier) -> Result<Arc<dyn FunctionDefinition>, PolicyError> {
        self.get(id)
            .ok_or_else(|| PolicyError::UnknownFunction(id.clone()))
    }

    /// Build an `Apply` of the function `id` to `arguments`
    ///
    /// # Errors
    ///
    /// Returns error if no function has this id
    pub fn apply(&self, id: &str, arguments: Vec<Expression>) -> Result<Expression, PolicyError> {
        let function = self.function(&Identifier::new(id))?;
        Ok(Expression::Apply(Apply::new(function, arguments)))
    }

    /// Check whether a function is registered
    #[must_use]
    pub fn contains(&self, id: &Identifier) -> bool {
        self.functions.contains_key(id)
    }

    /// Number of registered functions
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
