//! Pattern matching functions: `*-regexp-match`, `rfc822Name-match`,
//! `x500Name-match`.

use super::{Arity, Computed, FunctionArgument, FunctionDefinition, failure, finish, standard_id, value_at};
use crate::context::EvaluationContext;
use crate::expression::ExpressionResult;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::{Mutex, PoisonError};
use verdict_core::{AttributeValue, DataType, Identifier, Status};

/// Compiled patterns kept per function
const REGEX_CACHE_LIMIT: usize = 64;

/// `<type>-regexp-match(pattern, value)`
///
/// Searches the canonical string form of `value` for the pattern; the
/// pattern is not implicitly anchored.
#[derive(Debug)]
pub struct RegexpMatch {
    id: Identifier,
    data_type: DataType,
    cache: Mutex<IndexMap<String, Regex>>,
}

impl RegexpMatch {
    /// Data types with a standard regexp-match function
    pub const MATCHABLE_TYPES: [DataType; 6] = [
        DataType::String,
        DataType::AnyUri,
        DataType::IpAddress,
        DataType::DnsName,
        DataType::Rfc822Name,
        DataType::X500Name,
    ];

    /// Create a standard regexp-match function
    #[must_use]
    pub fn new(data_type: DataType) -> Self {
        let version = if data_type == DataType::String { "1.0" } else { "2.0" };
        Self {
            id: standard_id(version, &format!("{}-regexp-match", data_type.short_name())),
            data_type,
            cache: Mutex::new(IndexMap::new()),
        }
    }

    fn is_match(&self, pattern: &str, text: &str) -> Result<bool, Status> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.is_match(text));
        }
        let regex = Regex::new(pattern)
            .map_err(|e| failure(&self.id, format!("Invalid regular expression: {}", e)))?;
        let matched = regex.is_match(text);
        if cache.len() >= REGEX_CACHE_LIMIT {
            cache.shift_remove_index(0);
        }
        cache.insert(pattern.to_string(), regex);
        Ok(matched)
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let pattern = value_at(&self.id, args, 0, DataType::String)?;
        let value = value_at(&self.id, args, 1, self.data_type)?;
        let pattern = pattern.as_str().unwrap_or_default();
        Ok(ExpressionResult::boolean(self.is_match(pattern, &value.to_string())?))
    }
}

impl FunctionDefinition for RegexpMatch {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn return_type(&self) -> Option<DataType> {
        Some(DataType::Boolean)
    }

    fn returns_bag(&self) -> bool {
        false
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn evaluate(&self, _ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult {
        finish(self.compute(args))
    }
}

/// `rfc822Name-match(pattern, name)`
#[derive(Debug, Clone)]
pub struct Rfc822NameMatch {
    id: Identifier,
}

impl Rfc822NameMatch {
    /// Create the function
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: standard_id("1.0", "rfc822Name-match"),
        }
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let pattern = value_at(&self.id, args, 0, DataType::String)?;
        let AttributeValue::Rfc822Name(name) = value_at(&self.id, args, 1, DataType::Rfc822Name)? else {
            return Err(failure(&self.id, "Expected an rfc822Name at arg index 1"));
        };
        let pattern = pattern.as_str().unwrap_or_default();
        Ok(ExpressionResult::boolean(name.matches_pattern(pattern)))
    }
}

impl Default for Rfc822NameMatch {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionDefinition for Rfc822NameMatch {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn return_type(&self) -> Option<DataType> {
        Some(DataType::Boolean)
    }

    fn returns_bag(&self) -> bool {
        false
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn evaluate(&self, _ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult {
        finish(self.compute(args))
    }
}

/// `x500Name-match(suffix, name)`: true when `name` ends with the RDN
/// sequence of `suffix`
#[derive(Debug, Clone)]
pub struct X500NameMatch {
    id: Identifier,
}

impl X500NameMatch {
    /// Create the function
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: standard_id("1.0", "x500Name-match"),
        }
    }

    fn compute(&self, args: &[FunctionArgument]) -> Computed {
        super::check_arity(&self.id, self.arity(), args)?;
        let suffix = value_at(&self.id, args, 0, DataType::X500Name)?;
        let name = value_at(&self.id, args, 1, DataType::X500Name)?;
        match (suffix, name) {
            (AttributeValue::X500Name(suffix), AttributeValue::X500Name(name)) => {
                Ok(ExpressionResult::boolean(suffix.is_suffix_of(name)))
            }
            _ => Err(failure(&self.id, "Expected x500Name arguments")),
        }
    }
}

impl Default for X500NameMatch {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionDefinition for X500NameMatch {
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
        Some(DataType::X500Name)
    }

    fn arity(&self) -> Arity {
        Arity::Exactly(2)
    }

    fn evaluate(&self, _ctx: &dyn EvaluationContext, args: &[FunctionArgument]) -> ExpressionResult {
        finish(self.compute(args))
    }
}
