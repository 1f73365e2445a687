//! Bags: unordered multisets of attribute values sharing one data type.

use crate::datatype::DataType;
use crate::error::{CoreError, CoreResult};
use crate::value::AttributeValue;
use serde::Serialize;

/// Unordered, possibly empty collection of values of one data type
///
/// Equality is multiset equality: insertion order is ignored, duplicate
/// counts are not.
#[derive(Debug, Clone, Serialize)]
pub struct Bag {
    #[serde(rename = "dataType")]
    data_type: DataType,
    values: Vec<AttributeValue>,
}

impl Bag {
    /// Create an empty bag of the given data type
    #[must_use]
    pub const fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            values: Vec::new(),
        }
    }

    /// Create a bag from values
    ///
    /// # Errors
    ///
    /// Returns error if any value has a different data type
    pub fn from_values(data_type: DataType, values: Vec<AttributeValue>) -> CoreResult<Self> {
        let mut bag = Self::new(data_type);
        for value in values {
            bag.try_add(value)?;
        }
        Ok(bag)
    }

    /// Add a value
    ///
    /// # Panics
    ///
    /// Panics if the value's data type differs from the bag's. Mixing types
    /// in one bag is a programming error.
    pub fn add(&mut self, value: AttributeValue) {
        assert_eq!(
            value.data_type(),
            self.data_type,
            "bag of {} cannot hold a value of {}",
            self.data_type,
            value.data_type()
        );
        self.values.push(value);
    }

    /// Add a value, rejecting one of the wrong data type
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BagTypeMismatch`] if the data types differ
    pub fn try_add(&mut self, value: AttributeValue) -> CoreResult<()> {
        if value.data_type() != self.data_type {
            return Err(CoreError::BagTypeMismatch {
                expected: self.data_type.short_name().to_string(),
                actual: value.data_type().short_name().to_string(),
            });
        }
        self.values.push(value);
        Ok(())
    }

    /// Declared data type
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of values, duplicates included
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the bag is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check whether the bag holds a value equal to `value`
    #[must_use]
    pub fn contains(&self, value: &AttributeValue) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Number of occurrences of `value`
    #[must_use]
    pub fn count(&self, value: &AttributeValue) -> usize {
        self.values.iter().filter(|v| *v == value).count()
    }

    /// Iterate over the values
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeValue> {
        self.values.iter()
    }

    /// The only value, if the bag holds exactly one
    #[must_use]
    pub fn single(&self) -> Option<&AttributeValue> {
        match self.values.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Take the values out of the bag
    #[must_use]
    pub fn into_values(self) -> Vec<AttributeValue> {
        self.values
    }
}

/// Multiset equality, counting members with [`AttributeValue`]'s `==`
impl PartialEq for Bag {
    fn eq(&self, other: &Self) -> bool {
        self.data_type == other.data_type
            && self.len() == other.len()
            && self.values.iter().all(|v| self.count(v) == other.count(v))
    }
}

impl<'a> IntoIterator for &'a Bag {
    type Item = &'a AttributeValue;
    type IntoIter = std::slice::Iter<'a, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
