//! Core error types for VERDICT.

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Source text cannot be converted to the declared data type
    #[error("Cannot convert \"{input}\" to {data_type}: {reason}")]
    DataType {
        /// Short name of the target data type
        data_type: String,
        /// Offending source text
        input: String,
        /// What went wrong
        reason: String,
    },

    /// Unknown data type identifier
    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    /// Comparison between a time-zoned and a non-time-zoned value
    #[error("Cannot compare this ISO8601DateTime with non-time-zoned ISO8601DateTime")]
    TimezoneMismatch,

    /// Values of different data types compared or mixed
    #[error("Data type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected data type
        expected: String,
        /// Actual data type
        actual: String,
    },

    /// Value added to a bag of a different data type
    #[error("Bag of {expected} cannot hold a value of {actual}")]
    BagTypeMismatch {
        /// Declared data type of the bag
        expected: String,
        /// Data type of the rejected value
        actual: String,
    },

    /// Invalid identifier
    #[error("Invalid identifier: {reason}")]
    InvalidIdentifier {
        /// Why it is invalid
        reason: String,
    },
}

impl CoreError {
    /// Build a conversion error for the given data type name
    #[must_use]
    pub fn data_type(data_type: &str, input: &str, reason: impl Into<String>) -> Self {
        Self::DataType {
            data_type: data_type.to_string(),
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
