//! Evaluation status: the value-level error channel of the engine.

use crate::id::{Identifier, xacml};
use serde::{Deserialize, Serialize};

/// Classification of a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// Evaluation succeeded
    Ok,
    /// A required attribute was absent
    MissingAttribute,
    /// Malformed policy structure
    SyntaxError,
    /// Runtime evaluation error
    ProcessingError,
}

impl StatusCode {
    /// URI of the status code
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Ok => xacml::STATUS_OK,
            Self::MissingAttribute => xacml::STATUS_MISSING_ATTRIBUTE,
            Self::SyntaxError => xacml::STATUS_SYNTAX_ERROR,
            Self::ProcessingError => xacml::STATUS_PROCESSING_ERROR,
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.uri())
    }
}

/// Description of an attribute that was required but absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingAttributeDetail {
    /// Attribute category
    pub category: Identifier,
    /// Attribute id
    pub attribute_id: Identifier,
    /// Expected data type
    pub data_type: Identifier,
    /// Required issuer
    pub issuer: Option<String>,
}

/// Structured detail attached to a status
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusDetail {
    /// Attributes whose absence caused the status
    pub missing_attributes: Vec<MissingAttributeDetail>,
}

/// Status code plus optional message and detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Status code
    pub code: StatusCode,
    /// Human-readable message
    pub message: Option<String>,
    /// Structured detail
    pub detail: Option<StatusDetail>,
}

impl Status {
    /// Plain OK status
    pub const OK: Status = Status {
        code: StatusCode::Ok,
        message: None,
        detail: None,
    };

    /// Create a status with a message
    #[must_use]
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            detail: None,
        }
    }

    /// Create a processing-error status
    #[must_use]
    pub fn processing_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ProcessingError, message)
    }

    /// Create a syntax-error status
    #[must_use]
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SyntaxError, message)
    }

    /// Create a missing-attribute status naming the absent attribute
    #[must_use]
    pub fn missing_attribute(message: impl Into<String>, detail: MissingAttributeDetail) -> Self {
        Self {
            code: StatusCode::MissingAttribute,
            message: Some(message.into()),
            detail: Some(StatusDetail {
                missing_attributes: vec![detail],
            }),
        }
    }

    /// Check whether the code is OK
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    /// Prefix the message, e.g. with the id of the function that failed
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.message = Some(match self.message {
            Some(message) => format!("{} {}", prefix, message),
            None => prefix.to_string(),
        });
        self
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::OK
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code, message),
            None => write!(f, "{}", self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ok() {
        assert!(Status::OK.is_ok());
        assert!(Status::default().is_ok());
        assert!(!Status::processing_error("boom").is_ok());
    }

    #[test]
    fn test_status_display() {
        let status = Status::processing_error("boom");
        assert_eq!(
            status.to_string(),
            "urn:oasis:names:tc:xacml:1.0:status:processing-error: boom"
        );
        assert_eq!(Status::OK.to_string(), xacml::STATUS_OK);
    }

    #[test]
    fn test_with_prefix() {
        let status = Status::processing_error("Expected 3 arguments, got 2")
            .with_prefix("function:time-in-range");
        assert_eq!(
            status.message.as_deref(),
            Some("function:time-in-range Expected 3 arguments, got 2")
        );
    }

    #[test]
    fn test_missing_attribute_detail() {
        let detail = MissingAttributeDetail {
            category: Identifier::new(xacml::CATEGORY_RESOURCE),
            attribute_id: Identifier::new(xacml::ATTRIBUTE_RESOURCE_ID),
            data_type: Identifier::new("http://www.w3.org/2001/XMLSchema#string"),
            issuer: None,
        };
        let status = Status::missing_attribute("Missing required attribute", detail.clone());
        assert_eq!(status.code, StatusCode::MissingAttribute);
        let details = status.detail.unwrap();
        assert_eq!(details.missing_attributes, vec![detail]);
    }
}
