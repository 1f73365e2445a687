//! URI-like identifiers for categories, attributes, data types, functions
//! and combining algorithms.
//!
//! Identifiers are compared by value and cloned by reference count, so they
//! can be used as map keys throughout the evaluation tree.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque URI-like identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Create an identifier from its string form
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(Arc::from(value))
    }

    /// Get the string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing segment after the last `#` or `:`
    #[must_use]
    pub fn short_name(&self) -> &str {
        match self.0.rfind(['#', ':']) {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0.to_string()
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Well-known XACML identifiers
pub mod xacml {
    /// Access subject category
    pub const CATEGORY_ACCESS_SUBJECT: &str =
        "urn:oasis:names:tc:xacml:1.0:subject-category:access-subject";
    /// Resource category
    pub const CATEGORY_RESOURCE: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:resource";
    /// Action category
    pub const CATEGORY_ACTION: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:action";
    /// Environment category
    pub const CATEGORY_ENVIRONMENT: &str =
        "urn:oasis:names:tc:xacml:3.0:attribute-category:environment";

    /// Subject id attribute
    pub const ATTRIBUTE_SUBJECT_ID: &str = "urn:oasis:names:tc:xacml:1.0:subject:subject-id";
    /// Resource id attribute
    pub const ATTRIBUTE_RESOURCE_ID: &str = "urn:oasis:names:tc:xacml:1.0:resource:resource-id";
    /// Action id attribute
    pub const ATTRIBUTE_ACTION_ID: &str = "urn:oasis:names:tc:xacml:1.0:action:action-id";
    /// Current time attribute
    pub const ATTRIBUTE_CURRENT_TIME: &str =
        "urn:oasis:names:tc:xacml:1.0:environment:current-time";

    /// OK status
    pub const STATUS_OK: &str = "urn:oasis:names:tc:xacml:1.0:status:ok";
    /// Missing attribute status
    pub const STATUS_MISSING_ATTRIBUTE: &str =
        "urn:oasis:names:tc:xacml:1.0:status:missing-attribute";
    /// Syntax error status
    pub const STATUS_SYNTAX_ERROR: &str = "urn:oasis:names:tc:xacml:1.0:status:syntax-error";
    /// Processing error status
    pub const STATUS_PROCESSING_ERROR: &str =
        "urn:oasis:names:tc:xacml:1.0:status:processing-error";

    /// Prefix shared by XACML function identifiers of one version, e.g. `3.0`
    #[must_use]
    pub fn function_prefix(version: &str) -> String {
        format!("urn:oasis:names:tc:xacml:{}:function:", version)
    }

    /// Identifier of a rule-combining algorithm
    #[must_use]
    pub fn rule_combining_algorithm(version: &str, name: &str) -> String {
        format!("urn:oasis:names:tc:xacml:{}:rule-combining-algorithm:{}", version, name)
    }

    /// Identifier of a policy-combining algorithm
    #[must_use]
    pub fn policy_combining_algorithm(version: &str, name: &str) -> String {
        format!("urn:oasis:names:tc:xacml:{}:policy-combining-algorithm:{}", version, name)
    }

    /// XACML 3.0 deny-overrides for policies
    pub const POLICY_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-overrides";
    /// XACML 3.0 deny-overrides for rules
    pub const RULE_DENY_OVERRIDES: &str =
        "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-overrides";
}
