//! Data types of attribute values.

use crate::error::{CoreError, CoreResult};
use crate::id::Identifier;
use serde::{Deserialize, Serialize};

/// The standard XACML data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    /// `xs:string`
    String,
    /// `xs:boolean`
    Boolean,
    /// `xs:integer`
    Integer,
    /// `xs:double`
    Double,
    /// `xs:date`
    Date,
    /// `xs:time`
    Time,
    /// `xs:dateTime`
    DateTime,
    /// `xs:dayTimeDuration`
    DayTimeDuration,
    /// `xs:yearMonthDuration`
    YearMonthDuration,
    /// `xs:anyURI`
    AnyUri,
    /// `xs:hexBinary`
    HexBinary,
    /// `xs:base64Binary`
    Base64Binary,
    /// RFC 822 mailbox name
    Rfc822Name,
    /// X.500 distinguished name
    X500Name,
    /// IP address with optional mask and port range
    IpAddress,
    /// DNS host name with optional port range
    DnsName,
}

impl DataType {
    /// Every standard data type, in declaration order
    pub const ALL: [DataType; 16] = [
        Self::String,
        Self::Boolean,
        Self::Integer,
        Self::Double,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::DayTimeDuration,
        Self::YearMonthDuration,
        Self::AnyUri,
        Self::HexBinary,
        Self::Base64Binary,
        Self::Rfc822Name,
        Self::X500Name,
        Self::IpAddress,
        Self::DnsName,
    ];

    /// URI of the data type
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::String => "http://www.w3.org/2001/XMLSchema#string",
            Self::Boolean => "http://www.w3.org/2001/XMLSchema#boolean",
            Self::Integer => "http://www.w3.org/2001/XMLSchema#integer",
            Self::Double => "http://www.w3.org/2001/XMLSchema#double",
            Self::Date => "http://www.w3.org/2001/XMLSchema#date",
            Self::Time => "http://www.w3.org/2001/XMLSchema#time",
            Self::DateTime => "http://www.w3.org/2001/XMLSchema#dateTime",
            Self::DayTimeDuration => "http://www.w3.org/2001/XMLSchema#dayTimeDuration",
            Self::YearMonthDuration => "http://www.w3.org/2001/XMLSchema#yearMonthDuration",
            Self::AnyUri => "http://www.w3.org/2001/XMLSchema#anyURI",
            Self::HexBinary => "http://www.w3.org/2001/XMLSchema#hexBinary",
            Self::Base64Binary => "http://www.w3.org/2001/XMLSchema#base64Binary",
            Self::Rfc822Name => "urn:oasis:names:tc:xacml:1.0:data-type:rfc822Name",
            Self::X500Name => "urn:oasis:names:tc:xacml:1.0:data-type:x500Name",
            Self::IpAddress => "urn:oasis:names:tc:xacml:2.0:data-type:ipAddress",
            Self::DnsName => "urn:oasis:names:tc:xacml:2.0:data-type:dnsName",
        }
    }

    /// Identifier of the data type
    #[must_use]
    pub fn id(&self) -> Identifier {
        Identifier::new(self.uri())
    }

    /// Short name used in function identifiers and messages
    #[must_use]
    pub const fn short_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "dateTime",
            Self::DayTimeDuration => "dayTimeDuration",
            Self::YearMonthDuration => "yearMonthDuration",
            Self::AnyUri => "anyURI",
            Self::HexBinary => "hexBinary",
            Self::Base64Binary => "base64Binary",
            Self::Rfc822Name => "rfc822Name",
            Self::X500Name => "x500Name",
            Self::IpAddress => "ipAddress",
            Self::DnsName => "dnsName",
        }
    }

    /// XACML version that introduced the type's bag and equality functions
    #[must_use]
    pub const fn function_version(&self) -> &'static str {
        match self {
            Self::DayTimeDuration | Self::YearMonthDuration => "3.0",
            Self::IpAddress | Self::DnsName => "2.0",
            _ => "1.0",
        }
    }

    /// Look up a data type by URI
    ///
    /// # Errors
    ///
    /// Returns error if the identifier names no standard data type
    pub fn from_id(id: &Identifier) -> CoreResult<Self> {
        Self::from_uri(id.as_str())
    }

    /// Look up a data type by URI string
    ///
    /// # Errors
    ///
    /// Returns error if the URI names no standard data type
    pub fn from_uri(uri: &str) -> CoreResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|dt| dt.uri() == uri)
            .ok_or_else(|| CoreError::UnknownDataType(uri.to_string()))
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_round_trip() {
        for dt in DataType::ALL {
            assert_eq!(DataType::from_id(&dt.id()).unwrap(), dt);
        }
    }

    #[test]
    fn test_short_name_matches_uri_fragment() {
        for dt in DataType::ALL {
            assert_eq!(dt.id().short_name(), dt.short_name());
        }
    }

    #[test]
    fn test_unknown_data_type() {
        let result = DataType::from_uri("urn:example:unknown");
        assert!(matches!(result, Err(CoreError::UnknownDataType(_))));
    }
}
