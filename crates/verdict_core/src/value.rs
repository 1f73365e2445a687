//! Typed attribute values.
//!
//! An [`AttributeValue`] is built from source text by [`AttributeValue::parse`],
//! the single converter for every standard data type. `Display` always writes
//! the canonical form, so parsing a canonical string and printing it again
//! yields the same text.

use crate::datatype::DataType;
use crate::error::{CoreError, CoreResult};
use crate::id::Identifier;
use crate::name::{Rfc822Name, X500Name};
use crate::network::{DnsName, IpAddress};
use crate::time::{Date, DateTime, DayTimeDuration, Time, YearMonthDuration};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Attribute value of one of the standard data types
///
/// Doubles compare under [`f64::total_cmp`] everywhere: `-0.0` is below
/// `0.0`, and `NaN` equals itself and sorts above every other value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawValue", into = "RawValue")]
pub enum AttributeValue {
    /// `xs:string`
    String(String),
    /// `xs:boolean`
    Boolean(bool),
    /// `xs:integer`
    Integer(i64),
    /// `xs:double`
    Double(f64),
    /// `xs:date`
    Date(Date),
    /// `xs:time`
    Time(Time),
    /// `xs:dateTime`
    DateTime(DateTime),
    /// `xs:dayTimeDuration`
    DayTimeDuration(DayTimeDuration),
    /// `xs:yearMonthDuration`
    YearMonthDuration(YearMonthDuration),
    /// `xs:anyURI`
    AnyUri(String),
    /// `xs:hexBinary`
    HexBinary(Vec<u8>),
    /// `xs:base64Binary`
    Base64Binary(Vec<u8>),
    /// RFC 822 mailbox name
    Rfc822Name(Rfc822Name),
    /// X.500 distinguished name
    X500Name(X500Name),
    /// IP address
    IpAddress(IpAddress),
    /// DNS name
    DnsName(DnsName),
}

impl AttributeValue {
    /// Convert source text to a value of the given data type
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DataType`] if the text is not a valid lexical form
    pub fn parse(data_type: DataType, s: &str) -> CoreResult<Self> {
        let name = data_type.short_name();
        Ok(match data_type {
            DataType::String => Self::String(s.to_string()),
            DataType::Boolean => match s {
                "true" | "1" => Self::Boolean(true),
                "false" | "0" => Self::Boolean(false),
                _ => return Err(CoreError::data_type(name, s, "expected true or false")),
            },
            DataType::Integer => Self::Integer(
                s.parse()
                    .map_err(|e: std::num::ParseIntError| CoreError::data_type(name, s, e.to_string()))?,
            ),
            DataType::Double => Self::Double(parse_double(s)?),
            DataType::Date => Self::Date(Date::parse(s)?),
            DataType::Time => Self::Time(Time::parse(s)?),
            DataType::DateTime => Self::DateTime(DateTime::parse(s)?),
            DataType::DayTimeDuration => Self::DayTimeDuration(DayTimeDuration::parse(s)?),
            DataType::YearMonthDuration => Self::YearMonthDuration(YearMonthDuration::parse(s)?),
            DataType::AnyUri => {
                if s.chars().any(char::is_whitespace) {
                    return Err(CoreError::data_type(name, s, "whitespace in URI"));
                }
                Self::AnyUri(s.to_string())
            }
            DataType::HexBinary => Self::HexBinary(
                hex::decode(s).map_err(|e| CoreError::data_type(name, s, e.to_string()))?,
            ),
            DataType::Base64Binary => Self::Base64Binary(
                STANDARD
                    .decode(s)
                    .map_err(|e| CoreError::data_type(name, s, e.to_string()))?,
            ),
            DataType::Rfc822Name => Self::Rfc822Name(Rfc822Name::parse(s)?),
            DataType::X500Name => Self::X500Name(X500Name::parse(s)?),
            DataType::IpAddress => Self::IpAddress(IpAddress::parse(s)?),
            DataType::DnsName => Self::DnsName(DnsName::parse(s)?),
        })
    }

    /// Create a string value
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Create a boolean value
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    /// Create an integer value
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Integer(value)
    }

    /// Data type of the value
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::String(_) => DataType::String,
            Self::Boolean(_) => DataType::Boolean,
            Self::Integer(_) => DataType::Integer,
            Self::Double(_) => DataType::Double,
            Self::Date(_) => DataType::Date,
            Self::Time(_) => DataType::Time,
            Self::DateTime(_) => DataType::DateTime,
            Self::DayTimeDuration(_) => DataType::DayTimeDuration,
            Self::YearMonthDuration(_) => DataType::YearMonthDuration,
            Self::AnyUri(_) => DataType::AnyUri,
            Self::HexBinary(_) => DataType::HexBinary,
            Self::Base64Binary(_) => DataType::Base64Binary,
            Self::Rfc822Name(_) => DataType::Rfc822Name,
            Self::X500Name(_) => DataType::X500Name,
            Self::IpAddress(_) => DataType::IpAddress,
            Self::DnsName(_) => DataType::DnsName,
        }
    }

    /// Identifier of the value's data type
    #[must_use]
    pub fn data_type_id(&self) -> Identifier {
        self.data_type().id()
    }

    /// Boolean payload, if this is a boolean
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Text payload of string and anyURI values
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::AnyUri(s) => Some(s),
            _ => None,
        }
    }

    /// Time payload, if this is a time
    #[must_use]
    pub const fn as_time(&self) -> Option<&Time> {
        match self {
            Self::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Value equality under the data type's equality rule
    ///
    /// Temporal values are equal when they denote the same instant, which
    /// requires both or neither to carry a timezone. Doubles are equal when
    /// [`AttributeValue::compare`] finds them equal.
    ///
    /// # Errors
    ///
    /// Returns error if the data types differ or temporal timezones are mixed
    pub fn equals(&self, other: &AttributeValue) -> CoreResult<bool> {
        self.check_same_type(other)?;
        match (self, other) {
            (Self::Date(_), _) | (Self::Time(_), _) | (Self::DateTime(_), _) => {
                Ok(self.compare(other)? == Ordering::Equal)
            }
            _ => Ok(self == other),
        }
    }

    /// Total ordering for the ordered data types
    ///
    /// # Errors
    ///
    /// Returns error if the data types differ, the type has no ordering or
    /// temporal timezones are mixed
    pub fn compare(&self, other: &AttributeValue) -> CoreResult<Ordering> {
        self.check_same_type(other)?;
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Ok(a.cmp(b)),
            (Self::Double(a), Self::Double(b)) => Ok(a.total_cmp(b)),
            (Self::String(a), Self::String(b)) => Ok(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => a.compare(b),
            (Self::Time(a), Self::Time(b)) => a.compare(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.compare(b),
            _ => Err(CoreError::TypeMismatch {
                expected: "an ordered data type".to_string(),
                actual: self.data_type().short_name().to_string(),
            }),
        }
    }

    fn check_same_type(&self, other: &AttributeValue) -> CoreResult<()> {
        if self.data_type() == other.data_type() {
            Ok(())
        } else {
            Err(CoreError::TypeMismatch {
                expected: self.data_type().short_name().to_string(),
                actual: other.data_type().short_name().to_string(),
            })
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b) == Ordering::Equal,
            (Self::String(a), Self::String(b)) | (Self::AnyUri(a), Self::AnyUri(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::DayTimeDuration(a), Self::DayTimeDuration(b)) => a == b,
            (Self::YearMonthDuration(a), Self::YearMonthDuration(b)) => a == b,
            (Self::HexBinary(a), Self::HexBinary(b)) | (Self::Base64Binary(a), Self::Base64Binary(b)) => a == b,
            (Self::Rfc822Name(a), Self::Rfc822Name(b)) => a == b,
            (Self::X500Name(a), Self::X500Name(b)) => a == b,
            (Self::IpAddress(a), Self::IpAddress(b)) => a == b,
            (Self::DnsName(a), Self::DnsName(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) | Self::AnyUri(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Double(d) => write_double(f, *d),
            Self::Date(d) => write!(f, "{}", d),
            Self::Time(t) => write!(f, "{}", t),
            Self::DateTime(dt) => write!(f, "{}", dt),
            Self::DayTimeDuration(d) => write!(f, "{}", d),
            Self::YearMonthDuration(d) => write!(f, "{}", d),
            Self::HexBinary(bytes) => f.write_str(&hex::encode_upper(bytes)),
            Self::Base64Binary(bytes) => f.write_str(&STANDARD.encode(bytes)),
            Self::Rfc822Name(n) => write!(f, "{}", n),
            Self::X500Name(n) => write!(f, "{}", n),
            Self::IpAddress(ip) => write!(f, "{}", ip),
            Self::DnsName(dns) => write!(f, "{}", dns),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Wire form `{ "dataType": <uri>, "value": <canonical text> }`
#[derive(Serialize, Deserialize)]
struct RawValue {
    #[serde(rename = "dataType")]
    data_type: String,
    value: String,
}

impl TryFrom<RawValue> for AttributeValue {
    type Error = CoreError;

    fn try_from(raw: RawValue) -> Result<Self, Self::Error> {
        AttributeValue::parse(DataType::from_uri(&raw.data_type)?, &raw.value)
    }
}

impl From<AttributeValue> for RawValue {
    fn from(value: AttributeValue) -> Self {
        Self {
            data_type: value.data_type().uri().to_string(),
            value: value.to_string(),
        }
    }
}

fn parse_double(s: &str) -> CoreResult<f64> {
    match s {
        "INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    // Rust accepts "inf" and "nan" spellings that XML Schema does not
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return Err(CoreError::data_type("double", s, "invalid number"));
    }
    s.parse()
        .map_err(|e: std::num::ParseFloatError| CoreError::data_type("double", s, e.to_string()))
}

fn write_double(f: &mut std::fmt::Formatter<'_>, d: f64) -> std::fmt::Result {
    if d.is_nan() {
        f.write_str("NaN")
    } else if d == f64::INFINITY {
        f.write_str("INF")
    } else if d == f64::NEG_INFINITY {
        f.write_str("-INF")
    } else {
        write!(f, "{}", d)
    }
}
