//! VERDICT Core Types
//!
//! This crate contains the pure value model of the decision engine:
//! identifiers, typed attribute values, bags, and status codes.
//! Nothing here performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bag;
pub mod datatype;
pub mod error;
pub mod id;
pub mod name;
pub mod network;
pub mod status;
pub mod time;
pub mod value;
pub mod version;

// Re-exports
pub use bag::Bag;
pub use datatype::DataType;
pub use error::{CoreError, CoreResult};
pub use id::{Identifier, xacml};
pub use name::{Rfc822Name, X500Name};
pub use network::{DnsName, IpAddress, PortRange};
pub use status::{MissingAttributeDetail, Status, StatusCode, StatusDetail};
pub use time::{Date, DateTime, DayTimeDuration, Time, YearMonthDuration};
pub use value::AttributeValue;
pub use version::{Version, VersionError};
