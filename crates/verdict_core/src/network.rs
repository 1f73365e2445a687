//! Network attribute values: IP addresses and DNS names, each with an
//! optional port range.

use crate::error::{CoreError, CoreResult};
use std::net::IpAddr;

/// Port range `n`, `n-`, `-n` or `n-m`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PortRange {
    /// Lowest port, unbounded if absent
    pub low: Option<u16>,
    /// Highest port, unbounded if absent
    pub high: Option<u16>,
}

impl PortRange {
    /// Parse a port range
    ///
    /// # Errors
    ///
    /// Returns error if a bound is not a port number or the range is inverted
    pub fn parse(s: &str) -> Result<Self, String> {
        let port = |p: &str| -> Result<Option<u16>, String> {
            if p.is_empty() {
                Ok(None)
            } else {
                p.parse().map(Some).map_err(|_| format!("invalid port \"{}\"", p))
            }
        };
        let range = match s.split_once('-') {
            None => {
                let single = port(s)?;
                if single.is_none() {
                    return Err("empty port range".to_string());
                }
                Self {
                    low: single,
                    high: single,
                }
            }
            Some((low, high)) => Self {
                low: port(low)?,
                high: port(high)?,
            },
        };
        if let (Some(low), Some(high)) = (range.low, range.high) {
            if low > high {
                return Err(format!("inverted port range \"{}\"", s));
            }
        }
        Ok(range)
    }

    /// Check whether a port falls inside the range
    #[must_use]
    pub fn contains(&self, port: u16) -> bool {
        self.low.is_none_or(|l| port >= l) && self.high.is_none_or(|h| port <= h)
    }
}

impl std::fmt::Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.low, self.high) {
            (Some(l), Some(h)) if l == h => write!(f, "{}", l),
            (Some(l), Some(h)) => write!(f, "{}-{}", l, h),
            (Some(l), None) => write!(f, "{}-", l),
            (None, Some(h)) => write!(f, "-{}", h),
            (None, None) => f.write_str("-"),
        }
    }
}

/// IP address with optional mask and port range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpAddress {
    /// Address
    pub address: IpAddr,
    /// Network mask
    pub mask: Option<IpAddr>,
    /// Port range
    pub ports: Option<PortRange>,
}

impl IpAddress {
    /// Parse `a.b.c.d[/mask][:ports]` or `[v6][/[mask]][:ports]`
    ///
    /// # Errors
    ///
    /// Returns error if the address, mask or port range is malformed
    pub fn parse(s: &str) -> CoreResult<Self> {
        let err = |reason: &str| CoreError::data_type("ipAddress", s, reason);
        if s.starts_with('[') {
            Self::parse_v6(s).map_err(|r| err(&r))
        } else {
            Self::parse_v4(s).map_err(|r| err(&r))
        }
    }

    fn parse_v4(s: &str) -> Result<Self, String> {
        let (rest, ports) = match s.split_once(':') {
            Some((rest, ports)) => (rest, Some(PortRange::parse(ports)?)),
            None => (s, None),
        };
        let (addr, mask) = match rest.split_once('/') {
            Some((addr, mask)) => (addr, Some(mask)),
            None => (rest, None),
        };
        let address: IpAddr = addr
            .parse::<std::net::Ipv4Addr>()
            .map(IpAddr::V4)
            .map_err(|_| format!("invalid IPv4 address \"{}\"", addr))?;
        let mask = match mask {
            Some(m) => Some(
                m.parse::<std::net::Ipv4Addr>()
                    .map(IpAddr::V4)
                    .map_err(|_| format!("invalid IPv4 mask \"{}\"", m))?,
            ),
            None => None,
        };
        Ok(Self {
            address,
            mask,
            ports,
        })
    }

    fn parse_v6(s: &str) -> Result<Self, String> {
        let (addr, mut rest) = bracketed(s)?;
        let address = IpAddr::V6(
            addr.parse()
                .map_err(|_| format!("invalid IPv6 address \"{}\"", addr))?,
        );
        let mut mask = None;
        if let Some(after) = rest.strip_prefix('/') {
            let (m, r) = bracketed(after)?;
            mask = Some(IpAddr::V6(
                m.parse().map_err(|_| format!("invalid IPv6 mask \"{}\"", m))?,
            ));
            rest = r;
        }
        let ports = match rest.strip_prefix(':') {
            Some(p) => Some(PortRange::parse(p)?),
            None if rest.is_empty() => None,
            None => return Err(format!("unexpected trailing text \"{}\"", rest)),
        };
        Ok(Self {
            address,
            mask,
            ports,
        })
    }
}

impl std::fmt::Display for IpAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.address {
            IpAddr::V4(a) => write!(f, "{}", a)?,
            IpAddr::V6(a) => write!(f, "[{}]", a)?,
        }
        match self.mask {
            Some(IpAddr::V4(m)) => write!(f, "/{}", m)?,
            Some(IpAddr::V6(m)) => write!(f, "/[{}]", m)?,
            None => {}
        }
        if let Some(ports) = self.ports {
            write!(f, ":{}", ports)?;
        }
        Ok(())
    }
}

/// DNS host name with optional port range; may start with a `*.` wildcard
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsName {
    /// Host name
    pub host: String,
    /// Port range
    pub ports: Option<PortRange>,
}

impl DnsName {
    /// Parse `host[:ports]`
    ///
    /// # Errors
    ///
    /// Returns error if the host name or port range is malformed
    pub fn parse(s: &str) -> CoreResult<Self> {
        let err = |reason: String| CoreError::data_type("dnsName", s, reason);
        let (host, ports) = match s.split_once(':') {
            Some((host, ports)) => (host, Some(PortRange::parse(ports).map_err(err)?)),
            None => (s, None),
        };
        let labels = host.strip_prefix("*.").unwrap_or(host);
        let valid = !labels.is_empty()
            && labels.split('.').all(|label| {
                !label.is_empty()
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            });
        if !valid {
            return Err(err(format!("invalid host name \"{}\"", host)));
        }
        Ok(Self {
            host: host.to_string(),
            ports,
        })
    }
}

impl std::fmt::Display for DnsName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.host)?;
        if let Some(ports) = self.ports {
            write!(f, ":{}", ports)?;
        }
        Ok(())
    }
}

fn bracketed(s: &str) -> Result<(&str, &str), String> {
    let inner = s.strip_prefix('[').ok_or("expected '['")?;
    let end = inner.find(']').ok_or("missing ']'")?;
    Ok((&inner[..end], &inner[end + 1..]))
}
