//! Name-typed attribute values: RFC 822 mailbox names and X.500 distinguished names.

use crate::error::{CoreError, CoreResult};
use std::hash::{Hash, Hasher};

/// RFC 822 mailbox name, `local@domain`
///
/// The local part is case-sensitive, the domain part is not.
#[derive(Debug, Clone, Eq)]
pub struct Rfc822Name {
    local: String,
    domain: String,
}

impl Rfc822Name {
    /// Parse `local@domain`
    ///
    /// # Errors
    ///
    /// Returns error if either part is missing
    pub fn parse(s: &str) -> CoreResult<Self> {
        let (local, domain) = s
            .rsplit_once('@')
            .ok_or_else(|| CoreError::data_type("rfc822Name", s, "missing '@'"))?;
        if local.is_empty() || domain.is_empty() || local.contains('@') {
            return Err(CoreError::data_type("rfc822Name", s, "malformed mailbox"));
        }
        Ok(Self {
            local: local.to_string(),
            domain: domain.to_string(),
        })
    }

    /// Local part
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Domain part
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Match against an rfc822Name-match pattern
    ///
    /// `user@host` matches one mailbox, `host` matches every mailbox at that
    /// host and `.example.com` matches every mailbox in a subdomain.
    #[must_use]
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        if let Some((local, domain)) = pattern.rsplit_once('@') {
            return self.local == local && self.domain.eq_ignore_ascii_case(domain);
        }
        if pattern.starts_with('.') {
            let domain = self.domain.to_ascii_lowercase();
            return domain.ends_with(&pattern.to_ascii_lowercase());
        }
        self.domain.eq_ignore_ascii_case(pattern)
    }
}

impl PartialEq for Rfc822Name {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.domain.eq_ignore_ascii_case(&other.domain)
    }
}

impl Hash for Rfc822Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local.hash(state);
        self.domain.to_ascii_lowercase().hash(state);
    }
}

impl std::fmt::Display for Rfc822Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

/// X.500 distinguished name in RFC 2253 string form
#[derive(Debug, Clone)]
pub struct X500Name {
    text: String,
    /// Normalized RDNs, most significant last as written
    rdns: Vec<String>,
}

impl X500Name {
    /// Parse a distinguished name such as `cn=Alice, o=Example, c=US`
    ///
    /// # Errors
    ///
    /// Returns error if an RDN is not of the form `type=value`
    pub fn parse(s: &str) -> CoreResult<Self> {
        let mut rdns = Vec::new();
        for rdn in split_unescaped(s, ',') {
            let mut parts = Vec::new();
            for ava in split_unescaped(&rdn, '+') {
                let (attr_type, value) = ava
                    .split_once('=')
                    .ok_or_else(|| CoreError::data_type("x500Name", s, "RDN without '='"))?;
                let attr_type = attr_type.trim();
                if attr_type.is_empty() {
                    return Err(CoreError::data_type("x500Name", s, "empty attribute type"));
                }
                parts.push(format!(
                    "{}={}",
                    attr_type.to_ascii_lowercase(),
                    value.trim().to_lowercase()
                ));
            }
            parts.sort();
            rdns.push(parts.join("+"));
        }
        if rdns.is_empty() {
            return Err(CoreError::data_type("x500Name", s, "empty name"));
        }
        Ok(Self {
            text: s.to_string(),
            rdns,
        })
    }

    /// Check whether `self` is a terminal RDN sequence of `other`
    #[must_use]
    pub fn is_suffix_of(&self, other: &X500Name) -> bool {
        other.rdns.ends_with(&self.rdns)
    }
}

impl PartialEq for X500Name {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for X500Name {}

impl Hash for X500Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rdns.hash(state);
    }
}

impl std::fmt::Display for X500Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

fn split_unescaped(s: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for ch in s.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            current.push(ch);
            escaped = true;
        } else if ch == sep {
            out.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    if !current.trim().is_empty() || !out.is_empty() {
        out.push(current);
    }
    out
}
