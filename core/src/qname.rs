//! Qualified names and namespace-prefix resolution.
//!
//! A QName carries an optional prefix, a local part, and the namespace URI
//! the prefix resolved to at parse time. Lexical validation follows the
//! NCName production (no colons, no leading digit).

use crate::error::{CoreError, CoreResult};
use regex_lite::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// The reserved `xml` prefix, implicitly bound in every scope.
pub const XML_PREFIX: &str = "xml";

/// The namespace URI the `xml` prefix is permanently bound to.
pub const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";

fn ncname_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap())
}

/// Check that a string is a lexically valid NCName.
pub fn is_ncname(s: &str) -> bool {
    ncname_re().is_match(s)
}

/// A qualified name: optional prefix, local part, resolved namespace URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    prefix: Option<String>,
    local: String,
    ns_uri: Option<String>,
}

impl QName {
    /// Create a QName with no prefix and no namespace.
    pub fn local(local: impl Into<String>) -> CoreResult<Self> {
        let local = local.into();
        if !is_ncname(&local) {
            return Err(CoreError::invalid_ncname(local));
        }
        Ok(Self {
            prefix: None,
            local,
            ns_uri: None,
        })
    }

    /// Create a fully resolved QName.
    pub fn with_ns(
        prefix: impl Into<String>,
        local: impl Into<String>,
        ns_uri: impl Into<String>,
    ) -> CoreResult<Self> {
        let prefix = prefix.into();
        let local = local.into();
        if !is_ncname(&prefix) {
            return Err(CoreError::invalid_ncname(prefix));
        }
        if !is_ncname(&local) {
            return Err(CoreError::invalid_ncname(local));
        }
        Ok(Self {
            prefix: Some(prefix),
            local,
            ns_uri: Some(ns_uri.into()),
        })
    }

    /// Parse a lexical QName (`local` or `prefix:local`), resolving the
    /// prefix against the given bindings.
    ///
    /// Fails with `UnboundPrefix` when the prefix has no binding.
    pub fn parse(lexical: &str, namespaces: &Namespaces) -> CoreResult<Self> {
        match lexical.split_once(':') {
            None => Self::local(lexical),
            Some((prefix, local)) => {
                let uri = namespaces
                    .resolve(prefix)
                    .ok_or_else(|| CoreError::unbound_prefix(prefix))?;
                Self::with_ns(prefix, local, uri)
            }
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local_part(&self) -> &str {
        &self.local
    }

    pub fn ns_uri(&self) -> Option<&str> {
        self.ns_uri.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// An in-scope set of prefix → namespace-URI bindings.
///
/// The `xml` prefix is implicitly bound in every instance.
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    bindings: HashMap<String, String>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a prefix. A later binding shadows an earlier one.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.bindings.insert(prefix.into(), uri.into());
    }

    /// Resolve a prefix to its URI, if bound.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NS_URI);
        }
        self.bindings.get(prefix).map(String::as_str)
    }

    /// Whether the prefix has any binding in scope.
    pub fn is_bound(&self, prefix: &str) -> bool {
        self.resolve(prefix).is_some()
    }

    /// Iterate over the explicit bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}
