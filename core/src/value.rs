//! Atomic values as exchanged with the query-evaluation layer.
//!
//! These are the already-evaluated scalar results handed to the mutation
//! engine as `value` content. Node content travels separately as transient
//! trees; values here are the atomic items only.

use crate::qname::QName;
use std::fmt;

/// An atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 string.
    String(String),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Double(f64),
    /// Boolean value.
    Bool(bool),
    /// A qualified name, as produced by `xs:QName(...)`.
    QName(QName),
}

impl Value {
    /// Returns true if this is a string value.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns true if this is a QName value.
    pub fn is_qname(&self) -> bool {
        matches!(self, Value::QName(_))
    }

    /// Get as string reference if this is a String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as QName reference if this is a QName value.
    pub fn as_qname(&self) -> Option<&QName> {
        match self {
            Value::QName(q) => Some(q),
            _ => None,
        }
    }

    /// The XPath string value of this atomic.
    pub fn string_value(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::QName(q) => q.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string_value())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_value() {
        assert_eq!(Value::from("abc").string_value(), "abc");
        assert_eq!(Value::Int(5).string_value(), "5");
        assert_eq!(Value::Bool(true).string_value(), "true");
    }

    #[test]
    fn test_qname_value() {
        let q = QName::local("y").unwrap();
        let v = Value::QName(q.clone());
        assert!(v.is_qname());
        assert_eq!(v.as_qname(), Some(&q));
        assert_eq!(v.string_value(), "y");
    }
}
