//! Equation values

use crate::coerce;
use crate::kind::Kind;
use std::fmt;

/// A value consumed or produced by an equation
///
/// Exactly one of four scalar shapes or a homogeneous [`List`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Floating point number
    Float(f64),
    /// Integer number
    Integer(i64),
    /// String value
    String(String),
    /// Boolean value (TRUE/FALSE)
    Boolean(bool),
    /// Homogeneous list
    List(List),
}

/// A homogeneous ordered sequence of scalars
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum List {
    Float(Vec<f64>),
    Integer(Vec<i64>),
    String(Vec<String>),
    Boolean(Vec<bool>),
}

impl Value {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    /// The kind of this value
    pub fn kind(&self) -> Kind {
        match self {
            Value::Float(_) => Kind::Float,
            Value::Integer(_) => Kind::Integer,
            Value::String(_) => Kind::String,
            Value::Boolean(_) => Kind::Boolean,
            Value::List(list) => list.kind(),
        }
    }

    /// Check if the value is a list
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Get the list if this is one
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to get the value as a float without any conversion beyond
    /// integer widening
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Try to get the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl List {
    /// The list kind (e.g. [`Kind::FloatList`])
    pub fn kind(&self) -> Kind {
        match self {
            List::Float(_) => Kind::FloatList,
            List::Integer(_) => Kind::IntegerList,
            List::String(_) => Kind::StringList,
            List::Boolean(_) => Kind::BooleanList,
        }
    }

    /// An empty list holding elements of `element` kind
    pub fn empty(element: Kind) -> Self {
        match element {
            Kind::Float | Kind::FloatList => List::Float(Vec::new()),
            Kind::Integer | Kind::IntegerList => List::Integer(Vec::new()),
            Kind::String | Kind::StringList => List::String(Vec::new()),
            Kind::Boolean | Kind::BooleanList => List::Boolean(Vec::new()),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            List::Float(v) => v.len(),
            List::Integer(v) => v.len(),
            List::String(v) => v.len(),
            List::Boolean(v) => v.len(),
        }
    }

    /// Check if the list has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at zero-based `index` as a scalar value
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            List::Float(v) => v.get(index).map(|n| Value::Float(*n)),
            List::Integer(v) => v.get(index).map(|n| Value::Integer(*n)),
            List::String(v) => v.get(index).map(|s| Value::String(s.clone())),
            List::Boolean(v) => v.get(index).map(|b| Value::Boolean(*b)),
        }
    }

    /// Iterate over the elements as scalar values
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Widen an integer list to a float list; other lists are returned as-is
    pub fn widen(self) -> List {
        match self {
            List::Integer(v) => List::Float(v.into_iter().map(|n| n as f64).collect()),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::List(list) => write!(f, "{list}"),
            scalar => f.write_str(&coerce::scalar_text(scalar)),
        }
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match &value {
                Value::String(s) => write!(f, "{s:?}")?,
                other => write!(f, "{other}")?,
            }
        }
        f.write_str("]")
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
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

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::List(list)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::List(List::Float(v))
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::List(List::Integer(v))
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::List(List::String(v))
    }
}

impl From<Vec<bool>> for Value {
    fn from(v: Vec<bool>) -> Self {
        Value::List(List::Boolean(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::from(1.5).kind(), Kind::Float);
        assert_eq!(Value::from(3_i64).kind(), Kind::Integer);
        assert_eq!(Value::from("x").kind(), Kind::String);
        assert_eq!(Value::from(vec![true]).kind(), Kind::BooleanList);
    }

    #[test]
    fn test_list_access() {
        let list = List::Integer(vec![3, 4, 5]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(1), Some(Value::Integer(4)));
        assert_eq!(list.get(3), None);
        assert_eq!(list.clone().widen(), List::Float(vec![3.0, 4.0, 5.0]));

        for kind in Kind::ALL {
            let empty = List::empty(kind);
            assert!(empty.is_empty());
            assert_eq!(empty.kind(), kind.list_of());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(42.0).to_string(), "42");
        assert_eq!(Value::Boolean(false).to_string(), "FALSE");
        assert_eq!(
            Value::from(vec!["a".to_string(), "b".to_string()]).to_string(),
            "[\"a\", \"b\"]"
        );
        assert_eq!(Value::from(vec![1.5, 2.0]).to_string(), "[1.5, 2]");
    }
}
