//! Tagged payloads for composite table values.
//!
//! A table whose value type is [`Value<T>`] can hold plain scalars next to
//! lists, sets, and hashes. Adapters check the [`ValueKind`] before touching
//! a container and report a [`CacheError::TypeMismatch`] instead of guessing.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// VALUE KIND
// ═══════════════════════════════════════════════════════════════════════════════

/// Discriminant of a [`Value`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// A single opaque value.
    Scalar,
    /// A double-ended list.
    List,
    /// An unordered set of unique members.
    Set,
    /// A map from field names to values.
    Hash,
}

impl ValueKind {
    /// Lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Scalar => "scalar",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Hash => "hash",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALUE
// ═══════════════════════════════════════════════════════════════════════════════

/// A table payload tagged with its kind.
#[derive(Clone, Debug)]
pub enum Value<T> {
    /// A single value.
    Scalar(T),
    /// Ordered elements, pushed and popped at either end.
    List(VecDeque<T>),
    /// Unique members.
    Set(HashSet<T>),
    /// Field name to value.
    Hash(HashMap<String, T>),
}

impl<T> Value<T> {
    /// Wraps a single value.
    pub fn scalar(value: T) -> Self {
        Value::Scalar(value)
    }

    /// Creates an empty list.
    pub fn list() -> Self {
        Value::List(VecDeque::new())
    }

    /// Creates an empty set.
    pub fn set() -> Self {
        Value::Set(HashSet::new())
    }

    /// Creates an empty hash.
    pub fn hash() -> Self {
        Value::Hash(HashMap::new())
    }

    /// Returns the kind discriminant.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Scalar(_) => ValueKind::Scalar,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Hash(_) => ValueKind::Hash,
        }
    }

    /// Fails with `TypeMismatch` unless this value is of `expected` kind.
    pub fn expect_kind(&self, expected: ValueKind) -> Result<()> {
        let found = self.kind();
        if found == expected {
            Ok(())
        } else {
            Err(CacheError::TypeMismatch { expected, found })
        }
    }

    fn mismatch(&self, expected: ValueKind) -> CacheError {
        CacheError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    /// Borrows the scalar payload.
    pub fn as_scalar(&self) -> Result<&T> {
        match self {
            Value::Scalar(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Scalar)),
        }
    }

    /// Borrows the list payload.
    pub fn as_list(&self) -> Result<&VecDeque<T>> {
        match self {
            Value::List(list) => Ok(list),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }

    /// Mutably borrows the list payload.
    pub fn as_list_mut(&mut self) -> Result<&mut VecDeque<T>> {
        match self {
            Value::List(list) => Ok(list),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }

    /// Borrows the set payload.
    pub fn as_set(&self) -> Result<&HashSet<T>> {
        match self {
            Value::Set(set) => Ok(set),
            other => Err(other.mismatch(ValueKind::Set)),
        }
    }

    /// Mutably borrows the set payload.
    pub fn as_set_mut(&mut self) -> Result<&mut HashSet<T>> {
        match self {
            Value::Set(set) => Ok(set),
            other => Err(other.mismatch(ValueKind::Set)),
        }
    }

    /// Borrows the hash payload.
    pub fn as_hash(&self) -> Result<&HashMap<String, T>> {
        match self {
            Value::Hash(hash) => Ok(hash),
            other => Err(other.mismatch(ValueKind::Hash)),
        }
    }

    /// Mutably borrows the hash payload.
    pub fn as_hash_mut(&mut self) -> Result<&mut HashMap<String, T>> {
        match self {
            Value::Hash(hash) => Ok(hash),
            other => Err(other.mismatch(ValueKind::Hash)),
        }
    }
}

impl<T> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Value::Scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn any_kind() -> impl Strategy<Value = ValueKind> {
        prop_oneof![
            Just(ValueKind::Scalar),
            Just(ValueKind::List),
            Just(ValueKind::Set),
            Just(ValueKind::Hash),
        ]
    }

    fn empty(kind: ValueKind) -> Value<u8> {
        match kind {
            ValueKind::Scalar => Value::scalar(0),
            ValueKind::List => Value::list(),
            ValueKind::Set => Value::set(),
            ValueKind::Hash => Value::hash(),
        }
    }

    #[test_case(Value::scalar(1u8), ValueKind::Scalar ; "scalar")]
    #[test_case(Value::list(), ValueKind::List ; "list")]
    #[test_case(Value::set(), ValueKind::Set ; "set")]
    #[test_case(Value::hash(), ValueKind::Hash ; "hash")]
    fn test_kind(value: Value<u8>, kind: ValueKind) {
        assert_eq!(value.kind(), kind);
        assert!(value.expect_kind(kind).is_ok());
    }

    #[test_case(ValueKind::Scalar, "scalar")]
    #[test_case(ValueKind::List, "list")]
    #[test_case(ValueKind::Set, "set")]
    #[test_case(ValueKind::Hash, "hash")]
    fn test_kind_display(kind: ValueKind, name: &str) {
        assert_eq!(kind.to_string(), name);
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{name}\""));
    }

    #[test]
    fn test_expect_kind_mismatch() {
        let value: Value<u8> = Value::list();
        let err = value.expect_kind(ValueKind::Hash).unwrap_err();
        assert!(matches!(
            err,
            CacheError::TypeMismatch {
                expected: ValueKind::Hash,
                found: ValueKind::List
            }
        ));
    }

    #[test]
    fn test_accessors() {
        let mut list: Value<&str> = Value::list();
        list.as_list_mut().unwrap().push_back("a");
        assert_eq!(list.as_list().unwrap().len(), 1);
        assert!(list.as_set().is_err());
        assert!(list.as_hash_mut().is_err());

        let mut set: Value<&str> = Value::set();
        assert!(set.as_set_mut().unwrap().insert("m"));
        assert!(set.as_set().unwrap().contains("m"));
        assert!(set.as_list().unwrap_err().is_type_mismatch());

        let mut hash: Value<&str> = Value::hash();
        hash.as_hash_mut().unwrap().insert("f".into(), "v");
        assert_eq!(hash.as_hash().unwrap().get("f"), Some(&"v"));
        assert!(hash.as_scalar().is_err());
    }

    #[test]
    fn test_from_scalar() {
        let value: Value<String> = "hello".to_string().into();
        assert_eq!(value.as_scalar().unwrap(), "hello");
    }

    proptest! {
        /// Only the accessor for the value's own kind succeeds; the others
        /// report the expected and found kinds.
        #[test]
        fn test_accessor_matches_kind(kind in any_kind(), expected in any_kind()) {
            let value = empty(kind);
            let result = match expected {
                ValueKind::Scalar => value.as_scalar().map(|_| ()),
                ValueKind::List => value.as_list().map(|_| ()),
                ValueKind::Set => value.as_set().map(|_| ()),
                ValueKind::Hash => value.as_hash().map(|_| ()),
            };

            if kind == expected {
                prop_assert!(result.is_ok());
                prop_assert!(value.expect_kind(expected).is_ok());
            } else {
                let is_expected_mismatch = matches!(
                    result,
                    Err(CacheError::TypeMismatch { expected: e, found: f }) if e == expected && f == kind
                );
                prop_assert!(is_expected_mismatch);
                prop_assert!(value.expect_kind(expected).unwrap_err().is_type_mismatch());
            }
        }
    }
}
