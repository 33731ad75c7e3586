//! Request parameter values and the parameter map.
//!
//! Parameters come from three places: the query string, a form-encoded
//! request body, and route captures. Scalar sources produce
//! [`ParamValue::One`]; splat and agent captures produce ordered
//! [`ParamValue::Many`] lists.

use std::collections::HashMap;

/// A single parameter value: one string, or an ordered list of captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A scalar value (query/body field or a named route capture).
    One(String),
    /// An ordered list (splat captures, agent sub-captures).
    Many(Vec<String>),
}

impl ParamValue {
    /// The scalar value, if this is [`ParamValue::One`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(_) => None,
        }
    }

    /// View the value as a list. A scalar is a one-element list.
    #[must_use]
    pub fn as_list(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_owned())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// A named parameter map. Inserting an existing key overwrites it, so
/// merge order decides precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: HashMap<String, ParamValue>,
}

impl Params {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Look up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.inner.get(key)
    }

    /// Look up a scalar parameter.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    /// Look up a parameter as a list.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.get(key).map(ParamValue::as_list)
    }

    /// True when the key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.inner.iter()
    }

    /// Copy every entry of `other` into `self`, overwriting collisions.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            self.inner.insert(key.clone(), value.clone());
        }
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
