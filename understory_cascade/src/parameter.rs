// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generic parameter sets.
//!
//! A [`ParameterSet`] is the input of one update: an ordered sequence of
//! `(name, value)` pairs with type-erased values. Components pick out the
//! parameters they declare and reject the rest.

use alloc::borrow::Cow;
use smallvec::SmallVec;

use crate::value::ErasedValue;

/// Inline capacity for parameter entries.
///
/// Providers accept at most three parameters.
const INLINE_CAPACITY: usize = 3;

/// One named parameter value.
#[derive(Clone, Debug)]
pub struct Parameter {
    name: Cow<'static, str>,
    value: ErasedValue,
}

impl Parameter {
    /// Creates a parameter from a name and an erased value.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, value: ErasedValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Returns the parameter name as supplied.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter value.
    #[must_use]
    #[inline]
    pub fn value(&self) -> &ErasedValue {
        &self.value
    }
}

/// An ordered set of parameters for one update.
///
/// # Example
///
/// ```rust
/// use understory_cascade::ParameterSet;
///
/// let parameters = ParameterSet::new()
///     .with("Value", 3_i32)
///     .with("Name", "count");
///
/// assert_eq!(parameters.len(), 2);
/// assert_eq!(parameters.get("value").and_then(|v| v.downcast_ref::<i32>()), Some(&3));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ParameterSet {
    entries: SmallVec<[Parameter; INLINE_CAPACITY]>,
}

impl ParameterSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter and returns the set, builder style.
    #[must_use]
    pub fn with<T: Clone + 'static>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: T,
    ) -> Self {
        self.push(Parameter::new(name, ErasedValue::new(value)));
        self
    }

    /// Appends a parameter.
    pub fn push(&mut self, parameter: Parameter) {
        self.entries.push(parameter);
    }

    /// Returns the number of parameters, counting repeated names.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the set holds no parameters.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter()
    }

    /// Returns the first parameter whose name matches `name`, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ErasedValue> {
        self.entries
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(Parameter::value)
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<Parameter> for ParameterSet {
    fn extend<I: IntoIterator<Item = Parameter>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec::Vec;

    #[test]
    fn keeps_insertion_order() {
        let parameters = ParameterSet::new()
            .with("Content", ())
            .with("Value", 1_u8)
            .with(String::from("Name"), "n");
        let names: Vec<_> = parameters.iter().map(Parameter::name).collect();
        assert_eq!(names, ["Content", "Value", "Name"]);
    }

    #[test]
    fn get_ignores_ascii_case() {
        let parameters = ParameterSet::new().with("VALUE", 4_i64);
        assert_eq!(
            parameters.get("value").and_then(ErasedValue::downcast_ref::<i64>),
            Some(&4)
        );
        assert!(parameters.get("name").is_none());
    }

    #[test]
    fn collects_from_iterator() {
        let parameters: ParameterSet = [
            Parameter::new("Value", ErasedValue::new(1_i32)),
            Parameter::new("Value", ErasedValue::new(2_i32)),
        ]
        .into_iter()
        .collect();
        assert_eq!(parameters.len(), 2);
        // First match wins for lookups.
        assert_eq!(
            parameters.get("Value").and_then(ErasedValue::downcast_ref::<i32>),
            Some(&1)
        );
    }
}
