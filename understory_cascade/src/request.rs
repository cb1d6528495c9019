// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! What a descendant asks its ancestors for.

use core::any::TypeId;

/// A request for a cascading value: a value type and an optional name tag.
///
/// # Example
///
/// ```rust
/// use understory_cascade::CascadeRequest;
///
/// let by_type = CascadeRequest::of::<u32>();
/// assert_eq!(by_type.name(), None);
///
/// let by_name = CascadeRequest::of::<String>().named("theme");
/// assert_eq!(by_name.name(), Some("theme"));
/// assert!(by_name.wants::<String>());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CascadeRequest<'a> {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<&'a str>,
}

impl<'a> CascadeRequest<'a> {
    /// Requests a value of type `T`, matched by type alone.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            name: None,
        }
    }

    /// Requests a value by a type id obtained elsewhere.
    ///
    /// `type_name` is only used in diagnostics.
    #[must_use]
    pub fn of_type_id(type_id: TypeId, type_name: &'static str) -> Self {
        Self {
            type_id,
            type_name,
            name: None,
        }
    }

    /// Restricts the request to providers named exactly `name`.
    #[must_use]
    pub fn named(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Sets or clears the requested name.
    #[must_use]
    pub fn with_name(mut self, name: Option<&'a str>) -> Self {
        self.name = name;
        self
    }

    /// Returns the requested value type.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the requested value type's name, for diagnostics.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the requested name tag, if any.
    #[must_use]
    #[inline]
    pub fn name(&self) -> Option<&'a str> {
        self.name
    }

    /// Returns `true` if this request asks for values of type `T`.
    #[must_use]
    #[inline]
    pub fn wants<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// The name half of capability matching.
///
/// Matches when both names are unset (type-only match), or when both are set
/// and equal. The comparison is exact and case-sensitive.
#[must_use]
#[inline]
pub fn names_match(provided: Option<&str>, requested: Option<&str>) -> bool {
    match (provided, requested) {
        (None, None) => true,
        (Some(provided), Some(requested)) => provided == requested,
        _ => false,
    }
}
