// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased values.
//!
//! [`ErasedValue`] carries parameter values into a provider update and carries
//! supplied values back out to subscribers, without either side naming the
//! other's concrete types.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

/// A cloneable, type-erased value.
///
/// # Example
///
/// ```rust
/// use understory_cascade::ErasedValue;
///
/// let value = ErasedValue::new(42_i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
/// assert_eq!(value.type_name(), "i32");
///
/// let owned: Option<i32> = value.cloned();
/// assert_eq!(owned, Some(42));
/// ```
pub struct ErasedValue {
    inner: Box<dyn CloneAny>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ErasedValue {
    /// Wraps a concrete value.
    #[must_use]
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name of the contained value, for diagnostics.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the contained value is of type `T`.
    #[must_use]
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrows the contained value as `T`.
    ///
    /// Returns `None` if the contained value is not a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            self.inner.as_any().downcast_ref()
        } else {
            None
        }
    }

    /// Clones the contained value out as `T`.
    ///
    /// Returns `None` if the contained value is not a `T`.
    #[must_use]
    pub fn cloned<T: Clone + 'static>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            type_id: self.type_id,
            type_name: self.type_name,
        }
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

trait CloneAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn CloneAny>;
}

impl<T: Clone + 'static> CloneAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn CloneAny> {
        Box::new(self.clone())
    }
}
