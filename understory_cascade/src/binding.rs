// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The descendant side: declared cascading parameters and their bindings.
//!
//! A component declares each cascading parameter it wants with a
//! [`CascadingParameterInfo`]. The host keeps one [`CascadingParameterState`]
//! per declaration, which remembers the provider it is subscribed to and the
//! last value it received.
//!
//! ## Unmatched parameters
//!
//! Finding no provider is not an error by itself. An optional parameter is
//! left unset and the miss is logged at `debug`. A parameter declared with
//! [`CascadingParameterInfo::required`] fails with
//! [`BindingError::MissingCascadingValue`] instead.

use alloc::borrow::Cow;
use core::any::TypeId;
use core::hash::Hash;

use crate::error::BindingError;
use crate::lookup::{CascadeTree, find_nearest};
use crate::request::CascadeRequest;
use crate::value::ErasedValue;

/// A declared cascading parameter: what a component asks its ancestors for.
///
/// # Example
///
/// ```rust
/// use understory_cascade::CascadingParameterInfo;
///
/// let info = CascadingParameterInfo::new::<String>("Theme")
///     .named("theme")
///     .required();
/// assert_eq!(info.parameter(), "Theme");
/// assert_eq!(info.name(), Some("theme"));
/// assert!(info.is_required());
/// assert!(info.request().wants::<String>());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CascadingParameterInfo {
    parameter: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    name: Option<Cow<'static, str>>,
    required: bool,
}

impl CascadingParameterInfo {
    /// Declares parameter `parameter`, matched against providers of type `T`.
    #[must_use]
    pub fn new<T: 'static>(parameter: &'static str) -> Self {
        Self {
            parameter,
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            name: None,
            required: false,
        }
    }

    /// Restricts matching to providers named exactly `name`.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Makes an unmatched lookup an error instead of an unset parameter.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns the declared parameter name.
    #[must_use]
    #[inline]
    pub fn parameter(&self) -> &'static str {
        self.parameter
    }

    /// Returns the requested value type.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the requested value type's name.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the requested provider name, if any.
    #[must_use]
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if an unmatched lookup is an error.
    #[must_use]
    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the lookup request for this parameter.
    #[must_use]
    pub fn request(&self) -> CascadeRequest<'_> {
        CascadeRequest::of_type_id(self.type_id, self.type_name).with_name(self.name())
    }

    fn missing(&self) -> BindingError {
        BindingError::MissingCascadingValue {
            parameter: self.parameter,
            type_name: self.type_name,
            name: self.name.clone(),
        }
    }
}

/// The supplier change made by one [`CascadingParameterState::resolve`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Resolution<K> {
    /// The provider subscribed to before resolving.
    pub previous: Option<K>,
    /// The provider subscribed to after resolving.
    pub current: Option<K>,
}

impl<K: PartialEq> Resolution<K> {
    /// Returns `true` if a provider was found.
    #[must_use]
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.current.is_some()
    }

    /// Returns `true` if the subscription moved to a different provider,
    /// or was made or dropped.
    #[must_use]
    #[inline]
    pub fn rebound(&self) -> bool {
        self.previous != self.current
    }
}

/// One component's binding of one declared cascading parameter.
#[derive(Clone, Debug)]
pub struct CascadingParameterState<K> {
    info: CascadingParameterInfo,
    supplier: Option<K>,
    value: Option<ErasedValue>,
}

impl<K> CascadingParameterState<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an unbound state for `info`.
    #[must_use]
    pub fn new(info: CascadingParameterInfo) -> Self {
        Self {
            info,
            supplier: None,
            value: None,
        }
    }

    /// Returns the declaration.
    #[must_use]
    #[inline]
    pub fn info(&self) -> &CascadingParameterInfo {
        &self.info
    }

    /// Returns the provider this parameter is subscribed to.
    #[must_use]
    #[inline]
    pub fn supplier(&self) -> Option<K> {
        self.supplier
    }

    /// Returns the last resolved value, type-erased.
    #[must_use]
    #[inline]
    pub fn erased_value(&self) -> Option<&ErasedValue> {
        self.value.as_ref()
    }

    /// Returns the last resolved value as a `T`.
    #[must_use]
    pub fn value<T: 'static>(&self) -> Option<&T> {
        self.value.as_ref()?.downcast_ref()
    }

    /// Looks up the nearest supplier above `owner` and refreshes the binding.
    ///
    /// When the supplier differs from the current one, `owner` unsubscribes
    /// from the old provider before subscribing to the new one.
    ///
    /// # Errors
    ///
    /// [`BindingError::MissingCascadingValue`] if the parameter is required
    /// and nothing supplies it. The state is left unchanged in that case.
    pub fn resolve<T>(&mut self, owner: K, tree: &mut T) -> Result<Resolution<K>, BindingError>
    where
        T: CascadeTree<K> + ?Sized,
    {
        let found = find_nearest(tree.parent(owner), &self.info.request(), tree);
        if found.is_none() && self.info.required {
            return Err(self.info.missing());
        }

        let previous = self.supplier;
        let current = found.as_ref().map(|supplier| supplier.provider);
        if previous != current {
            if let Some(old) = previous
                && let Some(source) = tree.source_mut(old)
            {
                source.unsubscribe(owner);
            }
            if let Some(new) = current
                && let Some(source) = tree.source_mut(new)
            {
                source.subscribe(owner);
            }
            self.supplier = current;
        }

        if found.is_none() {
            tracing::debug!(
                parameter = self.info.parameter,
                type_name = self.info.type_name,
                name = self.info.name(),
                "no ancestor supplies cascading parameter; leaving it unset"
            );
        }
        self.value = found.map(|supplier| supplier.value);
        Ok(Resolution { previous, current })
    }

    /// Drops the binding, unsubscribing `owner` from its supplier.
    ///
    /// Returns `false` if there was nothing to unsubscribe from.
    pub fn detach<T>(&mut self, owner: K, tree: &mut T) -> bool
    where
        T: CascadeTree<K> + ?Sized,
    {
        self.value = None;
        let Some(supplier) = self.supplier.take() else {
            return false;
        };
        tree.source_mut(supplier)
            .is_some_and(|source| source.unsubscribe(owner))
    }
}
