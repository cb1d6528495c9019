// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability every provider node exposes to the tree.

use core::any::TypeId;

use crate::error::ParameterError;
use crate::parameter::ParameterSet;
use crate::provider::UpdateOutcome;
use crate::request::CascadeRequest;
use crate::schedule::RenderDispatch;
use crate::value::ErasedValue;

/// A tree node that publishes a cascading value.
///
/// This is the object-safe face of [`CascadingValue`](crate::CascadingValue),
/// so a tree can hold providers of different value types side by side and
/// match them against requests at runtime.
pub trait CascadingValueSource<K> {
    /// Returns `true` if this provider satisfies `request`.
    ///
    /// The requested type must be the provider's value type or one of the
    /// views it declares, and the names must match under
    /// [`names_match`](crate::names_match). A provider that has never been
    /// assigned a value supplies nothing.
    fn can_supply(&self, request: &CascadeRequest<'_>) -> bool;

    /// Returns the current value, presented as `type_id`.
    ///
    /// Returns `None` if no value has been assigned yet or the provider has
    /// no view for `type_id`.
    fn current_value(&self, type_id: TypeId) -> Option<ErasedValue>;

    /// Returns the provider's name tag, if any.
    fn name(&self) -> Option<&str>;

    /// Returns the name of the provider's declared value type.
    fn value_type_name(&self) -> &'static str;

    /// Registers `subscriber` for change notifications.
    ///
    /// Returns `false` if it was already registered.
    fn subscribe(&mut self, subscriber: K) -> bool;

    /// Removes `subscriber`.
    ///
    /// Returns `false` if it was not registered.
    fn unsubscribe(&mut self, subscriber: K) -> bool;

    /// Returns `true` if `subscriber` is registered.
    fn is_subscribed(&self, subscriber: K) -> bool;

    /// Returns the number of registered subscribers.
    fn subscriber_count(&self) -> usize;

    /// Applies a new parameter set; see [`CascadingValue::update`](crate::CascadingValue::update).
    fn set_parameters(
        &mut self,
        parameters: &ParameterSet,
        dispatch: &mut dyn RenderDispatch<K>,
    ) -> Result<UpdateOutcome, ParameterError>;

    /// Returns the rendered output: the content parameter, unaltered.
    fn render(&self) -> Option<&ErasedValue>;
}
