// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The value provider node.
//!
//! A [`CascadingValue`] is a transparent wrapper in the render tree: it
//! renders exactly its content and exists only to make its value reachable
//! from descendants.
//!
//! # Update protocol
//!
//! Each update receives a [`ParameterSet`] with up to three parameters,
//! matched ignoring ASCII case:
//!
//! | Parameter | Required | Meaning                                        |
//! |-----------|----------|------------------------------------------------|
//! | `Value`   | yes      | the published value, of the provider's type `T` |
//! | `Content` | no       | what to render underneath                      |
//! | `Name`    | no       | a non-empty name tag for named lookups         |
//!
//! The whole set is validated before anything is touched, so a rejected
//! update leaves the previous value, name and content in place. Once applied,
//! the provider **first** enqueues its own render and **then**, if the value
//! may have changed and anyone is subscribed, notifies every subscriber.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::TypeId;
use core::fmt;
use core::hash::Hash;

use smallvec::SmallVec;

use crate::change::{ChangeDetection, may_have_changed};
use crate::error::ParameterError;
use crate::parameter::ParameterSet;
use crate::request::{CascadeRequest, names_match};
use crate::schedule::RenderDispatch;
use crate::source::CascadingValueSource;
use crate::subscribers::SubscriberSet;
use crate::value::ErasedValue;

/// Component name used in parameter errors.
pub const COMPONENT_NAME: &str = "CascadingValue";

/// Name of the required value parameter.
pub const VALUE_PARAMETER: &str = "Value";

/// Name of the optional content parameter.
pub const CONTENT_PARAMETER: &str = "Content";

/// Name of the optional name-tag parameter.
pub const NAME_PARAMETER: &str = "Name";

/// What one successful update did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Whether change detection reported that the value may have changed.
    pub changed: bool,
    /// How many subscribers were notified.
    pub notified: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Slot {
    Value,
    Content,
    Name,
}

impl Slot {
    fn parse(name: &str) -> Option<Self> {
        [Self::Value, Self::Content, Self::Name]
            .into_iter()
            .find(|slot| slot.parameter().eq_ignore_ascii_case(name))
    }

    fn parameter(self) -> &'static str {
        match self {
            Self::Value => VALUE_PARAMETER,
            Self::Content => CONTENT_PARAMETER,
            Self::Name => NAME_PARAMETER,
        }
    }
}

/// A validated parameter set, ready to commit.
struct Accepted<T> {
    value: T,
    content: Option<ErasedValue>,
    name: Option<Box<str>>,
}

/// An additional type a provider can present its value as.
struct SupplyView<T> {
    type_id: TypeId,
    convert: Box<dyn Fn(&T) -> ErasedValue>,
}

/// A tree node that publishes a value of type `T` to its descendants.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{CascadingValue, ParameterSet, TraceRecorder, CascadeEvent};
///
/// let mut provider = CascadingValue::<u32, i32>::new(1);
/// provider.subscribe(2);
///
/// let mut trace = TraceRecorder::new();
/// provider.update(&ParameterSet::new().with("Value", 1), &mut trace).unwrap();
/// provider.update(&ParameterSet::new().with("value", 2), &mut trace).unwrap();
///
/// assert_eq!(provider.value(), Some(&2));
/// assert_eq!(
///     trace.events(),
///     &[
///         CascadeEvent::RenderEnqueued(1),
///         CascadeEvent::SubscriberNotified(2),
///         CascadeEvent::RenderEnqueued(1),
///         CascadeEvent::SubscriberNotified(2),
///     ]
/// );
/// ```
pub struct CascadingValue<K, T>
where
    K: Copy + Eq + Hash,
    T: ChangeDetection + Clone + 'static,
{
    key: K,
    value: Option<T>,
    content: Option<ErasedValue>,
    name: Option<Box<str>>,
    initialized: bool,
    views: SmallVec<[SupplyView<T>; 1]>,
    subscribers: SubscriberSet<K>,
}

impl<K, T> CascadingValue<K, T>
where
    K: Copy + Eq + Hash,
    T: ChangeDetection + Clone + 'static,
{
    /// Creates a provider for the node `key`, with no value assigned yet.
    #[must_use]
    pub fn new(key: K) -> Self {
        Self {
            key,
            value: None,
            content: None,
            name: None,
            initialized: false,
            views: SmallVec::new(),
            subscribers: SubscriberSet::new(),
        }
    }

    /// Declares that this provider can also supply its value as `U`.
    ///
    /// This is how a provider satisfies requests for a more general type,
    /// such as a trait object its value implements.
    ///
    /// ```rust
    /// use std::rc::Rc;
    /// use understory_cascade::{CascadeRequest, CascadingValue, ParameterSet, TraceRecorder};
    ///
    /// trait Palette { fn accent(&self) -> u32; }
    /// struct Dark;
    /// impl Palette for Dark { fn accent(&self) -> u32 { 0x336699 } }
    ///
    /// let mut provider = CascadingValue::<u32, Rc<Dark>>::new(1)
    ///     .supplies_as(|dark: &Rc<Dark>| dark.clone() as Rc<dyn Palette>);
    /// provider
    ///     .update(&ParameterSet::new().with("Value", Rc::new(Dark)), &mut TraceRecorder::new())
    ///     .unwrap();
    ///
    /// assert!(provider.can_supply(&CascadeRequest::of::<Rc<dyn Palette>>()));
    /// assert!(provider.can_supply(&CascadeRequest::of::<Rc<Dark>>()));
    /// assert!(!provider.can_supply(&CascadeRequest::of::<Dark>()));
    /// ```
    #[must_use]
    pub fn supplies_as<U, F>(mut self, convert: F) -> Self
    where
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let type_id = TypeId::of::<U>();
        if type_id != TypeId::of::<T>() && !self.views.iter().any(|v| v.type_id == type_id) {
            self.views.push(SupplyView {
                type_id,
                convert: Box::new(move |value: &T| ErasedValue::new(convert(value))),
            });
        }
        self
    }

    /// Returns the key of the node this provider belongs to.
    #[must_use]
    #[inline]
    pub fn key(&self) -> K {
        self.key
    }

    /// Returns the published value, or `None` before the first update.
    #[must_use]
    #[inline]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns the name tag, if one was supplied.
    #[must_use]
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the content parameter, if one was supplied.
    #[must_use]
    #[inline]
    pub fn content(&self) -> Option<&ErasedValue> {
        self.content.as_ref()
    }

    /// Renders the provider: its output is exactly its content.
    #[must_use]
    #[inline]
    pub fn render(&self) -> Option<&ErasedValue> {
        self.content.as_ref()
    }

    /// Returns the current subscribers.
    #[must_use]
    #[inline]
    pub fn subscribers(&self) -> &SubscriberSet<K> {
        &self.subscribers
    }

    /// Registers `subscriber`; duplicates are ignored.
    pub fn subscribe(&mut self, subscriber: K) -> bool {
        let added = self.subscribers.subscribe(subscriber);
        if added {
            tracing::trace!(
                value_type = core::any::type_name::<T>(),
                subscribers = self.subscribers.len(),
                "subscribed to cascading value"
            );
        }
        added
    }

    /// Removes `subscriber`; absent subscribers are ignored.
    pub fn unsubscribe(&mut self, subscriber: K) -> bool {
        let removed = self.subscribers.unsubscribe(subscriber);
        if removed {
            tracing::trace!(
                value_type = core::any::type_name::<T>(),
                subscribers = self.subscribers.len(),
                "unsubscribed from cascading value"
            );
        }
        removed
    }

    /// Returns `true` if this provider can present its value as `type_id`.
    #[must_use]
    pub fn supplies_type(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<T>() || self.views.iter().any(|v| v.type_id == type_id)
    }

    /// Returns `true` if this provider satisfies `request`.
    ///
    /// See [`CascadingValueSource::can_supply`].
    #[must_use]
    pub fn can_supply(&self, request: &CascadeRequest<'_>) -> bool {
        self.value.is_some()
            && self.supplies_type(request.type_id())
            && names_match(self.name(), request.name())
    }

    /// Applies a new parameter set.
    ///
    /// On success the provider enqueues its own render through `dispatch`,
    /// then notifies every subscriber through `dispatch` if change detection
    /// reports that the value may have changed.
    ///
    /// # Errors
    ///
    /// - [`ParameterError::UnrecognizedParameter`] for a name other than
    ///   `Value`, `Content` or `Name` (ignoring ASCII case).
    /// - [`ParameterError::MissingRequiredParameter`] if `Value` is absent.
    /// - [`ParameterError::InvalidParameter`] if a parameter repeats, `Value`
    ///   is not a `T`, `Name` is not a non-empty string, or `Name` differs
    ///   from the one established by the first update.
    ///
    /// A rejected update changes nothing and schedules nothing.
    ///
    /// Every update supplies the whole parameter set, so a parameter left
    /// out is reset. `Name` is the exception: the first successful update
    /// fixes it, present or absent. Leaving out an established name counts
    /// as changing it and is rejected, and so is adding a name to a provider
    /// that started without one. Repeat the original `Name` with every update.
    pub fn update<D>(
        &mut self,
        parameters: &ParameterSet,
        dispatch: &mut D,
    ) -> Result<UpdateOutcome, ParameterError>
    where
        D: RenderDispatch<K> + ?Sized,
    {
        let accepted = Self::accept(parameters)?;
        if self.initialized && accepted.name != self.name {
            return Err(invalid(NAME_PARAMETER, "name cannot change after the first update"));
        }

        let changed = may_have_changed(self.value.as_ref(), &accepted.value);
        self.value = Some(accepted.value);
        self.content = accepted.content;
        self.name = accepted.name;
        self.initialized = true;

        dispatch.enqueue_render(self.key);

        let notified = if changed && !self.subscribers.is_empty() {
            tracing::debug!(
                value_type = core::any::type_name::<T>(),
                name = self.name(),
                subscribers = self.subscribers.len(),
                "cascading value changed; notifying subscribers"
            );
            self.subscribers.notify_all(dispatch)
        } else {
            0
        };

        Ok(UpdateOutcome { changed, notified })
    }

    fn accept(parameters: &ParameterSet) -> Result<Accepted<T>, ParameterError> {
        let mut value = None;
        let mut content = None;
        let mut name = None;
        let mut seen: SmallVec<[Slot; 3]> = SmallVec::new();

        for parameter in parameters.iter() {
            let Some(slot) = Slot::parse(parameter.name()) else {
                return Err(ParameterError::UnrecognizedParameter {
                    component: COMPONENT_NAME,
                    parameter: String::from(parameter.name()),
                });
            };
            if seen.contains(&slot) {
                return Err(invalid(slot.parameter(), "supplied more than once"));
            }
            seen.push(slot);

            match slot {
                Slot::Value => {
                    let typed = parameter
                        .value()
                        .cloned::<T>()
                        .ok_or_else(|| invalid(VALUE_PARAMETER, "value has the wrong type"))?;
                    value = Some(typed);
                }
                Slot::Content => content = Some(parameter.value().clone()),
                Slot::Name => name = Some(name_tag(parameter.value())?),
            }
        }

        let Some(value) = value else {
            return Err(ParameterError::MissingRequiredParameter {
                component: COMPONENT_NAME,
                parameter: VALUE_PARAMETER,
            });
        };
        Ok(Accepted {
            value,
            content,
            name,
        })
    }
}

fn invalid(parameter: &'static str, reason: &'static str) -> ParameterError {
    ParameterError::InvalidParameter {
        component: COMPONENT_NAME,
        parameter,
        reason,
    }
}

fn name_tag(value: &ErasedValue) -> Result<Box<str>, ParameterError> {
    let name = value
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| value.downcast_ref::<&'static str>().copied())
        .or_else(|| value.downcast_ref::<Box<str>>().map(|name| &**name))
        .ok_or_else(|| invalid(NAME_PARAMETER, "name must be a string"))?;
    if name.is_empty() {
        return Err(invalid(NAME_PARAMETER, "name must not be empty"));
    }
    Ok(Box::from(name))
}

impl<K, T> CascadingValueSource<K> for CascadingValue<K, T>
where
    K: Copy + Eq + Hash,
    T: ChangeDetection + Clone + 'static,
{
    fn can_supply(&self, request: &CascadeRequest<'_>) -> bool {
        Self::can_supply(self, request)
    }

    fn current_value(&self, type_id: TypeId) -> Option<ErasedValue> {
        let value = self.value.as_ref()?;
        if type_id == TypeId::of::<T>() {
            return Some(ErasedValue::new(value.clone()));
        }
        self.views
            .iter()
            .find(|view| view.type_id == type_id)
            .map(|view| (view.convert)(value))
    }

    fn name(&self) -> Option<&str> {
        Self::name(self)
    }

    fn value_type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn subscribe(&mut self, subscriber: K) -> bool {
        Self::subscribe(self, subscriber)
    }

    fn unsubscribe(&mut self, subscriber: K) -> bool {
        Self::unsubscribe(self, subscriber)
    }

    fn is_subscribed(&self, subscriber: K) -> bool {
        self.subscribers.contains(subscriber)
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn set_parameters(
        &mut self,
        parameters: &ParameterSet,
        dispatch: &mut dyn RenderDispatch<K>,
    ) -> Result<UpdateOutcome, ParameterError> {
        self.update(parameters, dispatch)
    }

    fn render(&self) -> Option<&ErasedValue> {
        Self::render(self)
    }
}

// Manual Debug impl since views hold closures.
impl<K, T> fmt::Debug for CascadingValue<K, T>
where
    K: Copy + Eq + Hash + fmt::Debug,
    T: ChangeDetection + Clone + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadingValue")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("name", &self.name)
            .field("has_content", &self.content.is_some())
            .field("views", &self.views.len())
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}
