// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Cascade: values published by an ancestor, visible to every
//! descendant.
//!
//! A provider node publishes a typed value, optionally tagged with a name.
//! Any descendant can ask for "the nearest ancestor that supplies `T`
//! (named `n`)" without the value being threaded through every component in
//! between. Descendants that bind to a provider subscribe to it and are told
//! to re-resolve when its value may have changed.
//!
//! ## Core Concepts
//!
//! ### Providers
//!
//! [`CascadingValue`] holds the published value, an optional name, optional
//! content to render, and the set of subscribed descendants. Each update is
//! a [`ParameterSet`] carrying `Value`, and optionally `Content` and `Name`.
//!
//! ### Lookup
//!
//! [`find_nearest`] walks the parent chain of a [`CascadeTree`] and returns
//! the first provider whose [`CascadingValueSource::can_supply`] accepts the
//! [`CascadeRequest`]. A provider supplies its own value type plus any views
//! declared with [`CascadingValue::supplies_as`], and names match exactly.
//!
//! ### Change detection
//!
//! [`ChangeDetection`] is shallow: plain data compares by value, shared
//! pointers compare by identity. Subscribers are only notified when the new
//! value may differ from the previous one.
//!
//! ### Ordering
//!
//! An update **first** enqueues the provider's own render and **then**
//! notifies subscribers, so ancestors render before the descendants they
//! affect. [`TraceRecorder`] captures both in order.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_cascade::{
//!     CascadeEvent, CascadingParameterInfo, CascadingValue, ComponentTree, ParameterSet,
//! };
//!
//! let mut tree = ComponentTree::new().with_tracing();
//!
//! // A provider at the root publishes a named theme.
//! let theme = ParameterSet::new().with("Value", "dark").with("Name", "theme");
//! tree.insert_provider(None, CascadingValue::<u32, &'static str>::new(1), &theme)
//!     .unwrap();
//!
//! // A descendant asks for it by type and name.
//! let wants_theme = CascadingParameterInfo::new::<&'static str>("Theme").named("theme");
//! tree.insert_component(2, Some(1), [wants_theme]).unwrap();
//! assert_eq!(tree.parameter::<&'static str>(2, "Theme"), Some(&"dark"));
//!
//! // Changing the value re-renders the provider, then its subscriber.
//! tree.clear_trace();
//! let light = ParameterSet::new().with("Value", "light").with("Name", "theme");
//! tree.update_provider(1, &light).unwrap();
//! assert_eq!(tree.parameter::<&'static str>(2, "Theme"), Some(&"light"));
//! assert_eq!(
//!     tree.trace().unwrap().events(),
//!     &[
//!         CascadeEvent::RenderEnqueued(1),
//!         CascadeEvent::SubscriberNotified(2),
//!         CascadeEvent::RenderEnqueued(2),
//!     ]
//! );
//! ```
//!
//! ## Unmatched parameters
//!
//! Finding no provider is reported as `None` by the lookup layer. A
//! declared parameter is then left unset, unless it was declared
//! [`required`](CascadingParameterInfo::required), in which case binding
//! fails with [`BindingError::MissingCascadingValue`].
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` feature only forwards
//! to `std` support in `thiserror` and `tracing`.

#![no_std]

extern crate alloc;

mod binding;
mod change;
mod error;
mod lookup;
mod parameter;
mod provider;
mod request;
mod schedule;
mod source;
mod subscribers;
mod tree;
mod value;

pub use binding::{CascadingParameterInfo, CascadingParameterState, Resolution};
pub use change::{ChangeDetection, may_have_changed};
pub use error::{BindingError, ParameterError, TreeError};
pub use lookup::{CascadeTree, Supplier, find_nearest, find_suppliers};
pub use parameter::{Parameter, ParameterSet};
pub use provider::{
    COMPONENT_NAME, CONTENT_PARAMETER, CascadingValue, NAME_PARAMETER, UpdateOutcome,
    VALUE_PARAMETER,
};
pub use request::{CascadeRequest, names_match};
pub use schedule::{
    CascadeEvent, CascadeNotify, FifoRenderQueue, RenderDispatch, RenderQueue, SplitDispatch,
    TraceRecorder,
};
pub use source::CascadingValueSource;
pub use subscribers::SubscriberSet;
pub use tree::ComponentTree;
pub use value::ErasedValue;
