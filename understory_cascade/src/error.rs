// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::borrow::Cow;
use alloc::string::String;

/// A rejected parameter update.
///
/// These are usage errors. They are returned synchronously from the update
/// that caused them, and the rejected update leaves the component untouched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    /// A required parameter was not supplied.
    #[error("component `{component}` requires a value for parameter `{parameter}`")]
    MissingRequiredParameter {
        /// The component that rejected the update.
        component: &'static str,
        /// The missing parameter.
        parameter: &'static str,
    },
    /// A parameter name is not accepted by the component.
    #[error("component `{component}` has no parameter named `{parameter}`")]
    UnrecognizedParameter {
        /// The component that rejected the update.
        component: &'static str,
        /// The offending parameter name, as supplied.
        parameter: String,
    },
    /// A parameter was supplied with an unusable value.
    #[error("component `{component}` rejected parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// The component that rejected the update.
        component: &'static str,
        /// The parameter holding the unusable value.
        parameter: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// A failure while binding a component's cascading parameters.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// A required cascading parameter has no matching ancestor provider.
    #[error(
        "no ancestor supplies `{type_name}` (name: {name:?}) for required cascading parameter `{parameter}`"
    )]
    MissingCascadingValue {
        /// The declared parameter that could not be bound.
        parameter: &'static str,
        /// The requested value type.
        type_name: &'static str,
        /// The requested name tag, if any.
        name: Option<Cow<'static, str>>,
    },
}

/// A failure reported by [`ComponentTree`](crate::ComponentTree).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError<K> {
    /// No node with this key exists.
    #[error("no node with key {0:?}")]
    UnknownNode(K),
    /// A node with this key already exists.
    #[error("a node with key {0:?} already exists")]
    DuplicateNode(K),
    /// The node exists but does not provide a cascading value.
    #[error("node {0:?} is not a cascading value provider")]
    NotAProvider(K),
    /// Moving `node` under `parent` would make it its own ancestor.
    #[error("cannot move node {node:?} under its own descendant {parent:?}")]
    WouldCycle {
        /// The node being moved.
        node: K,
        /// The requested new parent.
        parent: K,
    },
    /// A provider rejected its parameters.
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    /// A component's cascading parameters could not be bound.
    #[error(transparent)]
    Binding(#[from] BindingError),
}
