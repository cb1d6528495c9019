// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nearest-ancestor capability lookup.
//!
//! [`find_nearest`] walks up the parent chain from a starting node and
//! returns the first provider that can supply a request. Trees plug in
//! through [`CascadeTree`].

use smallvec::SmallVec;

use crate::binding::CascadingParameterInfo;
use crate::request::CascadeRequest;
use crate::source::CascadingValueSource;
use crate::value::ErasedValue;

/// The view of a component tree that cascading lookup needs.
pub trait CascadeTree<K> {
    /// Returns the parent of `key`, or `None` at a root or for an unknown key.
    fn parent(&self, key: K) -> Option<K>;

    /// Returns the provider capability of `key`, if `key` is a provider.
    fn source(&self, key: K) -> Option<&dyn CascadingValueSource<K>>;

    /// Returns the provider capability of `key` mutably, if `key` is a provider.
    fn source_mut(&mut self, key: K) -> Option<&mut dyn CascadingValueSource<K>>;
}

/// A provider found by [`find_nearest`], with the value it supplied.
#[derive(Clone, Debug)]
pub struct Supplier<K> {
    /// The key of the matching provider.
    pub provider: K,
    /// The provider's current value, presented as the requested type.
    pub value: ErasedValue,
}

/// Finds the nearest provider at or above `start` that satisfies `request`.
///
/// Requesters usually pass their parent as `start`, so a provider never
/// matches itself. Finding nothing is not an error here: the caller decides
/// whether an unmatched request means a default value or a failure.
///
/// # Arguments
///
/// * `start` - The first node to consider (typically the requester's parent)
/// * `request` - The wanted type and optional name
/// * `tree` - Parent links and provider capabilities
pub fn find_nearest<K, T>(
    mut current: Option<K>,
    request: &CascadeRequest<'_>,
    tree: &T,
) -> Option<Supplier<K>>
where
    K: Copy,
    T: CascadeTree<K> + ?Sized,
{
    while let Some(key) = current {
        if let Some(source) = tree.source(key)
            && source.can_supply(request)
            && let Some(value) = source.current_value(request.type_id())
        {
            return Some(Supplier {
                provider: key,
                value,
            });
        }
        current = tree.parent(key);
    }
    None
}

/// Resolves a batch of declared cascading parameters from the same start node.
///
/// The result lines up with `infos`; unmatched entries are `None`.
pub fn find_suppliers<K, T>(
    infos: &[CascadingParameterInfo],
    start: Option<K>,
    tree: &T,
) -> SmallVec<[Option<Supplier<K>>; 4]>
where
    K: Copy,
    T: CascadeTree<K> + ?Sized,
{
    infos
        .iter()
        .map(|info| find_nearest(start, &info.request(), tree))
        .collect()
}
