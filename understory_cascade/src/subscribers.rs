// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-provider subscriber registry.

use core::hash::Hash;

use hashbrown::HashSet;

use crate::schedule::CascadeNotify;

/// The set of descendants subscribed to one provider.
///
/// Subscribers are plain keys: the provider never owns the nodes it
/// notifies. The tree that owns those nodes must unsubscribe them when they
/// leave it. Every operation is idempotent, because teardown order across a
/// tree is not guaranteed.
///
/// The set starts empty and does not allocate until the first subscription.
///
/// # Example
///
/// ```rust
/// use understory_cascade::SubscriberSet;
///
/// let mut subscribers = SubscriberSet::new();
/// assert!(subscribers.subscribe(7_u32));
/// assert!(!subscribers.subscribe(7)); // duplicate is a no-op
///
/// let mut notified = Vec::new();
/// subscribers.notify_all(&mut |key: u32| notified.push(key));
/// assert_eq!(notified, [7]);
///
/// assert!(subscribers.unsubscribe(7));
/// assert!(!subscribers.unsubscribe(7)); // absent is a no-op
/// ```
#[derive(Clone, Debug)]
pub struct SubscriberSet<K>
where
    K: Copy + Eq + Hash,
{
    subscribers: HashSet<K>,
}

impl<K> Default for SubscriberSet<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> SubscriberSet<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: HashSet::new(),
        }
    }

    /// Adds `subscriber`.
    ///
    /// Returns `false` if it was already subscribed.
    pub fn subscribe(&mut self, subscriber: K) -> bool {
        self.subscribers.insert(subscriber)
    }

    /// Removes `subscriber`.
    ///
    /// Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, subscriber: K) -> bool {
        self.subscribers.remove(&subscriber)
    }

    /// Returns `true` if `subscriber` is in the set.
    #[must_use]
    #[inline]
    pub fn contains(&self, subscriber: K) -> bool {
        self.subscribers.contains(&subscriber)
    }

    /// Returns the number of subscribers.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns `true` if nobody is subscribed.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Iterates over subscribers in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.subscribers.iter().copied()
    }

    /// Notifies every current subscriber, in unspecified order.
    ///
    /// Returns the number of subscribers notified.
    pub fn notify_all<N>(&self, notify: &mut N) -> usize
    where
        N: CascadeNotify<K> + ?Sized,
    {
        for subscriber in &self.subscribers {
            notify.parameters_changed(*subscriber);
        }
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn starts_empty() {
        let subscribers = SubscriberSet::<u32>::new();
        assert!(subscribers.is_empty());
        assert_eq!(subscribers.len(), 0);
        assert!(!subscribers.contains(1));
    }

    #[test]
    fn duplicate_subscribe_is_noop() {
        let mut subscribers = SubscriberSet::new();
        assert!(subscribers.subscribe(1_u32));
        assert!(!subscribers.subscribe(1));
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn unsubscribe_absent_is_noop() {
        let mut subscribers = SubscriberSet::new();
        assert!(!subscribers.unsubscribe(1_u32));
        subscribers.subscribe(2);
        assert!(!subscribers.unsubscribe(1));
        assert!(subscribers.contains(2));
    }

    #[test]
    fn notify_all_reaches_each_subscriber_once() {
        let mut subscribers = SubscriberSet::new();
        for key in [3_u32, 1, 2, 1] {
            subscribers.subscribe(key);
        }

        let mut notified = Vec::new();
        let count = subscribers.notify_all(&mut |key: u32| notified.push(key));
        notified.sort_unstable();

        assert_eq!(count, 3);
        assert_eq!(notified, [1, 2, 3]);
    }

    #[test]
    fn notify_all_on_empty_set_does_nothing() {
        let subscribers = SubscriberSet::<u32>::new();
        let mut calls = 0;
        assert_eq!(subscribers.notify_all(&mut |_: u32| calls += 1), 0);
        assert_eq!(calls, 0);
    }
}
