// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render scheduling and subscriber notification seams.
//!
//! A provider update talks to the surrounding renderer through two
//! operations:
//!
//! - [`RenderQueue::enqueue_render`] schedules a node's own render.
//! - [`CascadeNotify::parameters_changed`] tells a subscriber that its
//!   cascading parameters may have changed and must be re-resolved.
//!
//! A provider always enqueues its own render *before* it notifies any
//! subscriber. Render work runs in enqueue order, so an ancestor renders
//! before the descendants it affects and no descendant renders twice for
//! one logical update. [`TraceRecorder`] captures the interleaving of both
//! operations so the ordering can be checked from the trace itself.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashSet;

/// Schedules render work.
///
/// Implementations queue work without blocking and process it in enqueue
/// order.
pub trait RenderQueue<K> {
    /// Schedules a render of `node`.
    fn enqueue_render(&mut self, node: K);
}

/// Receives "your cascading parameters may have changed" notifications.
pub trait CascadeNotify<K> {
    /// Called once for each subscriber of a provider whose value may have changed.
    fn parameters_changed(&mut self, subscriber: K);
}

impl<K, F> CascadeNotify<K> for F
where
    F: FnMut(K),
{
    #[inline]
    fn parameters_changed(&mut self, subscriber: K) {
        self(subscriber);
    }
}

/// Everything a provider update needs from its caller.
///
/// Blanket-implemented for any type that is both a [`RenderQueue`] and a
/// [`CascadeNotify`]. It exists so the pair can travel as one
/// `&mut dyn RenderDispatch<K>`.
pub trait RenderDispatch<K>: RenderQueue<K> + CascadeNotify<K> {}

impl<K, D> RenderDispatch<K> for D where D: RenderQueue<K> + CascadeNotify<K> + ?Sized {}

/// Joins a [`RenderQueue`] and a [`CascadeNotify`] into one [`RenderDispatch`].
///
/// # Example
///
/// ```rust
/// use understory_cascade::{FifoRenderQueue, RenderQueue, CascadeNotify, SplitDispatch};
///
/// let mut queue = FifoRenderQueue::new();
/// let mut notified = Vec::new();
/// let mut dispatch = SplitDispatch::new(&mut queue, |key: u32| notified.push(key));
/// dispatch.enqueue_render(1);
/// dispatch.parameters_changed(2);
/// drop(dispatch);
///
/// assert_eq!(queue.drain().collect::<Vec<_>>(), [1]);
/// assert_eq!(notified, [2]);
/// ```
#[derive(Debug)]
pub struct SplitDispatch<'a, Q: ?Sized, N> {
    queue: &'a mut Q,
    notify: N,
}

impl<'a, Q: ?Sized, N> SplitDispatch<'a, Q, N> {
    /// Pairs a render queue with a notification sink.
    pub fn new(queue: &'a mut Q, notify: N) -> Self {
        Self { queue, notify }
    }
}

impl<K, Q, N> RenderQueue<K> for SplitDispatch<'_, Q, N>
where
    Q: RenderQueue<K> + ?Sized,
{
    #[inline]
    fn enqueue_render(&mut self, node: K) {
        self.queue.enqueue_render(node);
    }
}

impl<K, Q, N> CascadeNotify<K> for SplitDispatch<'_, Q, N>
where
    Q: ?Sized,
    N: CascadeNotify<K>,
{
    #[inline]
    fn parameters_changed(&mut self, subscriber: K) {
        self.notify.parameters_changed(subscriber);
    }
}

/// A first-in, first-out render queue that coalesces pending nodes.
///
/// A node that is already waiting in the queue is not queued a second time,
/// so each node renders at most once per drain.
#[derive(Clone, Debug)]
pub struct FifoRenderQueue<K>
where
    K: Copy + Eq + Hash,
{
    order: VecDeque<K>,
    pending: HashSet<K>,
}

impl<K> Default for FifoRenderQueue<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> FifoRenderQueue<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
            pending: HashSet::new(),
        }
    }

    /// Returns the number of pending renders.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no render is pending.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `node` is waiting to render.
    #[must_use]
    #[inline]
    pub fn is_pending(&self, node: K) -> bool {
        self.pending.contains(&node)
    }

    /// Iterates over pending renders in processing order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().copied()
    }

    /// Drops a pending render, for example because the node left the tree.
    ///
    /// Returns `true` if `node` was pending.
    pub fn cancel(&mut self, node: K) -> bool {
        if !self.pending.remove(&node) {
            return false;
        }
        self.order.retain(|queued| *queued != node);
        true
    }

    /// Removes and returns the next render to process.
    pub fn pop(&mut self) -> Option<K> {
        let node = self.order.pop_front()?;
        self.pending.remove(&node);
        Some(node)
    }

    /// Drains all pending renders in processing order.
    pub fn drain(&mut self) -> impl Iterator<Item = K> + '_ {
        self.pending.clear();
        self.order.drain(..)
    }
}

impl<K> RenderQueue<K> for FifoRenderQueue<K>
where
    K: Copy + Eq + Hash,
{
    fn enqueue_render(&mut self, node: K) {
        if self.pending.insert(node) {
            self.order.push_back(node);
        } else {
            tracing::trace!("render already pending; coalesced");
        }
    }
}

/// One observable step of a provider update.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CascadeEvent<K> {
    /// `node` was scheduled to render.
    RenderEnqueued(K),
    /// `subscriber` was told to re-resolve its cascading parameters.
    SubscriberNotified(K),
}

/// Records render scheduling and notification in the order they happen.
///
/// The recorder is itself a [`RenderDispatch`], so it can be handed straight
/// to [`CascadingValue::update`](crate::CascadingValue::update) in tests.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{CascadeEvent, CascadeNotify, RenderQueue, TraceRecorder};
///
/// let mut trace = TraceRecorder::new();
/// trace.enqueue_render(1_u32);
/// trace.parameters_changed(2);
///
/// assert_eq!(
///     trace.events(),
///     &[CascadeEvent::RenderEnqueued(1), CascadeEvent::SubscriberNotified(2)]
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceRecorder<K> {
    events: Vec<CascadeEvent<K>>,
}

impl<K: Copy + Eq> TraceRecorder<K> {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Returns all recorded events, oldest first.
    #[must_use]
    #[inline]
    pub fn events(&self) -> &[CascadeEvent<K>] {
        &self.events
    }

    /// Records an event.
    pub fn record(&mut self, event: CascadeEvent<K>) {
        self.events.push(event);
    }

    /// Clears all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Drops every event after the first `len`.
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    /// Returns the position of the first occurrence of `event`.
    #[must_use]
    pub fn position(&self, event: CascadeEvent<K>) -> Option<usize> {
        self.events.iter().position(|e| *e == event)
    }

    /// Returns the nodes whose renders were enqueued, in order.
    pub fn renders(&self) -> impl Iterator<Item = K> + '_ {
        self.events.iter().filter_map(|e| match e {
            CascadeEvent::RenderEnqueued(node) => Some(*node),
            CascadeEvent::SubscriberNotified(_) => None,
        })
    }

    /// Returns the subscribers that were notified, in order.
    pub fn notified(&self) -> impl Iterator<Item = K> + '_ {
        self.events.iter().filter_map(|e| match e {
            CascadeEvent::SubscriberNotified(node) => Some(*node),
            CascadeEvent::RenderEnqueued(_) => None,
        })
    }
}

impl<K: Copy + Eq> RenderQueue<K> for TraceRecorder<K> {
    fn enqueue_render(&mut self, node: K) {
        self.record(CascadeEvent::RenderEnqueued(node));
    }
}

impl<K: Copy + Eq> CascadeNotify<K> for TraceRecorder<K> {
    fn parameters_changed(&mut self, subscriber: K) {
        self.record(CascadeEvent::SubscriberNotified(subscriber));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn fifo_preserves_enqueue_order() {
        let mut queue = FifoRenderQueue::new();
        queue.enqueue_render(3_u32);
        queue.enqueue_render(1);
        queue.enqueue_render(2);
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn fifo_coalesces_pending_node() {
        let mut queue = FifoRenderQueue::new();
        queue.enqueue_render(1_u32);
        queue.enqueue_render(2);
        queue.enqueue_render(1);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![1, 2]);

        // Once popped, the node may be queued again.
        assert_eq!(queue.pop(), Some(1));
        queue.enqueue_render(1);
        assert_eq!(queue.iter().collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn fifo_cancel_removes_pending() {
        let mut queue = FifoRenderQueue::new();
        queue.enqueue_render(1_u32);
        queue.enqueue_render(2);
        assert!(queue.cancel(1));
        assert!(!queue.cancel(1));
        assert!(!queue.is_pending(1));
        assert_eq!(queue.drain().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn closures_receive_notifications() {
        let mut seen = Vec::new();
        {
            let mut sink = |k: u32| seen.push(k);
            sink.parameters_changed(5);
            sink.parameters_changed(6);
        }
        assert_eq!(seen, vec![5, 6]);
    }

    #[test]
    fn trace_splits_renders_and_notifications() {
        let mut trace = TraceRecorder::new();
        trace.enqueue_render(1_u32);
        trace.parameters_changed(2);
        trace.parameters_changed(3);
        trace.enqueue_render(2);

        assert_eq!(trace.renders().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(trace.notified().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(trace.position(CascadeEvent::SubscriberNotified(3)), Some(2));

        trace.truncate(1);
        assert_eq!(trace.events(), &[CascadeEvent::RenderEnqueued(1)]);
    }

    #[test]
    fn dyn_dispatch_reaches_both_halves() {
        let mut trace = TraceRecorder::new();
        let dispatch: &mut dyn RenderDispatch<u32> = &mut trace;
        dispatch.enqueue_render(9);
        dispatch.parameters_changed(10);
        assert_eq!(
            trace.events(),
            &[
                CascadeEvent::RenderEnqueued(9),
                CascadeEvent::SubscriberNotified(10)
            ]
        );
    }
}
