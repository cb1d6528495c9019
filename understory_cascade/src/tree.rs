// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small host tree that drives cascading values end to end.
//!
//! [`ComponentTree`] stands in for the renderer that normally owns the
//! component tree. It keeps parent links, owns provider nodes and the
//! cascading-parameter bindings of plain components, and feeds a
//! [`FifoRenderQueue`]. It is the reference for how a real host should wire
//! providers, subscriptions and render scheduling together:
//!
//! - inserting a component resolves its cascading parameters and schedules
//!   its first render;
//! - updating a provider schedules the provider first, then re-resolves and
//!   schedules every subscriber it notified;
//! - removing or moving a subtree detaches or re-resolves every binding in
//!   it, so no provider keeps a subscriber that no longer sees it.
//!
//! A tree is confined to one thread: its boxed providers are neither `Send`
//! nor `Sync`.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;
use core::mem;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::binding::{CascadingParameterInfo, CascadingParameterState};
use crate::change::ChangeDetection;
use crate::error::TreeError;
use crate::lookup::CascadeTree;
use crate::parameter::ParameterSet;
use crate::provider::{CascadingValue, UpdateOutcome};
use crate::schedule::{CascadeEvent, CascadeNotify, FifoRenderQueue, RenderQueue, TraceRecorder};
use crate::source::CascadingValueSource;
use crate::value::ErasedValue;

type Bindings<K> = SmallVec<[CascadingParameterState<K>; 2]>;

enum NodeKind<K> {
    Provider(Box<dyn CascadingValueSource<K>>),
    Component(Bindings<K>),
}

struct Node<K> {
    parent: Option<K>,
    children: SmallVec<[K; 4]>,
    kind: NodeKind<K>,
}

/// Forwards provider updates to the tree's queue and trace, and remembers
/// which subscribers were notified so the tree can refresh them afterwards.
///
/// The trace records every render request, including ones the queue
/// coalesces into an entry that is already pending.
struct TreeDispatch<'a, K>
where
    K: Copy + Eq + Hash,
{
    queue: &'a mut FifoRenderQueue<K>,
    trace: Option<&'a mut TraceRecorder<K>>,
    notified: SmallVec<[K; 8]>,
}

impl<K> RenderQueue<K> for TreeDispatch<'_, K>
where
    K: Copy + Eq + Hash,
{
    fn enqueue_render(&mut self, node: K) {
        self.queue.enqueue_render(node);
        if let Some(trace) = self.trace.as_deref_mut() {
            trace.record(CascadeEvent::RenderEnqueued(node));
        }
    }
}

impl<K> CascadeNotify<K> for TreeDispatch<'_, K>
where
    K: Copy + Eq + Hash,
{
    fn parameters_changed(&mut self, subscriber: K) {
        if let Some(trace) = self.trace.as_deref_mut() {
            trace.record(CascadeEvent::SubscriberNotified(subscriber));
        }
        self.notified.push(subscriber);
    }
}

/// A component tree hosting cascading value providers and their subscribers.
///
/// # Example
///
/// ```rust
/// use understory_cascade::{CascadingParameterInfo, CascadingValue, ComponentTree, ParameterSet};
///
/// let mut tree = ComponentTree::new();
/// tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &ParameterSet::new().with("Value", 1))
///     .unwrap();
/// tree.insert_component(2, Some(1), [CascadingParameterInfo::new::<i32>("Count")])
///     .unwrap();
/// assert_eq!(tree.parameter::<i32>(2, "Count"), Some(&1));
///
/// tree.update_provider(1, &ParameterSet::new().with("Value", 2)).unwrap();
/// assert_eq!(tree.parameter::<i32>(2, "Count"), Some(&2));
/// assert_eq!(tree.drain_renders().collect::<Vec<_>>(), [1, 2]);
/// ```
pub struct ComponentTree<K>
where
    K: Copy + Eq + Hash,
{
    nodes: HashMap<K, Node<K>>,
    queue: FifoRenderQueue<K>,
    trace: Option<TraceRecorder<K>>,
}

impl<K> Default for ComponentTree<K>
where
    K: Copy + Eq + Hash + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ComponentTree<K>
where
    K: Copy + Eq + Hash + 'static,
{
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            queue: FifoRenderQueue::new(),
            trace: None,
        }
    }

    /// Records every render enqueue and subscriber notification in a
    /// [`TraceRecorder`], available through [`ComponentTree::trace`].
    ///
    /// The trace lists render requests in the order they were made. A request
    /// for a node that is already pending is still recorded, even though the
    /// queue keeps a single entry for it; read [`ComponentTree::render_queue`]
    /// for what will actually render.
    #[must_use]
    pub fn with_tracing(mut self) -> Self {
        self.trace = Some(TraceRecorder::new());
        self
    }

    /// Returns the number of nodes.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no nodes.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `key` is in the tree.
    #[must_use]
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Returns the children of `key`, in insertion order.
    #[must_use]
    pub fn children(&self, key: K) -> &[K] {
        self.nodes
            .get(&key)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the pending render queue.
    #[must_use]
    #[inline]
    pub fn render_queue(&self) -> &FifoRenderQueue<K> {
        &self.queue
    }

    /// Drains pending renders in processing order.
    pub fn drain_renders(&mut self) -> impl Iterator<Item = K> + '_ {
        self.queue.drain()
    }

    /// Returns the recorded trace, if tracing is enabled.
    ///
    /// See [`ComponentTree::with_tracing`] for how it relates to the queue.
    #[must_use]
    #[inline]
    pub fn trace(&self) -> Option<&TraceRecorder<K>> {
        self.trace.as_ref()
    }

    /// Clears the recorded trace, if tracing is enabled.
    pub fn clear_trace(&mut self) {
        if let Some(trace) = &mut self.trace {
            trace.clear();
        }
    }

    /// Inserts a provider as a new leaf under `parent` and applies its
    /// initial parameters.
    ///
    /// The node key is the provider's [`key`](CascadingValue::key). The
    /// provider enqueues its first render on success.
    ///
    /// # Errors
    ///
    /// Fails with [`TreeError::DuplicateNode`] or [`TreeError::UnknownNode`]
    /// for a bad key or parent, and with [`TreeError::Parameter`] if the
    /// provider rejects `parameters`. Nothing is inserted on failure.
    pub fn insert_provider<T>(
        &mut self,
        parent: Option<K>,
        provider: CascadingValue<K, T>,
        parameters: &ParameterSet,
    ) -> Result<UpdateOutcome, TreeError<K>>
    where
        T: ChangeDetection + Clone + 'static,
    {
        let key = provider.key();
        self.check_insert(key, parent)?;

        let mut source: Box<dyn CascadingValueSource<K>> = Box::new(provider);
        let outcome = {
            let mut dispatch = self.dispatch();
            source.set_parameters(parameters, &mut dispatch)?
        };
        self.link(key, parent, NodeKind::Provider(source));
        Ok(outcome)
    }

    /// Inserts a plain component as a new leaf under `parent`.
    ///
    /// The component resolves each declared cascading parameter against its
    /// ancestors, subscribing to every provider it binds to, then enqueues
    /// its first render.
    ///
    /// # Errors
    ///
    /// Fails with [`TreeError::DuplicateNode`] or [`TreeError::UnknownNode`]
    /// for a bad key or parent, and with [`TreeError::Binding`] if a required
    /// parameter has no provider. Nothing is inserted on failure.
    pub fn insert_component<I>(
        &mut self,
        key: K,
        parent: Option<K>,
        parameters: I,
    ) -> Result<(), TreeError<K>>
    where
        I: IntoIterator<Item = CascadingParameterInfo>,
    {
        self.check_insert(key, parent)?;
        self.link(key, parent, NodeKind::Component(SmallVec::new()));

        let mut bindings: Bindings<K> = parameters
            .into_iter()
            .map(CascadingParameterState::new)
            .collect();
        for index in 0..bindings.len() {
            if let Err(error) = bindings[index].resolve(key, self) {
                for binding in &mut bindings[..index] {
                    binding.detach(key, self);
                }
                self.unlink(key);
                return Err(error.into());
            }
        }

        self.put_bindings(key, bindings);
        self.schedule(key);
        Ok(())
    }

    /// Applies new parameters to the provider at `key`.
    ///
    /// The provider's render is enqueued first. Each subscriber it notifies
    /// is then re-resolved and enqueued, in notification order.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownNode`], [`TreeError::NotAProvider`], or
    /// [`TreeError::Parameter`] if the provider rejects `parameters`.
    /// A [`TreeError::Binding`] from re-resolving a subscriber is returned
    /// only after every notified subscriber has been refreshed; the first
    /// such error wins.
    pub fn update_provider(
        &mut self,
        key: K,
        parameters: &ParameterSet,
    ) -> Result<UpdateOutcome, TreeError<K>> {
        let node = self.nodes.get_mut(&key).ok_or(TreeError::UnknownNode(key))?;
        let NodeKind::Provider(source) = &mut node.kind else {
            return Err(TreeError::NotAProvider(key));
        };

        let mut dispatch = TreeDispatch {
            queue: &mut self.queue,
            trace: self.trace.as_mut(),
            notified: SmallVec::new(),
        };
        let outcome = source.set_parameters(parameters, &mut dispatch)?;
        let notified = dispatch.notified;

        // Refresh every subscriber even if one fails; report the first error.
        let mut result = Ok(outcome);
        for subscriber in notified {
            if let Err(error) = self.refresh(subscriber)
                && result.is_ok()
            {
                result = Err(error);
            }
        }
        result
    }

    /// Removes `key` and its whole subtree.
    ///
    /// Every removed component is unsubscribed from every provider it was
    /// registered with, and pending renders of removed nodes are cancelled.
    /// Returns the number of nodes removed.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownNode`] if `key` is not in the tree.
    pub fn remove(&mut self, key: K) -> Result<usize, TreeError<K>> {
        if !self.contains(key) {
            return Err(TreeError::UnknownNode(key));
        }
        let subtree = self.subtree(key);

        for &node in &subtree {
            let mut bindings = self.take_bindings(node);
            for binding in &mut bindings {
                binding.detach(node, self);
            }
        }

        self.unlink(key);
        for &node in &subtree {
            self.nodes.remove(&node);
            self.queue.cancel(node);
        }
        tracing::trace!(removed = subtree.len(), "removed subtree");
        Ok(subtree.len())
    }

    /// Moves `key` and its subtree under `new_parent`, appending it to the
    /// new parent's children.
    ///
    /// Every binding in the moved subtree is re-resolved. A binding whose
    /// provider changes unsubscribes from the old provider before it
    /// subscribes to the new one, and its component is enqueued to render.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownNode`] for an unknown key or parent,
    /// [`TreeError::WouldCycle`] if `new_parent` is inside the moved subtree,
    /// and [`TreeError::Binding`] if a required parameter loses its provider.
    /// On a binding failure the subtree is moved back, and the render queue
    /// and trace are restored to their state before the call.
    pub fn reparent(&mut self, key: K, new_parent: Option<K>) -> Result<(), TreeError<K>> {
        let old_parent = self
            .nodes
            .get(&key)
            .ok_or(TreeError::UnknownNode(key))?
            .parent;
        if let Some(parent) = new_parent {
            if !self.contains(parent) {
                return Err(TreeError::UnknownNode(parent));
            }
            let mut current = Some(parent);
            while let Some(ancestor) = current {
                if ancestor == key {
                    return Err(TreeError::WouldCycle { node: key, parent });
                }
                current = self.parent(ancestor);
            }
        }

        let queue = self.queue.clone();
        let trace_len = self.trace.as_ref().map(|trace| trace.events().len());

        self.move_node(key, new_parent);
        if let Err(error) = self.rebind_subtree(key) {
            self.move_node(key, old_parent);
            let restored = self.rebind_subtree(key);
            debug_assert!(
                restored.is_ok(),
                "bindings that resolved before the move must resolve again"
            );
            self.queue = queue;
            if let (Some(trace), Some(len)) = (&mut self.trace, trace_len) {
                trace.truncate(len);
            }
            tracing::debug!("reparent rejected; subtree moved back");
            return Err(error);
        }
        Ok(())
    }

    /// Returns the resolved value of cascading parameter `parameter` on
    /// component `key`.
    #[must_use]
    pub fn parameter<T: 'static>(&self, key: K, parameter: &str) -> Option<&T> {
        self.binding(key, parameter)?.value()
    }

    /// Returns the provider bound to cascading parameter `parameter` on
    /// component `key`.
    #[must_use]
    pub fn supplier(&self, key: K, parameter: &str) -> Option<K> {
        self.binding(key, parameter)?.supplier()
    }

    /// Returns what the provider at `key` renders: its content parameter.
    #[must_use]
    pub fn render(&self, key: K) -> Option<&ErasedValue> {
        self.source(key)?.render()
    }

    fn binding(&self, key: K, parameter: &str) -> Option<&CascadingParameterState<K>> {
        match &self.nodes.get(&key)?.kind {
            NodeKind::Component(bindings) => bindings
                .iter()
                .find(|binding| binding.info().parameter() == parameter),
            NodeKind::Provider(_) => None,
        }
    }

    fn dispatch(&mut self) -> TreeDispatch<'_, K> {
        TreeDispatch {
            queue: &mut self.queue,
            trace: self.trace.as_mut(),
            notified: SmallVec::new(),
        }
    }

    fn schedule(&mut self, key: K) {
        self.dispatch().enqueue_render(key);
    }

    fn check_insert(&self, key: K, parent: Option<K>) -> Result<(), TreeError<K>> {
        if self.contains(key) {
            return Err(TreeError::DuplicateNode(key));
        }
        match parent {
            Some(parent) if !self.contains(parent) => Err(TreeError::UnknownNode(parent)),
            _ => Ok(()),
        }
    }

    fn link(&mut self, key: K, parent: Option<K>, kind: NodeKind<K>) {
        self.nodes.insert(
            key,
            Node {
                parent,
                children: SmallVec::new(),
                kind,
            },
        );
        self.attach(key, parent);
    }

    fn unlink(&mut self, key: K) {
        self.detach_from_parent(key);
        self.nodes.remove(&key);
    }

    fn move_node(&mut self, key: K, parent: Option<K>) {
        self.detach_from_parent(key);
        if let Some(node) = self.nodes.get_mut(&key) {
            node.parent = parent;
        }
        self.attach(key, parent);
    }

    fn attach(&mut self, key: K, parent: Option<K>) {
        if let Some(parent) = parent
            && let Some(node) = self.nodes.get_mut(&parent)
        {
            node.children.push(key);
        }
    }

    fn detach_from_parent(&mut self, key: K) {
        if let Some(parent) = self.parent(key)
            && let Some(node) = self.nodes.get_mut(&parent)
        {
            node.children.retain(|child| *child != key);
        }
    }

    /// `key` and all its descendants, parents before children.
    fn subtree(&self, key: K) -> Vec<K> {
        let mut out = Vec::new();
        let mut stack = Vec::from([key]);
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn take_bindings(&mut self, key: K) -> Bindings<K> {
        match self.nodes.get_mut(&key).map(|node| &mut node.kind) {
            Some(NodeKind::Component(bindings)) => mem::take(bindings),
            _ => SmallVec::new(),
        }
    }

    fn put_bindings(&mut self, key: K, bindings: Bindings<K>) {
        if let Some(Node {
            kind: NodeKind::Component(slot),
            ..
        }) = self.nodes.get_mut(&key)
        {
            *slot = bindings;
        }
    }

    /// Re-resolves the bindings of `key`. With `always_schedule` unset, the
    /// component is only scheduled when a binding changed provider.
    fn resolve_bindings(&mut self, key: K, always_schedule: bool) -> Result<(), TreeError<K>> {
        if !self.contains(key) {
            return Ok(());
        }
        let mut bindings = self.take_bindings(key);
        let mut rebound = false;
        let mut result = Ok(());
        for binding in &mut bindings {
            match binding.resolve(key, self) {
                Ok(resolution) => rebound |= resolution.rebound(),
                Err(error) => {
                    result = Err(error.into());
                    break;
                }
            }
        }
        self.put_bindings(key, bindings);
        if result.is_ok() && (always_schedule || rebound) {
            self.schedule(key);
        }
        result
    }

    fn refresh(&mut self, subscriber: K) -> Result<(), TreeError<K>> {
        self.resolve_bindings(subscriber, true)
    }

    fn rebind_subtree(&mut self, key: K) -> Result<(), TreeError<K>> {
        for node in self.subtree(key) {
            self.resolve_bindings(node, false)?;
        }
        Ok(())
    }
}

impl<K> CascadeTree<K> for ComponentTree<K>
where
    K: Copy + Eq + Hash,
{
    fn parent(&self, key: K) -> Option<K> {
        self.nodes.get(&key)?.parent
    }

    fn source(&self, key: K) -> Option<&dyn CascadingValueSource<K>> {
        match &self.nodes.get(&key)?.kind {
            NodeKind::Provider(source) => Some(source.as_ref()),
            NodeKind::Component(_) => None,
        }
    }

    fn source_mut(&mut self, key: K) -> Option<&mut dyn CascadingValueSource<K>> {
        match &mut self.nodes.get_mut(&key)?.kind {
            NodeKind::Provider(source) => Some(source.as_mut()),
            NodeKind::Component(_) => None,
        }
    }
}

impl<K> fmt::Debug for ComponentTree<K>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers = self
            .nodes
            .values()
            .filter(|node| matches!(node.kind, NodeKind::Provider(_)))
            .count();
        f.debug_struct("ComponentTree")
            .field("nodes", &self.nodes.len())
            .field("providers", &providers)
            .field("queue", &self.queue)
            .field("trace", &self.trace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BindingError, ParameterError};
    use alloc::string::String;
    use alloc::vec;

    fn value<T: Clone + 'static>(v: T) -> ParameterSet {
        ParameterSet::new().with("Value", v)
    }

    fn count() -> CascadingParameterInfo {
        CascadingParameterInfo::new::<i32>("Count")
    }

    #[test]
    fn insert_rejects_duplicates_and_unknown_parents() {
        let mut tree = ComponentTree::new();
        tree.insert_component(1, None, []).unwrap();
        assert_eq!(
            tree.insert_component(1, None, []),
            Err(TreeError::DuplicateNode(1))
        );
        assert_eq!(
            tree.insert_component(2, Some(9), []),
            Err(TreeError::UnknownNode(9))
        );
        let error = tree
            .insert_provider(Some(9), CascadingValue::<u32, i32>::new(3), &value(1))
            .unwrap_err();
        assert_eq!(error, TreeError::UnknownNode(9));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn rejected_provider_is_not_inserted() {
        let mut tree = ComponentTree::<u32>::new();
        let error = tree
            .insert_provider(None, CascadingValue::<u32, i32>::new(1), &ParameterSet::new())
            .unwrap_err();
        assert!(matches!(
            error,
            TreeError::Parameter(ParameterError::MissingRequiredParameter { .. })
        ));
        assert!(tree.is_empty());
        assert!(tree.render_queue().is_empty());
    }

    #[test]
    fn component_binds_nearest_provider() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.insert_provider(Some(1), CascadingValue::<u32, i32>::new(2), &value(2))
            .unwrap();
        tree.insert_component(3, Some(2), [count()]).unwrap();

        assert_eq!(tree.parameter::<i32>(3, "Count"), Some(&2));
        assert_eq!(tree.supplier(3, "Count"), Some(2));
        assert_eq!(tree.drain_renders().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn provider_does_not_match_itself() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        let request = crate::CascadeRequest::of::<i32>();
        assert!(crate::find_nearest(tree.parent(1), &request, &tree).is_none());
        assert!(crate::find_nearest(Some(1), &request, &tree).is_some());
    }

    #[test]
    fn failed_required_binding_rolls_back() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.drain_renders().for_each(drop);

        let error = tree
            .insert_component(
                2,
                Some(1),
                [count(), CascadingParameterInfo::new::<String>("Theme").required()],
            )
            .unwrap_err();
        assert!(matches!(
            error,
            TreeError::Binding(BindingError::MissingCascadingValue {
                parameter: "Theme",
                ..
            })
        ));
        assert!(!tree.contains(2));
        assert!(tree.children(1).is_empty());
        assert_eq!(tree.source(1).unwrap().subscriber_count(), 0);
        assert!(tree.render_queue().is_empty());
    }

    #[test]
    fn update_enqueues_provider_then_subscribers() {
        let mut tree = ComponentTree::new().with_tracing();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.insert_component(2, Some(1), [count()]).unwrap();
        tree.drain_renders().for_each(drop);
        tree.clear_trace();

        let outcome = tree.update_provider(1, &value(5)).unwrap();
        assert_eq!(outcome.notified, 1);
        assert_eq!(tree.parameter::<i32>(2, "Count"), Some(&5));
        assert_eq!(
            tree.trace().unwrap().events(),
            &[
                CascadeEvent::RenderEnqueued(1),
                CascadeEvent::SubscriberNotified(2),
                CascadeEvent::RenderEnqueued(2),
            ]
        );
        assert_eq!(tree.drain_renders().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn unchanged_update_renders_only_provider() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.insert_component(2, Some(1), [count()]).unwrap();
        tree.drain_renders().for_each(drop);

        let outcome = tree.update_provider(1, &value(1)).unwrap();
        assert!(!outcome.changed);
        assert_eq!(tree.drain_renders().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn update_errors() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.insert_component(2, Some(1), []).unwrap();
        assert_eq!(
            tree.update_provider(7, &value(1)),
            Err(TreeError::UnknownNode(7))
        );
        assert_eq!(
            tree.update_provider(2, &value(1)),
            Err(TreeError::NotAProvider(2))
        );
        assert!(matches!(
            tree.update_provider(1, &value(1_u8)),
            Err(TreeError::Parameter(ParameterError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn remove_detaches_subtree() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.insert_component(2, Some(1), [count()]).unwrap();
        tree.insert_component(3, Some(2), [count()]).unwrap();
        tree.insert_component(4, Some(1), [count()]).unwrap();
        assert_eq!(tree.source(1).unwrap().subscriber_count(), 3);

        assert_eq!(tree.remove(2), Ok(2));
        assert!(!tree.contains(2) && !tree.contains(3));
        assert_eq!(tree.children(1), &[4]);
        assert_eq!(tree.source(1).unwrap().subscriber_count(), 1);
        assert!(!tree.render_queue().is_pending(3));
        assert_eq!(tree.remove(2), Err(TreeError::UnknownNode(2)));
    }

    #[test]
    fn reparent_moves_subscription() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(2), &value(2))
            .unwrap();
        tree.insert_component(3, Some(1), [count()]).unwrap();
        tree.drain_renders().for_each(drop);

        tree.reparent(3, Some(2)).unwrap();
        assert_eq!(tree.supplier(3, "Count"), Some(2));
        assert_eq!(tree.parameter::<i32>(3, "Count"), Some(&2));
        assert!(!tree.source(1).unwrap().is_subscribed(3));
        assert!(tree.source(2).unwrap().is_subscribed(3));
        assert_eq!(tree.children(2), &[3]);
        assert_eq!(tree.drain_renders().collect::<Vec<_>>(), vec![3]);

        // The old provider no longer reaches the moved component.
        let outcome = tree.update_provider(1, &value(10)).unwrap();
        assert_eq!(outcome.notified, 0);
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut tree = ComponentTree::new();
        tree.insert_component(1, None, []).unwrap();
        tree.insert_component(2, Some(1), []).unwrap();
        assert_eq!(
            tree.reparent(1, Some(2)),
            Err(TreeError::WouldCycle { node: 1, parent: 2 })
        );
        assert_eq!(
            tree.reparent(1, Some(1)),
            Err(TreeError::WouldCycle { node: 1, parent: 1 })
        );
    }

    #[test]
    fn failed_reparent_restores_position() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.insert_component(2, None, []).unwrap();
        tree.insert_component(3, Some(1), [count().required()]).unwrap();
        tree.drain_renders().for_each(drop);

        assert!(matches!(
            tree.reparent(3, Some(2)),
            Err(TreeError::Binding(_))
        ));
        assert_eq!(tree.parent(3), Some(1));
        assert_eq!(tree.children(1), &[3]);
        assert!(tree.children(2).is_empty());
        assert_eq!(tree.supplier(3, "Count"), Some(1));
        assert!(tree.render_queue().is_empty());
    }

    #[test]
    fn failed_reparent_restores_queue_and_trace() {
        let mut tree = ComponentTree::new().with_tracing();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        let text = value(String::from("s"));
        tree.insert_provider(Some(1), CascadingValue::<u32, String>::new(2), &text)
            .unwrap();
        tree.insert_component(10, Some(2), [count()]).unwrap();
        tree.insert_component(
            11,
            Some(10),
            [CascadingParameterInfo::new::<String>("S").required()],
        )
        .unwrap();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(3), &value(3))
            .unwrap();
        tree.drain_renders().for_each(drop);
        tree.clear_trace();

        // 10 rebinds to provider 3, then 11 loses its `String` provider.
        assert!(matches!(
            tree.reparent(10, Some(3)),
            Err(TreeError::Binding(BindingError::MissingCascadingValue { parameter: "S", .. }))
        ));
        assert_eq!(tree.parent(10), Some(2));
        assert_eq!(tree.supplier(10, "Count"), Some(1));
        assert_eq!(tree.supplier(11, "S"), Some(2));
        assert!(tree.source(1).unwrap().is_subscribed(10));
        assert!(!tree.source(3).unwrap().is_subscribed(10));
        assert!(tree.render_queue().is_empty());
        assert!(tree.trace().unwrap().events().is_empty());
    }

    #[test]
    fn update_refreshes_every_notified_subscriber() {
        let mut tree = ComponentTree::new();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        for key in 2..5 {
            tree.insert_component(key, Some(1), [count()]).unwrap();
        }
        tree.drain_renders().for_each(drop);

        let outcome = tree.update_provider(1, &value(7)).unwrap();
        assert_eq!(outcome.notified, 3);
        for key in 2..5 {
            assert_eq!(tree.parameter::<i32>(key, "Count"), Some(&7));
        }
        assert_eq!(tree.drain_renders().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn trace_keeps_coalesced_render_requests() {
        let mut tree = ComponentTree::new().with_tracing();
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &value(1))
            .unwrap();
        tree.drain_renders().for_each(drop);
        tree.clear_trace();

        tree.update_provider(1, &value(2)).unwrap();
        tree.update_provider(1, &value(3)).unwrap();
        assert_eq!(
            tree.trace().unwrap().events(),
            &[CascadeEvent::RenderEnqueued(1), CascadeEvent::RenderEnqueued(1)]
        );
        assert_eq!(tree.render_queue().len(), 1);
        assert_eq!(tree.drain_renders().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn provider_renders_its_content() {
        let mut tree = ComponentTree::new();
        let params = value(1_i32).with("Content", String::from("child"));
        tree.insert_provider(None, CascadingValue::<u32, i32>::new(1), &params)
            .unwrap();
        assert_eq!(
            tree.render(1).and_then(|content| content.downcast_ref::<String>()),
            Some(&String::from("child"))
        );
    }
}
