//! Control-thread access to a running graph.

use super::{NodeManager, Task};
use crate::format::{AudioFormat, SharedFormat};
use crate::node::{Node, NodeId, NodeRef, PinRef};
use crate::safe::{DeletionQueue, SafeOwner};
use crossbeam_channel::Sender;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Thread-safe handle to a [`NodeManager`].
///
/// Every mutation is queued and applied on the audio thread at the start of the
/// next callback, in the order it was enqueued.
#[derive(Clone)]
pub struct GraphHandle {
    tasks: Sender<Task>,
    deletion_queue: DeletionQueue,
    next_id: Arc<AtomicU64>,
    format: Arc<SharedFormat>,
}

impl GraphHandle {
    pub(crate) fn new(
        tasks: Sender<Task>,
        deletion_queue: DeletionQueue,
        next_id: Arc<AtomicU64>,
        format: Arc<SharedFormat>,
    ) -> Self {
        Self {
            tasks,
            deletion_queue,
            next_id,
            format,
        }
    }

    pub fn enqueue_task<F>(&self, task: F)
    where
        F: FnOnce(&mut NodeManager) + Send + 'static,
    {
        if self.tasks.send(Box::new(task)).is_err() {
            debug!("node manager is gone, task discarded");
        }
    }

    /// Current sample rate and block size, for constructing nodes.
    pub fn format(&self) -> AudioFormat {
        self.format.load()
    }

    pub fn deletion_queue(&self) -> &DeletionQueue {
        &self.deletion_queue
    }

    pub fn make_safe<T: Send + Sync + 'static>(&self, value: T) -> SafeOwner<T> {
        SafeOwner::new(&self.deletion_queue, value)
    }

    /// Queues `node` for insertion. The node is removed again when the returned
    /// owner is dropped.
    pub fn add_node<N: Node>(&self, node: N) -> NodeOwner<N> {
        let id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.enqueue_task(move |manager| manager.insert_node(id, Box::new(node)));
        NodeOwner {
            node: NodeRef::new(id),
            handle: Some(self.clone()),
        }
    }

    /// Like [`add_node`](Self::add_node), and registers the node as a root.
    pub fn add_root_node<N: Node>(&self, node: N) -> NodeOwner<N> {
        let owner = self.add_node(node);
        self.register_root_node(owner.id());
        owner
    }

    pub fn remove_node(&self, node: impl Into<NodeId>) {
        let id = node.into();
        self.enqueue_task(move |manager| {
            manager.remove_node(id);
        });
    }

    pub fn connect(&self, source: PinRef, dest: impl Into<NodeId>, input: usize) {
        let dest = dest.into();
        self.enqueue_task(move |manager| {
            if let Err(e) = manager.connect(source, dest, input) {
                error!("connect {} -> {}:{} failed: {}", source.node, dest, input, e);
            }
        });
    }

    pub fn disconnect(&self, dest: impl Into<NodeId>, input: usize) {
        let dest = dest.into();
        self.enqueue_task(move |manager| {
            if let Err(e) = manager.disconnect(dest, input) {
                error!("disconnect {}:{} failed: {}", dest, input, e);
            }
        });
    }

    pub fn register_root_node(&self, node: impl Into<NodeId>) {
        let id = node.into();
        self.enqueue_task(move |manager| manager.register_root_node(id));
    }

    pub fn unregister_root_node(&self, node: impl Into<NodeId>) {
        let id = node.into();
        self.enqueue_task(move |manager| manager.unregister_root_node(id));
    }

    /// Runs `f` against the node on the audio thread.
    pub fn update<N, F>(&self, node: NodeRef<N>, f: F)
    where
        N: Node,
        F: FnOnce(&mut N) + Send + 'static,
    {
        self.enqueue_task(move |manager| match manager.node_mut(node) {
            Some(target) => f(target),
            None => debug!(node = %node.id(), "update for missing node dropped"),
        });
    }
}

impl fmt::Debug for GraphHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphHandle")
            .field("format", &self.format())
            .field("pending_tasks", &self.tasks.len())
            .finish()
    }
}

/// Control-thread owner of a graph node.
///
/// Dropping the owner queues removal of the node; the node itself is then freed
/// through the deletion queue.
pub struct NodeOwner<N> {
    node: NodeRef<N>,
    handle: Option<GraphHandle>,
}

impl<N: Node> NodeOwner<N> {
    #[inline]
    pub fn node_ref(&self) -> NodeRef<N> {
        self.node
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    #[inline]
    pub fn output(&self, index: usize) -> PinRef {
        self.node.output(index)
    }

    /// Runs `f` against the node on the audio thread.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut N) + Send + 'static,
    {
        if let Some(handle) = &self.handle {
            handle.update(self.node, f);
        }
    }

    /// Gives up ownership. The node stays in the graph until the manager drops.
    pub fn release(mut self) -> NodeRef<N> {
        self.handle = None;
        self.node
    }
}

impl<N> From<&NodeOwner<N>> for NodeId {
    fn from(owner: &NodeOwner<N>) -> Self {
        owner.node.id()
    }
}

impl<N> fmt::Debug for NodeOwner<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeOwner").field(&self.node).finish()
    }
}

impl<N> Drop for NodeOwner<N> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let id = self.node.id();
            handle.enqueue_task(move |manager| {
                manager.remove_node(id);
            });
        }
    }
}
