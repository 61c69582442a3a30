//! The unit of computation in the graph.

mod pin;

pub use pin::{InputPin, OutputPin, PinRef};

use crate::manager::ProcessContext;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// Stable identity of a node in a [`NodeManager`](crate::NodeManager).
///
/// Ids are never reused, so an id that outlives its node simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    Input,
    Output,
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKind::Input => f.write_str("input"),
            PinKind::Output => f.write_str("output"),
        }
    }
}

/// Typed handle to a node of type `N`.
pub struct NodeRef<N> {
    id: NodeId,
    _marker: PhantomData<fn() -> N>,
}

impl<N> NodeRef<N> {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// Address of this node's output pin `index`.
    #[inline]
    pub fn output(self, index: usize) -> PinRef {
        PinRef::new(self.id, index)
    }
}

impl<N> Clone for NodeRef<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for NodeRef<N> {}

impl<N> PartialEq for NodeRef<N> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<N> Eq for NodeRef<N> {}

impl<N> fmt::Debug for NodeRef<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef<{}>({})", std::any::type_name::<N>(), self.id)
    }
}

impl<N> From<NodeRef<N>> for NodeId {
    fn from(node: NodeRef<N>) -> Self {
        node.id
    }
}

/// Downcasting support for `dyn Node`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A processing node.
///
/// Nodes own their pins. `process` is called at most once per block, on the
/// audio thread, and must fill every output pin with exactly one block of
/// samples. It must not allocate, lock or block.
///
/// Pin enumeration is usually generated with [`pins!`](crate::pins).
pub trait Node: AsAny + Send {
    fn process(&mut self, ctx: &mut ProcessContext<'_>);

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn input_count(&self) -> usize {
        0
    }

    fn input_mut(&mut self, _index: usize) -> Option<&mut InputPin> {
        None
    }

    fn output_count(&self) -> usize {
        0
    }

    fn output(&self, _index: usize) -> Option<&OutputPin> {
        None
    }

    fn output_mut(&mut self, _index: usize) -> Option<&mut OutputPin> {
        None
    }

    /// Called after the manager's sample rate changed.
    fn sample_rate_changed(&mut self, _sample_rate: f32) {}

    /// Called after the manager resized every pin to `block_size`.
    fn buffer_size_changed(&mut self, _block_size: usize) {}
}

#[doc(hidden)]
pub fn nth_pin_mut<P, const N: usize>(pins: [&mut P; N], index: usize) -> Option<&mut P> {
    pins.into_iter().nth(index)
}

#[doc(hidden)]
pub fn nth_pin<P, const N: usize>(pins: [&P; N], index: usize) -> Option<&P> {
    pins.get(index).copied()
}
