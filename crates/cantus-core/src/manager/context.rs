//! Per-block processing context handed to [`Node::process`].

use crate::node::{Node, NodeId, PinRef};
use hashbrown::HashMap;

pub(crate) struct Slot {
    /// `None` while the node is inside its own `process` call.
    pub(crate) node: Option<Box<dyn Node>>,
    /// Block generation this node last ran in.
    pub(crate) processed: u64,
}

impl Slot {
    pub(crate) fn new(node: Box<dyn Node>) -> Self {
        Self {
            node: Some(node),
            processed: 0,
        }
    }
}

pub(crate) type Arena = HashMap<NodeId, Slot>;

/// The view of the graph a node gets while it processes one block.
///
/// Pulling an [`InputPin`](crate::InputPin) goes through the context, which
/// makes sure every upstream node runs at most once per block.
pub struct ProcessContext<'a> {
    pub(crate) nodes: &'a mut Arena,
    pub(crate) generation: u64,
    pub(crate) sample_time: u64,
    pub(crate) sample_rate: f32,
    pub(crate) block_size: usize,
    pub(crate) inputs: &'a [&'a [f32]],
    pub(crate) offset: usize,
    pub(crate) outputs: &'a mut [Vec<f32>],
    pub(crate) cycles: &'a mut u64,
}

impl ProcessContext<'_> {
    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[inline]
    pub fn samples_per_millisecond(&self) -> f32 {
        self.sample_rate / 1000.0
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Sample time at the start of this block.
    #[inline]
    pub fn sample_time(&self) -> u64 {
        self.sample_time
    }

    pub fn input_channel_count(&self) -> usize {
        self.inputs.len()
    }

    /// This block's slice of the device input for `channel`.
    pub fn input_channel(&self, channel: usize) -> Option<&[f32]> {
        let end = self.offset + self.block_size;
        self.inputs
            .get(channel)
            .and_then(|samples| samples.get(self.offset..end))
    }

    pub fn output_channel_count(&self) -> usize {
        self.outputs.len()
    }

    /// Mixes `samples` into the device output for `channel`.
    ///
    /// Returns `false` if the channel does not exist.
    pub fn add_to_output(&mut self, channel: usize, samples: &[f32]) -> bool {
        match self.outputs.get_mut(channel) {
            Some(mix) => {
                for (out, sample) in mix.iter_mut().zip(samples) {
                    *out += sample;
                }
                true
            }
            None => false,
        }
    }

    /// Read-only access to another node.
    ///
    /// Returns `None` for unknown ids, nodes of another type and nodes that are
    /// currently processing further up the call chain.
    pub fn node<N: Node>(&self, id: impl Into<NodeId>) -> Option<&N> {
        let node = self.nodes.get(&id.into())?.node.as_deref()?;
        node.as_any().downcast_ref::<N>()
    }

    /// Runs node `id` for this block unless it already ran.
    ///
    /// Returns `false` for unknown ids and for re-entrant calls, which are counted
    /// as cycles.
    pub fn ensure_processed(&mut self, id: NodeId) -> bool {
        let generation = self.generation;
        let mut node = {
            let Some(slot) = self.nodes.get_mut(&id) else {
                return false;
            };
            if slot.processed == generation {
                return true;
            }
            match slot.node.take() {
                Some(node) => node,
                None => {
                    *self.cycles += 1;
                    return false;
                }
            }
        };

        node.process(self);

        // Nodes cannot remove other nodes mid-block, so the slot is still here.
        if let Some(slot) = self.nodes.get_mut(&id) {
            slot.node = Some(node);
            slot.processed = generation;
        }
        true
    }

    /// Processes the source node if needed and copies its output into `dst`.
    pub(crate) fn pull_into(&mut self, source: PinRef, dst: &mut [f32]) -> bool {
        if !self.ensure_processed(source.node) {
            return false;
        }
        let Some(pin) = self
            .nodes
            .get(&source.node)
            .and_then(|slot| slot.node.as_deref())
            .and_then(|node| node.output(source.output))
        else {
            return false;
        };

        let src = pin.buffer();
        let len = src.len().min(dst.len());
        dst[..len].copy_from_slice(&src[..len]);
        dst[len..].fill(0.0);
        true
    }
}
