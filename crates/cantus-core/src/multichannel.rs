//! Treating groups of mono nodes as one multichannel object.

use crate::format::AudioFormat;
use crate::manager::NodeManager;
use crate::node::{Node, NodeRef, PinRef};
use crate::{Error, Result};

/// Something with one output pin per channel.
pub trait MultiChannelOutput {
    fn channel_count(&self) -> usize;

    fn output_for_channel(&self, channel: usize) -> Option<PinRef>;
}

/// Something with one input pin per channel.
pub trait MultiChannelInput {
    fn input_channel_count(&self) -> usize;

    fn connect_channel(&self, manager: &mut NodeManager, channel: usize, pin: PinRef) -> Result<()>;

    /// Connects every input channel to `source`. A source with fewer channels
    /// is repeated, so a mono source feeds all channels.
    fn connect(&self, manager: &mut NodeManager, source: &dyn MultiChannelOutput) -> Result<()> {
        let count = source.channel_count();
        if count == 0 {
            return Ok(());
        }
        for channel in 0..self.input_channel_count() {
            let pin = source
                .output_for_channel(channel % count)
                .ok_or(Error::ChannelOutOfRange {
                    channel: channel % count,
                    count,
                })?;
            self.connect_channel(manager, channel, pin)?;
        }
        Ok(())
    }
}

impl MultiChannelOutput for PinRef {
    fn channel_count(&self) -> usize {
        1
    }

    fn output_for_channel(&self, channel: usize) -> Option<PinRef> {
        (channel == 0).then_some(*self)
    }
}

impl<const N: usize> MultiChannelOutput for [PinRef; N] {
    fn channel_count(&self) -> usize {
        N
    }

    fn output_for_channel(&self, channel: usize) -> Option<PinRef> {
        self.get(channel).copied()
    }
}

impl MultiChannelOutput for Vec<PinRef> {
    fn channel_count(&self) -> usize {
        self.len()
    }

    fn output_for_channel(&self, channel: usize) -> Option<PinRef> {
        self.get(channel).copied()
    }
}

/// One node of type `N` per channel, using input 0 and output 0 of each.
pub struct MultiChannel<N> {
    nodes: Vec<NodeRef<N>>,
}

impl<N: Node> MultiChannel<N> {
    /// Adds `channel_count` nodes built by `make(channel, format)`.
    pub fn new<F>(manager: &mut NodeManager, channel_count: usize, mut make: F) -> Self
    where
        F: FnMut(usize, AudioFormat) -> N,
    {
        let format = manager.format();
        let nodes = (0..channel_count)
            .map(|channel| manager.add_node(make(channel, format)))
            .collect();
        Self { nodes }
    }

    pub fn channel(&self, channel: usize) -> Option<NodeRef<N>> {
        self.nodes.get(channel).copied()
    }

    pub fn nodes(&self) -> &[NodeRef<N>] {
        &self.nodes
    }

    /// Applies `f` to every channel's node, passing the channel index.
    pub fn for_each_mut<F>(&self, manager: &mut NodeManager, mut f: F)
    where
        F: FnMut(usize, &mut N),
    {
        for (channel, &node) in self.nodes.iter().enumerate() {
            if let Some(node) = manager.node_mut(node) {
                f(channel, node);
            }
        }
    }

    pub fn register_roots(&self, manager: &mut NodeManager) {
        for &node in &self.nodes {
            manager.register_root_node(node);
        }
    }

    /// Removes every node from the graph.
    pub fn remove(self, manager: &mut NodeManager) {
        for node in self.nodes {
            manager.remove_node(node);
        }
    }
}

impl<N: Node> MultiChannelOutput for MultiChannel<N> {
    fn channel_count(&self) -> usize {
        self.nodes.len()
    }

    fn output_for_channel(&self, channel: usize) -> Option<PinRef> {
        self.nodes.get(channel).map(|node| node.output(0))
    }
}

impl<N: Node> MultiChannelInput for MultiChannel<N> {
    fn input_channel_count(&self) -> usize {
        self.nodes.len()
    }

    fn connect_channel(&self, manager: &mut NodeManager, channel: usize, pin: PinRef) -> Result<()> {
        let node = self.nodes.get(channel).ok_or(Error::ChannelOutOfRange {
            channel,
            count: self.nodes.len(),
        })?;
        manager.connect(pin, *node, 0)
    }
}
