//! Signal routing endpoints.

use super::NodeId;
use crate::manager::ProcessContext;

/// Address of an output pin: the owning node and the pin's index on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinRef {
    pub node: NodeId,
    pub output: usize,
}

impl PinRef {
    pub fn new(node: NodeId, output: usize) -> Self {
        Self { node, output }
    }
}

/// One block of output samples, filled by the owning node's `process`.
#[derive(Debug, Clone)]
pub struct OutputPin {
    buffer: Vec<f32>,
}

impl OutputPin {
    pub fn new(block_size: usize) -> Self {
        Self {
            buffer: vec![0.0; block_size],
        }
    }

    #[inline]
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub(crate) fn resize(&mut self, block_size: usize) {
        self.buffer.resize(block_size, 0.0);
    }
}

/// Input endpoint. Holds at most one upstream connection and a private buffer
/// the upstream block is copied into on every pull.
#[derive(Debug, Clone)]
pub struct InputPin {
    source: Option<PinRef>,
    buffer: Vec<f32>,
}

impl InputPin {
    pub fn new(block_size: usize) -> Self {
        Self {
            source: None,
            buffer: vec![0.0; block_size],
        }
    }

    /// Replaces any existing connection.
    pub fn connect(&mut self, source: PinRef) {
        self.source = Some(source);
    }

    pub fn disconnect(&mut self) {
        self.source = None;
    }

    #[inline]
    pub fn source(&self) -> Option<PinRef> {
        self.source
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Returns this block's input samples.
    ///
    /// The upstream node is processed first if it has not run yet this block.
    /// An unconnected pin, a removed upstream node, a bad output index or a
    /// feedback cycle all yield a block of zeros.
    pub fn pull<'a>(&'a mut self, ctx: &mut ProcessContext<'_>) -> &'a [f32] {
        let filled = match self.source {
            Some(source) => ctx.pull_into(source, &mut self.buffer),
            None => false,
        };
        if !filled {
            self.buffer.fill(0.0);
        }
        &self.buffer
    }

    /// The samples from the most recent pull.
    #[inline]
    pub fn last_block(&self) -> &[f32] {
        &self.buffer
    }

    pub(crate) fn resize(&mut self, block_size: usize) {
        self.buffer.resize(block_size, 0.0);
    }
}
