//! Bridges between the device buffers and the graph.

use crate::format::AudioFormat;
use crate::node::{InputPin, Node, OutputPin};
use crate::manager::ProcessContext;
use crate::pins;

/// Exposes one channel of the device input as an output pin.
pub struct InputNode {
    channel: usize,
    pub output: OutputPin,
}

impl InputNode {
    pub fn new(format: AudioFormat, channel: usize) -> Self {
        Self {
            channel,
            output: OutputPin::new(format.block_size),
        }
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn set_channel(&mut self, channel: usize) {
        self.channel = channel;
    }
}

impl Node for InputNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let output = self.output.buffer_mut();
        match ctx.input_channel(self.channel) {
            Some(input) => output.copy_from_slice(input),
            None => output.fill(0.0),
        }
    }

    pins!(inputs: [], outputs: [output]);
}

/// Mixes its input into one channel of the device output.
///
/// Must be registered as a root node to be heard.
pub struct OutputNode {
    channel: usize,
    pub input: InputPin,
}

impl OutputNode {
    pub fn new(format: AudioFormat, channel: usize) -> Self {
        Self {
            channel,
            input: InputPin::new(format.block_size),
        }
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn set_channel(&mut self, channel: usize) {
        self.channel = channel;
    }
}

impl Node for OutputNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let samples = self.input.pull(ctx);
        ctx.add_to_output(self.channel, samples);
    }

    pins!(inputs: [input], outputs: []);
}
