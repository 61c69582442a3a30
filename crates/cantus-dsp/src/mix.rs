//! Summing and multiplying nodes.

use cantus_core::{pins, AudioFormat, InputPin, Node, OutputPin, ProcessContext};

/// Sums all of its inputs.
pub struct MixNode {
    pub inputs: Vec<InputPin>,
    pub output: OutputPin,
}

impl MixNode {
    pub fn new(format: AudioFormat, input_count: usize) -> Self {
        Self {
            inputs: (0..input_count)
                .map(|_| InputPin::new(format.block_size))
                .collect(),
            output: OutputPin::new(format.block_size),
        }
    }

    /// Adds an input pin and returns its index. Allocates; call from a task.
    pub fn add_input(&mut self) -> usize {
        let block_size = self.output.len();
        self.inputs.push(InputPin::new(block_size));
        self.inputs.len() - 1
    }
}

impl Node for MixNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let output = self.output.buffer_mut();
        output.fill(0.0);
        for pin in &mut self.inputs {
            if !pin.is_connected() {
                continue;
            }
            for (out, &x) in output.iter_mut().zip(pin.pull(ctx)) {
                *out += x;
            }
        }
    }

    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn input_mut(&mut self, index: usize) -> Option<&mut InputPin> {
        self.inputs.get_mut(index)
    }

    fn output_count(&self) -> usize {
        1
    }

    fn output(&self, index: usize) -> Option<&OutputPin> {
        (index == 0).then_some(&self.output)
    }

    fn output_mut(&mut self, index: usize) -> Option<&mut OutputPin> {
        (index == 0).then_some(&mut self.output)
    }
}

/// Multiplies two signals, typically an audio signal by an envelope.
///
/// An unconnected input reads as zeros, so the output is silent until both
/// inputs are connected.
pub struct MultiplyNode {
    pub input: InputPin,
    pub modulator: InputPin,
    pub output: OutputPin,
}

impl MultiplyNode {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            input: InputPin::new(format.block_size),
            modulator: InputPin::new(format.block_size),
            output: OutputPin::new(format.block_size),
        }
    }
}

impl Node for MultiplyNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let input = self.input.pull(ctx);
        let modulator = self.modulator.pull(ctx);
        for ((out, &x), &m) in self.output.buffer_mut().iter_mut().zip(input).zip(modulator) {
            *out = x * m;
        }
    }

    pins!(inputs: [input, modulator], outputs: [output]);
}
