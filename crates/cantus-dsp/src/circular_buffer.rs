//! Circular sample history and a node that records into one.

use cantus_core::{pins, AudioFormat, InputPin, Node, ProcessContext};

/// Fixed-capacity ring of the most recent samples.
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    data: Vec<f32>,
    write_pos: usize,
}

impl CircularBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.data[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.data.len();
    }

    pub fn write_block(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.write(sample);
        }
    }

    /// The sample written `delay` writes ago; `read(1)` is the latest.
    ///
    /// Delays are clamped to `1..=capacity`.
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.data.len();
        let delay = delay.clamp(1, len);
        self.data[(self.write_pos + len - delay) % len]
    }

    /// Linear interpolation between neighbouring delays.
    #[inline]
    pub fn read_interpolated(&self, delay: f32) -> f32 {
        let whole = delay.floor();
        let fraction = delay - whole;
        let a = self.read(whole as usize);
        let b = self.read(whole as usize + 1);
        a + (b - a) * fraction
    }

    /// Copies the `out.len()` samples ending `delay` writes ago, oldest first.
    pub fn read_block(&self, delay: usize, out: &mut [f32]) {
        let count = out.len();
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.read(delay + count - 1 - i);
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.write_pos = 0;
    }
}

/// Keeps a history of its input for other code to read.
///
/// Has no outputs, so it must be registered as a root node to run.
pub struct CircularBufferNode {
    pub input: InputPin,
    buffer: CircularBuffer,
    samples_written: u64,
}

impl CircularBufferNode {
    pub fn new(format: AudioFormat, capacity: usize) -> Self {
        Self {
            input: InputPin::new(format.block_size),
            buffer: CircularBuffer::new(capacity.max(format.block_size)),
            samples_written: 0,
        }
    }

    pub fn buffer(&self) -> &CircularBuffer {
        &self.buffer
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }
}

impl Node for CircularBufferNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let input = self.input.pull(ctx);
        self.buffer.write_block(input);
        self.samples_written += input.len() as u64;
    }

    pins!(inputs: [input], outputs: []);
}
