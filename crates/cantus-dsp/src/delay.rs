//! Feedback delay node.

use crate::circular_buffer::CircularBuffer;
use cantus_core::{
    pins, AtomicFloat, AudioFormat, InputPin, Node, OutputPin, ProcessContext, SmoothedValue,
};
use std::sync::Arc;

/// Dry/wet changes are smoothed over this long to avoid clicks.
const DRY_WET_SMOOTH_MS: f32 = 5.0;

/// Delay parameters, writable from any thread.
#[derive(Debug, Clone)]
pub struct DelayParams {
    time_ms: Arc<AtomicFloat>,
    dry_wet: Arc<AtomicFloat>,
    feedback: Arc<AtomicFloat>,
}

impl DelayParams {
    fn new(time_ms: f32) -> Self {
        Self {
            time_ms: Arc::new(AtomicFloat::new(time_ms.max(0.0))),
            dry_wet: Arc::new(AtomicFloat::new(1.0)),
            feedback: Arc::new(AtomicFloat::new(0.0)),
        }
    }

    pub fn set_time_ms(&self, millis: f32) {
        self.time_ms.set(millis.max(0.0));
    }

    pub fn time_ms(&self) -> f32 {
        self.time_ms.get()
    }

    /// 0 is fully dry, 1 fully wet.
    pub fn set_dry_wet(&self, mix: f32) {
        self.dry_wet.set(mix.clamp(0.0, 1.0));
    }

    pub fn dry_wet(&self) -> f32 {
        self.dry_wet.get()
    }

    /// Portion of the delayed signal fed back into the line.
    pub fn set_feedback(&self, feedback: f32) {
        self.feedback.set(feedback.clamp(0.0, 0.999));
    }

    pub fn feedback(&self) -> f32 {
        self.feedback.get()
    }
}

/// Delay line with feedback and a dry/wet mix.
///
/// A delay time of zero passes the input straight through and ignores
/// feedback.
pub struct DelayNode {
    pub input: InputPin,
    pub output: OutputPin,
    buffer: CircularBuffer,
    params: DelayParams,
    dry_wet: SmoothedValue,
    primed: bool,
    sample_rate: f32,
}

impl DelayNode {
    /// `max_time_ms` bounds the delay time for the lifetime of the node.
    pub fn new(format: AudioFormat, time_ms: f32, max_time_ms: f32) -> Self {
        let capacity = format.millis_to_samples(max_time_ms.max(time_ms)).max(1) as usize;
        Self {
            input: InputPin::new(format.block_size),
            output: OutputPin::new(format.block_size),
            buffer: CircularBuffer::new(capacity),
            params: DelayParams::new(time_ms),
            dry_wet: SmoothedValue::from_millis(
                1.0,
                DRY_WET_SMOOTH_MS,
                format.samples_per_millisecond(),
            ),
            primed: false,
            sample_rate: format.sample_rate,
        }
    }

    /// Shared parameter handle.
    pub fn params(&self) -> DelayParams {
        self.params.clone()
    }

    /// Current delay in whole samples.
    pub fn delay_samples(&self) -> usize {
        let samples = (self.params.time_ms() * self.sample_rate / 1000.0).round() as usize;
        samples.min(self.buffer.capacity())
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Node for DelayNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let delay = self.delay_samples();
        let feedback = self.params.feedback();
        self.dry_wet.set_target(self.params.dry_wet());
        if !self.primed {
            self.dry_wet.skip_to_target();
            self.primed = true;
        }

        let input = self.input.pull(ctx);
        let output = self.output.buffer_mut();

        if delay == 0 {
            self.buffer.write_block(input);
            output.copy_from_slice(input);
            return;
        }

        for (out, &x) in output.iter_mut().zip(input) {
            let delayed = self.buffer.read(delay);
            self.buffer.write(x + delayed * feedback);
            let wet = self.dry_wet.next_sample();
            *out = x * (1.0 - wet) + delayed * wet;
        }
    }

    fn sample_rate_changed(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.dry_wet
            .set_smooth_millis(DRY_WET_SMOOTH_MS, sample_rate / 1000.0);
    }

    pins!(inputs: [input], outputs: [output]);
}
