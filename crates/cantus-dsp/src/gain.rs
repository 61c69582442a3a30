//! Gain node.

use crate::millis_to_steps;
use cantus_core::{pins, AudioFormat, InputPin, Node, OutputPin, ProcessContext, RampMode, RampedValue};

/// Multiplies its input by a ramped gain.
pub struct GainNode {
    pub input: InputPin,
    pub output: OutputPin,
    gain: RampedValue,
    sample_rate: f32,
}

impl GainNode {
    pub fn new(format: AudioFormat, gain: f32) -> Self {
        Self {
            input: InputPin::new(format.block_size),
            output: OutputPin::new(format.block_size),
            gain: RampedValue::new(gain),
            sample_rate: format.sample_rate,
        }
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain.set_value(gain);
    }

    pub fn ramp_gain(&mut self, gain: f32, millis: f32, mode: RampMode) {
        self.gain
            .ramp(gain, millis_to_steps(millis, self.sample_rate), mode);
    }

    pub fn gain(&self) -> f32 {
        self.gain.value()
    }

    pub fn is_ramping(&self) -> bool {
        self.gain.is_ramping()
    }

    pub fn set_on_ramp_finished<F>(&mut self, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.gain.set_on_destination_reached(callback);
    }
}

impl Node for GainNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let input = self.input.pull(ctx);
        let output = self.output.buffer_mut();

        if self.gain.is_ramping() {
            for (out, &x) in output.iter_mut().zip(input) {
                *out = x * self.gain.next_value();
            }
        } else {
            let gain = self.gain.value();
            for (out, &x) in output.iter_mut().zip(input) {
                *out = x * gain;
            }
        }
    }

    fn sample_rate_changed(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pins!(inputs: [input], outputs: [output]);
}
