//! Control signal source.

use crate::millis_to_steps;
use cantus_core::{pins, AudioFormat, Node, OutputPin, ProcessContext, RampMode, RampedValue};

/// Outputs a ramped control value, one step per sample.
pub struct ControlNode {
    pub output: OutputPin,
    value: RampedValue,
    sample_rate: f32,
}

impl ControlNode {
    pub fn new(format: AudioFormat, value: f32) -> Self {
        Self {
            output: OutputPin::new(format.block_size),
            value: RampedValue::new(value),
            sample_rate: format.sample_rate,
        }
    }

    pub fn set_value(&mut self, value: f32) {
        self.value.set_value(value);
    }

    pub fn ramp(&mut self, destination: f32, millis: f32, mode: RampMode) {
        self.value
            .ramp(destination, millis_to_steps(millis, self.sample_rate), mode);
    }

    /// Ramps over an exact number of samples.
    pub fn ramp_samples(&mut self, destination: f32, samples: u32, mode: RampMode) {
        self.value.ramp(destination, samples, mode);
    }

    pub fn stop(&mut self) {
        self.value.stop();
    }

    pub fn value(&self) -> f32 {
        self.value.value()
    }

    pub fn destination(&self) -> f32 {
        self.value.destination()
    }

    pub fn is_ramping(&self) -> bool {
        self.value.is_ramping()
    }

    /// Fires on the audio thread when a ramp lands.
    pub fn set_on_ramp_finished<F>(&mut self, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.value.set_on_destination_reached(callback);
    }
}

impl Node for ControlNode {
    fn process(&mut self, _ctx: &mut ProcessContext<'_>) {
        self.value.process_block(self.output.buffer_mut());
    }

    fn sample_rate_changed(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pins!(inputs: [], outputs: [output]);
}
