//! Wavetable oscillator node.

use crate::millis_to_steps;
use crate::wavetable::WaveTable;
use cantus_core::{pins, AudioFormat, InputPin, Node, OutputPin, ProcessContext, RampMode, RampedValue};
use std::sync::Arc;

/// Wavetable oscillator with ramped frequency and amplitude.
///
/// The optional `fm_input` scales the frequency per sample by `1 + fm`, so an
/// unconnected input leaves the frequency untouched.
pub struct OscillatorNode {
    pub fm_input: InputPin,
    pub output: OutputPin,
    table: Arc<WaveTable>,
    frequency: RampedValue,
    amplitude: RampedValue,
    phase_offset: f32,
    phase: f32,
    sample_rate: f32,
}

impl OscillatorNode {
    pub fn new(format: AudioFormat, table: Arc<WaveTable>) -> Self {
        Self {
            fm_input: InputPin::new(format.block_size),
            output: OutputPin::new(format.block_size),
            table,
            frequency: RampedValue::new(440.0),
            amplitude: RampedValue::new(1.0),
            phase_offset: 0.0,
            phase: 0.0,
            sample_rate: format.sample_rate,
        }
    }

    pub fn sine(format: AudioFormat) -> Self {
        Self::new(format, Arc::new(WaveTable::sine()))
    }

    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency.set_value(hz);
    }

    pub fn ramp_frequency(&mut self, hz: f32, millis: f32, mode: RampMode) {
        let steps = self.steps(millis);
        self.frequency.ramp(hz, steps, mode);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency.value()
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude.set_value(amplitude);
    }

    pub fn ramp_amplitude(&mut self, amplitude: f32, millis: f32, mode: RampMode) {
        let steps = self.steps(millis);
        self.amplitude.ramp(amplitude, steps, mode);
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude.value()
    }

    /// Phase offset as a fraction of one cycle.
    pub fn set_phase_offset(&mut self, offset: f32) {
        self.phase_offset = offset - offset.floor();
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn set_table(&mut self, table: Arc<WaveTable>) {
        self.table = table;
    }

    fn steps(&self, millis: f32) -> u32 {
        millis_to_steps(millis, self.sample_rate)
    }
}

impl Node for OscillatorNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let fm = self.fm_input.pull(ctx);
        let output = self.output.buffer_mut();
        let period = 1.0 / self.sample_rate;

        for (sample, &modulation) in output.iter_mut().zip(fm) {
            let frequency = self.frequency.next_value() * (1.0 + modulation);
            let amplitude = self.amplitude.next_value();

            let phase = self.phase + self.phase_offset;
            *sample = amplitude * self.table.interpolate(phase - phase.floor());

            self.phase += frequency * period;
            self.phase -= self.phase.floor();
        }
    }

    fn sample_rate_changed(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pins!(inputs: [fm_input], outputs: [output]);
}
