//! Per-sample ramped control values with a completion notification.
//!
//! A [`RampedValue`] moves from its current value to a destination over a fixed
//! number of steps, one step per [`next_value`](RampedValue::next_value) call.
//! When the last step lands, the value is set exactly to the destination and the
//! `on_destination_reached` callback fires once.
//!
//! Exponential ramps cannot start or end at zero, so a zero endpoint is replaced
//! by the other endpoint scaled by `1e-4` (a fade of roughly 80 dB in amplitude).
//! A ramp whose destination is zero still finishes at exactly `0.0`.

use std::fmt;

/// Scale applied to the non-zero endpoint to stand in for a zero endpoint.
const ZERO_SUBSTITUTE: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampMode {
    #[default]
    Linear,
    Exponential,
}

pub type DestinationCallback = Box<dyn FnMut(f32) + Send>;

pub struct RampedValue {
    value: f32,
    destination: f32,
    /// Linear: per-step increment. Exponential: per-step factor.
    increment: f32,
    steps_remaining: u32,
    mode: RampMode,
    on_destination_reached: Option<DestinationCallback>,
}

impl RampedValue {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            destination: value,
            increment: 0.0,
            steps_remaining: 0,
            mode: RampMode::Linear,
            on_destination_reached: None,
        }
    }

    /// Jumps to `value`, cancelling any ramp. Does not notify.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
        self.destination = value;
        self.increment = 0.0;
        self.steps_remaining = 0;
    }

    /// Starts a ramp towards `destination` lasting `step_count` steps.
    ///
    /// A zero step count jumps straight to the destination and notifies immediately.
    pub fn ramp(&mut self, destination: f32, step_count: u32, mode: RampMode) {
        if step_count == 0 {
            self.set_value(destination);
            self.notify();
            return;
        }

        self.destination = destination;
        self.steps_remaining = step_count;
        self.mode = mode;

        match mode {
            RampMode::Linear => self.start_linear(step_count),
            RampMode::Exponential => self.start_exponential(step_count),
        }
    }

    fn start_linear(&mut self, step_count: u32) {
        self.mode = RampMode::Linear;
        self.increment = (self.destination - self.value) / step_count as f32;
    }

    fn start_exponential(&mut self, step_count: u32) {
        let mut start = self.value;
        let mut end = self.destination;

        if start == 0.0 && end == 0.0 {
            self.start_linear(step_count);
            return;
        }
        if end == 0.0 {
            end = start * ZERO_SUBSTITUTE;
        }
        if start == 0.0 {
            start = end * ZERO_SUBSTITUTE;
        }
        // No exponential curve crosses zero.
        if start.signum() != end.signum() {
            self.start_linear(step_count);
            return;
        }

        self.value = start;
        self.increment = ((end / start).ln() / step_count as f32).exp();
    }

    /// Advances one step and returns the new value.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.steps_remaining == 0 {
            return self.value;
        }

        self.steps_remaining -= 1;
        if self.steps_remaining == 0 {
            self.value = self.destination;
            self.notify();
        } else {
            match self.mode {
                RampMode::Linear => self.value += self.increment,
                RampMode::Exponential => self.value *= self.increment,
            }
        }
        self.value
    }

    /// Fills `buffer` with consecutive values.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        if self.steps_remaining == 0 {
            buffer.fill(self.value);
            return;
        }
        for sample in buffer.iter_mut() {
            *sample = self.next_value();
        }
    }

    /// Freezes the value where it is.
    pub fn stop(&mut self) {
        self.steps_remaining = 0;
        self.destination = self.value;
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn destination(&self) -> f32 {
        self.destination
    }

    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.steps_remaining > 0
    }

    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.steps_remaining
    }

    /// The mode actually in use; exponential ramps across zero run linearly.
    #[inline]
    pub fn mode(&self) -> RampMode {
        self.mode
    }

    pub fn set_on_destination_reached<F>(&mut self, callback: F)
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.on_destination_reached = Some(Box::new(callback));
    }

    pub fn clear_on_destination_reached(&mut self) {
        self.on_destination_reached = None;
    }

    fn notify(&mut self) {
        if let Some(callback) = self.on_destination_reached.as_mut() {
            callback(self.value);
        }
    }
}

impl Default for RampedValue {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl fmt::Debug for RampedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RampedValue")
            .field("value", &self.value)
            .field("destination", &self.destination)
            .field("steps_remaining", &self.steps_remaining)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
