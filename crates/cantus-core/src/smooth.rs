//! Fixed-length linear smoothing for control values written from another thread.
//!
//! [`SmoothedValue`] is the cheap sibling of [`RampedValue`](crate::RampedValue):
//! every retarget uses the same step count and nothing is notified when the
//! target is reached. Nodes use it to de-zipper parameters that a control thread
//! writes into an [`AtomicFloat`](crate::AtomicFloat) and the audio thread picks
//! up once per block.
//!
//! ```
//! use cantus_core::SmoothedValue;
//!
//! // 10 ms at 44.1 kHz
//! let mut gain = SmoothedValue::from_millis(1.0, 10.0, 44.1);
//! gain.set_target(0.5);
//!
//! let mut buffer = [1.0f32; 64];
//! gain.apply_gain(&mut buffer);
//! assert!(buffer[63] < 1.0);
//! ```

#[derive(Debug, Clone)]
pub struct SmoothedValue {
    current: f32,
    target: f32,
    step: f32,
    steps_remaining: u32,
    step_count: u32,
}

impl SmoothedValue {
    /// Every retarget reaches its target after `step_count` samples (at least one).
    pub fn new(initial: f32, step_count: u32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            steps_remaining: 0,
            step_count: step_count.max(1),
        }
    }

    pub fn from_millis(initial: f32, millis: f32, samples_per_millisecond: f32) -> Self {
        Self::new(initial, Self::steps_for(millis, samples_per_millisecond))
    }

    fn steps_for(millis: f32, samples_per_millisecond: f32) -> u32 {
        (millis * samples_per_millisecond).round().max(1.0) as u32
    }

    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        self.steps_remaining = self.step_count;
        self.step = (self.target - self.current) / self.step_count as f32;
    }

    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.steps_remaining = 0;
    }

    /// Call once per sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.steps_remaining > 0 {
            self.steps_remaining -= 1;
            if self.steps_remaining == 0 {
                self.current = self.target;
            } else {
                self.current += self.step;
            }
        }
        self.current
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.steps_remaining > 0
    }

    #[inline]
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Takes effect on the next `set_target()` call.
    pub fn set_step_count(&mut self, step_count: u32) {
        self.step_count = step_count.max(1);
    }

    /// Keeps the smoothing time constant across a sample rate change.
    pub fn set_smooth_millis(&mut self, millis: f32, samples_per_millisecond: f32) {
        self.set_step_count(Self::steps_for(millis, samples_per_millisecond));
    }

    #[inline]
    pub fn skip_to_target(&mut self) {
        self.set_immediate(self.target);
    }

    #[inline]
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        if !self.is_smoothing() {
            buffer.fill(self.current);
            return;
        }
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    #[inline]
    pub fn apply_gain(&mut self, buffer: &mut [f32]) {
        if !self.is_smoothing() {
            let gain = self.current;
            buffer.iter_mut().for_each(|sample| *sample *= gain);
            return;
        }
        for sample in buffer.iter_mut() {
            *sample *= self.next_sample();
        }
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::new(0.0, 64)
    }
}
