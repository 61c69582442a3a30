//! Biquad filter node (RBJ cookbook responses).

use cantus_core::{pins, AudioFormat, InputPin, Node, OutputPin, ProcessContext};
use std::f64::consts::PI;
use tracing::warn;

const PASSTHROUGH: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    LowPass,
    HighPass,
    BandPass,
    Notch,
    Peak,
    LowShelf,
    HighShelf,
}

/// Transposed direct form II biquad.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Normalizes by `a0`.
    pub fn set_coefficients(&mut self, b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) {
        let a0_inv = 1.0 / a0;
        self.b0 = (b0 * a0_inv) as f32;
        self.b1 = (b1 * a0_inv) as f32;
        self.b2 = (b2 * a0_inv) as f32;
        self.a1 = (a1 * a0_inv) as f32;
        self.a2 = (a2 * a0_inv) as f32;
    }

    pub fn design(&mut self, mode: FilterMode, frequency: f32, q: f32, gain_db: f32, sample_rate: f32) {
        let [b0, b1, b2, a0, a1, a2] = coefficients(mode, frequency, q, gain_db, sample_rate);
        self.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    pub fn clear(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Unnormalized `[b0, b1, b2, a0, a1, a2]`.
///
/// A non-positive or non-finite `sample_rate` yields a passthrough. The cutoff
/// is kept between 1 Hz and just below Nyquist, 1 Hz winning when the two
/// cross.
pub fn coefficients(
    mode: FilterMode,
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> [f64; 6] {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return PASSTHROUGH;
    }
    let nyquist = sample_rate as f64 * 0.5;
    let frequency = (frequency as f64).min(nyquist * 0.99).max(1.0);
    let q = (q as f64).max(0.01);
    let omega = 2.0 * PI * frequency / sample_rate as f64;
    let (sin, cos) = omega.sin_cos();
    let alpha = sin / (2.0 * q);
    let a = 10f64.powf(gain_db as f64 / 40.0);

    match mode {
        FilterMode::LowPass => [
            (1.0 - cos) / 2.0,
            1.0 - cos,
            (1.0 - cos) / 2.0,
            1.0 + alpha,
            -2.0 * cos,
            1.0 - alpha,
        ],
        FilterMode::HighPass => [
            (1.0 + cos) / 2.0,
            -(1.0 + cos),
            (1.0 + cos) / 2.0,
            1.0 + alpha,
            -2.0 * cos,
            1.0 - alpha,
        ],
        FilterMode::BandPass => [alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos, 1.0 - alpha],
        FilterMode::Notch => [1.0, -2.0 * cos, 1.0, 1.0 + alpha, -2.0 * cos, 1.0 - alpha],
        FilterMode::Peak => [
            1.0 + alpha * a,
            -2.0 * cos,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos,
            1.0 - alpha / a,
        ],
        FilterMode::LowShelf => {
            let shelf = 2.0 * a.sqrt() * alpha;
            [
                a * ((a + 1.0) - (a - 1.0) * cos + shelf),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos),
                a * ((a + 1.0) - (a - 1.0) * cos - shelf),
                (a + 1.0) + (a - 1.0) * cos + shelf,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos),
                (a + 1.0) + (a - 1.0) * cos - shelf,
            ]
        }
        FilterMode::HighShelf => {
            let shelf = 2.0 * a.sqrt() * alpha;
            [
                a * ((a + 1.0) + (a - 1.0) * cos + shelf),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos),
                a * ((a + 1.0) + (a - 1.0) * cos - shelf),
                (a + 1.0) - (a - 1.0) * cos + shelf,
                2.0 * ((a - 1.0) - (a + 1.0) * cos),
                (a + 1.0) - (a - 1.0) * cos - shelf,
            ]
        }
    }
}

/// Biquad filter node. Coefficients are recomputed whenever a parameter or the
/// sample rate changes.
pub struct FilterNode {
    pub input: InputPin,
    pub output: OutputPin,
    biquad: Biquad,
    mode: FilterMode,
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
}

impl FilterNode {
    pub fn new(format: AudioFormat, mode: FilterMode, frequency: f32) -> Self {
        let mut node = Self {
            input: InputPin::new(format.block_size),
            output: OutputPin::new(format.block_size),
            biquad: Biquad::new(),
            mode,
            frequency,
            q: std::f32::consts::FRAC_1_SQRT_2,
            gain_db: 0.0,
            sample_rate: format.sample_rate,
        };
        node.update();
        node
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
        self.update();
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.update();
    }

    pub fn set_q(&mut self, q: f32) {
        self.q = q;
        self.update();
    }

    /// Only used by the peak and shelf modes.
    pub fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db;
        self.update();
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    pub fn clear(&mut self) {
        self.biquad.clear();
    }

    fn update(&mut self) {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            warn!(sample_rate = self.sample_rate, "invalid sample rate, filter bypassed");
        }
        self.biquad.design(
            self.mode,
            self.frequency,
            self.q,
            self.gain_db,
            self.sample_rate,
        );
    }
}

impl Node for FilterNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let input = self.input.pull(ctx);
        for (out, &x) in self.output.buffer_mut().iter_mut().zip(input) {
            *out = self.biquad.process(x);
        }
    }

    fn sample_rate_changed(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update();
    }

    pins!(inputs: [input], outputs: [output]);
}
