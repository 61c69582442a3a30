//! Single-cycle lookup tables.

use std::f32::consts::TAU;

pub const DEFAULT_TABLE_SIZE: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Saw,
    Square,
}

impl Waveform {
    /// Value at `phase` in `[0, 1)`.
    #[inline]
    pub fn evaluate(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => {
                let p = phase * 4.0;
                if p < 1.0 {
                    p
                } else if p < 3.0 {
                    2.0 - p
                } else {
                    p - 4.0
                }
            }
            Waveform::Saw => phase * 2.0 - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// One period of a waveform, read with linear interpolation.
#[derive(Debug, Clone)]
pub struct WaveTable {
    samples: Vec<f32>,
}

impl WaveTable {
    pub fn new(waveform: Waveform, size: usize) -> Self {
        let size = size.max(2);
        let samples = (0..size)
            .map(|i| waveform.evaluate(i as f32 / size as f32))
            .collect();
        Self { samples }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine, DEFAULT_TABLE_SIZE)
    }

    /// Wraps an arbitrary single cycle. Empty input yields a silent table.
    pub fn from_samples(samples: Vec<f32>) -> Self {
        if samples.is_empty() {
            return Self {
                samples: vec![0.0; 2],
            };
        }
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Interpolated value at `phase` in `[0, 1)`.
    #[inline]
    pub fn interpolate(&self, phase: f32) -> f32 {
        let len = self.samples.len();
        let position = phase * len as f32;
        let index = (position as usize) % len;
        let next = (index + 1) % len;
        let fraction = position - position.floor();
        let a = self.samples[index];
        a + (self.samples[next] - a) * fraction
    }
}
