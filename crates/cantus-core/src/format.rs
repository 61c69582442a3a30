//! Stream format nodes are constructed against.

use crate::lockfree::{AtomicCount, AtomicFloat};

/// Sample rate and block size of a running graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioFormat {
    pub sample_rate: f32,
    pub block_size: usize,
}

impl AudioFormat {
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }

    #[inline]
    pub fn samples_per_millisecond(&self) -> f32 {
        self.sample_rate / 1000.0
    }

    /// Rounded number of samples in `millis` milliseconds.
    #[inline]
    pub fn millis_to_samples(&self, millis: f32) -> u32 {
        (millis.max(0.0) * self.samples_per_millisecond()).round() as u32
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::new(44100.0, 64)
    }
}

/// Format mirror readable from control threads.
#[derive(Debug, Default)]
pub(crate) struct SharedFormat {
    sample_rate: AtomicFloat,
    block_size: AtomicCount,
}

impl SharedFormat {
    pub(crate) fn new(format: AudioFormat) -> Self {
        Self {
            sample_rate: AtomicFloat::new(format.sample_rate),
            block_size: AtomicCount::new(format.block_size),
        }
    }

    pub(crate) fn load(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate.get(), self.block_size.get())
    }

    pub(crate) fn set_sample_rate(&self, sample_rate: f32) {
        self.sample_rate.set(sample_rate);
    }

    pub(crate) fn set_block_size(&self, block_size: usize) {
        self.block_size.set(block_size);
    }
}
