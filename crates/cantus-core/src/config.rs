//! Audio engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the audio graph and its device callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: f32,
    /// Frames delivered per device callback.
    pub buffer_size: usize,
    /// Frames per internal processing block. Must divide `buffer_size`.
    pub internal_buffer_size: usize,
    pub input_channels: usize,
    pub output_channels: usize,
    /// Arena capacity reserved up front so adding nodes does not reallocate.
    pub node_capacity: usize,
    pub worker_poll_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            buffer_size: 512,
            internal_buffer_size: 64,
            input_channels: 0,
            output_channels: 2,
            node_capacity: 256,
            worker_poll_interval_ms: 5,
        }
    }
}

impl AudioConfig {
    /// Parse a config from TOML. Missing keys fall back to defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if self.internal_buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "internal_buffer_size must be greater than zero".into(),
            ));
        }
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfig(
                "buffer_size must be greater than zero".into(),
            ));
        }
        if self.buffer_size % self.internal_buffer_size != 0 {
            return Err(Error::InvalidConfig(format!(
                "internal buffer size {} does not fit device buffer size {}",
                self.internal_buffer_size, self.buffer_size
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn samples_per_block(&self) -> usize {
        self.internal_buffer_size
    }

    #[inline]
    pub fn blocks_per_buffer(&self) -> usize {
        self.buffer_size / self.internal_buffer_size.max(1)
    }

    #[inline]
    pub fn samples_per_millisecond(&self) -> f32 {
        self.sample_rate / 1000.0
    }

    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms.max(1))
    }
}
