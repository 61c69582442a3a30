//! Builder for configuring and constructing an [`Engine`].

use crate::core::{AudioConfig, NodeManager, WorkerThread};
use crate::{Engine, Result};
use std::path::Path;

/// Starts from [`AudioConfig::default`]; individual setters override single
/// fields of whatever config is in place.
///
/// # Example
///
/// ```
/// use cantus::prelude::*;
///
/// let (engine, mut manager) = Engine::builder()
///     .sample_rate(48000.0)
///     .internal_buffer_size(32)
///     .build()?;
///
/// assert_eq!(engine.format().block_size, 32);
/// assert_eq!(manager.render(64).len(), 2);
/// # Ok::<(), cantus::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: AudioConfig,
    worker_name: Option<String>,
}

impl EngineBuilder {
    /// Replaces the whole config.
    pub fn config(mut self, config: AudioConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the config from a TOML file.
    pub fn config_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        self.config = AudioConfig::from_toml_str(&source)?;
        Ok(self)
    }

    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Frames per device callback. Default: 512
    pub fn buffer_size(mut self, frames: usize) -> Self {
        self.config.buffer_size = frames;
        self
    }

    /// Frames per internal block. Default: 64
    pub fn internal_buffer_size(mut self, frames: usize) -> Self {
        self.config.internal_buffer_size = frames;
        self
    }

    /// Default: 0
    pub fn inputs(mut self, count: usize) -> Self {
        self.config.input_channels = count;
        self
    }

    /// Default: 2
    pub fn outputs(mut self, count: usize) -> Self {
        self.config.output_channels = count;
        self
    }

    /// Name of the background I/O thread. Default: "cantus-worker"
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = Some(name.into());
        self
    }

    /// Validates the config and returns the control-side [`Engine`] together
    /// with the [`NodeManager`] to be moved into the audio callback.
    pub fn build(self) -> Result<(Engine, NodeManager)> {
        let manager = NodeManager::from_config(&self.config)?;
        let name = self.worker_name.as_deref().unwrap_or("cantus-worker");
        let worker = WorkerThread::spawn(name, self.config.worker_poll_interval())?;

        tracing::info!(
            sample_rate = self.config.sample_rate,
            buffer_size = self.config.buffer_size,
            block_size = self.config.internal_buffer_size,
            inputs = self.config.input_channels,
            outputs = self.config.output_channels,
            "engine built"
        );

        let engine = Engine::new(self.config, manager.handle(), worker);
        Ok((engine, manager))
    }
}
