//! Test helpers and fixtures for cantus integration tests
//!
//! Graphs are driven by calling `NodeManager::process` / `render` directly, so
//! every test controls exactly which blocks run.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (passthrough, unity gain)
//! - `DSP_EPSILON` (1e-4): DSP processing (filters, oscillators)
//! - `PERCEPTUAL_EPSILON` (0.001): Perceptual equivalence (-60dB)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use cantus::prelude::*;

/// Default test sample rate
pub const TEST_SAMPLE_RATE: f32 = 44100.0;

/// Internal block size used by the test graphs
pub const TEST_BLOCK_SIZE: usize = 64;

/// Routes `tracing` output to the test harness. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A manager with the test format and two output channels.
pub fn test_manager() -> NodeManager {
    init_tracing();
    NodeManager::new(TEST_SAMPLE_RATE, TEST_BLOCK_SIZE)
}

/// Engine plus the manager that would live on the audio thread.
pub fn test_engine() -> (Engine, NodeManager) {
    init_tracing();
    Engine::builder()
        .sample_rate(TEST_SAMPLE_RATE)
        .internal_buffer_size(TEST_BLOCK_SIZE)
        .worker_name("cantus-test-worker")
        .build()
        .expect("Failed to create test engine")
}

/// Runs `input` through the graph as device input channel 0 and returns every
/// output channel.
pub fn process_mono(manager: &mut NodeManager, input: &[f32]) -> Vec<Vec<f32>> {
    let mut buffers = vec![vec![0.0; input.len()]; manager.output_channel_count()];
    let mut outputs: Vec<&mut [f32]> = buffers.iter_mut().map(Vec::as_mut_slice).collect();
    manager.process(&[input], &mut outputs, input.len());
    buffers
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Generate an integer staircase signal [0, 1, 2, ..., n-1] as f32.
///
/// Each sample equals its index, which makes misrouted or shifted samples
/// easy to spot.
pub fn generate_integer_staircase(num_samples: usize) -> Vec<f32> {
    (0..num_samples).map(|i| i as f32).collect()
}

/// Generate an impulse signal (single sample at 1.0, rest zeros).
pub fn generate_impulse(num_samples: usize, position: usize) -> Vec<f32> {
    let mut samples = vec![0.0; num_samples];
    if position < num_samples {
        samples[position] = 1.0;
    }
    samples
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Check if two signals are approximately equal within tolerance.
pub fn signals_approx_equal(a: &[f32], b: &[f32], tolerance: f32) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tolerance)
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

// =============================================================================
// Test nodes
// =============================================================================

/// Plays a fixed signal once, then silence.
pub struct SignalNode {
    signal: Vec<f32>,
    position: usize,
    pub output: OutputPin,
}

impl SignalNode {
    pub fn new(format: AudioFormat, signal: Vec<f32>) -> Self {
        Self {
            signal,
            position: 0,
            output: OutputPin::new(format.block_size),
        }
    }
}

impl Node for SignalNode {
    fn process(&mut self, _ctx: &mut ProcessContext<'_>) {
        for sample in self.output.buffer_mut() {
            *sample = self.signal.get(self.position).copied().unwrap_or(0.0);
            self.position += 1;
        }
    }

    pins!(inputs: [], outputs: [output]);
}

/// Passes its input through and counts how often it ran.
pub struct CountingNode {
    pub runs: usize,
    pub input: InputPin,
    pub output: OutputPin,
}

impl CountingNode {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            runs: 0,
            input: InputPin::new(format.block_size),
            output: OutputPin::new(format.block_size),
        }
    }
}

impl Node for CountingNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        self.runs += 1;
        let samples = self.input.pull(ctx);
        self.output.buffer_mut().copy_from_slice(samples);
    }

    pins!(inputs: [input], outputs: [output]);
}
