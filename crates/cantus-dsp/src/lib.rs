//! DSP nodes for the cantus audio graph.
//!
//! Every node takes the graph's [`AudioFormat`](cantus_core::AudioFormat) at
//! construction, exposes its pins as public fields and is driven entirely by
//! [`NodeManager::process`](cantus_core::NodeManager::process).

mod circular_buffer;
pub use circular_buffer::{CircularBuffer, CircularBufferNode};

mod control;
pub use control::ControlNode;

mod delay;
pub use delay::{DelayNode, DelayParams};

mod envelope;
pub use envelope::{EnvelopeNode, Segment};

mod filter;
pub use filter::{coefficients, Biquad, FilterMode, FilterNode};

mod gain;
pub use gain::GainNode;

mod mix;
pub use mix::{MixNode, MultiplyNode};

mod oscillator;
pub use oscillator::OscillatorNode;

mod wavetable;
pub use wavetable::{WaveTable, Waveform, DEFAULT_TABLE_SIZE};

/// Ramp length in samples for a duration in milliseconds.
#[inline]
pub(crate) fn millis_to_steps(millis: f32, sample_rate: f32) -> u32 {
    (millis.max(0.0) * sample_rate / 1000.0).round() as u32
}
