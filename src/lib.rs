//! # Cantus - Pull-based Audio Graph
//!
//! Sample-accurate audio processing graph built from modular crates.
//!
//! ## Architecture
//!
//! Cantus is an umbrella crate that coordinates:
//! - **cantus-core** - Graph runtime (nodes, pins, NodeManager, safe ownership, ramps)
//! - **cantus-dsp** - DSP nodes (oscillator, gain, delay, filter, envelope)
//! - **cantus-sampler** - Sample buffers and streaming WAV reader/writer nodes
//!
//! ## Quick Start
//!
//! ```
//! use cantus::prelude::*;
//!
//! let (engine, mut manager) = Engine::builder()
//!     .sample_rate(44100.0)
//!     .build()?;
//! let format = engine.format();
//!
//! let osc = engine.add_node(OscillatorNode::sine(format));
//! let gain = engine.add_node(GainNode::new(format, 0.5));
//! let out = engine.add_root_node(OutputNode::new(format, 0));
//! engine.connect(osc.output(0), &gain, 0);
//! engine.connect(gain.output(0), &out, 0);
//!
//! // In the device callback:
//! let output = manager.render(512);
//! assert!(output[0].iter().all(|x| x.abs() <= 0.5));
//! # Ok::<(), cantus::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Core graph, DSP nodes and sampler
//! - `sampler` - Sample buffers and file streaming

mod builder;
mod engine;
mod error;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use error::{Error, Result};

/// Re-export of cantus-core for direct access
pub use cantus_core as core;

/// Re-export of cantus-dsp for direct access
pub use cantus_dsp as dsp;

#[cfg(feature = "sampler")]
pub use cantus_sampler as sampler;

pub use cantus_core::{
    AudioConfig, AudioFormat, DeletionQueue, GraphHandle, InputNode, InputPin, Node, NodeId,
    NodeManager, NodeOwner, NodeRef, OutputNode, OutputPin, PinRef, ProcessContext, RampMode,
    RampedValue, SafeOwner, SafePtr, SmoothedValue, WorkerThread,
};

pub use cantus_dsp::{
    ControlNode, DelayNode, EnvelopeNode, FilterMode, FilterNode, GainNode, MixNode,
    MultiplyNode, OscillatorNode, Segment, WaveTable, Waveform,
};

#[cfg(feature = "sampler")]
pub use cantus_sampler::{
    BufferLooperNode, BufferPlayerNode, FileReaderNode, FileWriterNode, LoopRegion, SampleBuffer,
};

pub mod prelude {
    pub use crate::{Engine, EngineBuilder, Error, Result};

    pub use cantus_core::prelude::*;

    pub use cantus_dsp::{
        ControlNode, DelayNode, EnvelopeNode, FilterMode, FilterNode, GainNode, MixNode,
        MultiplyNode, OscillatorNode, Segment,
    };

    #[cfg(feature = "sampler")]
    pub use cantus_sampler::{
        BufferLooperNode, BufferPlayerNode, FileReaderNode, FileWriterNode, LoopRegion, SampleBuffer,
    };
}
