//! Sample buffers and WAV file nodes for the cantus graph.
//!
//! - [`SampleBuffer`]: Whole files loaded into memory
//! - [`BufferPlayerNode`]: Plays a shared [`SampleBuffer`]
//! - [`BufferLooperNode`]: Repeats a region of a buffer with a crossfade
//! - [`FileReaderNode`]: Streams a WAV file from disk
//! - [`FileWriterNode`]: Records the graph to a WAV file
//!
//! Disk access for the streaming nodes happens on a
//! [`WorkerThread`](cantus_core::WorkerThread); the audio thread only touches
//! lock-free ring buffers.

pub mod buffer;
pub mod error;
pub mod looper;
pub mod player;
pub mod reader;
pub mod writer;

pub use buffer::SampleBuffer;
pub use error::{Error, Result};
pub use looper::{BufferLooperNode, LoopRegion};
pub use player::BufferPlayerNode;
pub use reader::FileReaderNode;
pub use writer::FileWriterNode;
