//! Control-side engine that owns the graph handle and the I/O worker.

use crate::core::{
    AudioConfig, AudioFormat, GraphHandle, Node, NodeId, NodeOwner, PinRef, SafeOwner,
    WorkerThread,
};
use crate::EngineBuilder;

#[cfg(feature = "sampler")]
use crate::sampler::{FileReaderNode, FileWriterNode, SampleBuffer};
#[cfg(feature = "sampler")]
use crate::Result;
#[cfg(feature = "sampler")]
use std::path::Path;

/// Control-thread half of a running graph.
///
/// The [`NodeManager`](crate::core::NodeManager) returned alongside it by
/// [`EngineBuilder::build`] belongs to the audio thread; every edit made here
/// is queued and applied at the start of its next `process` call.
///
/// # Example
///
/// ```
/// use cantus::prelude::*;
///
/// let (engine, mut manager) = Engine::builder().build()?;
/// let format = engine.format();
///
/// let mut osc = OscillatorNode::sine(format);
/// osc.set_frequency(441.0);
/// let osc = engine.add_node(osc);
/// let out = engine.add_root_node(OutputNode::new(format, 0));
/// engine.connect(osc.output(0), &out, 0);
///
/// let output = manager.render(512);
/// assert!(output[0].iter().any(|&x| x != 0.0));
/// # Ok::<(), cantus::Error>(())
/// ```
pub struct Engine {
    config: AudioConfig,
    handle: GraphHandle,
    worker: WorkerThread,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn new(config: AudioConfig, handle: GraphHandle, worker: WorkerThread) -> Self {
        Self {
            config,
            handle,
            worker,
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Current graph format. Follows rate and block size changes made on the
    /// audio thread.
    pub fn format(&self) -> AudioFormat {
        self.handle.format()
    }

    pub fn sample_rate(&self) -> f32 {
        self.format().sample_rate
    }

    /// Clonable handle for other control threads.
    pub fn handle(&self) -> &GraphHandle {
        &self.handle
    }

    pub fn worker(&self) -> &WorkerThread {
        &self.worker
    }

    // =========================================================================
    // Graph edits
    // =========================================================================

    pub fn add_node<N: Node>(&self, node: N) -> NodeOwner<N> {
        self.handle.add_node(node)
    }

    pub fn add_root_node<N: Node>(&self, node: N) -> NodeOwner<N> {
        self.handle.add_root_node(node)
    }

    pub fn connect(&self, source: PinRef, dest: impl Into<NodeId>, input: usize) {
        self.handle.connect(source, dest, input);
    }

    pub fn disconnect(&self, dest: impl Into<NodeId>, input: usize) {
        self.handle.disconnect(dest, input);
    }

    /// Wraps `value` for sharing with nodes; it is freed on the audio thread
    /// only once no block can still be reading it.
    pub fn make_safe<T: Send + Sync + 'static>(&self, value: T) -> SafeOwner<T> {
        self.handle.make_safe(value)
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// Loads a WAV file into a buffer ready to hand to
    /// [`BufferPlayerNode`](crate::sampler::BufferPlayerNode)s.
    #[cfg(feature = "sampler")]
    pub fn load_buffer(&self, path: impl AsRef<Path>) -> Result<SafeOwner<SampleBuffer>> {
        let buffer = SampleBuffer::load_wav(path)?;
        Ok(self.make_safe(buffer))
    }

    /// Opens a streaming reader served by the engine's worker thread.
    #[cfg(feature = "sampler")]
    pub fn file_reader(&self, path: impl AsRef<Path>, looping: bool) -> Result<FileReaderNode> {
        Ok(FileReaderNode::open(path, self.format(), &self.worker, looping)?)
    }

    /// Creates a recorder served by the engine's worker thread. Add it with
    /// [`add_root_node`](Self::add_root_node).
    #[cfg(feature = "sampler")]
    pub fn file_writer(&self, path: impl AsRef<Path>, channels: usize) -> Result<FileWriterNode> {
        Ok(FileWriterNode::create(path, self.format(), channels, &self.worker)?)
    }

    /// Stops the worker, finalizing any open recordings.
    pub fn shutdown(mut self) {
        self.worker.stop();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("running", &self.worker.is_running())
            .finish()
    }
}
