//! Recording the graph to a WAV file.

use crate::buffer::float_spec;
use crate::Result;
use cantus_core::{
    AtomicCount, AtomicFlag, AudioFormat, InputPin, Node, ProcessContext, WorkerJob, WorkerThread,
    WorkerWaker,
};
use hound::WavWriter;
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Ring buffer size in device blocks.
const BUFFER_BLOCKS: usize = 64;

#[derive(Default)]
struct WriterShared {
    closed: AtomicFlag,
    failed: AtomicFlag,
    dropped_frames: AtomicCount,
    frames_written: AtomicCount,
}

struct WriterState {
    writer: Option<WavWriter<BufWriter<File>>>,
    consumer: HeapCons<f32>,
    chunk: Vec<f32>,
    channels: usize,
}

struct WriterJob {
    path: PathBuf,
    state: Mutex<WriterState>,
    shared: Arc<WriterShared>,
}

impl WriterJob {
    fn drain(&self, state: &mut WriterState) {
        loop {
            let count = state.consumer.pop_slice(&mut state.chunk);
            if count == 0 {
                return;
            }
            let result = match state.writer.as_mut() {
                Some(writer) => state.chunk[..count]
                    .iter()
                    .try_for_each(|&sample| writer.write_sample(sample)),
                None => Ok(()),
            };
            match result {
                Ok(()) if state.writer.is_some() => {
                    self.shared.frames_written.add(count / state.channels);
                }
                Ok(()) => {}
                Err(e) => {
                    error!(path = %self.path.display(), "write failed: {}", e);
                    self.shared.failed.set(true);
                    state.writer = None;
                }
            }
        }
    }

    fn finalize(&self, state: &mut WriterState) {
        self.drain(state);
        let Some(writer) = state.writer.take() else {
            return;
        };
        match writer.finalize() {
            Ok(()) => info!(
                path = %self.path.display(),
                frames = self.shared.frames_written.get(),
                "recording finalized"
            ),
            Err(e) => {
                error!(path = %self.path.display(), "finalize failed: {}", e);
                self.shared.failed.set(true);
            }
        }
    }
}

impl WorkerJob for WriterJob {
    fn run(&self) -> bool {
        let mut guard = self.state.lock();
        // Read the flag first so everything pushed before closing is drained.
        let closed = self.shared.closed.get();
        self.drain(&mut guard);
        if closed {
            self.finalize(&mut guard);
            return false;
        }
        true
    }

    fn finish(&self) {
        let mut guard = self.state.lock();
        self.finalize(&mut guard);
    }
}

/// Records its inputs, one per channel, to a 32-bit float WAV file.
///
/// Register it as a root node. The file is finalized on the worker thread
/// once the node is dropped or the worker stops. When the worker falls behind,
/// whole blocks are dropped and counted.
pub struct FileWriterNode {
    pub inputs: Vec<InputPin>,
    producer: HeapProd<f32>,
    scratch: Vec<f32>,
    flush_threshold: usize,
    shared: Arc<WriterShared>,
    waker: WorkerWaker,
}

impl FileWriterNode {
    /// Creates (or truncates) `path` and registers the writing job with `worker`.
    pub fn create(
        path: impl AsRef<Path>,
        format: AudioFormat,
        channels: usize,
        worker: &WorkerThread,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let spec = float_spec(channels, format.sample_rate);
        crate::buffer::check_spec(&spec)?;

        let file = File::create(&path)?;
        let writer = WavWriter::new(BufWriter::new(file), spec)?;

        let capacity = format.block_size * channels * BUFFER_BLOCKS;
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
        let shared = Arc::new(WriterShared::default());

        worker.register(Arc::new(WriterJob {
            path: path.clone(),
            state: Mutex::new(WriterState {
                writer: Some(writer),
                consumer,
                chunk: vec![0.0; capacity],
                channels,
            }),
            shared: Arc::clone(&shared),
        }));
        info!(path = %path.display(), channels, "recording started");

        Ok(Self {
            inputs: (0..channels)
                .map(|_| InputPin::new(format.block_size))
                .collect(),
            producer,
            scratch: vec![0.0; format.block_size * channels],
            flush_threshold: capacity / 4,
            shared,
            waker: worker.waker(),
        })
    }

    pub fn channel_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn dropped_frames(&self) -> usize {
        self.shared.dropped_frames.get()
    }

    pub fn frames_written(&self) -> usize {
        self.shared.frames_written.get()
    }

    pub fn has_failed(&self) -> bool {
        self.shared.failed.get()
    }
}

impl Node for FileWriterNode {
    fn process(&mut self, ctx: &mut ProcessContext<'_>) {
        let channels = self.inputs.len();
        for (channel, pin) in self.inputs.iter_mut().enumerate() {
            let samples = pin.pull(ctx);
            let frames = self.scratch[channel..].iter_mut().step_by(channels);
            for (dst, &sample) in frames.zip(samples) {
                *dst = sample;
            }
        }

        if self.producer.vacant_len() >= self.scratch.len() {
            self.producer.push_slice(&self.scratch);
        } else if channels > 0 {
            self.shared.dropped_frames.add(self.scratch.len() / channels);
        }

        if self.producer.occupied_len() >= self.flush_threshold {
            self.waker.wake();
        }
    }

    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn input_mut(&mut self, index: usize) -> Option<&mut InputPin> {
        self.inputs.get_mut(index)
    }

    fn buffer_size_changed(&mut self, block_size: usize) {
        self.scratch.resize(block_size * self.inputs.len(), 0.0);
    }
}

impl Drop for FileWriterNode {
    fn drop(&mut self) {
        self.shared.closed.set(true);
        self.waker.wake();
    }
}
