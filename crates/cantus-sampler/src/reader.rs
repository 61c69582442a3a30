//! Streaming WAV playback.
//!
//! A [`ReaderJob`] on the [`WorkerThread`] decodes ahead into a lock-free ring
//! buffer; the [`FileReaderNode`] only pops from it on the audio thread.

use crate::buffer::{check_spec, read_interleaved};
use crate::Result;
use cantus_core::{
    AtomicCount, AtomicFlag, AudioFormat, Node, OutputPin, ProcessContext, WorkerJob, WorkerThread,
    WorkerWaker,
};
use hound::WavReader;
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Ring buffer size in device blocks.
const BUFFER_BLOCKS: usize = 32;

#[derive(Default)]
struct StreamState {
    closed: AtomicFlag,
    exhausted: AtomicFlag,
    failed: AtomicFlag,
    underruns: AtomicCount,
}

struct ReaderState {
    reader: WavReader<BufReader<File>>,
    producer: HeapProd<f32>,
    scratch: Vec<f32>,
    channels: usize,
    looping: bool,
}

struct ReaderJob {
    path: PathBuf,
    state: Mutex<ReaderState>,
    shared: Arc<StreamState>,
}

impl ReaderJob {
    /// Tops up the ring buffer. Returns `false` once nothing more will be read.
    fn fill(&self) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut rewound = false;

        loop {
            let vacant = state.producer.vacant_len();
            let wanted = (vacant / state.channels * state.channels).min(state.scratch.len());
            if wanted == 0 {
                return true;
            }

            let read = match read_interleaved(&mut state.reader, &mut state.scratch[..wanted]) {
                Ok(read) => read,
                Err(e) => {
                    error!(path = %self.path.display(), "read failed: {}", e);
                    self.shared.failed.set(true);
                    self.shared.exhausted.set(true);
                    return false;
                }
            };
            // Whole frames only, so the consumer never sees a split frame.
            let read = read / state.channels * state.channels;
            state.producer.push_slice(&state.scratch[..read]);
            if read > 0 {
                rewound = false;
            }
            if read == wanted {
                continue;
            }

            if state.looping && !rewound {
                if let Err(e) = state.reader.seek(0) {
                    error!(path = %self.path.display(), "seek failed: {}", e);
                    self.shared.failed.set(true);
                    self.shared.exhausted.set(true);
                    return false;
                }
                rewound = true;
                continue;
            }

            debug!(path = %self.path.display(), "end of file");
            self.shared.exhausted.set(true);
            return false;
        }
    }
}

impl WorkerJob for ReaderJob {
    fn run(&self) -> bool {
        if self.shared.closed.get() {
            return false;
        }
        self.fill()
    }
}

/// Streams a WAV file from disk, one output per file channel.
///
/// Samples are played at the graph's rate; files at another rate play at the
/// wrong pitch. After the end of a non-looping file every output is silent.
pub struct FileReaderNode {
    outputs: Vec<OutputPin>,
    consumer: HeapCons<f32>,
    scratch: Vec<f32>,
    channels: usize,
    low_water: usize,
    shared: Arc<StreamState>,
    waker: WorkerWaker,
}

impl FileReaderNode {
    /// Opens `path`, fills the ring buffer and registers the reading job with
    /// `worker`.
    pub fn open(
        path: impl AsRef<Path>,
        format: AudioFormat,
        worker: &WorkerThread,
        looping: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = WavReader::open(&path)?;
        let spec = reader.spec();
        check_spec(&spec)?;

        if spec.sample_rate as f32 != format.sample_rate {
            warn!(
                path = %path.display(),
                file_rate = spec.sample_rate,
                graph_rate = format.sample_rate,
                "sample rate mismatch, playing without conversion"
            );
        }

        let channels = spec.channels as usize;
        let capacity = format.block_size * channels * BUFFER_BLOCKS;
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
        let shared = Arc::new(StreamState::default());

        let job = Arc::new(ReaderJob {
            path: path.clone(),
            state: Mutex::new(ReaderState {
                reader,
                producer,
                scratch: vec![0.0; capacity],
                channels,
                looping,
            }),
            shared: Arc::clone(&shared),
        });

        if job.fill() {
            worker.register(job);
        }
        if shared.failed.get() {
            warn!(path = %path.display(), "stream failed during prefill");
        }
        debug!(path = %path.display(), channels, looping, "file reader opened");

        Ok(Self {
            outputs: (0..channels)
                .map(|_| OutputPin::new(format.block_size))
                .collect(),
            consumer,
            scratch: vec![0.0; format.block_size * channels],
            channels,
            low_water: capacity / 2,
            shared,
            waker: worker.waker(),
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// `true` once the whole file has been read and played.
    pub fn is_finished(&self) -> bool {
        self.shared.exhausted.get() && self.consumer.is_empty()
    }

    pub fn has_failed(&self) -> bool {
        self.shared.failed.get()
    }

    /// Blocks that could not be filled because the worker fell behind.
    pub fn underrun_count(&self) -> usize {
        self.shared.underruns.get()
    }
}

impl Node for FileReaderNode {
    fn process(&mut self, _ctx: &mut ProcessContext<'_>) {
        let wanted = self.scratch.len();
        let read = self.consumer.pop_slice(&mut self.scratch);
        if read < wanted {
            self.scratch[read..].fill(0.0);
            if !self.shared.exhausted.get() {
                self.shared.underruns.add(1);
            }
        }

        let channels = self.channels;
        for (channel, pin) in self.outputs.iter_mut().enumerate() {
            let frames = self.scratch[channel..].iter().step_by(channels);
            for (out, &sample) in pin.buffer_mut().iter_mut().zip(frames) {
                *out = sample;
            }
        }

        if self.consumer.occupied_len() < self.low_water {
            self.waker.wake();
        }
    }

    fn output_count(&self) -> usize {
        self.outputs.len()
    }

    fn output(&self, index: usize) -> Option<&OutputPin> {
        self.outputs.get(index)
    }

    fn output_mut(&mut self, index: usize) -> Option<&mut OutputPin> {
        self.outputs.get_mut(index)
    }

    fn buffer_size_changed(&mut self, block_size: usize) {
        self.scratch.resize(block_size * self.channels, 0.0);
    }
}

impl Drop for FileReaderNode {
    fn drop(&mut self) {
        self.shared.closed.set(true);
        self.waker.wake();
    }
}
