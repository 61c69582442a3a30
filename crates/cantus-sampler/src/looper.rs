//! Sustained looping of a region of a [`SampleBuffer`].

use crate::{Error, Result, SampleBuffer};
use cantus_core::{pins, AudioFormat, Node, OutputPin, ProcessContext, SafePtr};
use tracing::warn;

/// Where a [`BufferLooperNode`] starts, which frames it repeats and how long
/// each pass overlaps the next. All values are in buffer frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRegion {
    pub start: f64,
    pub loop_start: f64,
    pub loop_end: f64,
    pub crossfade: f64,
}

impl LoopRegion {
    pub fn new(start: f64, loop_start: f64, loop_end: f64, crossfade: f64) -> Self {
        Self {
            start,
            loop_start,
            loop_end,
            crossfade,
        }
    }

    /// Builds a region from millisecond positions at the buffer's rate.
    pub fn from_millis(
        start: f64,
        loop_start: f64,
        loop_end: f64,
        crossfade: f64,
        sample_rate: f32,
    ) -> Self {
        let per_ms = sample_rate as f64 / 1000.0;
        Self::new(start * per_ms, loop_start * per_ms, loop_end * per_ms, crossfade * per_ms)
    }

    /// Checks the region against a buffer of `frames` frames.
    ///
    /// The first pass must fit one crossfade before `loop_end`, and each
    /// repeat must fit a fade in and a fade out.
    pub fn validate(&self, frames: usize) -> Result<()> {
        let frames = frames as f64;
        let values = [self.start, self.loop_start, self.loop_end, self.crossfade];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::InvalidLoop(format!("negative or non-finite value in {:?}", self)));
        }
        if self.start >= frames {
            return Err(Error::InvalidLoop(format!("start {} past end of buffer", self.start)));
        }
        if self.loop_end > frames || self.loop_end <= self.loop_start {
            return Err(Error::InvalidLoop(format!(
                "loop {}..{} does not fit {} frames",
                self.loop_start, self.loop_end, frames
            )));
        }
        if self.loop_end - self.start < self.crossfade {
            return Err(Error::InvalidLoop(
                "start too close to loop end for the crossfade".into(),
            ));
        }
        if self.loop_end - self.loop_start < self.crossfade * 2.0 {
            return Err(Error::InvalidLoop("crossfade longer than half the loop".into()));
        }
        Ok(())
    }

    fn fade_start(&self) -> f64 {
        self.loop_end - self.crossfade
    }
}

/// Plays `start..loop_end` of one buffer channel, then repeats
/// `loop_start..loop_end` until stopped.
///
/// Two read heads overlap for `crossfade` frames at each seam: the outgoing
/// head fades out past `loop_end - crossfade` while the incoming one fades in
/// from `loop_start`. The fades are linear and sum to unity.
pub struct BufferLooperNode {
    pub output: OutputPin,
    buffer: SafePtr<SampleBuffer>,
    channel: usize,
    region: LoopRegion,
    head: f64,
    tail: Option<f64>,
    speed: f64,
    playing: bool,
    passes: u64,
}

impl BufferLooperNode {
    /// Fails if the region does not fit the buffer or the buffer is already
    /// released.
    pub fn new(
        format: AudioFormat,
        buffer: SafePtr<SampleBuffer>,
        channel: usize,
        region: LoopRegion,
    ) -> Result<Self> {
        let Some(shared) = buffer.get() else {
            return Err(Error::InvalidBuffer("buffer already released".into()));
        };
        if channel >= shared.channel_count() {
            return Err(Error::InvalidBuffer(format!(
                "channel {} out of range for {} channels",
                channel,
                shared.channel_count()
            )));
        }
        region.validate(shared.frame_count())?;

        Ok(Self {
            output: OutputPin::new(format.block_size),
            buffer,
            channel,
            region,
            head: region.start,
            tail: None,
            speed: 1.0,
            playing: false,
            passes: 0,
        })
    }

    /// Starts from `region.start`. `speed` must be positive.
    pub fn play(&mut self, speed: f64) {
        if !(speed.is_finite() && speed > 0.0) {
            warn!(speed, "looper speed must be positive, ignoring play");
            return;
        }
        self.speed = speed;
        self.head = self.region.start;
        self.tail = None;
        self.passes = 0;
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.tail = None;
    }

    pub fn region(&self) -> LoopRegion {
        self.region
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Number of times playback has jumped back to `loop_start`.
    pub fn loop_count(&self) -> u64 {
        self.passes
    }
}

fn read(samples: &[f32], position: f64) -> f32 {
    let index = position as usize;
    let frac = (position - index as f64) as f32;
    let a = samples.get(index).copied().unwrap_or(0.0);
    let b = samples.get(index + 1).copied().unwrap_or(0.0);
    a + (b - a) * frac
}

impl Node for BufferLooperNode {
    fn process(&mut self, _ctx: &mut ProcessContext<'_>) {
        let output = self.output.buffer_mut();
        if !self.playing {
            output.fill(0.0);
            return;
        }
        let Some(buffer) = self.buffer.get() else {
            output.fill(0.0);
            self.stop();
            return;
        };
        let Some(samples) = buffer.channel(self.channel) else {
            output.fill(0.0);
            self.stop();
            return;
        };

        let region = self.region;
        let fade_start = region.fade_start();
        let loop_length = region.loop_end - region.loop_start;
        for out in output.iter_mut() {
            if self.tail.is_none() && self.head >= fade_start {
                let overshoot = (self.head - fade_start) % loop_length;
                if region.crossfade > 0.0 {
                    self.tail = Some(self.head);
                }
                self.head = region.loop_start + overshoot;
                self.passes += 1;
            }

            *out = match self.tail {
                Some(tail) => {
                    let fade = ((tail - fade_start) / region.crossfade).clamp(0.0, 1.0) as f32;
                    read(samples, tail) * (1.0 - fade) + read(samples, self.head) * fade
                }
                None => read(samples, self.head),
            };

            self.head += self.speed;
            if let Some(tail) = self.tail.as_mut() {
                *tail += self.speed;
                if *tail >= region.loop_end {
                    self.tail = None;
                }
            }
        }
    }

    pins!(inputs: [], outputs: [output]);
}
