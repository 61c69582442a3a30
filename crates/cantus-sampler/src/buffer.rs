//! In-memory multichannel sample buffers.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Read;
use std::path::Path;

/// Deinterleaved audio held in memory.
///
/// Shared with the audio thread through a
/// [`SafeOwner`](cantus_core::SafeOwner) so it is never freed mid-callback.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: f32,
}

impl SampleBuffer {
    /// All channels must have the same length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: f32) -> Result<Self> {
        if let Some(first) = channels.first() {
            if channels.iter().any(|channel| channel.len() != first.len()) {
                return Err(Error::InvalidBuffer(
                    "channels have different lengths".into(),
                ));
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    pub fn silent(channel_count: usize, frame_count: usize, sample_rate: f32) -> Self {
        Self {
            channels: vec![vec![0.0; frame_count]; channel_count],
            sample_rate,
        }
    }

    /// Loads a whole WAV file (integer or 32-bit float samples).
    pub fn load_wav(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();
        check_spec(&spec)?;

        let channel_count = spec.channels as usize;
        let mut interleaved = vec![0.0; reader.len() as usize];
        let read = read_interleaved(&mut reader, &mut interleaved)?;
        interleaved.truncate(read);

        let frame_count = read / channel_count;
        let mut channels = vec![Vec::with_capacity(frame_count); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        tracing::debug!(
            path = %path.display(),
            channels = channel_count,
            frames = frame_count,
            "sample buffer loaded"
        );
        Ok(Self {
            channels,
            sample_rate: spec.sample_rate as f32,
        })
    }

    /// Writes the buffer as a 32-bit float WAV file.
    pub fn save_wav(&self, path: impl AsRef<Path>) -> Result<()> {
        let spec = float_spec(self.channel_count(), self.sample_rate);
        let mut writer = WavWriter::create(path, spec)?;
        for frame in 0..self.frame_count() {
            for channel in &self.channels {
                writer.write_sample(channel[frame])?;
            }
        }
        writer.finalize()?;
        Ok(())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn duration_secs(&self) -> f32 {
        self.frame_count() as f32 / self.sample_rate
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        self.channels.get_mut(index).map(Vec::as_mut_slice)
    }
}

pub(crate) fn float_spec(channels: usize, sample_rate: f32) -> WavSpec {
    WavSpec {
        channels: channels as u16,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

pub(crate) fn check_spec(spec: &WavSpec) -> Result<()> {
    if spec.channels == 0 {
        return Err(Error::UnsupportedFormat("zero channels".into()));
    }
    match spec.sample_format {
        SampleFormat::Float if spec.bits_per_sample != 32 => Err(Error::UnsupportedFormat(
            format!("{}-bit float", spec.bits_per_sample),
        )),
        SampleFormat::Int if spec.bits_per_sample > 32 => Err(Error::UnsupportedFormat(
            format!("{}-bit integer", spec.bits_per_sample),
        )),
        _ => Ok(()),
    }
}

/// Reads interleaved samples into `out`, scaled to `[-1, 1]`. Returns how many
/// were read; fewer than `out.len()` means the end of the data was reached.
pub(crate) fn read_interleaved<R: Read>(
    reader: &mut WavReader<R>,
    out: &mut [f32],
) -> std::result::Result<usize, hound::Error> {
    let spec = reader.spec();
    let mut count = 0;
    match spec.sample_format {
        SampleFormat::Float => {
            for (dst, sample) in out.iter_mut().zip(reader.samples::<f32>()) {
                *dst = sample?;
                count += 1;
            }
        }
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            for (dst, sample) in out.iter_mut().zip(reader.samples::<i32>()) {
                *dst = sample? as f32 * scale;
                count += 1;
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mismatched_channels_rejected() {
        let result = SampleBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100.0);
        assert!(matches!(result, Err(Error::InvalidBuffer(_))));
    }

    #[test]
    fn test_float_wav_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buffer.wav");
        let buffer = SampleBuffer::new(
            vec![vec![0.0, 0.25, -0.5], vec![1.0, -1.0, 0.125]],
            48000.0,
        )
        .unwrap();

        buffer.save_wav(&path).unwrap();
        let loaded = SampleBuffer::load_wav(&path).unwrap();
        assert_eq!(loaded, buffer);
    }

    #[test]
    fn test_int_wav_is_scaled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for sample in [0i16, 16384, -32768] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let loaded = SampleBuffer::load_wav(&path).unwrap();
        assert_eq!(loaded.channel(0).unwrap(), &[0.0, 0.5, -1.0]);
        assert_eq!(loaded.sample_rate(), 44100.0);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(matches!(
            SampleBuffer::load_wav("/definitely/not/here.wav"),
            Err(Error::Hound(_))
        ));
    }
}
