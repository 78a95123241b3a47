//! WAVE source and sink using hound
//!
//! Reads 16/24/32-bit integer and 32-bit float files; writes 16-bit, 24-bit
//! or 32-bit float.

use super::{float_to_i16, float_to_i24, int_to_float};
use crate::error::{Error, Result};
use crate::options::BitDepth;
use crate::traits::{SampleSink, SampleSource};
use blockhost_core::SampleBuffer;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// WAV encoder configuration
#[derive(Debug, Clone)]
pub struct WavConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bit depth
    pub bit_depth: BitDepth,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
}

impl Default for WavConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            bit_depth: BitDepth::Int16,
            channels: 2,
        }
    }
}

fn create_wav_spec(config: &WavConfig) -> WavSpec {
    let (bits_per_sample, sample_format) = match config.bit_depth {
        BitDepth::Int16 => (16, SampleFormat::Int),
        BitDepth::Int24 => (24, SampleFormat::Int),
        BitDepth::Float32 => (32, SampleFormat::Float),
    };

    WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample,
        sample_format,
    }
}

/// Reads a WAVE file block by block.
pub struct WavSource {
    name: String,
    path: PathBuf,
    reader: Option<WavReader<BufReader<File>>>,
    interleaved: Vec<f32>,
    frames_read: u64,
}

impl WavSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: path.display().to_string(),
            path,
            reader: None,
            interleaved: Vec::new(),
            frames_read: 0,
        }
    }

    /// Header of the opened file.
    pub fn spec(&self) -> Option<WavSpec> {
        self.reader.as_ref().map(|r| r.spec())
    }
}

impl SampleSource for WavSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        let reader = WavReader::open(&self.path)?;
        let spec = reader.spec();
        log::info!(
            "Opened WAVE input '{}': {} channels, {}Hz, {}-bit {:?}",
            self.name,
            spec.channels,
            spec.sample_rate,
            spec.bits_per_sample,
            spec.sample_format
        );
        self.reader = Some(reader);
        Ok(())
    }

    fn read_block(&mut self, buffer: &mut SampleBuffer) -> Result<bool> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::NotOpen(self.name.clone()))?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        let wanted = buffer.block_size() * channels;

        self.interleaved.clear();
        match spec.sample_format {
            SampleFormat::Float => {
                for sample in reader.samples::<f32>().take(wanted) {
                    self.interleaved.push(sample?);
                }
            }
            SampleFormat::Int => {
                let bits = spec.bits_per_sample;
                for sample in reader.samples::<i32>().take(wanted) {
                    self.interleaved.push(int_to_float(sample?, bits));
                }
            }
        }

        let frames = buffer.fill_from_interleaved(&self.interleaved, channels);
        self.frames_read += frames as u64;
        Ok(frames == buffer.block_size())
    }

    fn frames_processed(&self) -> u64 {
        self.frames_read
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }
}

/// Writes a WAVE file block by block. The header is finalized on `close`.
pub struct WavSink {
    name: String,
    path: PathBuf,
    config: WavConfig,
    writer: Option<WavWriter<BufWriter<File>>>,
    frames_written: u64,
}

impl WavSink {
    pub fn new(path: impl AsRef<Path>, config: WavConfig) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: path.display().to_string(),
            path,
            config,
            writer: None,
            frames_written: 0,
        }
    }
}

impl SampleSink for WavSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        let spec = create_wav_spec(&self.config);
        self.writer = Some(WavWriter::create(&self.path, spec)?);
        log::info!(
            "Opened WAVE output '{}': {} channels, {}Hz, {}-bit",
            self.name,
            self.config.channels,
            self.config.sample_rate,
            self.config.bit_depth.bits()
        );
        Ok(())
    }

    fn write_block(&mut self, buffer: &SampleBuffer, frames: usize) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::NotOpen(self.name.clone()))?;
        let channels = self.config.channels as usize;
        let frames = frames.min(buffer.block_size());

        for frame in 0..frames {
            for ch in 0..channels {
                let sample = if ch < buffer.num_channels() {
                    buffer.channel(ch)[frame]
                } else {
                    0.0
                };
                match self.config.bit_depth {
                    BitDepth::Int16 => writer.write_sample(float_to_i16(sample))?,
                    BitDepth::Int24 => writer.write_sample(float_to_i24(sample))?,
                    BitDepth::Float32 => writer.write_sample(sample)?,
                }
            }
        }

        self.frames_written += frames as u64;
        Ok(())
    }

    fn frames_processed(&self) -> u64 {
        self.frames_written
    }

    fn close(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn ramp_buffer(block_size: usize) -> SampleBuffer {
        let mut buffer = SampleBuffer::new(2, block_size);
        for i in 0..block_size {
            buffer.channel_mut(0)[i] = i as f32 / block_size as f32;
            buffer.channel_mut(1)[i] = -(i as f32) / block_size as f32;
        }
        buffer
    }

    #[test]
    fn test_write_then_read_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");

        let mut sink = WavSink::new(
            &path,
            WavConfig {
                bit_depth: BitDepth::Float32,
                ..Default::default()
            },
        );
        sink.open().unwrap();
        let block = ramp_buffer(64);
        sink.write_block(&block, 64).unwrap();
        sink.write_block(&block, 10).unwrap();
        assert_eq!(sink.frames_processed(), 74);
        sink.close().unwrap();

        let mut source = WavSource::new(&path);
        source.open().unwrap();
        assert_eq!(source.spec().unwrap().channels, 2);

        let mut buffer = SampleBuffer::new(2, 64);
        assert!(source.read_block(&mut buffer).unwrap());
        assert_eq!(buffer, block);

        assert!(!source.read_block(&mut buffer).unwrap());
        assert_eq!(source.frames_processed(), 74);
        assert_relative_eq!(buffer.channel(0)[9], block.channel(0)[9]);
        assert!(buffer.channel(0)[10..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_int16_round_trip_is_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("int16.wav");

        let mut sink = WavSink::new(&path, WavConfig::default());
        sink.open().unwrap();
        let block = ramp_buffer(32);
        sink.write_block(&block, 32).unwrap();
        sink.close().unwrap();

        let mut source = WavSource::new(&path);
        source.open().unwrap();
        let mut buffer = SampleBuffer::new(2, 32);
        assert!(source.read_block(&mut buffer).unwrap());
        for i in 0..32 {
            assert_relative_eq!(buffer.channel(1)[i], block.channel(1)[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let mut source = WavSource::new("/nonexistent/input.wav");
        assert!(matches!(source.open(), Err(Error::Io(_))));
    }

    #[test]
    fn test_read_before_open_fails() {
        let mut source = WavSource::new("/tmp/never-opened.wav");
        let mut buffer = SampleBuffer::new(2, 8);
        assert!(matches!(
            source.read_block(&mut buffer),
            Err(Error::NotOpen(_))
        ));
    }
}
