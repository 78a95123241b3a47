use crate::traits::{SampleSink, SampleSource};
use crate::Result;
use blockhost_core::SampleBuffer;

/// Source backed by an interleaved sample vector.
#[derive(Debug, Clone)]
pub struct MemorySource {
    samples: Vec<f32>,
    channels: usize,
    position: usize,
    frames_read: u64,
}

impl MemorySource {
    pub fn new(samples: Vec<f32>, channels: usize) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            position: 0,
            frames_read: 0,
        }
    }

    /// `frames` frames of silence.
    pub fn silent(frames: usize, channels: usize) -> Self {
        Self::new(vec![0.0; frames * channels.max(1)], channels)
    }

    pub fn total_frames(&self) -> usize {
        self.samples.len() / self.channels
    }
}

impl SampleSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&mut self) -> Result<()> {
        self.position = 0;
        self.frames_read = 0;
        Ok(())
    }

    fn read_block(&mut self, buffer: &mut SampleBuffer) -> Result<bool> {
        let remaining = &self.samples[self.position.min(self.samples.len())..];
        let frames = buffer.fill_from_interleaved(remaining, self.channels);
        self.position += frames * self.channels;
        self.frames_read += frames as u64;
        Ok(frames == buffer.block_size())
    }

    fn frames_processed(&self) -> u64 {
        self.frames_read
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps everything written, interleaved.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    samples: Vec<f32>,
    channels: usize,
    frames_written: u64,
    closed: bool,
}

impl MemorySink {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            ..Default::default()
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl SampleSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&mut self) -> Result<()> {
        self.samples.clear();
        self.frames_written = 0;
        self.closed = false;
        Ok(())
    }

    fn write_block(&mut self, buffer: &SampleBuffer, frames: usize) -> Result<()> {
        let frames = frames.min(buffer.block_size());
        buffer.write_interleaved(frames, self.channels, &mut self.samples);
        self.frames_written += frames as u64;
        Ok(())
    }

    fn frames_processed(&self) -> u64 {
        self.frames_written
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
