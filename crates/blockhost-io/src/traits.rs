use crate::Result;
use blockhost_core::SampleBuffer;

/// Block-wise audio input.
pub trait SampleSource {
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<()>;

    /// Fills `buffer` with the next block.
    ///
    /// A short read zero-pads the remainder of the buffer. Returns `false` once
    /// the input is exhausted (the block that came up short, or an empty read).
    fn read_block(&mut self, buffer: &mut SampleBuffer) -> Result<bool>;

    /// Frames delivered so far.
    fn frames_processed(&self) -> u64;

    fn close(&mut self) -> Result<()>;
}

/// Block-wise audio output.
pub trait SampleSink {
    fn name(&self) -> &str;

    fn open(&mut self) -> Result<()>;

    /// Writes the first `frames` frames of `buffer`.
    fn write_block(&mut self, buffer: &SampleBuffer, frames: usize) -> Result<()>;

    /// Frames written so far.
    fn frames_processed(&self) -> u64;

    /// Flushes and finalizes the output.
    fn close(&mut self) -> Result<()>;
}
