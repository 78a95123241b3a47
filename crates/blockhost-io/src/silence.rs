use crate::traits::SampleSource;
use crate::Result;
use blockhost_core::SampleBuffer;

/// Endless source of silence, used when no input file is given.
#[derive(Debug, Default)]
pub struct SilenceSource {
    frames_read: u64,
}

impl SilenceSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SampleSource for SilenceSource {
    fn name(&self) -> &str {
        "silence"
    }

    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_block(&mut self, buffer: &mut SampleBuffer) -> Result<bool> {
        buffer.clear();
        self.frames_read += buffer.block_size() as u64;
        Ok(true)
    }

    fn frames_processed(&self) -> u64 {
        self.frames_read
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
