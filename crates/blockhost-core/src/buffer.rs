//! Non-interleaved sample storage for one processing block.

/// `num_channels` separate channels of `block_size` frames each.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    block_size: usize,
}

impl SampleBuffer {
    pub fn new(num_channels: usize, block_size: usize) -> Self {
        Self {
            channels: vec![vec![0.0; block_size]; num_channels],
            block_size,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Copies `other` into `self`, channel by channel.
    ///
    /// Channels present only in `self` are cleared; channels present only in
    /// `other` are dropped.
    pub fn copy_from(&mut self, other: &SampleBuffer) {
        let frames = self.block_size.min(other.block_size);
        for (index, channel) in self.channels.iter_mut().enumerate() {
            match other.channels.get(index) {
                Some(source) => {
                    channel[..frames].copy_from_slice(&source[..frames]);
                    channel[frames..].fill(0.0);
                }
                None => channel.fill(0.0),
            }
        }
    }

    /// Grows the buffer to `num_channels` silent channels. Never shrinks.
    pub fn expand_channels(&mut self, num_channels: usize) {
        let block_size = self.block_size;
        if num_channels > self.channels.len() {
            self.channels.resize_with(num_channels, || vec![0.0; block_size]);
        }
    }

    /// Fills frames from an interleaved slice and zero-pads the rest.
    ///
    /// `channels` is the interleave width of `data`. Returns the number of
    /// whole frames copied.
    pub fn fill_from_interleaved(&mut self, data: &[f32], channels: usize) -> usize {
        if channels == 0 {
            self.clear();
            return 0;
        }
        let frames = (data.len() / channels).min(self.block_size);
        for (ch_index, channel) in self.channels.iter_mut().enumerate() {
            if ch_index < channels {
                for (frame, sample) in channel.iter_mut().take(frames).enumerate() {
                    *sample = data[frame * channels + ch_index];
                }
            } else {
                channel[..frames].fill(0.0);
            }
            channel[frames..].fill(0.0);
        }
        frames
    }

    /// Appends the first `frames` frames to `out`, interleaved over `channels` channels.
    ///
    /// Missing channels are written as silence.
    pub fn write_interleaved(&self, frames: usize, channels: usize, out: &mut Vec<f32>) {
        let frames = frames.min(self.block_size);
        out.reserve(frames * channels);
        for frame in 0..frames {
            for ch_index in 0..channels {
                let sample = self
                    .channels
                    .get(ch_index)
                    .map(|channel| channel[frame])
                    .unwrap_or(0.0);
                out.push(sample);
            }
        }
    }
}
