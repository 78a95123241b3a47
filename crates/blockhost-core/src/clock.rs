//! Sample-accurate run clock.

/// Sample position and transport flags for the current run.
///
/// `advance` and `stop` are the only mutators.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    current_sample: u64,
    is_playing: bool,
    transport_changed: bool,
}

/// Copy of the clock state handed to plugins through the host callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportSnapshot {
    pub current_sample: u64,
    pub is_playing: bool,
    pub transport_changed: bool,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `frames`.
    ///
    /// The first call from sample zero marks the start of playback.
    pub fn advance(&mut self, frames: usize) {
        if self.current_sample == 0 {
            self.transport_changed = true;
            self.is_playing = true;
        } else {
            self.transport_changed = false;
        }
        self.current_sample += frames as u64;
    }

    pub fn stop(&mut self) {
        self.is_playing = false;
        self.transport_changed = true;
    }

    pub fn current_sample(&self) -> u64 {
        self.current_sample
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn transport_changed(&self) -> bool {
        self.transport_changed
    }

    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            current_sample: self.current_sample,
            is_playing: self.is_playing,
            transport_changed: self.transport_changed,
        }
    }
}
