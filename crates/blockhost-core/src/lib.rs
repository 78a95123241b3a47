//! Run context for the blockhost offline renderer.
//!
//! # Primary API
//!
//! - [`Settings`] / [`FrozenSettings`]: audio configuration, mutable until frozen
//! - [`Clock`]: sample position and transport flags
//! - [`TaskTimer`]: per-component elapsed time accounting
//! - [`SampleBuffer`]: non-interleaved block storage shared by every stage
//!
//! # Example
//!
//! ```ignore
//! use blockhost_core::{Clock, Settings};
//!
//! let mut settings = Settings::default();
//! settings.set_block_size(256);
//! let settings = settings.freeze();
//!
//! let mut clock = Clock::new();
//! clock.advance(settings.block_size());
//! ```

pub mod error;
pub use error::{Error, Result, ReturnCode};

mod settings;
pub use settings::{FrozenSettings, Settings, TimeSignature};

mod clock;
pub use clock::{Clock, TransportSnapshot};

mod timer;
pub use timer::TaskTimer;

mod buffer;
pub use buffer::SampleBuffer;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;
/// Default channel count.
pub const DEFAULT_NUM_CHANNELS: usize = 2;
/// Default block size in frames.
pub const DEFAULT_BLOCK_SIZE: usize = 512;
/// Default tempo in BPM.
pub const DEFAULT_TEMPO: f64 = 120.0;
