//! Audio sources and sinks for blockhost.
//!
//! Everything the render loop reads from or writes to implements
//! [`SampleSource`] or [`SampleSink`]. Concrete formats:
//!
//! - WAVE via `hound` (feature `wav`, on by default)
//! - raw interleaved 16-bit PCM in either byte order, including stdin/stdout
//! - an endless [`SilenceSource`]
//! - in-memory [`MemorySource`] / [`MemorySink`]
//!
//! [`open_source`] and [`open_sink`] pick a format from the path's extension.

pub mod error;
pub use error::{Error, Result};

mod options;
pub use options::{AudioFormat, BitDepth, Endianness, PcmOptions};

mod traits;
pub use traits::{SampleSink, SampleSource};

pub mod format;
pub use format::pcm::{PcmSink, PcmSource};
#[cfg(feature = "wav")]
pub use format::wav::{WavSink, WavSource};

mod memory;
pub use memory::{MemorySink, MemorySource};

mod silence;
pub use silence::SilenceSource;

mod open;
pub use open::{input_format, open_sink, open_source, InputFormat};
