//! Format dispatch from a path.

use crate::format::pcm::{PcmSink, PcmSource};
use crate::options::{AudioFormat, BitDepth, PcmOptions};
use crate::traits::{SampleSink, SampleSource};
use crate::{Error, Result};

/// Picks an input by extension. `-` reads raw PCM from stdin.
///
/// The source is returned unopened; call [`SampleSource::open`] before reading.
pub fn open_source(path: &str, pcm: &PcmOptions) -> Result<Box<dyn SampleSource>> {
    let source: Box<dyn SampleSource> = match AudioFormat::guess(path)? {
        AudioFormat::Wave => wave_source(path)?,
        AudioFormat::Pcm => Box::new(PcmSource::file(path, *pcm)),
        AudioFormat::Stdio => Box::new(PcmSource::stdin(*pcm)),
    };
    Ok(source)
}

/// Sample rate and channel count an input declares about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Reads the format from an input's header, for formats that have one.
///
/// Raw PCM and stdin carry no header and give `None`; the run's settings
/// describe them instead.
pub fn input_format(path: &str) -> Result<Option<InputFormat>> {
    match AudioFormat::guess(path)? {
        AudioFormat::Wave => wave_format(path).map(Some),
        AudioFormat::Pcm | AudioFormat::Stdio => Ok(None),
    }
}

/// Picks an output by extension. `-` writes raw PCM to stdout.
///
/// Raw PCM is always 16-bit; `bit_depth` only applies to WAVE. Nothing is
/// created on disk until the sink is opened.
pub fn open_sink(path: &str, bit_depth: BitDepth, pcm: &PcmOptions) -> Result<Box<dyn SampleSink>> {
    let sink: Box<dyn SampleSink> = match AudioFormat::guess(path)? {
        AudioFormat::Wave => wave_sink(path, bit_depth, pcm)?,
        AudioFormat::Pcm | AudioFormat::Stdio => {
            if bit_depth != BitDepth::Int16 {
                log::warn!(
                    "Raw PCM output is 16-bit only, ignoring {}-bit request",
                    bit_depth.bits()
                );
            }
            if path == "-" {
                Box::new(PcmSink::stdout(*pcm))
            } else {
                Box::new(PcmSink::file(path, *pcm))
            }
        }
    };
    Ok(sink)
}

#[cfg(feature = "wav")]
fn wave_source(path: &str) -> Result<Box<dyn SampleSource>> {
    Ok(Box::new(crate::format::wav::WavSource::new(path)))
}

#[cfg(not(feature = "wav"))]
fn wave_source(path: &str) -> Result<Box<dyn SampleSource>> {
    Err(Error::UnsupportedFormat(format!(
        "WAVE support not enabled ({})",
        path
    )))
}

#[cfg(feature = "wav")]
fn wave_format(path: &str) -> Result<InputFormat> {
    let spec = hound::WavReader::open(path)?.spec();
    Ok(InputFormat {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

#[cfg(not(feature = "wav"))]
fn wave_format(path: &str) -> Result<InputFormat> {
    Err(Error::UnsupportedFormat(format!(
        "WAVE support not enabled ({})",
        path
    )))
}

#[cfg(feature = "wav")]
fn wave_sink(path: &str, bit_depth: BitDepth, pcm: &PcmOptions) -> Result<Box<dyn SampleSink>> {
    let channels = u16::try_from(pcm.channels)
        .map_err(|_| Error::InvalidOptions(format!("{} channels", pcm.channels)))?;
    Ok(Box::new(crate::format::wav::WavSink::new(
        path,
        crate::format::wav::WavConfig {
            sample_rate: pcm.sample_rate,
            bit_depth,
            channels,
        },
    )))
}

#[cfg(not(feature = "wav"))]
fn wave_sink(path: &str, _bit_depth: BitDepth, _pcm: &PcmOptions) -> Result<Box<dyn SampleSink>> {
    Err(Error::UnsupportedFormat(format!(
        "WAVE support not enabled ({})",
        path
    )))
}
