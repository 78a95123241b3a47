//! Audio settings for a run.
//!
//! [`Settings`] is filled in by the command line (or a library caller) and then
//! frozen into a [`FrozenSettings`] before any plugin is opened. Everything
//! downstream of the freeze only ever sees the read-only copy.

use crate::{Error, Result};
use crate::{DEFAULT_BLOCK_SIZE, DEFAULT_NUM_CHANNELS, DEFAULT_SAMPLE_RATE, DEFAULT_TEMPO};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Musical time signature, e.g. 3/4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (num, denom) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::InvalidTimeSignature(s.to_string()))?;

        let numerator: u32 = num
            .trim()
            .parse()
            .map_err(|_| Error::InvalidTimeSignature(s.to_string()))?;
        let denominator: u32 = denom
            .trim()
            .parse()
            .map_err(|_| Error::InvalidTimeSignature(s.to_string()))?;

        if numerator == 0 || denominator == 0 {
            return Err(Error::InvalidTimeSignature(s.to_string()));
        }

        Ok(Self {
            numerator,
            denominator,
        })
    }
}

/// Mutable audio configuration.
///
/// Every setter rejects a zero (or otherwise non-positive) value: the rejection
/// is logged, the previous value is kept and `false` is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    sample_rate: f64,
    num_channels: usize,
    block_size: usize,
    tempo: f64,
    time_signature: TimeSignature,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            num_channels: DEFAULT_NUM_CHANNELS,
            block_size: DEFAULT_BLOCK_SIZE,
            tempo: DEFAULT_TEMPO,
            time_signature: TimeSignature::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) -> bool {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            warn!("Can't set sample rate to {}", sample_rate);
            return false;
        }
        info!("Setting sample rate to {}Hz", sample_rate);
        self.sample_rate = sample_rate;
        true
    }

    pub fn set_num_channels(&mut self, num_channels: usize) -> bool {
        if num_channels == 0 {
            warn!("Can't set channel count to {}", num_channels);
            return false;
        }
        info!("Setting {} channels", num_channels);
        self.num_channels = num_channels;
        true
    }

    pub fn set_block_size(&mut self, block_size: usize) -> bool {
        if block_size == 0 {
            warn!("Can't set invalid block size {}", block_size);
            return false;
        }
        info!("Setting block size to {}", block_size);
        self.block_size = block_size;
        true
    }

    pub fn set_tempo(&mut self, tempo: f64) -> bool {
        if !tempo.is_finite() || tempo <= 0.0 {
            warn!("Can't set tempo to {}", tempo);
            return false;
        }
        info!("Setting tempo to {} BPM", tempo);
        self.tempo = tempo;
        true
    }

    /// Unusual values outside 2..=12 are applied with an advisory.
    pub fn set_time_signature_numerator(&mut self, numerator: u32) -> bool {
        if numerator == 0 {
            warn!(
                "Ignoring attempt to set time signature numerator to {}",
                numerator
            );
            return false;
        }
        if !(2..=12).contains(&numerator) {
            warn!(
                "Unusual time signature numerator {}, applying anyway",
                numerator
            );
        }
        self.time_signature.numerator = numerator;
        true
    }

    /// Denominators other than 2, 4, 8 or 16 are applied with an advisory.
    pub fn set_time_signature_denominator(&mut self, denominator: u32) -> bool {
        if denominator == 0 {
            warn!(
                "Ignoring attempt to set time signature denominator to {}",
                denominator
            );
            return false;
        }
        if !matches!(denominator, 2 | 4 | 8 | 16) {
            warn!(
                "Unusual time signature denominator {}, applying anyway",
                denominator
            );
        }
        self.time_signature.denominator = denominator;
        true
    }

    pub fn set_time_signature(&mut self, signature: TimeSignature) -> bool {
        // Validate both halves before touching either.
        if signature.numerator == 0 || signature.denominator == 0 {
            warn!("Ignoring invalid time signature {}", signature);
            return false;
        }
        self.set_time_signature_numerator(signature.numerator)
            && self.set_time_signature_denominator(signature.denominator)
    }

    /// Parses `"N/D"` and applies it. Malformed strings are rejected like zero values.
    pub fn set_time_signature_from_str(&mut self, signature: &str) -> bool {
        match signature.parse::<TimeSignature>() {
            Ok(sig) => self.set_time_signature(sig),
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Ends the configuration phase.
    pub fn freeze(self) -> FrozenSettings {
        info!(
            "Settings frozen: {}Hz, {} channels, block size {}, {} BPM, {}",
            self.sample_rate, self.num_channels, self.block_size, self.tempo, self.time_signature
        );
        FrozenSettings {
            sample_rate: self.sample_rate,
            num_channels: self.num_channels,
            block_size: self.block_size,
            tempo: self.tempo,
            time_signature: self.time_signature,
        }
    }
}

/// Read-only settings shared by the chain, the host callback and the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrozenSettings {
    sample_rate: f64,
    num_channels: usize,
    block_size: usize,
    tempo: f64,
    time_signature: TimeSignature,
}

impl Default for FrozenSettings {
    fn default() -> Self {
        Settings::default().freeze()
    }
}

impl FrozenSettings {
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn samples_per_beat(&self) -> f64 {
        self.sample_rate * 60.0 / self.tempo
    }

    pub fn frames_to_ms(&self, frames: u64) -> f64 {
        frames as f64 * 1000.0 / self.sample_rate
    }

    /// Rounds up so that a requested duration is never cut short.
    pub fn ms_to_frames(&self, ms: f64) -> u64 {
        if ms <= 0.0 {
            return 0;
        }
        (ms * self.sample_rate / 1000.0).ceil() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.sample_rate(), 44100.0);
        assert_eq!(settings.num_channels(), 2);
        assert_eq!(settings.block_size(), 512);
        assert_eq!(settings.tempo(), 120.0);
        assert_eq!(settings.time_signature(), TimeSignature::default());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut settings = Settings::default();
        assert!(!settings.set_sample_rate(0.0));
        assert!(!settings.set_num_channels(0));
        assert!(!settings.set_block_size(0));
        assert!(!settings.set_tempo(0.0));
        assert!(!settings.set_time_signature_numerator(0));
        assert!(!settings.set_time_signature_denominator(0));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unusual_time_signature_still_applied() {
        let mut settings = Settings::default();
        assert!(settings.set_time_signature_numerator(13));
        assert!(settings.set_time_signature_denominator(7));
        assert_eq!(settings.time_signature().to_string(), "13/7");
    }

    #[test]
    fn test_time_signature_from_str() {
        let mut settings = Settings::default();
        assert!(settings.set_time_signature_from_str("3/4"));
        assert_eq!(settings.time_signature().numerator, 3);
        assert_eq!(settings.time_signature().denominator, 4);

        assert!(!settings.set_time_signature_from_str("3-4"));
        assert!(!settings.set_time_signature_from_str("0/4"));
        assert!(!settings.set_time_signature_from_str("6/"));
        assert_eq!(settings.time_signature().to_string(), "3/4");
    }

    #[test]
    fn test_frozen_conversions() {
        let frozen = Settings::default().freeze();
        assert_relative_eq!(frozen.frames_to_ms(4410), 100.0);
        assert_eq!(frozen.ms_to_frames(100.0), 4410);
        assert_eq!(frozen.ms_to_frames(0.0), 0);
        assert_relative_eq!(frozen.samples_per_beat(), 22050.0);
    }

    proptest! {
        #[test]
        fn prop_sample_rate_round_trip(rate in 1.0f64..384_000.0) {
            let mut settings = Settings::default();
            prop_assert!(settings.set_sample_rate(rate));
            prop_assert_eq!(settings.sample_rate(), rate);
        }

        #[test]
        fn prop_integer_setters_round_trip(
            channels in 1usize..64,
            block_size in 1usize..16384,
            num in 1u32..32,
            denom in 1u32..32,
        ) {
            let mut settings = Settings::default();
            prop_assert!(settings.set_num_channels(channels));
            prop_assert!(settings.set_block_size(block_size));
            prop_assert!(settings.set_time_signature_numerator(num));
            prop_assert!(settings.set_time_signature_denominator(denom));
            prop_assert_eq!(settings.num_channels(), channels);
            prop_assert_eq!(settings.block_size(), block_size);
            prop_assert_eq!(settings.time_signature().numerator, num);
            prop_assert_eq!(settings.time_signature().denominator, denom);
        }

        #[test]
        fn prop_zero_keeps_previous(tempo in 1.0f64..999.0, block_size in 1usize..8192) {
            let mut settings = Settings::default();
            settings.set_tempo(tempo);
            settings.set_block_size(block_size);
            prop_assert!(!settings.set_tempo(0.0));
            prop_assert!(!settings.set_block_size(0));
            prop_assert_eq!(settings.tempo(), tempo);
            prop_assert_eq!(settings.block_size(), block_size);
        }
    }
}
