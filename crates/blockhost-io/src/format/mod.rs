//! Audio file formats
//!
//! - `wav`: WAVE via hound (pure Rust), feature-gated
//! - `pcm`: headerless interleaved 16-bit PCM

#[cfg(feature = "wav")]
pub mod wav;

pub mod pcm;

/// Convert float sample to 16-bit integer with clipping
#[inline]
pub(crate) fn float_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * 32767.0) as i16
}

/// Convert float sample to 24-bit integer (stored as i32) with clipping
#[inline]
pub(crate) fn float_to_i24(sample: f32) -> i32 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * 8388607.0) as i32
}

/// Inverse of the integer conversions above for a given bit width.
#[inline]
pub(crate) fn int_to_float(sample: i32, bits: u16) -> f32 {
    let full_scale = ((1i64 << (bits.clamp(2, 32) - 1)) - 1) as f32;
    (sample as f32 / full_scale).clamp(-1.0, 1.0)
}
