//! Test helpers and fixtures for blockhost integration tests

#![allow(dead_code)]

pub mod tolerances;

use blockhost::prelude::*;

/// Default test sample rate
pub const TEST_SAMPLE_RATE: f64 = 44100.0;

/// Standard block size for deterministic testing
pub const TEST_BLOCK_SIZE: usize = 512;

/// Stereo, 44.1 kHz, 512-frame blocks, still open to changes.
pub fn base_settings() -> Settings {
    let mut settings = Settings::default();
    settings.set_sample_rate(TEST_SAMPLE_RATE);
    settings.set_block_size(TEST_BLOCK_SIZE);
    settings
}

pub fn test_settings() -> FrozenSettings {
    base_settings().freeze()
}

/// Orchestrator over an unopened chain built from `chain`.
pub fn test_orchestrator(chain: &str) -> Orchestrator {
    let settings = test_settings();
    let chain = PluginChain::from_chain_string(chain, None, HostContext::new(settings))
        .expect("Failed to build test chain");
    Orchestrator::new(settings, chain)
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (0.5 * (2.0 * std::f64::consts::PI * frequency * t).sin()) as f32
        })
        .collect()
}

/// Interleaves one mono signal into `channels` identical channels.
pub fn interleave(mono: &[f32], channels: usize) -> Vec<f32> {
    mono.iter()
        .flat_map(|s| std::iter::repeat(*s).take(channels))
        .collect()
}

/// In-memory stereo source holding `frames` frames of a 440 Hz sine.
pub fn sine_source(frames: usize) -> (MemorySource, Vec<f32>) {
    let samples = interleave(&generate_sine(440.0, TEST_SAMPLE_RATE, frames), 2);
    (MemorySource::new(samples.clone(), 2), samples)
}

pub fn stereo_sink() -> MemorySink {
    MemorySink::new(2)
}

/// True when every sample is below the silence threshold.
pub fn is_silent(samples: &[f32]) -> bool {
    samples.iter().all(|s| s.abs() < tolerances::SILENCE_THRESHOLD)
}

/// Writes a 16-bit WAVE file from interleaved samples.
pub fn write_wave(path: &std::path::Path, samples: &[f32], channels: u16, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create test WAVE");
    for sample in samples {
        writer
            .write_sample((sample * 32767.0).round() as i16)
            .expect("Failed to write test WAVE");
    }
    writer.finalize().expect("Failed to finalize test WAVE");
}
