//! End-to-end runs through the orchestrator with built-in plugins.

mod helpers;

use blockhost::prelude::*;
use blockhost::{RunOutcome, RunState};
use helpers::tolerances::{FLOAT_EPSILON, INT16_EPSILON};
use helpers::*;

#[test]
fn test_passthrough_is_sample_exact() {
    let mut orchestrator = test_orchestrator("mrs_passthru");
    let (mut source, input) = sine_source(1024);
    let mut sink = stereo_sink();

    let report = orchestrator.run(&mut source, &mut sink, None, &[]).unwrap();

    assert_eq!(report.frames_read, 1024);
    assert_eq!(report.frames_written, 1024);
    assert_eq!(source.frames_processed() * 2, 2048);
    assert_eq!(sink.frames_processed() * 2, 2048);
    assert_eq!(report.samples_processed, 2048);
    assert_eq!(report.tail_frames, 0);
    assert_eq!(sink.samples().len(), input.len());
    for (out, expected) in sink.samples().iter().zip(&input) {
        approx::assert_relative_eq!(*out, *expected, epsilon = FLOAT_EPSILON);
    }
}

#[test]
fn test_tail_spliced_into_final_block_then_drained() {
    let mut orchestrator = test_orchestrator("mrs_passthru").with_tail_time_ms(100);
    let (mut source, input) = sine_source(500);
    let mut sink = stereo_sink();

    let report = orchestrator.run(&mut source, &mut sink, None, &[]).unwrap();

    assert_eq!(report.tail_frames, 4410);
    assert_eq!(report.frames_read, 500);
    assert_eq!(report.frames_written, 500 + 4410);

    let final_sample = orchestrator.clock().current_sample();
    assert!(final_sample >= 4910);
    assert!(final_sample < 4910 + TEST_BLOCK_SIZE as u64);
    assert_eq!(final_sample % TEST_BLOCK_SIZE as u64, 0);

    let samples = sink.samples();
    assert_eq!(&samples[..1000], &input[..]);
    assert!(is_silent(&samples[1000..]));
}

#[test]
fn test_max_time_truncates_output() {
    let mut orchestrator = test_orchestrator("mrs_passthru").with_max_time_ms(Some(10));
    let mut source = SilenceSource::new();
    let mut sink = stereo_sink();

    let report = orchestrator.run(&mut source, &mut sink, None, &[]).unwrap();

    assert_eq!(report.frames_written, 441);
    assert_eq!(sink.samples().len(), 441 * 2);
}

#[test]
fn test_instrument_without_midi_is_missing_option() {
    let mut orchestrator = test_orchestrator("mrs_silence;mrs_limiter");
    let (mut source, _) = sine_source(1024);
    let mut sink = stereo_sink();

    let err = orchestrator
        .run(&mut source, &mut sink, None, &[])
        .unwrap_err();

    assert!(matches!(err, Error::MissingRequiredOption(_)));
    assert_eq!(err.return_code(), ReturnCode::MissingRequiredOption);
    assert_eq!(orchestrator.state(), RunState::Stopped);
    assert!(sink.samples().is_empty());
    assert!(!orchestrator.chain().handles().any(|h| h.is_open()));
}

#[test]
fn test_instrument_after_effect_is_invalid_chain() {
    let mut orchestrator = test_orchestrator("mrs_passthru;mrs_silence");
    let (mut source, _) = sine_source(1024);
    let mut sink = stereo_sink();

    let err = orchestrator
        .run(&mut source, &mut sink, None, &[])
        .unwrap_err();

    assert_eq!(err.return_code(), ReturnCode::InvalidPluginChain);
}

#[test]
fn test_chain_runs_in_series() {
    let mut orchestrator = test_orchestrator("mrs_gain;mrs_limiter");
    let mut source = MemorySource::new(vec![0.6, -0.6].repeat(256), 2);
    let mut sink = stereo_sink();
    let parameters = [ParameterSetting {
        index: 0,
        value: 2.0,
    }];

    orchestrator
        .run(&mut source, &mut sink, None, &parameters)
        .unwrap();

    let samples = sink.samples();
    assert_eq!(samples.len(), 512);
    assert!(samples.chunks(2).all(|frame| frame == [1.0, -1.0]));
}

/// Format 0, 96 ticks per quarter: note on at tick 0, note off at tick 96.
fn one_note_midi_file() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"MThd");
    data.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0, 96]);
    data.extend_from_slice(b"MTrk");
    data.extend_from_slice(&[0, 0, 0, 12]);
    data.extend_from_slice(&[0x00, 0x90, 60, 100]);
    data.extend_from_slice(&[0x60, 0x80, 60, 0]);
    data.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
    data
}

#[test]
fn test_midi_file_drives_instrument_run() {
    let settings = test_settings();
    let mut orchestrator = test_orchestrator("mrs_silence");
    let mut source = SilenceSource::new();
    let mut sink = stereo_sink();
    let mut midi = MidiFileSource::from_bytes("one-note.mid", one_note_midi_file(), settings);

    let report = orchestrator
        .run(&mut source, &mut sink, Some(&mut midi), &[])
        .unwrap();

    // 120 BPM: the note off lands on sample 22050, inside the block at 22016.
    assert_eq!(report.frames_written, 22016 + 512);
    assert!(is_silent(sink.samples()));
}

#[test]
fn test_wave_file_round_trip_through_gain() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");

    let input = interleave(&generate_sine(220.0, TEST_SAMPLE_RATE, 3000), 2);
    write_wave(&input_path, &input, 2, 44100);

    let config = RunConfig {
        input: Some(input_path.to_str().unwrap().to_string()),
        output: output_path.to_str().unwrap().to_string(),
        parameters: vec!["0,0.5".parse().unwrap()],
        ..RunConfig::new("mrs_gain")
    };
    let outcome = blockhost::run(&config, base_settings()).unwrap();
    let RunOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(report.frames_written, 3000);

    let mut reader = hound::WavReader::open(&output_path).unwrap();
    assert_eq!(reader.spec().channels, 2);
    let output: Vec<f32> = reader
        .samples::<i16>()
        .map(|s| s.unwrap() as f32 / 32768.0)
        .collect();
    assert_eq!(output.len(), input.len());
    for (out, original) in output.iter().zip(&input) {
        assert!((out - original * 0.5).abs() <= 3.0 * INT16_EPSILON);
    }
}

#[test]
fn test_wave_input_header_sets_rate_and_channels() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("mono48k.wav");
    let output_path = dir.path().join("out.wav");
    let input = generate_sine(440.0, 48000.0, 4800);
    write_wave(&input_path, &input, 1, 48000);

    let config = RunConfig {
        input: Some(input_path.to_str().unwrap().to_string()),
        output: output_path.to_str().unwrap().to_string(),
        ..RunConfig::new("mrs_passthru")
    };
    let RunOutcome::Completed(report) = blockhost::run(&config, base_settings()).unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(report.frames_read, 4800);
    assert_eq!(report.frames_written, 4800);
    assert_eq!(report.samples_processed, 4800);

    let mut reader = hound::WavReader::open(&output_path).unwrap();
    assert_eq!(reader.spec().sample_rate, 48000);
    assert_eq!(reader.spec().channels, 1);
    let output: Vec<f32> = reader
        .samples::<i16>()
        .map(|s| s.unwrap() as f32 / 32768.0)
        .collect();
    assert_eq!(output.len(), input.len());
    for (out, original) in output.iter().zip(&input) {
        assert!((out - original).abs() <= 3.0 * INT16_EPSILON);
    }
}
