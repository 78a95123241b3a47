//! Integration tests for blockhost-midi.
//!
//! A MIDI file on disk is read into a timeline and consumed block by block.

use blockhost_core::Settings;
use blockhost_midi::{MidiEvent, MidiEventKind, MidiFileSource, MidiSource, MidiTimeline};

/// Format 0, 480 ticks per quarter, a note every eighth note for two bars.
fn eighth_notes_file() -> Vec<u8> {
    let mut track = Vec::new();
    for i in 0..16u8 {
        // delta 0: note on; delta 240 (0x81 0x70): note off
        track.extend_from_slice(&[0x00, 0x90, 48 + i, 90]);
        track.extend_from_slice(&[0x81, 0x70, 0x80, 48 + i, 0]);
    }
    track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut data = Vec::new();
    data.extend_from_slice(b"MThd");
    data.extend_from_slice(&[0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0]);
    data.extend_from_slice(b"MTrk");
    data.extend_from_slice(&(track.len() as u32).to_be_bytes());
    data.extend_from_slice(&track);
    data
}

#[test]
fn test_file_partitions_into_blocks_without_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eighths.mid");
    std::fs::write(&path, eighth_notes_file()).unwrap();

    let mut settings = Settings::default();
    settings.set_block_size(256);
    let settings = settings.freeze();

    let mut source = MidiFileSource::new(&path, settings);
    source.open().unwrap();
    let mut timeline = MidiTimeline::new();
    source.read_all_events(&mut timeline).unwrap();

    // 16 note ons, 16 note offs, end of track.
    assert_eq!(timeline.len(), 33);
    // 120 BPM at 44.1 kHz: an eighth note is 11025 samples.
    assert_eq!(timeline.events()[1].timestamp, 11025);
    assert_eq!(timeline.last_timestamp(), Some(16 * 11025));

    let mut seen: Vec<MidiEvent> = Vec::new();
    let mut start = 0u64;
    loop {
        let mut block = Vec::new();
        let more = timeline.extract_range(start, settings.block_size(), &mut block);
        for event in &block {
            assert!(event.timestamp >= start);
            assert_eq!(event.timestamp - start, event.delta_frames as u64);
        }
        seen.extend(block);
        if !more {
            break;
        }
        start += settings.block_size() as u64;
    }

    assert_eq!(seen.len(), 33);
    assert_eq!(timeline.num_processed(), 33);
    assert_eq!(seen.last().map(|e| e.kind()), Some(MidiEventKind::Meta));
    let note_offs = seen.iter().filter(|e| e.is_note_off()).count();
    assert_eq!(note_offs, 16);
}
