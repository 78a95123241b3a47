//! Standard MIDI File source
//!
//! Parses SMF data with the `midly` crate and converts tick positions into
//! absolute sample timestamps using the run's frozen tempo and sample rate.
//!
//! Tempo and time signature meta events are recorded in the timeline and
//! logged, but they do not change the run's settings.

use crate::error::{Error, Result};
use crate::{MidiEvent, MidiMessage, MidiSource, MidiTimeline};
use blockhost_core::FrozenSettings;
use midly::{Format, MetaMessage, MidiMessage as SmfMessage, Smf, Timing, TrackEventKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// MIDI source backed by a `.mid` file on disk (or an in-memory copy of one).
pub struct MidiFileSource {
    name: String,
    path: Option<PathBuf>,
    settings: FrozenSettings,
    data: Option<Vec<u8>>,
}

impl MidiFileSource {
    pub fn new(path: impl AsRef<Path>, settings: FrozenSettings) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: path.display().to_string(),
            path: Some(path),
            settings,
            data: None,
        }
    }

    /// Source over bytes already in memory. `open` is a no-op.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>, settings: FrozenSettings) -> Self {
        Self {
            name: name.into(),
            path: None,
            settings,
            data: Some(data),
        }
    }

    fn parse_into(&self, data: &[u8], timeline: &mut MidiTimeline) -> Result<()> {
        let smf = Smf::parse(data)?;

        let division = match smf.header.timing {
            Timing::Metrical(tpb) if tpb.as_int() == 0 => {
                warn!("MIDI file '{}' has a time division of 0", self.name);
                return Err(Error::MidiUnsupportedTiming);
            }
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(_, _) => {
                warn!("Unsupported feature: SMPTE-timed MIDI files");
                return Err(Error::MidiUnsupportedTiming);
            }
        };

        let single_track = matches!(smf.header.format, Format::SingleTrack) || smf.tracks.len() == 1;
        if !single_track {
            warn!(
                "Unsupported feature: multi-track MIDI ({} tracks in '{}')",
                smf.tracks.len(),
                self.name
            );
            return Err(Error::Unsupported(format!(
                "multi-track MIDI file '{}' ({} tracks)",
                self.name,
                smf.tracks.len()
            )));
        }

        let samples_per_tick = samples_per_tick(&self.settings, division);
        debug!(
            "Parsing MIDI file '{}': division {}, {:.4} samples per tick",
            self.name, division, samples_per_tick
        );

        let Some(track) = smf.tracks.first() else {
            return Ok(());
        };

        let mut current_tick = 0u64;
        for event in track.iter() {
            current_tick += event.delta.as_int() as u64;
            let timestamp = (current_tick as f64 * samples_per_tick).floor() as u64;

            match convert_event(&event.kind) {
                Some(message) => timeline.append(MidiEvent::new(timestamp, message)),
                None => debug!("Skipping MIDI escape sequence at tick {}", current_tick),
            }
        }

        info!(
            "Read {} MIDI events from '{}'",
            timeline.len(),
            self.name
        );
        Ok(())
    }
}

impl MidiSource for MidiFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        if self.data.is_some() {
            return Ok(());
        }
        match &self.path {
            Some(path) => {
                self.data = Some(std::fs::read(path)?);
                Ok(())
            }
            None => Err(Error::NotOpened(self.name.clone())),
        }
    }

    fn read_all_events(&mut self, timeline: &mut MidiTimeline) -> Result<()> {
        let data = self
            .data
            .take()
            .ok_or_else(|| Error::NotOpened(self.name.clone()))?;
        let result = self.parse_into(&data, timeline);
        self.data = Some(data);
        result
    }
}

/// `sample_rate / (division * tempo / 60)`.
pub(crate) fn samples_per_tick(settings: &FrozenSettings, division: u16) -> f64 {
    let ticks_per_second = division as f64 * settings.tempo() / 60.0;
    settings.sample_rate() / ticks_per_second
}

fn convert_event(kind: &TrackEventKind) -> Option<MidiMessage> {
    match kind {
        TrackEventKind::Midi { channel, message } => {
            let ch = channel.as_int();
            let (status, data1, data2) = match *message {
                SmfMessage::NoteOff { key, vel } => (0x80, key.as_int(), vel.as_int()),
                SmfMessage::NoteOn { key, vel } => (0x90, key.as_int(), vel.as_int()),
                SmfMessage::Aftertouch { key, vel } => (0xA0, key.as_int(), vel.as_int()),
                SmfMessage::Controller { controller, value } => {
                    (0xB0, controller.as_int(), value.as_int())
                }
                SmfMessage::ProgramChange { program } => (0xC0, program.as_int(), 0),
                SmfMessage::ChannelAftertouch { vel } => (0xD0, vel.as_int(), 0),
                SmfMessage::PitchBend { bend } => {
                    let raw = bend.0.as_int();
                    (0xE0, (raw & 0x7F) as u8, (raw >> 7) as u8)
                }
            };
            Some(MidiMessage::Voice {
                status: status | ch,
                data1,
                data2,
            })
        }
        TrackEventKind::SysEx(data) => Some(MidiMessage::SysEx(data.to_vec())),
        TrackEventKind::Escape(_) => None,
        TrackEventKind::Meta(meta) => Some(convert_meta(meta)),
    }
}

fn convert_meta(meta: &MetaMessage) -> MidiMessage {
    let (meta_type, data) = match meta {
        MetaMessage::Tempo(tempo) => {
            let us_per_quarter = tempo.as_int();
            info!(
                "MIDI file tempo change to {:.2} BPM is not applied",
                60_000_000.0 / us_per_quarter as f64
            );
            (
                0x51,
                vec![
                    (us_per_quarter >> 16) as u8,
                    (us_per_quarter >> 8) as u8,
                    us_per_quarter as u8,
                ],
            )
        }
        MetaMessage::TimeSignature(num, denom_pow, clocks, notes) => {
            info!(
                "MIDI file time signature {}/{} is not applied",
                num,
                1u32 << (*denom_pow).min(31)
            );
            (0x58, vec![*num, *denom_pow, *clocks, *notes])
        }
        MetaMessage::EndOfTrack => (0x2F, Vec::new()),
        MetaMessage::Text(text) => (0x01, text.to_vec()),
        MetaMessage::Copyright(text) => (0x02, text.to_vec()),
        MetaMessage::TrackName(text) => (0x03, text.to_vec()),
        MetaMessage::InstrumentName(text) => (0x04, text.to_vec()),
        MetaMessage::Lyric(text) => (0x05, text.to_vec()),
        MetaMessage::Marker(text) => (0x06, text.to_vec()),
        MetaMessage::CuePoint(text) => (0x07, text.to_vec()),
        MetaMessage::KeySignature(sharps, minor) => (0x59, vec![*sharps as u8, *minor as u8]),
        MetaMessage::SequencerSpecific(data) => (0x7F, data.to_vec()),
        MetaMessage::Unknown(meta_type, data) => (*meta_type, data.to_vec()),
        other => {
            debug!("Ignoring MIDI meta event payload {:?}", other);
            (0x00, Vec::new())
        }
    };
    MidiMessage::Meta { meta_type, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockhost_core::Settings;
    use std::io::Write;

    fn header(format: u16, tracks: u16, division: u16) -> Vec<u8> {
        let mut data = b"MThd".to_vec();
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&format.to_be_bytes());
        data.extend_from_slice(&tracks.to_be_bytes());
        data.extend_from_slice(&division.to_be_bytes());
        data
    }

    fn track(body: &[u8]) -> Vec<u8> {
        let mut data = b"MTrk".to_vec();
        data.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend_from_slice(body);
        data
    }

    fn note_file() -> Vec<u8> {
        let mut data = header(0, 1, 480);
        data.extend(track(&[
            0x00, 0x90, 0x3C, 0x64, // note on at tick 0
            0x83, 0x60, 0x80, 0x3C, 0x00, // note off at tick 480
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo 120 BPM
            0x00, 0xFF, 0x2F, 0x00, // end of track
        ]));
        data
    }

    #[test]
    fn test_tick_to_sample_conversion() {
        let settings = Settings::default().freeze();
        // 480 ticks per beat at 120 BPM and 44.1kHz: one beat is 22050 samples.
        let spt = samples_per_tick(&settings, 480);
        assert!((spt * 480.0 - 22050.0).abs() < 1e-9);
    }

    #[test]
    fn test_reads_voice_and_meta_events() {
        let settings = Settings::default().freeze();
        let mut source = MidiFileSource::from_bytes("notes.mid", note_file(), settings);
        let mut timeline = MidiTimeline::new();
        source.open().unwrap();
        source.read_all_events(&mut timeline).unwrap();

        let events = timeline.events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].timestamp, 0);
        assert_eq!(events[0].status(), Some(0x90));
        assert_eq!(events[1].timestamp, 22050);
        assert!(events[1].is_note_off());
        assert_eq!(
            events[2].message,
            MidiMessage::Meta {
                meta_type: 0x51,
                data: vec![0x07, 0xA1, 0x20]
            }
        );
    }

    #[test]
    fn test_tempo_meta_does_not_change_timing() {
        let mut settings = Settings::default();
        settings.set_tempo(60.0);
        let settings = settings.freeze();
        let mut source = MidiFileSource::from_bytes("notes.mid", note_file(), settings);
        let mut timeline = MidiTimeline::new();
        source.open().unwrap();
        source.read_all_events(&mut timeline).unwrap();

        // At 60 BPM one beat is a full second, regardless of the 120 BPM meta event.
        assert_eq!(timeline.events()[1].timestamp, 44100);
    }

    #[test]
    fn test_multi_track_rejected() {
        let mut data = header(1, 2, 96);
        data.extend(track(&[0x00, 0xFF, 0x2F, 0x00]));
        data.extend(track(&[0x00, 0xFF, 0x2F, 0x00]));
        let mut source = MidiFileSource::from_bytes("multi.mid", data, FrozenSettings::default());
        source.open().unwrap();
        let err = source.read_all_events(&mut MidiTimeline::new()).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(err.to_string().contains("multi-track"));
    }

    #[test]
    fn test_format_one_single_track_accepted() {
        let mut data = header(1, 1, 96);
        data.extend(track(&[0x00, 0x90, 0x40, 0x40, 0x00, 0xFF, 0x2F, 0x00]));
        let mut source = MidiFileSource::from_bytes("one.mid", data, FrozenSettings::default());
        let mut timeline = MidiTimeline::new();
        source.open().unwrap();
        source.read_all_events(&mut timeline).unwrap();
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_smpte_timing_rejected() {
        // Negative division byte selects SMPTE timing (-25 fps, 40 ticks per frame).
        let mut data = header(0, 1, 0xE728);
        data.extend(track(&[0x00, 0xFF, 0x2F, 0x00]));
        let mut source = MidiFileSource::from_bytes("smpte.mid", data, FrozenSettings::default());
        source.open().unwrap();
        let err = source.read_all_events(&mut MidiTimeline::new()).unwrap_err();
        assert!(matches!(err, Error::MidiUnsupportedTiming));
    }

    #[test]
    fn test_zero_division_rejected() {
        let mut data = header(0, 1, 0);
        data.extend(track(&[0x00, 0x90, 0x3C, 0x64, 0x60, 0x80, 0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00]));
        let mut source = MidiFileSource::from_bytes("zero.mid", data, FrozenSettings::default());
        let mut timeline = MidiTimeline::new();
        source.open().unwrap();
        let err = source.read_all_events(&mut timeline).unwrap_err();
        assert!(matches!(err, Error::MidiUnsupportedTiming));
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_open_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&note_file()).unwrap();

        let mut source = MidiFileSource::new(file.path(), FrozenSettings::default());
        let mut timeline = MidiTimeline::new();
        source.open().unwrap();
        source.read_all_events(&mut timeline).unwrap();
        assert_eq!(timeline.len(), 4);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut source = MidiFileSource::new("/nonexistent/file.mid", FrozenSettings::default());
        assert!(matches!(source.open(), Err(Error::Io(_))));
    }

    #[test]
    fn test_read_without_open_fails() {
        let mut source = MidiFileSource::new("/tmp/unopened.mid", FrozenSettings::default());
        let err = source.read_all_events(&mut MidiTimeline::new()).unwrap_err();
        assert!(matches!(err, Error::NotOpened(_)));
    }
}
