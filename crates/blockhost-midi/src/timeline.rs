//! Ordered MIDI events with a forward-only extraction cursor.

use crate::MidiEvent;
use tracing::{debug, error};

/// Events sorted by non-decreasing timestamp, read block by block.
///
/// The timeline is filled completely before processing and then consumed by
/// successive [`extract_range`](Self::extract_range) calls whose start
/// positions never go backwards.
#[derive(Debug, Clone, Default)]
pub struct MidiTimeline {
    events: Vec<MidiEvent>,
    cursor: usize,
}

impl MidiTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event at the end. Timestamp order is the caller's responsibility.
    pub fn append(&mut self, event: MidiEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[MidiEvent] {
        &self.events
    }

    /// Number of events the cursor has moved past.
    pub fn num_processed(&self) -> usize {
        self.cursor
    }

    /// Timestamp of the last event, if any.
    pub fn last_timestamp(&self) -> Option<u64> {
        self.events.last().map(|e| e.timestamp)
    }

    /// Copies every event in `[start, start + block_size)` into `out`, with
    /// `delta_frames` set relative to `start`.
    ///
    /// Returns `false` once the cursor has moved past the final event, i.e.
    /// the timeline is exhausted within (or before) this range.
    pub fn extract_range(&mut self, start: u64, block_size: usize, out: &mut Vec<MidiEvent>) -> bool {
        let stop = start + block_size as u64;

        while let Some(event) = self.events.get(self.cursor) {
            if event.timestamp >= stop {
                return true;
            }

            if event.timestamp >= start {
                let mut scheduled = event.clone();
                scheduled.delta_frames = (event.timestamp - start) as u32;
                debug!(
                    "Scheduling MIDI event {:?} in {} frames",
                    scheduled.message, scheduled.delta_frames
                );
                out.push(scheduled);
            } else {
                error!(
                    "Internal error: inconsistent MIDI timeline ordering, event at {} precedes block start {}",
                    event.timestamp, start
                );
            }
            self.cursor += 1;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline_with(timestamps: &[u64]) -> MidiTimeline {
        let mut timeline = MidiTimeline::new();
        for (i, ts) in timestamps.iter().enumerate() {
            timeline.append(MidiEvent::note_on(*ts, 0, 60 + i as u8, 100));
        }
        timeline
    }

    #[test]
    fn test_block_partitioning() {
        let mut timeline = timeline_with(&[0, 100, 250, 400]);
        let mut out = Vec::new();

        assert!(timeline.extract_range(0, 150, &mut out));
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].timestamp, out[0].delta_frames), (0, 0));
        assert_eq!((out[1].timestamp, out[1].delta_frames), (100, 100));

        out.clear();
        assert!(timeline.extract_range(150, 150, &mut out));
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].timestamp, out[0].delta_frames), (250, 100));

        out.clear();
        let more = timeline.extract_range(300, 150, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].timestamp, out[0].delta_frames), (400, 100));
        assert!(!more);
        assert_eq!(timeline.num_processed(), 4);
    }

    #[test]
    fn test_stop_boundary_is_exclusive() {
        let mut timeline = timeline_with(&[150]);
        let mut out = Vec::new();

        assert!(timeline.extract_range(0, 150, &mut out));
        assert!(out.is_empty());

        assert!(!timeline.extract_range(150, 150, &mut out));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].delta_frames, 0);
    }

    #[test]
    fn test_empty_range_before_events() {
        let mut timeline = timeline_with(&[1000, 1001]);
        let mut out = Vec::new();
        for block in 0..3 {
            assert!(timeline.extract_range(block * 256, 256, &mut out));
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_timeline_is_exhausted() {
        let mut timeline = MidiTimeline::new();
        let mut out = Vec::new();
        assert!(!timeline.extract_range(0, 512, &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn test_event_before_start_is_skipped() {
        let mut timeline = timeline_with(&[10, 600]);
        let mut out = Vec::new();

        // Start past the first event; it is logged and dropped, not emitted.
        assert!(!timeline.extract_range(512, 512, &mut out));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, 600);
        assert_eq!(out[0].delta_frames, 88);
    }

    #[test]
    fn test_simultaneous_events_stay_together() {
        let mut timeline = timeline_with(&[64, 64, 64]);
        let mut out = Vec::new();
        assert!(!timeline.extract_range(0, 128, &mut out));
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|e| e.delta_frames == 64));
    }
}
