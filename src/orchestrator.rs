//! Block-processing state machine.
//!
//! ```text
//! Idle -> Initializing -> Running -> Draining -> Stopped
//! ```
//!
//! Running reads one input block at a time, routes that block's MIDI events
//! and audio through the chain and writes the result. When input ends (or
//! the MIDI timeline does, or the time limit is hit) the requested tail is
//! first spliced into the spare frames of the final block, and whatever is
//! left is generated from silence while Draining.

use crate::config::ParameterSetting;
use crate::report::RunReport;
use crate::{Error, Result};
use blockhost_core::{Clock, FrozenSettings, SampleBuffer, TaskTimer};
use blockhost_io::{SampleSink, SampleSource, SilenceSource};
use blockhost_midi::{MidiSource, MidiTimeline};
use blockhost_plugin::PluginChain;
use std::iter;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Initializing,
    Running,
    Draining,
    Stopped,
}

pub struct Orchestrator {
    settings: FrozenSettings,
    chain: PluginChain,
    clock: Clock,
    host_timer: TaskTimer,
    timeline: Option<MidiTimeline>,
    state: RunState,
    max_time_ms: Option<u64>,
    tail_time_ms: u64,
}

impl Orchestrator {
    pub fn new(settings: FrozenSettings, chain: PluginChain) -> Self {
        Self {
            settings,
            chain,
            clock: Clock::new(),
            host_timer: TaskTimer::new("blockhost", "Host"),
            timeline: None,
            state: RunState::Idle,
            max_time_ms: None,
            tail_time_ms: 0,
        }
    }

    /// Stops producing input blocks after this much time.
    pub fn with_max_time_ms(mut self, max_time_ms: Option<u64>) -> Self {
        self.max_time_ms = max_time_ms;
        self
    }

    /// Tail requested on top of the chain's own tail time.
    pub fn with_tail_time_ms(mut self, tail_time_ms: u64) -> Self {
        self.tail_time_ms = tail_time_ms;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn settings(&self) -> &FrozenSettings {
        &self.settings
    }

    pub fn chain(&self) -> &PluginChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut PluginChain {
        &mut self.chain
    }

    /// Initializes, applies `parameters` to the first plugin, then processes.
    pub fn run(
        &mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn SampleSink,
        midi: Option<&mut dyn MidiSource>,
        parameters: &[ParameterSetting],
    ) -> Result<RunReport> {
        self.initialize(source, sink, midi)?;
        for parameter in parameters {
            if let Err(e) = self.set_parameter(*parameter) {
                self.stop();
                return Err(e);
            }
        }
        let report = self.process(source, sink)?;
        report.log_summary();
        Ok(report)
    }

    /// Opens the input, initializes the chain, opens the output and loads
    /// the whole MIDI timeline.
    ///
    /// A chain led by an instrument needs a MIDI source.
    pub fn initialize(
        &mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn SampleSink,
        midi: Option<&mut dyn MidiSource>,
    ) -> Result<()> {
        if self.state != RunState::Idle {
            return Err(Error::InvalidState(format!(
                "initialize called in state {:?}",
                self.state
            )));
        }
        self.state = RunState::Initializing;

        let result = self.initialize_collaborators(source, sink, midi);
        self.host_timer.stop();
        if result.is_err() {
            self.stop();
        }
        result
    }

    fn initialize_collaborators(
        &mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn SampleSink,
        midi: Option<&mut dyn MidiSource>,
    ) -> Result<()> {
        self.host_timer.start();
        source.open()?;
        info!("Opened input '{}'", source.name());
        self.host_timer.stop();

        self.chain.initialize()?;

        self.host_timer.start();
        if self.chain.starts_with_instrument() && midi.is_none() {
            error!(
                "Plugin '{}' is an instrument, but no MIDI source was given",
                self.chain.handle(0).map(|h| h.name()).unwrap_or_default()
            );
            return Err(Error::MissingRequiredOption(
                "instruments need a MIDI file (--midi-file)".to_string(),
            ));
        }

        sink.open()?;
        info!("Opened output '{}'", sink.name());

        if let Some(midi) = midi {
            midi.open()?;
            let mut timeline = MidiTimeline::new();
            midi.read_all_events(&mut timeline)?;
            info!(
                "Read {} MIDI events from '{}'",
                timeline.len(),
                midi.name()
            );
            self.timeline = Some(timeline);
        }
        Ok(())
    }

    /// Sets a parameter on the first plugin in the chain.
    pub fn set_parameter(&mut self, parameter: ParameterSetting) -> Result<()> {
        if self.state != RunState::Initializing {
            return Err(Error::InvalidState(format!(
                "set_parameter called in state {:?}",
                self.state
            )));
        }
        self.chain
            .set_parameter(0, parameter.index, parameter.value)
            .map_err(Error::from)
    }

    /// Runs the block loop and the tail, then stops.
    pub fn process(
        &mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn SampleSink,
    ) -> Result<RunReport> {
        if self.state != RunState::Initializing {
            return Err(Error::InvalidState(format!(
                "process called in state {:?}",
                self.state
            )));
        }

        let result = self.process_blocks(source, sink);
        let tail_frames = match result {
            Ok(tail_frames) => tail_frames,
            Err(e) => {
                self.stop();
                return Err(e);
            }
        };
        self.stop();

        self.host_timer.start();
        source.close()?;
        sink.close()?;
        self.host_timer.stop();

        let frames_written = sink.frames_processed();
        Ok(RunReport {
            frames_read: source.frames_processed(),
            frames_written,
            samples_processed: frames_written * self.settings.num_channels() as u64,
            tail_frames,
            components: RunReport::component_times(
                iter::once(&self.host_timer).chain(self.chain.timers()),
            ),
        })
    }

    /// Returns the total tail frames requested.
    fn process_blocks(
        &mut self,
        source: &mut dyn SampleSource,
        sink: &mut dyn SampleSink,
    ) -> Result<u64> {
        self.state = RunState::Running;

        let block_size = self.settings.block_size();
        let channels = self.settings.num_channels();
        let mut input = SampleBuffer::new(channels, block_size);
        let mut output = SampleBuffer::new(channels, block_size);
        let mut events = Vec::new();

        let tail_ms = self.chain.maximum_tail_time_ms() + self.tail_time_ms;
        let tail_frames = self.settings.ms_to_frames(tail_ms as f64);
        let mut remaining_tail = tail_frames;
        let max_frames = self
            .max_time_ms
            .map(|ms| self.settings.ms_to_frames(ms as f64));
        if tail_frames > 0 {
            info!("Requesting {} ms ({} frames) of tail", tail_ms, tail_frames);
        }

        loop {
            self.host_timer.start();
            let block_start = self.clock.current_sample();
            let read_before = source.frames_processed();
            let mut has_more = source.read_block(&mut input)?;
            let mut frames = (source.frames_processed() - read_before).min(block_size as u64) as usize;

            // A MIDI timeline decides when the run ends, not the audio input.
            events.clear();
            if let Some(timeline) = self.timeline.as_mut() {
                has_more = timeline.extract_range(block_start, block_size, &mut events);
                frames = block_size;
            }

            if let Some(limit) = max_frames {
                if block_start + frames as u64 >= limit {
                    frames = limit.saturating_sub(block_start) as usize;
                    has_more = false;
                }
            }
            self.host_timer.stop();

            // Input ran out exactly on the previous block boundary.
            if frames == 0 && !has_more {
                debug!("Input ended at block boundary {}", block_start);
                break;
            }

            self.chain.publish_transport(self.clock.snapshot());
            self.chain.process_midi(&events);
            self.chain.process_audio(&mut input, &mut output);

            self.host_timer.start();
            let write_frames = if has_more {
                block_size
            } else {
                let spare = (block_size - frames) as u64;
                if remaining_tail > spare {
                    remaining_tail -= spare;
                    block_size
                } else {
                    let absorbed = remaining_tail as usize;
                    remaining_tail = 0;
                    frames + absorbed
                }
            };
            debug!(
                "Block at {}: {} frames in, {} frames out, {} MIDI events",
                block_start,
                frames,
                write_frames,
                events.len()
            );
            sink.write_block(&output, write_frames)?;
            self.clock.advance(block_size);
            self.host_timer.stop();

            if !has_more {
                break;
            }
        }

        self.state = RunState::Draining;
        if remaining_tail > 0 {
            debug!("Draining {} tail frames", remaining_tail);
        }
        let mut silence = SilenceSource::new();
        while remaining_tail > 0 {
            self.host_timer.start();
            silence.read_block(&mut input)?;
            let frames = remaining_tail.min(block_size as u64) as usize;
            self.host_timer.stop();

            self.chain.publish_transport(self.clock.snapshot());
            self.chain.process_audio(&mut input, &mut output);

            self.host_timer.start();
            sink.write_block(&output, frames)?;
            remaining_tail -= frames as u64;
            self.clock.advance(block_size);
            self.host_timer.stop();
        }

        Ok(tail_frames)
    }

    fn stop(&mut self) {
        if self.state == RunState::Stopped {
            return;
        }
        self.state = RunState::Stopped;
        self.clock.stop();
        self.chain.publish_transport(self.clock.snapshot());
        self.chain.shutdown();
        info!("Stopped at sample {}", self.clock.current_sample());
    }
}
