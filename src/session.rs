//! Wiring a [`RunConfig`] to real files and plugins.

use crate::{Orchestrator, Result, RunConfig, RunReport};
use blockhost_core::Settings;
use blockhost_io::{input_format, open_sink, open_source, PcmOptions, SampleSource, SilenceSource};
use blockhost_midi::{MidiFileSource, MidiSource};
use blockhost_plugin::{HostContext, PluginChain};
use tracing::info;

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// `display_info` was set; plugins were inspected and nothing processed.
    Displayed,
    Completed(RunReport),
}

/// Builds the chain and collaborators described by `config` and runs them.
///
/// An input with a header (WAVE) overrides the sample rate and channel count
/// in `settings` before they are frozen.
pub fn run(config: &RunConfig, mut settings: Settings) -> Result<RunOutcome> {
    config.validate()?;

    if !config.display_info {
        if let Some(path) = config.input.as_deref() {
            apply_input_format(&mut settings, path)?;
        }
    }
    let settings = settings.freeze();

    let host = HostContext::new(settings);
    let mut chain = PluginChain::from_chain_string(
        &config.plugin_chain,
        config.plugin_root.as_deref(),
        host,
    )?;

    if config.display_info {
        chain.inspect()?;
        chain.shutdown();
        return Ok(RunOutcome::Displayed);
    }

    let pcm = PcmOptions {
        channels: settings.num_channels(),
        sample_rate: settings.sample_rate().round() as u32,
        endianness: config.endianness,
    };

    let mut source: Box<dyn SampleSource> = match config.input.as_deref() {
        Some(path) => open_source(path, &pcm)?,
        None => {
            info!("No input given, processing silence");
            Box::new(SilenceSource::new())
        }
    };
    let mut sink = open_sink(&config.output, config.bit_depth, &pcm)?;
    let mut midi = config
        .midi_file
        .as_ref()
        .map(|path| MidiFileSource::new(path, settings));

    let mut orchestrator = Orchestrator::new(settings, chain)
        .with_max_time_ms(config.max_time_ms)
        .with_tail_time_ms(config.tail_time_ms);
    let report = orchestrator.run(
        source.as_mut(),
        sink.as_mut(),
        midi.as_mut().map(|m| m as &mut dyn MidiSource),
        &config.parameters,
    )?;
    Ok(RunOutcome::Completed(report))
}

fn apply_input_format(settings: &mut Settings, path: &str) -> Result<()> {
    let Some(format) = input_format(path)? else {
        return Ok(());
    };
    if f64::from(format.sample_rate) != settings.sample_rate() {
        info!(
            "Input '{}' is {}Hz, overriding {}Hz",
            path,
            format.sample_rate,
            settings.sample_rate()
        );
        settings.set_sample_rate(f64::from(format.sample_rate));
    }
    if usize::from(format.channels) != settings.num_channels() {
        info!(
            "Input '{}' has {} channels, overriding {}",
            path,
            format.channels,
            settings.num_channels()
        );
        settings.set_num_channels(usize::from(format.channels));
    }
    Ok(())
}
