//! `blockhost` command line.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use blockhost::{ParameterSetting, ReturnCode, RunConfig, RunOutcome, Settings};
use blockhost_io::{BitDepth, Endianness};
use blockhost_plugin::{discovery, list_internal_plugins};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Runs audio and MIDI through a chain of VST2 plugins, offline"
)]
struct Cli {
    /// Plugin chain: name[,preset][;name[,preset]]...
    #[arg(short, long, required_unless_present = "list_plugins")]
    plugin: Option<String>,
    /// Input file (.wav, .pcm, .raw, or - for stdin). Silence when omitted.
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (.wav, .pcm, .raw, or - for stdout).
    #[arg(short, long, default_value = blockhost::DEFAULT_OUTPUT)]
    output: String,
    /// Standard MIDI file sent to the first plugin.
    #[arg(short, long = "midi-file")]
    midi_file: Option<PathBuf>,
    /// Extra directory searched for plugins before the system defaults.
    #[arg(long)]
    plugin_root: Option<PathBuf>,
    #[arg(long)]
    sample_rate: Option<f64>,
    #[arg(long)]
    channels: Option<usize>,
    #[arg(long = "blocksize")]
    block_size: Option<usize>,
    /// Tempo in BPM.
    #[arg(long)]
    tempo: Option<f64>,
    /// Time signature as N/D.
    #[arg(long)]
    time_signature: Option<String>,
    /// Output bit depth (16, 24 or 32; 32 writes float).
    #[arg(long, default_value_t = 16)]
    bit_depth: u16,
    /// Byte order for raw PCM.
    #[arg(long, value_enum, default_value_t = Endian::Little)]
    endian: Endian,
    /// Parameter for the first plugin, as index,value. Repeatable.
    #[arg(long = "parameter")]
    parameters: Vec<String>,
    /// Stop reading input after this many milliseconds.
    #[arg(long)]
    max_time: Option<u64>,
    /// Extra tail to render after the input ends, in milliseconds.
    #[arg(long, default_value_t = 0)]
    tail_time: u64,
    /// Print information about each plugin and exit.
    #[arg(long)]
    display_info: bool,
    /// List available plugins and exit.
    #[arg(long)]
    list_plugins: bool,
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
    /// Write log output to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    /// Log everything.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Endian {
    Little,
    Big,
}

impl From<Endian> for Endianness {
    fn from(endian: Endian) -> Self {
        match endian {
            Endian::Little => Endianness::Little,
            Endian::Big => Endianness::Big,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl Cli {
    fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        if self.verbose {
            return "debug";
        }
        match self.log_level {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        if let Some(sample_rate) = self.sample_rate {
            settings.set_sample_rate(sample_rate);
        }
        if let Some(channels) = self.channels {
            settings.set_num_channels(channels);
        }
        if let Some(block_size) = self.block_size {
            settings.set_block_size(block_size);
        }
        if let Some(tempo) = self.tempo {
            settings.set_tempo(tempo);
        }
        if let Some(signature) = &self.time_signature {
            settings.set_time_signature_from_str(signature);
        }
        settings
    }

    fn run_config(&self) -> blockhost::Result<RunConfig> {
        let parameters = self
            .parameters
            .iter()
            .map(|p| p.parse::<ParameterSetting>())
            .collect::<blockhost::Result<Vec<_>>>()?;
        Ok(RunConfig {
            plugin_chain: self.plugin.clone().unwrap_or_default(),
            plugin_root: self.plugin_root.clone(),
            input: self.input.clone(),
            output: self.output.clone(),
            midi_file: self.midi_file.clone(),
            parameters,
            max_time_ms: self.max_time,
            tail_time_ms: self.tail_time,
            bit_depth: BitDepth::from_bits(self.bit_depth)?,
            endianness: self.endian.into(),
            display_info: self.display_info,
        })
    }
}

fn init_logging(cli: &Cli) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .ok();
        }
        None => {
            builder.with_writer(std::io::stderr).try_init().ok();
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("Can't open log file: {}", e);
        return ReturnCode::IoError.into();
    }

    if cli.list_plugins {
        list_internal_plugins();
        discovery::list_plugins(cli.plugin_root.as_deref());
        return ReturnCode::Success.into();
    }

    let settings = cli.settings();
    let result = cli
        .run_config()
        .and_then(|config| blockhost::run(&config, settings));

    match result {
        Ok(RunOutcome::Displayed) => ReturnCode::Success.into(),
        Ok(RunOutcome::Completed(report)) => {
            info!("Wrote {} frames to '{}'", report.frames_written, cli.output);
            ReturnCode::Success.into()
        }
        Err(e) => {
            let code = e.return_code();
            error!("{}", e);
            error!("Run failed: {}", code);
            code.into()
        }
    }
}
