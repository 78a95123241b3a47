//! Headerless interleaved 16-bit PCM.

use super::{float_to_i16, int_to_float};
use crate::error::{Error, Result};
use crate::options::{Endianness, PcmOptions};
use crate::traits::{SampleSink, SampleSource};
use blockhost_core::SampleBuffer;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

const BYTES_PER_SAMPLE: usize = 2;

enum PcmInput {
    File(std::path::PathBuf),
    Stdin,
    Reader(Option<Box<dyn Read>>),
}

/// Raw PCM reader over a file, stdin or any `Read`.
pub struct PcmSource {
    name: String,
    input: PcmInput,
    options: PcmOptions,
    reader: Option<Box<dyn Read>>,
    bytes: Vec<u8>,
    samples: Vec<f32>,
    frames_read: u64,
}

impl PcmSource {
    pub fn file(path: impl AsRef<Path>, options: PcmOptions) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::with_input(path.display().to_string(), PcmInput::File(path), options)
    }

    pub fn stdin(options: PcmOptions) -> Self {
        Self::with_input("stdin".to_string(), PcmInput::Stdin, options)
    }

    pub fn from_reader(name: impl Into<String>, reader: Box<dyn Read>, options: PcmOptions) -> Self {
        Self::with_input(name.into(), PcmInput::Reader(Some(reader)), options)
    }

    fn with_input(name: String, input: PcmInput, options: PcmOptions) -> Self {
        Self {
            name,
            input,
            options,
            reader: None,
            bytes: Vec::new(),
            samples: Vec::new(),
            frames_read: 0,
        }
    }
}

/// Reads until `buf` is full or the reader hits end of input.
fn read_fully(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl SampleSource for PcmSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        if self.options.channels == 0 {
            return Err(Error::InvalidOptions("PCM input needs at least one channel".into()));
        }
        let reader: Box<dyn Read> = match &mut self.input {
            PcmInput::File(path) => Box::new(BufReader::new(File::open(path.as_path())?)),
            PcmInput::Stdin => Box::new(BufReader::new(io::stdin())),
            PcmInput::Reader(reader) => reader
                .take()
                .ok_or_else(|| Error::NotOpen(self.name.clone()))?,
        };
        self.reader = Some(reader);
        log::info!(
            "Opened PCM input '{}': {} channels, {:?} endian",
            self.name,
            self.options.channels,
            self.options.endianness
        );
        Ok(())
    }

    fn read_block(&mut self, buffer: &mut SampleBuffer) -> Result<bool> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::NotOpen(self.name.clone()))?;
        let channels = self.options.channels;
        let frame_bytes = channels * BYTES_PER_SAMPLE;

        self.bytes.resize(buffer.block_size() * frame_bytes, 0);
        let filled = read_fully(reader.as_mut(), &mut self.bytes)?;
        let whole = filled - filled % frame_bytes;

        self.samples.clear();
        for pair in self.bytes[..whole].chunks_exact(BYTES_PER_SAMPLE) {
            let raw = [pair[0], pair[1]];
            let value = match self.options.endianness {
                Endianness::Little => i16::from_le_bytes(raw),
                Endianness::Big => i16::from_be_bytes(raw),
            };
            self.samples.push(int_to_float(value as i32, 16));
        }

        let frames = buffer.fill_from_interleaved(&self.samples, channels);
        self.frames_read += frames as u64;
        Ok(frames == buffer.block_size())
    }

    fn frames_processed(&self) -> u64 {
        self.frames_read
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }
}

enum PcmOutput {
    File(std::path::PathBuf),
    Stdout,
    Writer(Option<Box<dyn Write>>),
}

/// Raw PCM writer over a file, stdout or any `Write`.
pub struct PcmSink {
    name: String,
    output: PcmOutput,
    options: PcmOptions,
    writer: Option<Box<dyn Write>>,
    bytes: Vec<u8>,
    frames_written: u64,
}

impl PcmSink {
    pub fn file(path: impl AsRef<Path>, options: PcmOptions) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::with_output(path.display().to_string(), PcmOutput::File(path), options)
    }

    pub fn stdout(options: PcmOptions) -> Self {
        Self::with_output("stdout".to_string(), PcmOutput::Stdout, options)
    }

    pub fn from_writer(name: impl Into<String>, writer: Box<dyn Write>, options: PcmOptions) -> Self {
        Self::with_output(name.into(), PcmOutput::Writer(Some(writer)), options)
    }

    fn with_output(name: String, output: PcmOutput, options: PcmOptions) -> Self {
        Self {
            name,
            output,
            options,
            writer: None,
            bytes: Vec::new(),
            frames_written: 0,
        }
    }
}

impl SampleSink for PcmSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<()> {
        let writer: Box<dyn Write> = match &mut self.output {
            PcmOutput::File(path) => Box::new(BufWriter::new(File::create(path.as_path())?)),
            PcmOutput::Stdout => Box::new(BufWriter::new(io::stdout())),
            PcmOutput::Writer(writer) => writer
                .take()
                .ok_or_else(|| Error::NotOpen(self.name.clone()))?,
        };
        self.writer = Some(writer);
        Ok(())
    }

    fn write_block(&mut self, buffer: &SampleBuffer, frames: usize) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::NotOpen(self.name.clone()))?;
        let frames = frames.min(buffer.block_size());

        self.bytes.clear();
        for frame in 0..frames {
            for ch in 0..self.options.channels {
                let sample = if ch < buffer.num_channels() {
                    buffer.channel(ch)[frame]
                } else {
                    0.0
                };
                let value = float_to_i16(sample);
                match self.options.endianness {
                    Endianness::Little => self.bytes.extend_from_slice(&value.to_le_bytes()),
                    Endianness::Big => self.bytes.extend_from_slice(&value.to_be_bytes()),
                }
            }
        }
        writer.write_all(&self.bytes)?;

        self.frames_written += frames as u64;
        Ok(())
    }

    fn frames_processed(&self) -> u64 {
        self.frames_written
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
