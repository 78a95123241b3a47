//! Presets bound to chain slots: plugin-internal programs and FXP files.

use crate::error::{Error, Result};
use crate::handle::PluginHandle;
use crate::id::id_to_string;
use crate::vst2::Vst2Plugin;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CHUNK_MAGIC: &[u8; 4] = b"CcnK";
const PARAMS_MAGIC: &[u8; 4] = b"FxCk";
const OPAQUE_MAGIC: &[u8; 4] = b"FPCh";
const PROGRAM_NAME_LEN: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    /// A program number stored inside the plugin.
    InternalProgram,
    /// A `.fxp` program file.
    Fxp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FxpContent {
    Params(Vec<f32>),
    Chunk(Vec<u8>),
}

/// Parsed `.fxp` program.
#[derive(Debug, Clone, PartialEq)]
pub struct Fxp {
    pub version: i32,
    pub fx_id: u32,
    pub fx_version: i32,
    pub program_name: String,
    pub content: FxpContent,
}

/// Bounds-checked big-endian reader.
struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> std::result::Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                format!(
                    "truncated: wanted {} bytes at offset {}, file has {}",
                    len,
                    self.pos,
                    self.data.len()
                )
            })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> std::result::Result<[u8; N], String> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    fn read_i32(&mut self) -> std::result::Result<i32, String> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> std::result::Result<u32, String> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_f32(&mut self) -> std::result::Result<f32, String> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    fn read_count(&mut self, what: &str) -> std::result::Result<usize, String> {
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| format!("negative {} ({})", what, count))
    }
}

impl Fxp {
    pub fn parse(data: &[u8]) -> std::result::Result<Self, String> {
        let mut cursor = ByteCursor::new(data);

        let chunk_magic: [u8; 4] = cursor.read_array()?;
        if &chunk_magic != CHUNK_MAGIC {
            return Err(format!(
                "bad chunk magic '{}'",
                String::from_utf8_lossy(&chunk_magic)
            ));
        }
        let _byte_size = cursor.read_i32()?;
        let fx_magic: [u8; 4] = cursor.read_array()?;
        let version = cursor.read_i32()?;
        let fx_id = cursor.read_u32()?;
        let fx_version = cursor.read_i32()?;
        let num_params = cursor.read_count("parameter count")?;
        let name_bytes = cursor.take(PROGRAM_NAME_LEN)?;
        let name_end = name_bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(PROGRAM_NAME_LEN);
        let program_name = String::from_utf8_lossy(&name_bytes[..name_end]).to_string();

        let content = match &fx_magic {
            PARAMS_MAGIC => {
                let params = (0..num_params)
                    .map(|_| cursor.read_f32())
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                FxpContent::Params(params)
            }
            OPAQUE_MAGIC => {
                let size = cursor.read_count("chunk size")?;
                FxpContent::Chunk(cursor.take(size)?.to_vec())
            }
            other => {
                return Err(format!(
                    "unsupported program type '{}'",
                    String::from_utf8_lossy(other)
                ))
            }
        };

        Ok(Self {
            version,
            fx_id,
            fx_version,
            program_name,
            content,
        })
    }
}

#[derive(Debug, Clone)]
enum PresetSource {
    Program(i32),
    Fxp { path: PathBuf, data: Option<Fxp> },
}

/// A preset waiting to be applied to one chain slot.
#[derive(Debug, Clone)]
pub struct PluginPreset {
    name: String,
    source: PresetSource,
}

impl PluginPreset {
    /// Picks the preset type from its name: all digits is a program number,
    /// a `.fxp` extension is a program file.
    pub fn guess(name: &str) -> Result<Self> {
        let source = if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            let program = name
                .parse()
                .map_err(|_| Error::InvalidPreset(name.to_string()))?;
            PresetSource::Program(program)
        } else if Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("fxp"))
        {
            PresetSource::Fxp {
                path: PathBuf::from(name),
                data: None,
            }
        } else {
            return Err(Error::InvalidPreset(name.to_string()));
        };
        Ok(Self {
            name: name.to_string(),
            source,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PresetKind {
        match self.source {
            PresetSource::Program(_) => PresetKind::InternalProgram,
            PresetSource::Fxp { .. } => PresetKind::Fxp,
        }
    }

    /// Both preset kinds address native plugin state.
    pub fn is_compatible(&self, handle: &PluginHandle) -> bool {
        handle.is_native()
    }

    /// Reads the preset file, if any.
    pub fn open(&mut self) -> Result<()> {
        if let PresetSource::Fxp { path, data } = &mut self.source {
            let bytes = std::fs::read(path.as_path())?;
            let parsed = Fxp::parse(&bytes).map_err(|reason| Error::PresetLoad {
                preset: self.name.clone(),
                reason,
            })?;
            *data = Some(parsed);
        }
        Ok(())
    }

    /// Applies the preset. Consumes it: a preset is only ever loaded once.
    pub fn load(self, handle: &mut PluginHandle) -> Result<()> {
        let plugin = match handle {
            PluginHandle::Vst2(plugin) => plugin,
            PluginHandle::Internal(internal) => {
                return Err(Error::IncompatiblePreset {
                    preset: self.name,
                    plugin: internal.name().to_string(),
                })
            }
        };
        info!("Loading preset '{}' into '{}'", self.name, plugin.name());

        match self.source {
            PresetSource::Program(program) => load_program(&self.name, program, plugin),
            PresetSource::Fxp { data: Some(fxp), .. } => load_fxp(&self.name, fxp, plugin),
            PresetSource::Fxp { data: None, .. } => Err(Error::PresetLoad {
                preset: self.name,
                reason: "preset file was not opened".to_string(),
            }),
        }
    }
}

fn load_program(name: &str, program: i32, plugin: &mut Vst2Plugin) -> Result<()> {
    plugin.set_program(program);
    let current = plugin.get_program();
    if current != program {
        return Err(Error::PresetLoad {
            preset: name.to_string(),
            reason: format!("plugin reports program {} after selecting {}", current, program),
        });
    }
    Ok(())
}

fn load_fxp(name: &str, fxp: Fxp, plugin: &mut Vst2Plugin) -> Result<()> {
    let unique_id = plugin.unique_id();
    if fxp.fx_id != unique_id {
        if fxp.fx_id == 0 || unique_id == 0 {
            warn!(
                "Preset '{}' id '{}' does not match plugin id '{}'",
                name,
                id_to_string(fxp.fx_id),
                id_to_string(unique_id)
            );
        } else {
            return Err(Error::PresetLoad {
                preset: name.to_string(),
                reason: format!(
                    "preset is for plugin '{}', not '{}'",
                    id_to_string(fxp.fx_id),
                    id_to_string(unique_id)
                ),
            });
        }
    }

    match fxp.content {
        FxpContent::Params(params) => {
            for (index, value) in params.into_iter().enumerate() {
                plugin
                    .set_parameter(index, value)
                    .map_err(|e| Error::PresetLoad {
                        preset: name.to_string(),
                        reason: e.to_string(),
                    })?;
            }
        }
        FxpContent::Chunk(chunk) => {
            plugin.set_chunk(&chunk, true);
        }
    }
    info!("Loaded program '{}'", fxp.program_name);
    Ok(())
}
