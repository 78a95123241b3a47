//! In-process VST2 plugin instance.

use super::abi::{
    category, eff, effect_flags, AEffect, PluginMainProc, VstSpeakerArrangement, MAGIC,
    MAX_STRING_LEN,
};
use super::events::{to_vst_events, EventBuffer};
use super::host::{self, HostContext};
use crate::discovery;
use crate::error::{Error, LoadStage, Result};
use crate::handle::{PluginSetting, PluginType};
use crate::id::{id_to_string, split_shell_id};
use blockhost_core::SampleBuffer;
use blockhost_midi::MidiEvent;
use libloading::{Library, Symbol};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capabilities reported by `display_info`.
const COMMON_CAN_DO: &[&str] = &[
    "receiveVstEvents",
    "receiveVstMidiEvent",
    "receiveVstTimeInfo",
    "sendVstEvents",
    "sendVstMidiEvent",
    "offline",
    "midiProgramNames",
    "bypass",
];

/// A native VST2 module loaded into this process.
///
/// Not `Send`: the plugin is only ever driven from the thread that opened it.
pub struct Vst2Plugin {
    name: String,
    shell_id: Option<u32>,
    plugin_root: Option<PathBuf>,
    path: Option<PathBuf>,
    library: Option<Library>,
    effect: *mut AEffect,
    host: Arc<HostContext>,
    plugin_type: PluginType,
    is_shell: bool,
    is_resumed: bool,
    events: EventBuffer,
    input_ptrs: Vec<*mut f32>,
    output_ptrs: Vec<*mut f32>,
}

impl Vst2Plugin {
    /// `name` may carry a `:ABCD` shell sub-id suffix.
    pub fn new(name: &str, plugin_root: Option<&Path>, host: Arc<HostContext>) -> Self {
        let (module, shell_id) = split_shell_id(name);
        Self {
            name: module.to_string(),
            shell_id,
            plugin_root: plugin_root.map(Path::to_path_buf),
            path: None,
            library: None,
            effect: ptr::null_mut(),
            host,
            plugin_type: PluginType::Unknown,
            is_shell: false,
            is_resumed: false,
            events: EventBuffer::new(),
            input_ptrs: Vec::new(),
            output_ptrs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shell_id(&self) -> Option<u32> {
        self.shell_id
    }

    /// Resolved module location, once opened.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn plugin_type(&self) -> PluginType {
        self.plugin_type
    }

    pub fn is_open(&self) -> bool {
        !self.effect.is_null()
    }

    pub fn is_shell(&self) -> bool {
        self.is_shell
    }

    pub fn open(&mut self) -> Result<()> {
        let path = discovery::resolve(&self.name, self.plugin_root.as_deref())
            .ok_or_else(|| Error::NotFound(self.name.clone()))?;
        info!("Opening VST2 plugin '{}' from {}", self.name, path.display());

        // Shell modules pick their sub-plugin from audioMasterCurrentId while
        // inside the entry point, so the slot must be set before loading.
        self.host.shell_id().set(self.shell_id.unwrap_or(0));
        host::install(&self.host);

        let library = unsafe { Library::new(&path) }.map_err(|e| Error::LoadFailed {
            path: path.clone(),
            stage: LoadStage::Loading,
            reason: e.to_string(),
        })?;

        let main: PluginMainProc = {
            let entry: Symbol<PluginMainProc> = unsafe {
                library
                    .get(b"VSTPluginMain\0")
                    .or_else(|_| library.get(b"main\0"))
            }
            .map_err(|e| Error::LoadFailed {
                path: path.clone(),
                stage: LoadStage::EntryPoint,
                reason: format!("no VSTPluginMain or main symbol: {}", e),
            })?;
            *entry
        };

        let effect = unsafe { main(host::host_callback) };
        if effect.is_null() {
            return Err(Error::LoadFailed {
                path,
                stage: LoadStage::EntryPoint,
                reason: "entry point returned null".to_string(),
            });
        }

        self.library = Some(library);
        self.path = Some(path);
        self.start(effect)
    }

    /// Validates a freshly created `AEffect` and runs the open sequence.
    fn start(&mut self, effect: *mut AEffect) -> Result<()> {
        let path = self.path.clone().unwrap_or_else(|| PathBuf::from(&self.name));
        let magic = unsafe { (*effect).magic };
        if magic != MAGIC {
            self.library = None;
            return Err(Error::LoadFailed {
                path,
                stage: LoadStage::Magic,
                reason: format!("bad magic {:#010x}", magic),
            });
        }
        if unsafe { (*effect).dispatcher.is_none() } {
            self.library = None;
            return Err(Error::LoadFailed {
                path,
                stage: LoadStage::Initialization,
                reason: "plugin has no dispatcher".to_string(),
            });
        }
        self.effect = effect;

        self.dispatch(eff::OPEN, 0, 0, ptr::null_mut(), 0.0);
        self.is_shell = self.dispatch(eff::GET_PLUG_CATEGORY, 0, 0, ptr::null_mut(), 0.0)
            == category::SHELL;
        self.plugin_type = self.classify();

        let settings = *self.host.settings();
        self.dispatch(
            eff::SET_SAMPLE_RATE,
            0,
            0,
            ptr::null_mut(),
            settings.sample_rate() as f32,
        );
        self.dispatch(
            eff::SET_BLOCK_SIZE,
            0,
            settings.block_size() as isize,
            ptr::null_mut(),
            0.0,
        );
        let (inputs, outputs) = unsafe { ((*effect).num_inputs, (*effect).num_outputs) };
        unsafe { set_speaker_arrangement(effect, inputs, outputs) };
        self.resume();

        debug!(
            "VST2 plugin '{}' opened as {} ({} in / {} out)",
            self.name, self.plugin_type, inputs, outputs
        );
        Ok(())
    }

    fn classify(&self) -> PluginType {
        let Some(effect) = self.effect_ref() else {
            return PluginType::Unknown;
        };
        if self.is_shell && self.shell_id.is_none() {
            warn!(
                "'{}' is a shell plugin; pick a sub-plugin with '{}:ID'",
                self.name, self.name
            );
            return PluginType::Unsupported;
        }
        if effect.process_replacing.is_none() {
            warn!(
                "Unsupported feature: '{}' does not implement processReplacing",
                self.name
            );
            return PluginType::Unsupported;
        }
        if effect.flags & effect_flags::IS_SYNTH != 0 {
            PluginType::Instrument
        } else {
            PluginType::Effect
        }
    }

    fn effect_ref(&self) -> Option<&AEffect> {
        unsafe { self.effect.as_ref() }
    }

    fn dispatch(&self, opcode: i32, index: i32, value: isize, ptr: *mut c_void, opt: f32) -> isize {
        match self.effect_ref().and_then(|effect| effect.dispatcher) {
            Some(dispatcher) => unsafe { dispatcher(self.effect, opcode, index, value, ptr, opt) },
            None => 0,
        }
    }

    fn dispatch_string(&self, opcode: i32, index: i32) -> String {
        let mut buffer = [0u8; MAX_STRING_LEN];
        self.dispatch(opcode, index, 0, buffer.as_mut_ptr() as *mut c_void, 0.0);
        c_buffer_to_string(&buffer)
    }

    fn resume(&mut self) {
        self.dispatch(eff::MAINS_CHANGED, 0, 1, ptr::null_mut(), 0.0);
        self.dispatch(eff::START_PROCESS, 0, 0, ptr::null_mut(), 0.0);
        self.is_resumed = true;
    }

    fn suspend(&mut self) {
        self.dispatch(eff::MAINS_CHANGED, 0, 0, ptr::null_mut(), 0.0);
        self.dispatch(eff::STOP_PROCESS, 0, 0, ptr::null_mut(), 0.0);
        self.is_resumed = false;
    }

    /// Calls `processReplacing` over every channel of both buffers.
    pub fn process_audio(&mut self, input: &mut SampleBuffer, output: &mut SampleBuffer) {
        let Some(process) = self.effect_ref().and_then(|effect| effect.process_replacing) else {
            return;
        };
        let frames = input.block_size().min(output.block_size());

        self.input_ptrs.clear();
        self.input_ptrs
            .extend(input.channels_mut().iter_mut().map(|c| c.as_mut_ptr()));
        self.output_ptrs.clear();
        self.output_ptrs
            .extend(output.channels_mut().iter_mut().map(|c| c.as_mut_ptr()));

        unsafe {
            process(
                self.effect,
                self.input_ptrs.as_mut_ptr(),
                self.output_ptrs.as_mut_ptr(),
                frames as i32,
            )
        };
    }

    /// Sends one block's events with note-offs first.
    ///
    /// The `VstEvents` block is kept until the next call here (or `close`),
    /// since plugins may read it during the following `processReplacing`.
    pub fn process_midi(&mut self, events: &[MidiEvent]) {
        if events.is_empty() || !self.is_open() {
            return;
        }
        let converted = to_vst_events(events);
        if converted.is_empty() {
            return;
        }
        let header = self.events.fill(converted);
        self.dispatch(eff::PROCESS_EVENTS, 0, 0, header as *mut c_void, 0.0);
    }

    pub fn get_setting(&self, setting: PluginSetting) -> u64 {
        let Some(effect) = self.effect_ref() else {
            return 0;
        };
        match setting {
            PluginSetting::TailTimeMs => {
                let raw = self.dispatch(eff::GET_TAIL_SIZE, 0, 0, ptr::null_mut(), 0.0);
                tail_size_to_ms(raw, self.host.settings().sample_rate())
            }
            PluginSetting::NumInputs => effect.num_inputs.max(0) as u64,
            PluginSetting::NumOutputs => effect.num_outputs.max(0) as u64,
            PluginSetting::InitialDelayFrames => effect.initial_delay.max(0) as u64,
        }
    }

    pub fn num_params(&self) -> usize {
        self.effect_ref()
            .map(|effect| effect.num_params.max(0) as usize)
            .unwrap_or(0)
    }

    pub fn set_parameter(&mut self, index: usize, value: f32) -> Result<()> {
        if index >= self.num_params() {
            return Err(Error::InvalidParameter {
                plugin: self.name.clone(),
                index,
            });
        }
        if let Some(set) = self.effect_ref().and_then(|effect| effect.set_parameter) {
            unsafe { set(self.effect, index as i32, value) };
        }
        Ok(())
    }

    pub fn get_parameter(&self, index: usize) -> Option<f32> {
        if index >= self.num_params() {
            return None;
        }
        let get = self.effect_ref()?.get_parameter?;
        Some(unsafe { get(self.effect, index as i32) })
    }

    pub fn set_program(&mut self, program: i32) {
        self.dispatch(eff::SET_PROGRAM, 0, program as isize, ptr::null_mut(), 0.0);
    }

    pub fn get_program(&self) -> i32 {
        self.dispatch(eff::GET_PROGRAM, 0, 0, ptr::null_mut(), 0.0) as i32
    }

    /// Hands an opaque state blob to the plugin.
    pub fn set_chunk(&mut self, data: &[u8], is_preset: bool) -> isize {
        self.dispatch(
            eff::SET_CHUNK,
            i32::from(is_preset),
            data.len() as isize,
            data.as_ptr() as *mut c_void,
            0.0,
        )
    }

    pub fn unique_id(&self) -> u32 {
        self.effect_ref()
            .map(|effect| effect.unique_id as u32)
            .unwrap_or(0)
    }

    /// Sub-plugins of a shell module as `(id, name)` pairs.
    pub fn shell_plugins(&self) -> Vec<(u32, String)> {
        let mut plugins = Vec::new();
        loop {
            let mut buffer = [0u8; MAX_STRING_LEN];
            let id = self.dispatch(
                eff::SHELL_GET_NEXT_PLUGIN,
                0,
                0,
                buffer.as_mut_ptr() as *mut c_void,
                0.0,
            );
            if id == 0 || plugins.len() >= 4096 {
                break;
            }
            plugins.push((id as u32, c_buffer_to_string(&buffer)));
        }
        plugins
    }

    /// Logs everything the plugin reports about itself.
    pub fn display_info(&self) {
        let Some(effect) = self.effect_ref() else {
            warn!("Plugin '{}' is not open", self.name);
            return;
        };
        let category = self.dispatch(eff::GET_PLUG_CATEGORY, 0, 0, ptr::null_mut(), 0.0);

        info!("Information for VST2 plugin '{}'", self.name);
        info!("  Vendor: {}", self.dispatch_string(eff::GET_VENDOR_STRING, 0));
        info!("  Product: {}", self.dispatch_string(eff::GET_PRODUCT_STRING, 0));
        info!(
            "  Vendor version: {}",
            self.dispatch(eff::GET_VENDOR_VERSION, 0, 0, ptr::null_mut(), 0.0)
        );
        info!("  Unique ID: {}", id_to_string(effect.unique_id as u32));
        info!("  Category: {}", category::name(category));
        info!("  Version: {}", effect.version);
        info!("  I/O: {} in / {} out", effect.num_inputs, effect.num_outputs);
        info!("  Initial delay: {} frames", effect.initial_delay);

        if self.is_shell && self.shell_id.is_none() {
            info!("  Shell sub-plugins:");
            for (id, name) in self.shell_plugins() {
                info!("    {}:{} ({})", self.name, id_to_string(id), name);
            }
            return;
        }

        info!("  Parameters ({}):", effect.num_params);
        for index in 0..self.num_params() {
            let name = self.dispatch_string(eff::GET_PARAM_NAME, index as i32);
            let value = self.get_parameter(index).unwrap_or_default();
            info!("    {}: {} = {:.6}", index, name, value);
        }

        info!("  Programs ({}):", effect.num_programs);
        for index in 0..effect.num_programs.max(0) {
            let name = self.dispatch_string(eff::GET_PROGRAM_NAME_INDEXED, index);
            info!("    {}: {}", index, name);
        }
        info!("  Current program: {}", self.get_program());

        info!("  Common canDo's:");
        for capability in COMMON_CAN_DO {
            let mut query = capability.as_bytes().to_vec();
            query.push(0);
            let answer = self.dispatch(eff::CAN_DO, 0, 0, query.as_mut_ptr() as *mut c_void, 0.0);
            let answer = match answer {
                1 => "yes",
                -1 => "no",
                _ => "don't know",
            };
            info!("    {}: {}", capability, answer);
        }
    }

    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        info!("Closing VST2 plugin '{}'", self.name);
        if self.is_resumed {
            self.suspend();
        }
        self.dispatch(eff::CLOSE, 0, 0, ptr::null_mut(), 0.0);
        self.effect = ptr::null_mut();
        self.events.clear();
        // Unloading the module must come after effClose.
        self.library = None;
    }
}

impl Drop for Vst2Plugin {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sends mono/stereo speaker layouts sized to the given channel counts.
///
/// # Safety
///
/// `effect` must point to a live `AEffect`.
pub(super) unsafe fn set_speaker_arrangement(
    effect: *mut AEffect,
    inputs: i32,
    outputs: i32,
) -> isize {
    let Some(dispatcher) = (*effect).dispatcher else {
        return 0;
    };
    let mut input = VstSpeakerArrangement::for_channels(inputs);
    let mut output = VstSpeakerArrangement::for_channels(outputs);
    dispatcher(
        effect,
        eff::SET_SPEAKER_ARRANGEMENT,
        0,
        &mut input as *mut VstSpeakerArrangement as isize,
        &mut output as *mut VstSpeakerArrangement as *mut c_void,
        0.0,
    )
}

/// Raw `effGetTailSize` answers of 0 and 1 both mean no tail.
pub fn tail_size_to_ms(raw: isize, sample_rate: f64) -> u64 {
    if raw <= 1 || sample_rate <= 0.0 {
        return 0;
    }
    (raw as f64 * 1000.0 / sample_rate) as u64
}

fn c_buffer_to_string(buffer: &[u8]) -> String {
    let end = buffer.iter().position(|b| *b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).trim().to_string()
}
