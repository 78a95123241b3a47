//! C layout of the VST 2.4 plugin interface.
//!
//! Only the pieces the host actually touches are declared. Field order and
//! widths follow the 2.4 SDK headers; `isize` stands in for `VstIntPtr`.

#![allow(dead_code)]

use std::ffi::c_void;

/// `'VstP'`
pub const MAGIC: i32 = 0x5673_7450;

pub type HostCallbackProc = unsafe extern "C" fn(
    effect: *mut AEffect,
    opcode: i32,
    index: i32,
    value: isize,
    ptr: *mut c_void,
    opt: f32,
) -> isize;

pub type DispatcherProc = unsafe extern "C" fn(
    effect: *mut AEffect,
    opcode: i32,
    index: i32,
    value: isize,
    ptr: *mut c_void,
    opt: f32,
) -> isize;

pub type ProcessProc = unsafe extern "C" fn(
    effect: *mut AEffect,
    inputs: *mut *mut f32,
    outputs: *mut *mut f32,
    sample_frames: i32,
);

pub type ProcessDoubleProc = unsafe extern "C" fn(
    effect: *mut AEffect,
    inputs: *mut *mut f64,
    outputs: *mut *mut f64,
    sample_frames: i32,
);

pub type SetParameterProc = unsafe extern "C" fn(effect: *mut AEffect, index: i32, parameter: f32);

pub type GetParameterProc = unsafe extern "C" fn(effect: *mut AEffect, index: i32) -> f32;

/// `VSTPluginMain` / `main`
pub type PluginMainProc = unsafe extern "C" fn(callback: HostCallbackProc) -> *mut AEffect;

#[repr(C)]
pub struct AEffect {
    pub magic: i32,
    pub dispatcher: Option<DispatcherProc>,
    /// Deprecated accumulating process call.
    pub process: Option<ProcessProc>,
    pub set_parameter: Option<SetParameterProc>,
    pub get_parameter: Option<GetParameterProc>,
    pub num_programs: i32,
    pub num_params: i32,
    pub num_inputs: i32,
    pub num_outputs: i32,
    pub flags: i32,
    pub reserved1: isize,
    pub reserved2: isize,
    pub initial_delay: i32,
    pub real_qualities: i32,
    pub off_qualities: i32,
    pub io_ratio: f32,
    pub object: *mut c_void,
    pub user: *mut c_void,
    pub unique_id: i32,
    pub version: i32,
    pub process_replacing: Option<ProcessProc>,
    pub process_double_replacing: Option<ProcessDoubleProc>,
    pub future: [u8; 56],
}

pub mod effect_flags {
    pub const HAS_EDITOR: i32 = 1;
    pub const CAN_REPLACING: i32 = 1 << 4;
    pub const PROGRAM_CHUNKS: i32 = 1 << 5;
    pub const IS_SYNTH: i32 = 1 << 8;
    pub const NO_SOUND_IN_STOP: i32 = 1 << 9;
    pub const CAN_DOUBLE_REPLACING: i32 = 1 << 12;
}

/// Host to plugin opcodes.
pub mod eff {
    pub const OPEN: i32 = 0;
    pub const CLOSE: i32 = 1;
    pub const SET_PROGRAM: i32 = 2;
    pub const GET_PROGRAM: i32 = 3;
    pub const GET_PROGRAM_NAME: i32 = 5;
    pub const GET_PARAM_LABEL: i32 = 6;
    pub const GET_PARAM_DISPLAY: i32 = 7;
    pub const GET_PARAM_NAME: i32 = 8;
    pub const SET_SAMPLE_RATE: i32 = 10;
    pub const SET_BLOCK_SIZE: i32 = 11;
    pub const MAINS_CHANGED: i32 = 12;
    pub const GET_CHUNK: i32 = 23;
    pub const SET_CHUNK: i32 = 24;
    pub const PROCESS_EVENTS: i32 = 25;
    pub const GET_PROGRAM_NAME_INDEXED: i32 = 29;
    pub const GET_PLUG_CATEGORY: i32 = 35;
    pub const SET_SPEAKER_ARRANGEMENT: i32 = 42;
    pub const GET_EFFECT_NAME: i32 = 45;
    pub const GET_VENDOR_STRING: i32 = 47;
    pub const GET_PRODUCT_STRING: i32 = 48;
    pub const GET_VENDOR_VERSION: i32 = 49;
    pub const CAN_DO: i32 = 51;
    pub const GET_TAIL_SIZE: i32 = 52;
    pub const GET_VST_VERSION: i32 = 58;
    pub const SHELL_GET_NEXT_PLUGIN: i32 = 70;
    pub const START_PROCESS: i32 = 71;
    pub const STOP_PROCESS: i32 = 72;
}

/// Plugin to host opcodes.
pub mod audio_master {
    pub const AUTOMATE: i32 = 0;
    pub const VERSION: i32 = 1;
    pub const CURRENT_ID: i32 = 2;
    pub const IDLE: i32 = 3;
    pub const WANT_MIDI: i32 = 6;
    pub const GET_TIME: i32 = 7;
    pub const PROCESS_EVENTS: i32 = 8;
    pub const IO_CHANGED: i32 = 13;
    pub const SIZE_WINDOW: i32 = 15;
    pub const GET_SAMPLE_RATE: i32 = 16;
    pub const GET_BLOCK_SIZE: i32 = 17;
    pub const GET_INPUT_LATENCY: i32 = 18;
    pub const GET_OUTPUT_LATENCY: i32 = 19;
    pub const GET_CURRENT_PROCESS_LEVEL: i32 = 23;
    pub const GET_AUTOMATION_STATE: i32 = 24;
    pub const GET_VENDOR_STRING: i32 = 32;
    pub const GET_PRODUCT_STRING: i32 = 33;
    pub const GET_VENDOR_VERSION: i32 = 34;
    pub const CAN_DO: i32 = 37;
    pub const GET_LANGUAGE: i32 = 38;
    pub const UPDATE_DISPLAY: i32 = 42;
}

/// `VstPlugCategory` values.
pub mod category {
    pub const UNKNOWN: isize = 0;
    pub const EFFECT: isize = 1;
    pub const SYNTH: isize = 2;
    pub const ANALYSIS: isize = 3;
    pub const MASTERING: isize = 4;
    pub const SPACIALIZER: isize = 5;
    pub const ROOM_FX: isize = 6;
    pub const SURROUND_FX: isize = 7;
    pub const RESTORATION: isize = 8;
    pub const OFFLINE_PROCESS: isize = 9;
    pub const SHELL: isize = 10;
    pub const GENERATOR: isize = 11;

    pub fn name(category: isize) -> &'static str {
        match category {
            EFFECT => "Effect",
            SYNTH => "Synth",
            ANALYSIS => "Analysis",
            MASTERING => "Mastering",
            SPACIALIZER => "Spacializer",
            ROOM_FX => "Room FX",
            SURROUND_FX => "Surround FX",
            RESTORATION => "Restoration",
            OFFLINE_PROCESS => "Offline",
            SHELL => "Shell",
            GENERATOR => "Generator",
            _ => "Unknown",
        }
    }
}

/// Upper bound for strings the plugin writes into host buffers.
pub const MAX_STRING_LEN: usize = 256;
/// `kVstMaxVendorStrLen` / `kVstMaxProductStrLen`
pub const MAX_VENDOR_STR_LEN: usize = 64;

pub const MIDI_EVENT_TYPE: i32 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VstMidiEvent {
    pub event_type: i32,
    pub byte_size: i32,
    pub delta_frames: i32,
    pub flags: i32,
    pub note_length: i32,
    pub note_offset: i32,
    pub midi_data: [u8; 4],
    pub detune: i8,
    pub note_off_velocity: u8,
    pub reserved1: u8,
    pub reserved2: u8,
}

/// Generic event header. Every concrete event starts with this layout.
#[repr(C)]
pub struct VstEvent {
    pub event_type: i32,
    pub byte_size: i32,
    pub delta_frames: i32,
    pub flags: i32,
    pub data: [u8; 16],
}

/// Variable-length event list; `events` really has `num_events` entries.
#[repr(C)]
pub struct VstEvents {
    pub num_events: i32,
    pub reserved: isize,
    pub events: [*mut VstEvent; 0],
}

pub mod time_flags {
    pub const TRANSPORT_CHANGED: i32 = 1;
    pub const TRANSPORT_PLAYING: i32 = 1 << 1;
    pub const NANOS_VALID: i32 = 1 << 8;
    pub const PPQ_POS_VALID: i32 = 1 << 9;
    pub const TEMPO_VALID: i32 = 1 << 10;
    pub const BARS_VALID: i32 = 1 << 11;
    pub const CYCLE_POS_VALID: i32 = 1 << 12;
    pub const TIME_SIG_VALID: i32 = 1 << 13;
    pub const SMPTE_VALID: i32 = 1 << 14;
    pub const CLOCK_VALID: i32 = 1 << 15;
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VstTimeInfo {
    pub sample_pos: f64,
    pub sample_rate: f64,
    pub nano_seconds: f64,
    pub ppq_pos: f64,
    pub tempo: f64,
    pub bar_start_pos: f64,
    pub cycle_start_pos: f64,
    pub cycle_end_pos: f64,
    pub time_sig_numerator: i32,
    pub time_sig_denominator: i32,
    pub smpte_offset: i32,
    pub smpte_frame_rate: i32,
    pub samples_to_next_clock: i32,
    pub flags: i32,
}

pub const SPEAKER_ARR_MONO: i32 = 0;
pub const SPEAKER_ARR_STEREO: i32 = 1;
pub const SPEAKER_UNDEFINED: i32 = 0x7fff_ffff;
pub const MAX_SPEAKERS: usize = 8;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct VstSpeakerProperties {
    pub azimuth: f32,
    pub elevation: f32,
    pub radius: f32,
    pub reserved: f32,
    pub name: [u8; 64],
    pub speaker_type: i32,
    pub future: [u8; 28],
}

impl Default for VstSpeakerProperties {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            radius: 0.0,
            reserved: 0.0,
            name: [0; 64],
            speaker_type: SPEAKER_UNDEFINED,
            future: [0; 28],
        }
    }
}

/// Fixed-size stand-in for the SDK's 8-speaker arrangement.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct VstSpeakerArrangement {
    pub arrangement_type: i32,
    pub num_channels: i32,
    pub speakers: [VstSpeakerProperties; MAX_SPEAKERS],
}

impl VstSpeakerArrangement {
    /// Mono for one channel, stereo otherwise; capped at [`MAX_SPEAKERS`].
    pub fn for_channels(channels: i32) -> Self {
        let num_channels = channels.clamp(0, MAX_SPEAKERS as i32);
        Self {
            arrangement_type: if num_channels == 1 {
                SPEAKER_ARR_MONO
            } else {
                SPEAKER_ARR_STEREO
            },
            num_channels,
            speakers: [VstSpeakerProperties::default(); MAX_SPEAKERS],
        }
    }
}
