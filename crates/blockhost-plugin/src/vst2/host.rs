//! Host side of the VST2 callback protocol.
//!
//! Plugins call back into the host from inside almost any dispatcher call,
//! including from their entry point before the host has an `AEffect` to
//! associate with them. The callback therefore answers from one process-wide
//! [`HostContext`] installed before a module is loaded, rather than from the
//! plugin handle that is still being built.

use super::abi::{
    audio_master, time_flags, AEffect, VstTimeInfo, MAX_VENDOR_STR_LEN,
};
use blockhost_core::{FrozenSettings, TransportSnapshot};
use parking_lot::{Mutex, RwLock};
use std::ffi::{c_char, c_void, CStr};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Host version reported for `audioMasterVersion` (VST 2.4).
pub const HOST_VST_VERSION: isize = 2400;

const HOST_NAME: &str = "blockhost";

/// Capabilities the host answers "yes" to.
const CAN_DO_YES: &[&str] = &[
    "sendVstEvents",
    "sendVstMidiEvent",
    "sendVstTimeInfo",
    "startStopProcess",
    "shellCategory",
];

/// Capabilities the host answers "no" to.
const CAN_DO_NO: &[&str] = &["offline", "openFileSelector", "editFile"];

/// The shell sub-id a module will see from `audioMasterCurrentId`.
#[derive(Debug, Default)]
pub struct ShellIdSlot(AtomicU32);

impl ShellIdSlot {
    pub fn set(&self, id: u32) {
        self.0.store(id, Ordering::Relaxed);
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything the callback is allowed to read.
pub struct HostContext {
    settings: FrozenSettings,
    shell_id: ShellIdSlot,
    current_sample: AtomicU64,
    is_playing: AtomicBool,
    transport_changed: AtomicBool,
    time_info: Mutex<Box<VstTimeInfo>>,
    io_inputs: AtomicI32,
    io_outputs: AtomicI32,
}

impl HostContext {
    pub fn new(settings: FrozenSettings) -> Arc<Self> {
        Arc::new(Self {
            settings,
            shell_id: ShellIdSlot::default(),
            current_sample: AtomicU64::new(0),
            is_playing: AtomicBool::new(false),
            transport_changed: AtomicBool::new(false),
            time_info: Mutex::new(Box::default()),
            io_inputs: AtomicI32::new(0),
            io_outputs: AtomicI32::new(0),
        })
    }

    pub fn settings(&self) -> &FrozenSettings {
        &self.settings
    }

    pub fn shell_id(&self) -> &ShellIdSlot {
        &self.shell_id
    }

    /// Records the clock position plugins will see from `audioMasterGetTime`.
    pub fn publish_transport(&self, snapshot: TransportSnapshot) {
        self.current_sample
            .store(snapshot.current_sample, Ordering::Relaxed);
        self.is_playing.store(snapshot.is_playing, Ordering::Relaxed);
        self.transport_changed
            .store(snapshot.transport_changed, Ordering::Relaxed);
    }

    pub fn transport(&self) -> TransportSnapshot {
        TransportSnapshot {
            current_sample: self.current_sample.load(Ordering::Relaxed),
            is_playing: self.is_playing.load(Ordering::Relaxed),
            transport_changed: self.transport_changed.load(Ordering::Relaxed),
        }
    }

    /// Channel counts from the most recent `audioMasterIOChanged`.
    pub fn io_counts(&self) -> (i32, i32) {
        (
            self.io_inputs.load(Ordering::Relaxed),
            self.io_outputs.load(Ordering::Relaxed),
        )
    }

    fn time_info(&self) -> *mut VstTimeInfo {
        let transport = self.transport();
        let signature = self.settings.time_signature();
        let numerator = signature.numerator.max(1) as f64;

        let mut guard = self.time_info.lock();
        let info: &mut VstTimeInfo = &mut guard;
        *info = VstTimeInfo::default();

        info.sample_pos = transport.current_sample as f64;
        info.sample_rate = self.settings.sample_rate();
        info.tempo = self.settings.tempo();
        info.ppq_pos = info.sample_pos / self.settings.samples_per_beat() + 1.0;
        info.bar_start_pos = (info.ppq_pos / numerator).floor() * numerator + 1.0;
        info.time_sig_numerator = signature.numerator as i32;
        info.time_sig_denominator = signature.denominator as i32;

        info.flags = time_flags::TEMPO_VALID
            | time_flags::TIME_SIG_VALID
            | time_flags::PPQ_POS_VALID
            | time_flags::BARS_VALID;
        if transport.is_playing {
            info.flags |= time_flags::TRANSPORT_PLAYING;
        }
        if transport.transport_changed {
            info.flags |= time_flags::TRANSPORT_CHANGED;
        }

        // The box never moves, so the pointer stays valid after the guard drops.
        info as *mut VstTimeInfo
    }
}

static ACTIVE_HOST: RwLock<Option<Arc<HostContext>>> = parking_lot::const_rwlock(None);

/// Makes `context` the one answering plugin callbacks.
pub fn install(context: &Arc<HostContext>) {
    *ACTIVE_HOST.write() = Some(Arc::clone(context));
}

pub fn active() -> Option<Arc<HostContext>> {
    ACTIVE_HOST.read().clone()
}

/// The function pointer handed to every module's entry point.
pub unsafe extern "C" fn host_callback(
    effect: *mut AEffect,
    opcode: i32,
    index: i32,
    value: isize,
    ptr: *mut c_void,
    opt: f32,
) -> isize {
    // Clone out of the lock first: answering may re-enter the plugin.
    match active() {
        Some(context) => respond(&context, effect, opcode, index, value, ptr, opt),
        None if opcode == audio_master::VERSION => HOST_VST_VERSION,
        None => 0,
    }
}

/// Answers one host callback.
///
/// # Safety
///
/// `effect` must be null or point to a live `AEffect`. `ptr` must satisfy
/// the opcode's contract: a NUL-terminated string for `canDo`, a writable
/// buffer of at least 64 bytes for the vendor and product queries.
pub unsafe fn respond(
    context: &HostContext,
    effect: *mut AEffect,
    opcode: i32,
    index: i32,
    value: isize,
    ptr: *mut c_void,
    opt: f32,
) -> isize {
    match opcode {
        audio_master::AUTOMATE => 0,
        audio_master::VERSION => HOST_VST_VERSION,
        audio_master::CURRENT_ID => context.shell_id.get() as i32 as isize,
        audio_master::IDLE => 1,
        audio_master::WANT_MIDI => 1,
        audio_master::GET_TIME => context.time_info() as isize,
        audio_master::IO_CHANGED => io_changed(context, effect),
        audio_master::SIZE_WINDOW => 0,
        audio_master::GET_SAMPLE_RATE => context.settings.sample_rate() as isize,
        audio_master::GET_BLOCK_SIZE => context.settings.block_size() as isize,
        audio_master::GET_INPUT_LATENCY | audio_master::GET_OUTPUT_LATENCY => 0,
        audio_master::GET_CURRENT_PROCESS_LEVEL => 0,
        audio_master::GET_AUTOMATION_STATE => 0,
        audio_master::GET_VENDOR_STRING | audio_master::GET_PRODUCT_STRING => {
            if write_c_string(ptr, MAX_VENDOR_STR_LEN, HOST_NAME) {
                1
            } else {
                0
            }
        }
        audio_master::GET_VENDOR_VERSION => vendor_version(),
        audio_master::CAN_DO => can_do(ptr),
        audio_master::GET_LANGUAGE => 1,
        audio_master::UPDATE_DISPLAY => 0,
        other => {
            debug!(
                "Unhandled host callback opcode {} (index {}, value {}, opt {})",
                other, index, value, opt
            );
            0
        }
    }
}

unsafe fn io_changed(context: &HostContext, effect: *mut AEffect) -> isize {
    if effect.is_null() {
        return 0;
    }
    let (inputs, outputs) = ((*effect).num_inputs, (*effect).num_outputs);
    context.io_inputs.store(inputs, Ordering::Relaxed);
    context.io_outputs.store(outputs, Ordering::Relaxed);
    debug!("Plugin I/O changed to {} in / {} out", inputs, outputs);
    super::plugin::set_speaker_arrangement(effect, inputs, outputs);
    1
}

unsafe fn can_do(ptr: *mut c_void) -> isize {
    let Some(capability) = read_c_str(ptr) else {
        return 0;
    };
    if CAN_DO_YES.contains(&capability) {
        1
    } else if CAN_DO_NO.contains(&capability) {
        -1
    } else {
        debug!("Plugin asked host canDo '{}'", capability);
        0
    }
}

/// `major * 1000 + minor * 100 + patch`, e.g. 1.2.3 -> 1203.
fn vendor_version() -> isize {
    let part = |s: &str| s.parse::<isize>().unwrap_or(0);
    part(env!("CARGO_PKG_VERSION_MAJOR")) * 1000
        + part(env!("CARGO_PKG_VERSION_MINOR")) * 100
        + part(env!("CARGO_PKG_VERSION_PATCH"))
}

/// Copies `text` into a C buffer of `capacity` bytes, always NUL-terminating.
pub(crate) unsafe fn write_c_string(ptr: *mut c_void, capacity: usize, text: &str) -> bool {
    if ptr.is_null() || capacity == 0 {
        return false;
    }
    let len = text.len().min(capacity - 1);
    let dest = ptr as *mut u8;
    std::ptr::copy_nonoverlapping(text.as_ptr(), dest, len);
    *dest.add(len) = 0;
    true
}

unsafe fn read_c_str<'a>(ptr: *mut c_void) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr as *const c_char).to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockhost_core::Settings;
    use std::ptr;

    fn context() -> Arc<HostContext> {
        let mut settings = Settings::default();
        settings.set_sample_rate(48000.0);
        settings.set_block_size(256);
        HostContext::new(settings.freeze())
    }

    fn ask(context: &HostContext, opcode: i32) -> isize {
        unsafe { respond(context, ptr::null_mut(), opcode, 0, 0, ptr::null_mut(), 0.0) }
    }

    #[test]
    fn test_fixed_answers() {
        let context = context();
        assert_eq!(ask(&context, audio_master::VERSION), 2400);
        assert_eq!(ask(&context, audio_master::GET_SAMPLE_RATE), 48000);
        assert_eq!(ask(&context, audio_master::GET_BLOCK_SIZE), 256);
        assert_eq!(ask(&context, audio_master::GET_INPUT_LATENCY), 0);
        assert_eq!(ask(&context, audio_master::WANT_MIDI), 1);
        assert_eq!(ask(&context, audio_master::GET_LANGUAGE), 1);
        assert_eq!(ask(&context, 9999), 0);
    }

    #[test]
    fn test_current_id_reads_slot() {
        let context = context();
        assert_eq!(ask(&context, audio_master::CURRENT_ID), 0);
        context.shell_id().set(crate::id::id_from_str("ABCD"));
        assert_eq!(ask(&context, audio_master::CURRENT_ID), 0x41424344);
    }

    #[test]
    fn test_can_do() {
        let context = context();
        let query = |name: &str| {
            let c = std::ffi::CString::new(name).unwrap();
            unsafe {
                respond(
                    &context,
                    ptr::null_mut(),
                    audio_master::CAN_DO,
                    0,
                    0,
                    c.as_ptr() as *mut c_void,
                    0.0,
                )
            }
        };
        assert_eq!(query("sendVstEvents"), 1);
        assert_eq!(query("shellCategory"), 1);
        assert_eq!(query("offline"), -1);
        assert_eq!(query("supplyIdle"), 0);
    }

    #[test]
    fn test_vendor_string() {
        let context = context();
        let mut buffer = [0xffu8; 64];
        let result = unsafe {
            respond(
                &context,
                ptr::null_mut(),
                audio_master::GET_VENDOR_STRING,
                0,
                0,
                buffer.as_mut_ptr() as *mut c_void,
                0.0,
            )
        };
        assert_eq!(result, 1);
        let text = CStr::from_bytes_until_nul(&buffer).unwrap();
        assert_eq!(text.to_str().unwrap(), "blockhost");
    }

    #[test]
    fn test_time_info_tracks_transport() {
        let context = context();
        context.publish_transport(TransportSnapshot {
            current_sample: 48000,
            is_playing: true,
            transport_changed: false,
        });
        let info = ask(&context, audio_master::GET_TIME) as *const VstTimeInfo;
        assert!(!info.is_null());
        let info = unsafe { &*info };

        assert_eq!(info.sample_pos, 48000.0);
        assert_eq!(info.tempo, 120.0);
        // One second at 120 BPM is two beats past the first.
        assert!((info.ppq_pos - 3.0).abs() < 1e-9);
        assert_eq!(info.bar_start_pos, 1.0);
        assert_eq!(info.time_sig_numerator, 4);
        assert_ne!(info.flags & time_flags::TRANSPORT_PLAYING, 0);
        assert_eq!(info.flags & time_flags::TRANSPORT_CHANGED, 0);
        assert_ne!(info.flags & time_flags::TEMPO_VALID, 0);
    }

    #[test]
    fn test_io_changed_without_effect_is_ignored() {
        let context = context();
        assert_eq!(ask(&context, audio_master::IO_CHANGED), 0);
        assert_eq!(context.io_counts(), (0, 0));
    }
}
