use std::fmt;

/// Errors that can occur when talking to the NOLO kit.
#[derive(Debug, thiserror::Error)]
pub enum NoloError {
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("Device not found (VID=0483 PID=5750)")]
    DeviceNotFound,

    #[error("Could not open {path}. Check your rights. ({reason})")]
    Open { path: String, reason: String },

    #[error("failed to set non-blocking on device: {0}")]
    NonBlocking(String),

    #[error("error reading from device: {0}")]
    Read(String),

    #[error("feature report failed: {0}")]
    FeatureReport(String),

    #[error("short report: tag 0x{tag:02x} needs {needed} bytes, got {got}")]
    ShortReport { tag: u8, needed: usize, got: usize },

    #[error("invalid type given to getf ({0})")]
    InvalidFloatKind(i32),

    #[error("device descriptor belongs to another driver instance")]
    ForeignDescriptor,
}

/// Last-error storage backing `nolo_last_error()` in the C ABI.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &NoloError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
