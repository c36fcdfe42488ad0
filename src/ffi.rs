//! C ABI for hosts that drive devices through opaque handles.
//!
//! The generated C header is written to `include/nolo.h` by cbindgen.

use crate::device::{Device, Driver};
use crate::error::LastError;
use crate::hid::HidTransport;
use crate::types::{DeviceDescriptor, FloatKind};
use std::ffi::{c_char, c_float, c_int};

/// Process-wide last error message for C consumers.
static LAST_ERROR: LastError = LastError::new();

/// Opaque driver handle for C consumers.
pub struct NoloDriver(Driver);

/// Opaque device handle for C consumers.
pub struct NoloDevice(Device<HidTransport>);

/// Device descriptor in C-compatible layout.
#[repr(C)]
pub struct NoloDeviceDesc {
    /// Null-terminated driver display name.
    pub driver: [c_char; 64],
    /// Null-terminated vendor display name.
    pub vendor: [c_char; 64],
    /// Null-terminated product display name.
    pub product: [c_char; 64],
    pub revision: c_int,
    /// Null-terminated transport path.
    pub path: [c_char; 256],
    /// Id of the driver that listed this device.
    pub driver_id: u64,
}

fn str_to_fixed<const N: usize>(s: &str) -> [c_char; N] {
    let mut buf = [0 as c_char; N];
    let bytes = s.as_bytes();
    let len = bytes.len().min(N - 1);
    for (i, &b) in bytes[..len].iter().enumerate() {
        buf[i] = b as c_char;
    }
    buf
}

fn c_char_to_string(buf: &[c_char]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    let bytes: Vec<u8> = buf[..end].iter().map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).to_string()
}

/// Create a driver. Returns NULL on error (check `nolo_last_error()`).
#[no_mangle]
pub extern "C" fn nolo_driver_create() -> *mut NoloDriver {
    match Driver::new() {
        Ok(driver) => Box::into_raw(Box::new(NoloDriver(driver))),
        Err(e) => {
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Destroy a driver. Devices opened from it must be closed first.
///
/// # Safety
/// `drv` must be a pointer returned by `nolo_driver_create`, or null.
#[no_mangle]
pub unsafe extern "C" fn nolo_driver_destroy(drv: *mut NoloDriver) {
    if !drv.is_null() {
        drop(Box::from_raw(drv));
    }
}

/// List attached devices.
///
/// Writes up to `max` entries into `out`. Returns the number of devices
/// written, or -1 on error.
///
/// # Safety
/// `drv` must be a valid driver pointer. `out` must point to an array of at
/// least `max` `NoloDeviceDesc` elements, or be null.
#[no_mangle]
pub unsafe extern "C" fn nolo_list_devices(
    drv: *mut NoloDriver,
    out: *mut NoloDeviceDesc,
    max: c_int,
) -> c_int {
    if drv.is_null() {
        return -1;
    }
    let drv = &mut *drv;
    match drv.0.device_list() {
        Ok(devices) => {
            let count = devices.len().min(max.max(0) as usize);
            if !out.is_null() {
                for (i, dev) in devices.iter().take(count).enumerate() {
                    let desc = NoloDeviceDesc {
                        driver: str_to_fixed(&dev.driver),
                        vendor: str_to_fixed(&dev.vendor),
                        product: str_to_fixed(&dev.product),
                        revision: dev.revision,
                        path: str_to_fixed(&dev.path),
                        driver_id: dev.driver_id,
                    };
                    out.add(i).write(desc);
                }
            }
            count as c_int
        }
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Open the device described by `desc`. Returns NULL on error.
///
/// # Safety
/// `drv` must be a valid driver pointer and `desc` a valid descriptor, or null.
#[no_mangle]
pub unsafe extern "C" fn nolo_open_device(
    drv: *mut NoloDriver,
    desc: *const NoloDeviceDesc,
) -> *mut NoloDevice {
    if drv.is_null() || desc.is_null() {
        return std::ptr::null_mut();
    }
    let drv = &mut *drv;
    let desc = &*desc;

    let descriptor = DeviceDescriptor {
        driver: c_char_to_string(&desc.driver),
        vendor: c_char_to_string(&desc.vendor),
        product: c_char_to_string(&desc.product),
        revision: desc.revision,
        path: c_char_to_string(&desc.path),
        driver_id: desc.driver_id,
    };

    match drv.0.open_device(&descriptor) {
        Ok(dev) => Box::into_raw(Box::new(NoloDevice(dev))),
        Err(e) => {
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Drain and decode all queued reports. Returns 0 on success, -1 on a
/// read error; the device stays usable either way.
///
/// # Safety
/// `dev` must be a valid device pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn nolo_device_update(dev: *mut NoloDevice) -> c_int {
    if dev.is_null() {
        return -1;
    }
    let dev = &mut *dev;
    match dev.0.poll() {
        Ok(_) => 0,
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Copy a float value into `out`: 4 floats for kind 1 (rotation
/// quaternion), 3 floats for kind 6 (position). Returns 0 on success,
/// -1 for any other kind.
///
/// # Safety
/// `dev` must be a valid device pointer. `out` must have room for 4 floats.
#[no_mangle]
pub unsafe extern "C" fn nolo_device_getf(
    dev: *const NoloDevice,
    kind: c_int,
    out: *mut c_float,
) -> c_int {
    if dev.is_null() || out.is_null() {
        return -1;
    }
    let dev = &*dev;
    let result = FloatKind::try_from(kind).and_then(|k| dev.0.getf(k));
    match result {
        Ok(value) => {
            let values = value.as_slice();
            std::ptr::copy_nonoverlapping(values.as_ptr(), out, values.len());
            0
        }
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Close a device and free its resources.
///
/// # Safety
/// `dev` must be a pointer returned by `nolo_open_device`, or null. It must
/// not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn nolo_close_device(dev: *mut NoloDevice) {
    if !dev.is_null() {
        Box::from_raw(dev).0.close();
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next failing call.
///
/// The message slot is shared by the whole process. Only call this from the
/// thread that drives the library: a failure on another thread frees the
/// string the returned pointer refers to.
#[no_mangle]
pub extern "C" fn nolo_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}
