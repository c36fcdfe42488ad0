//! # nolo - Rust driver for the NOLO CV1 VR tracking kit
//!
//! Decodes the kit's 64-byte HID input reports (HMD marker, two hand
//! controllers, base station) into poses. Provides:
//! - Device discovery by vendor/product id
//! - Non-blocking, drain-to-empty polling driven by the host's frame loop
//! - C FFI for integration with C/C++ hosts
//!
//! ## Quick Start
//! ```no_run
//! use nolo::{Driver, FloatKind};
//!
//! let mut driver = Driver::new().unwrap();
//! let mut device = driver.open_first().unwrap();
//! loop {
//!     device.poll().unwrap();
//!     println!("rot: {:?}", device.getf(FloatKind::RotationQuat).unwrap());
//!     # break;
//! }
//! ```

pub mod error;
pub mod types;
pub mod protocol;
pub mod fusion;
pub mod hid;
pub mod poll;
pub mod config;
pub mod device;
pub mod ffi;

pub use config::DriverConfig;
pub use device::{Device, DeviceState, Driver, HostDevice};
pub use error::NoloError;
pub use fusion::{PoseFusion, ScaledFusion};
pub use hid::{Backend, HidEntry, HidTransport, Transport};
pub use protocol::Report;
pub use types::*;

/// Result type alias for nolo operations.
pub type Result<T> = std::result::Result<T, NoloError>;
