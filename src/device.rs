use crate::config::DriverConfig;
use crate::fusion::{PoseFusion, ScaledFusion};
use crate::hid::{Backend, Transport};
use crate::poll;
use crate::protocol::{self, Report, FEATURE_BUFFER_SIZE, REPORT_SIZE};
use crate::types::{
    BaseStation, ControllerState, DeviceDescriptor, DeviceProperties, FloatKind, FloatValue, Pose,
};
use crate::{NoloError, Result};
use hidapi::HidApi;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DRIVER_NAME: &str = "NOLO VR CV1 driver";
pub const VENDOR_NAME: &str = "LYRobotix";
pub const PRODUCT_NAME: &str = "NOLO CV1";

static DRIVER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn create_hid_api(config: &DriverConfig) -> Result<HidApi> {
    let api = HidApi::new()?;
    #[cfg(target_os = "macos")]
    {
        api.set_open_exclusive(config.open_exclusive);
    }
    #[cfg(not(target_os = "macos"))]
    let _ = config;
    Ok(api)
}

/// Host-facing device surface shared by all drivers.
pub trait HostDevice {
    /// Per-frame update: drain and decode all queued reports.
    fn update(&mut self) -> Result<()>;

    fn getf(&self, kind: FloatKind) -> Result<FloatValue>;

    /// Release the device. Must be called at most once.
    fn close(self: Box<Self>);
}

/// Owns the transport backend for the lifetime of the driver.
///
/// With the default hidapi backend, creating the driver initializes the
/// HID library. The hidapi context is process-wide: dropping the driver
/// releases its handle to it, but the library itself is never torn down.
pub struct Driver<B: Backend = HidApi> {
    id: u64,
    backend: B,
    config: DriverConfig,
}

impl Driver<HidApi> {
    /// Driver over hidapi, configured from the environment.
    pub fn new() -> Result<Self> {
        Self::with_config(DriverConfig::from_env())
    }

    pub fn with_config(config: DriverConfig) -> Result<Self> {
        let api = create_hid_api(&config)?;
        Ok(Self::with_backend(api, config))
    }
}

impl<B: Backend> Driver<B> {
    pub fn with_backend(backend: B, config: DriverConfig) -> Self {
        Self {
            id: DRIVER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            backend,
            config,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Scan for attached devices, one descriptor per match, in
    /// enumeration order.
    pub fn device_list(&mut self) -> Result<Vec<DeviceDescriptor>> {
        let entries = self
            .backend
            .enumerate(self.config.vendor_id, self.config.product_id)?;

        Ok(entries
            .into_iter()
            .filter(|e| e.vendor_id == self.config.vendor_id && e.product_id == self.config.product_id)
            .map(|e| DeviceDescriptor {
                driver: DRIVER_NAME.to_string(),
                vendor: VENDOR_NAME.to_string(),
                product: PRODUCT_NAME.to_string(),
                revision: 0,
                path: e.path,
                driver_id: self.id,
            })
            .collect())
    }

    /// Open the first device found by a fresh scan.
    pub fn open_first(&mut self) -> Result<Device<B::Transport>> {
        let desc = self
            .device_list()?
            .into_iter()
            .next()
            .ok_or(NoloError::DeviceNotFound)?;
        self.open_device(&desc)
    }

    /// Open the device behind `desc`.
    ///
    /// Any failure after the transport was opened drops it again before
    /// returning, so an aborted open holds no handle.
    pub fn open_device(&mut self, desc: &DeviceDescriptor) -> Result<Device<B::Transport>> {
        if desc.driver_id != self.id {
            return Err(NoloError::ForeignDescriptor);
        }

        let mut transport = self.backend.open(&desc.path).map_err(|e| {
            log::error!("{}", e);
            e
        })?;

        if let Err(e) = transport.set_nonblocking() {
            log::error!("{}", e);
            return Err(e);
        }

        let device = Device::new(transport, desc.path.clone(), DeviceProperties::default());
        log::info!("Opened {} at {}", PRODUCT_NAME, desc.path);
        Ok(device)
    }
}

impl<B: Backend> Drop for Driver<B> {
    fn drop(&mut self) {
        log::debug!("shutting down {} driver", PRODUCT_NAME);
    }
}

/// Mutable tracking state of one open device.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceState {
    pose: Pose,
    /// Recentering position of the HMD marker, raw wire units.
    home: [i16; 3],
    controllers: [ControllerState; 2],
    base_station: Option<BaseStation>,
}

impl DeviceState {
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn home(&self) -> [i16; 3] {
        self.home
    }

    pub fn controller(&self, index: usize) -> Option<&ControllerState> {
        self.controllers.get(index)
    }

    pub fn base_station(&self) -> Option<BaseStation> {
        self.base_station
    }

    /// Write one decoded report into the state. Each slot is replaced
    /// as a whole or not at all.
    pub fn apply(&mut self, report: &Report, fusion: &mut dyn PoseFusion) {
        match report {
            Report::ControllerPair(decoded) => {
                for (index, (slot, controller)) in
                    self.controllers.iter_mut().zip(decoded.iter()).enumerate()
                {
                    let Some(c) = controller else {
                        log::debug!("controller {}: unsupported record version", index);
                        continue;
                    };
                    let pose = fusion.fuse(&c.raw).unwrap_or(slot.pose);
                    *slot = ControllerState {
                        pose,
                        buttons: c.buttons,
                        touch: c.touch,
                        battery: c.battery,
                    };
                }
            }
            Report::HmdFrame {
                marker,
                base_station,
            } => {
                match marker {
                    Some(m) => {
                        // Home and pose always come from the same frame.
                        if let Some(pose) = fusion.fuse(&m.raw) {
                            self.pose = pose;
                            self.home = m.home;
                        }
                    }
                    None => log::debug!("hmd marker: unsupported record version"),
                }
                if base_station.is_some() {
                    self.base_station = *base_station;
                }
            }
            Report::Unrecognized(tag) => {
                log::warn!("unknown message type: {}", tag);
            }
        }
    }
}

/// An open NOLO device.
pub struct Device<T: Transport> {
    // Declared first so it is released before the rest of the state.
    transport: T,
    state: DeviceState,
    properties: DeviceProperties,
    fusion: Box<dyn PoseFusion>,
    buffer: [u8; REPORT_SIZE],
    path: String,
}

impl<T: Transport> Device<T> {
    pub(crate) fn new(transport: T, path: String, properties: DeviceProperties) -> Self {
        Self {
            transport,
            state: DeviceState::default(),
            properties,
            fusion: Box::new(ScaledFusion::default()),
            buffer: [0u8; REPORT_SIZE],
            path,
        }
    }

    /// Replace the fusion step applied to decoded poses.
    pub fn with_fusion(mut self, fusion: impl PoseFusion + 'static) -> Self {
        self.fusion = Box::new(fusion);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn properties(&self) -> &DeviceProperties {
        &self.properties
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn pose(&self) -> Pose {
        self.state.pose
    }

    pub fn controller(&self, index: usize) -> Option<&ControllerState> {
        self.state.controller(index)
    }

    pub fn base_station(&self) -> Option<BaseStation> {
        self.state.base_station
    }

    /// Drain the input queue and apply every report. Returns the number of
    /// reports read.
    ///
    /// Malformed reports are logged and skipped. A read error ends this
    /// call; the device stays open and the next call reads again.
    pub fn poll(&mut self) -> Result<usize> {
        let Self {
            transport,
            state,
            fusion,
            buffer,
            ..
        } = self;

        let result = poll::drain(transport, buffer, |raw| match protocol::decode(raw) {
            Ok(report) => state.apply(&report, &mut **fusion),
            Err(e) => log::warn!("{}", e),
        });

        if let Err(e) = &result {
            log::error!("{}", e);
        }
        result
    }

    /// Current HMD rotation or position. Never reads from the device.
    pub fn getf(&self, kind: FloatKind) -> Result<FloatValue> {
        match kind {
            FloatKind::RotationQuat => Ok(FloatValue::Quat(self.state.pose.rotation)),
            FloatKind::PositionVector => Ok(FloatValue::Vec3(self.state.pose.position)),
            other => Err(NoloError::InvalidFloatKind(other.code())),
        }
    }

    /// Query device state: `cmd` goes at offset 0 of a zeroed buffer, the
    /// device fills in the rest.
    pub fn get_feature_report(&mut self, cmd: u8) -> Result<[u8; FEATURE_BUFFER_SIZE]> {
        let mut buf = protocol::build_feature_request(cmd);
        self.transport.get_feature_report(&mut buf)?;
        Ok(buf)
    }

    pub fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        self.transport.send_feature_report(data)
    }

    /// Close the transport, then release the session state.
    pub fn close(self) {
        log::debug!("closing device {}", self.path);
        let Device {
            transport, state, ..
        } = self;
        drop(transport);
        drop(state);
    }
}

impl<T: Transport> HostDevice for Device<T> {
    fn update(&mut self) -> Result<()> {
        self.poll().map(|_| ())
    }

    fn getf(&self, kind: FloatKind) -> Result<FloatValue> {
        Device::getf(self, kind)
    }

    fn close(self: Box<Self>) {
        Device::close(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{RECORD_VERSION, TAG_CONTROLLERS, TAG_HMD};
    use crate::types::{Buttons, ControllerReport, HmdMarker, RawPose};

    fn raw(position: [i16; 3]) -> RawPose {
        RawPose {
            position,
            orientation: [1, 0, 0, 0],
        }
    }

    #[test]
    fn test_hmd_frame_updates_pose_only() {
        let mut state = DeviceState::default();
        let mut fusion = ScaledFusion::default();
        let report = Report::HmdFrame {
            marker: Some(HmdMarker {
                home: [1, 2, 3],
                raw: raw([10000, 0, 0]),
            }),
            base_station: Some(BaseStation { battery: 50 }),
        };
        state.apply(&report, &mut fusion);

        assert!((state.pose().position[0] - 1.0).abs() < 1e-6);
        assert_eq!(state.home(), [1, 2, 3]);
        assert_eq!(state.base_station(), Some(BaseStation { battery: 50 }));
        assert_eq!(state.controller(0), Some(&ControllerState::default()));
        assert_eq!(state.controller(1), Some(&ControllerState::default()));
    }

    #[test]
    fn test_controller_pair_fills_own_slots() {
        let mut state = DeviceState::default();
        let mut fusion = ScaledFusion::default();
        let second = ControllerReport {
            raw: raw([0, 10000, 0]),
            buttons: Buttons::GRIP,
            touch: [1, 2],
            battery: 3,
        };
        state.apply(&Report::ControllerPair([None, Some(second)]), &mut fusion);

        assert_eq!(state.controller(0), Some(&ControllerState::default()));
        let c1 = state.controller(1).unwrap();
        assert_eq!(c1.buttons, Buttons::GRIP);
        assert!((c1.pose.position[1] - 1.0).abs() < 1e-6);
        assert_eq!(state.pose(), Pose::IDENTITY);
        assert!(state.controller(2).is_none());
    }

    #[test]
    fn test_zero_quaternion_keeps_previous_pose() {
        let mut state = DeviceState::default();
        let mut fusion = ScaledFusion::default();
        let report = Report::HmdFrame {
            marker: Some(HmdMarker {
                home: [0; 3],
                raw: RawPose {
                    position: [500, 500, 500],
                    orientation: [0; 4],
                },
            }),
            base_station: None,
        };
        state.apply(&report, &mut fusion);
        assert_eq!(state.pose(), Pose::IDENTITY);
    }

    #[test]
    fn test_rejected_marker_keeps_home() {
        let mut state = DeviceState::default();
        let mut fusion = ScaledFusion::default();
        let frame = |home: [i16; 3], orientation: [i16; 4]| Report::HmdFrame {
            marker: Some(HmdMarker {
                home,
                raw: RawPose {
                    position: [10000, 0, 0],
                    orientation,
                },
            }),
            base_station: None,
        };

        state.apply(&frame([1, 1, 1], [1, 0, 0, 0]), &mut fusion);
        assert_eq!(state.home(), [1, 1, 1]);

        state.apply(&frame([9, 9, 9], [0; 4]), &mut fusion);
        assert_eq!(state.home(), [1, 1, 1]);
        assert!((state.pose().position[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unrecognized_leaves_state() {
        let mut state = DeviceState::default();
        state.apply(&Report::Unrecognized(0x11), &mut ScaledFusion::default());
        assert_eq!(state, DeviceState::default());
    }

    #[test]
    fn test_decoded_bytes_reach_state() {
        let mut report = [0u8; REPORT_SIZE];
        report[0] = TAG_CONTROLLERS;
        report[1..3].copy_from_slice(&RECORD_VERSION);
        report[1 + 9] = 0x40;
        report[1 + 17] = Buttons::MENU.bits();
        report[42..44].copy_from_slice(&RECORD_VERSION);
        report[42 + 9] = 0x40;
        report[42 + 21] = 99;

        let mut state = DeviceState::default();
        state.apply(&protocol::decode(&report).unwrap(), &mut ScaledFusion::default());
        assert_eq!(state.controller(0).unwrap().buttons, Buttons::MENU);
        assert_eq!(state.controller(1).unwrap().battery, 99);

        report[0] = TAG_HMD;
        assert!(matches!(
            protocol::decode(&report).unwrap(),
            Report::HmdFrame { marker: None, base_station: None }
        ));
    }
}
