use crate::{NoloError, Result};
use hidapi::{HidApi, HidDevice};
use std::ffi::CString;

/// One open, duplex connection to a device.
///
/// Dropping the transport closes it. Reads are expected to be
/// non-blocking once `set_nonblocking` succeeded: `Ok(0)` means the
/// input queue is empty, `Err` is an unrecoverable read error.
pub trait Transport {
    fn set_nonblocking(&mut self) -> Result<()>;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// `buf[0]` carries the command; the response is written back into `buf`.
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize>;

    fn send_feature_report(&mut self, data: &[u8]) -> Result<()>;
}

/// Enumeration record copied out of the transport's device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidEntry {
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
}

/// Device enumeration and opening, owned by one `Driver`.
pub trait Backend {
    type Transport: Transport;

    /// Entries matching `vendor_id`/`product_id` exactly, in enumeration order.
    fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> Result<Vec<HidEntry>>;

    fn open(&mut self, path: &str) -> Result<Self::Transport>;
}

/// HID transport over hidapi.
pub struct HidTransport {
    device: HidDevice,
}

impl HidTransport {
    pub fn new(device: HidDevice) -> Self {
        Self { device }
    }
}

impl Transport for HidTransport {
    fn set_nonblocking(&mut self) -> Result<()> {
        self.device
            .set_blocking_mode(false)
            .map_err(|e| NoloError::NonBlocking(e.to_string()))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.device
            .read(buf)
            .map_err(|e| NoloError::Read(e.to_string()))
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.device
            .get_feature_report(buf)
            .map_err(|e| NoloError::FeatureReport(format!("get failed: {}", e)))
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        self.device
            .send_feature_report(data)
            .map_err(|e| NoloError::FeatureReport(format!("send failed: {}", e)))
    }
}

impl Backend for HidApi {
    type Transport = HidTransport;

    fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> Result<Vec<HidEntry>> {
        self.refresh_devices()?;
        Ok(self
            .device_list()
            .filter(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .map(|d| HidEntry {
                path: d.path().to_string_lossy().into_owned(),
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
            })
            .collect())
    }

    fn open(&mut self, path: &str) -> Result<HidTransport> {
        let c_path = CString::new(path).map_err(|e| NoloError::Open {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let device = self.open_path(&c_path).map_err(|e| NoloError::Open {
            path: crate::protocol::hid_to_unix_path(path).unwrap_or_else(|| path.to_string()),
            reason: e.to_string(),
        })?;
        Ok(HidTransport::new(device))
    }
}
