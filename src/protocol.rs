use crate::types::{BaseStation, Buttons, ControllerReport, HmdMarker, RawPose};
use crate::{NoloError, Result};

// -- USB identifiers --
pub const VID: u16 = 0x0483;
pub const PID: u16 = 0x5750;

// -- Packet geometry --
/// Size of every input report, also used for feature reports.
pub const REPORT_SIZE: usize = 64;
pub const FEATURE_BUFFER_SIZE: usize = REPORT_SIZE;

// -- Report tags (byte 0) --
pub const TAG_CONTROLLERS: u8 = 0xA5;
pub const TAG_HMD: u8 = 0xA6;

/// Every sub-record starts with this version pair.
pub const RECORD_VERSION: [u8; 2] = [0x02, 0x01];
const RECORD_HEADER_LEN: usize = 3;

/// Header, 3x i16 position, 4x i16 quaternion, buttons + touch flags,
/// touchpad x/y, battery.
pub const CONTROLLER_RECORD_LEN: usize = 3 + (3 + 4) * 2 + 2 + 2 + 1;

/// Controller 0 follows the tag; controller 1 is right-aligned to the
/// end of the report, leaving a gap between the two.
pub const CONTROLLER_OFFSETS: [usize; 2] = [1, REPORT_SIZE - CONTROLLER_RECORD_LEN];

pub const HMD_MARKER_OFFSET: usize = 0x15;
/// Header, home position, position, quaternion.
pub const HMD_MARKER_LEN: usize = 3 + 3 * 2 + 3 * 2 + 4 * 2;
pub const BASE_STATION_OFFSET: usize = 0x36;
pub const BASE_STATION_LEN: usize = REPORT_SIZE - BASE_STATION_OFFSET;

/// One decoded input report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Both hand controllers, indexed 0 and 1. `None` when the record
    /// carries an unsupported version.
    ControllerPair([Option<ControllerReport>; 2]),
    HmdFrame {
        marker: Option<HmdMarker>,
        base_station: Option<BaseStation>,
    },
    /// First byte matched no known tag.
    Unrecognized(u8),
}

/// Classify and decode one raw input report.
///
/// Report layout:
/// - `[0]`: tag
/// - `0xA5`: controller 0 at `[1..23]`, controller 1 at `[42..64]`
/// - `0xA6`: HMD marker at `[0x15..0x2C]`, base station at `[0x36..0x40]`
///
/// Known tags require the full 64-byte report; anything shorter is
/// rejected with `ShortReport` instead of being partially decoded.
pub fn decode(report: &[u8]) -> Result<Report> {
    let tag = match report.first() {
        Some(&tag) => tag,
        None => {
            return Err(NoloError::ShortReport {
                tag: 0,
                needed: 1,
                got: 0,
            })
        }
    };

    match tag {
        TAG_CONTROLLERS => {
            let first = decode_controller(controller_span(report, 0)?);
            let second = decode_controller(controller_span(report, 1)?);
            Ok(Report::ControllerPair([first, second]))
        }
        TAG_HMD => {
            check_full(report)?;
            let marker = decode_hmd_marker(
                &report[HMD_MARKER_OFFSET..HMD_MARKER_OFFSET + HMD_MARKER_LEN],
            );
            let base_station = decode_base_station(&report[BASE_STATION_OFFSET..]);
            Ok(Report::HmdFrame {
                marker,
                base_station,
            })
        }
        other => Ok(Report::Unrecognized(other)),
    }
}

/// The 22-byte sub-slice holding controller `index` (0 or 1) inside a
/// controller-pair report.
///
/// Panics if `index` is greater than 1.
pub fn controller_span(report: &[u8], index: usize) -> Result<&[u8]> {
    check_full(report)?;
    let start = CONTROLLER_OFFSETS[index];
    Ok(&report[start..start + CONTROLLER_RECORD_LEN])
}

fn check_full(report: &[u8]) -> Result<()> {
    if report.len() < REPORT_SIZE {
        return Err(NoloError::ShortReport {
            tag: report.first().copied().unwrap_or(0),
            needed: REPORT_SIZE,
            got: report.len(),
        });
    }
    Ok(())
}

fn has_supported_version(record: &[u8]) -> bool {
    record.len() >= RECORD_HEADER_LEN && record[..2] == RECORD_VERSION
}

/// Decode one controller record. `None` on an unknown record version.
pub fn decode_controller(record: &[u8]) -> Option<ControllerReport> {
    let record = record.get(..CONTROLLER_RECORD_LEN)?;
    if !has_supported_version(record) {
        return None;
    }

    let raw = RawPose {
        position: read_vec3(&record[3..9]),
        orientation: read_quat(&record[9..17]),
    };

    Some(ControllerReport {
        raw,
        buttons: Buttons::from_bits_truncate(record[17]),
        touch: [record[18], record[19]],
        battery: record[21],
    })
}

/// Decode the HMD marker record. `None` on an unknown record version.
pub fn decode_hmd_marker(record: &[u8]) -> Option<HmdMarker> {
    let record = record.get(..HMD_MARKER_LEN)?;
    if !has_supported_version(record) {
        return None;
    }

    Some(HmdMarker {
        home: read_vec3(&record[3..9]),
        raw: RawPose {
            position: read_vec3(&record[9..15]),
            orientation: read_quat(&record[15..23]),
        },
    })
}

/// Decode the base-station record. `None` on an unknown record version.
pub fn decode_base_station(record: &[u8]) -> Option<BaseStation> {
    let record = record.get(..BASE_STATION_LEN)?;
    if !has_supported_version(record) {
        return None;
    }
    Some(BaseStation { battery: record[2] })
}

fn read_i16_be(data: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([data[at], data[at + 1]])
}

fn read_vec3(data: &[u8]) -> [i16; 3] {
    [read_i16_be(data, 0), read_i16_be(data, 2), read_i16_be(data, 4)]
}

/// Wire order is [w, x, y, z].
fn read_quat(data: &[u8]) -> [i16; 4] {
    [
        read_i16_be(data, 0),
        read_i16_be(data, 2),
        read_i16_be(data, 4),
        read_i16_be(data, 6),
    ]
}

/// Build a zeroed feature-report buffer with `cmd` at offset 0.
pub fn build_feature_request(cmd: u8) -> [u8; FEATURE_BUFFER_SIZE] {
    let mut buf = [0u8; FEATURE_BUFFER_SIZE];
    buf[0] = cmd;
    buf
}

/// Turn a libusb-style hidapi path (`bbbb:dddd:ii`, hex) into the
/// `/dev/bus/usb/BBB/DDD` node a user would have to fix permissions on.
pub fn hid_to_unix_path(path: &str) -> Option<String> {
    let bus = u16::from_str_radix(path.get(0..4)?, 16).ok()?;
    if path.get(4..5)? != ":" {
        return None;
    }
    let dev = u16::from_str_radix(path.get(5..9)?, 16).ok()?;
    Some(format!("/dev/bus/usb/{:03}/{:03}", bus, dev))
}
