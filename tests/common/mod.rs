#![allow(dead_code)]

use nolo::protocol::{
    BASE_STATION_OFFSET, CONTROLLER_OFFSETS, HMD_MARKER_OFFSET, RECORD_VERSION, REPORT_SIZE,
    TAG_CONTROLLERS, TAG_HMD,
};
use nolo::{Backend, HidEntry, NoloError, Result, Transport};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One scripted outcome of a `read` call.
#[derive(Debug, Clone)]
pub enum Step {
    Report(Vec<u8>),
    Fail,
}

/// In-memory backend. Clones share the same queue and counters, so a test
/// can keep a clone after moving one into a `Driver`.
#[derive(Clone, Default)]
pub struct MockBackend {
    entries: Rc<RefCell<Vec<HidEntry>>>,
    queue: Rc<RefCell<VecDeque<Step>>>,
    live: Rc<Cell<usize>>,
    closed: Rc<Cell<usize>>,
    reads: Rc<Cell<usize>>,
    sent_features: Rc<RefCell<Vec<Vec<u8>>>>,
    fail_open: Rc<Cell<bool>>,
    fail_nonblocking: Rc<Cell<bool>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, path: &str, vendor_id: u16, product_id: u16) {
        self.entries.borrow_mut().push(HidEntry {
            path: path.to_string(),
            vendor_id,
            product_id,
        });
    }

    pub fn queue_report(&self, report: &[u8]) {
        self.queue
            .borrow_mut()
            .push_back(Step::Report(report.to_vec()));
    }

    pub fn queue_error(&self) {
        self.queue.borrow_mut().push_back(Step::Fail);
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn live_handles(&self) -> usize {
        self.live.get()
    }

    pub fn closed_handles(&self) -> usize {
        self.closed.get()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn sent_features(&self) -> Vec<Vec<u8>> {
        self.sent_features.borrow().clone()
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.set(fail);
    }

    pub fn set_fail_nonblocking(&self, fail: bool) {
        self.fail_nonblocking.set(fail);
    }
}

impl Backend for MockBackend {
    type Transport = MockTransport;

    fn enumerate(&mut self, vendor_id: u16, product_id: u16) -> Result<Vec<HidEntry>> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .filter(|e| e.vendor_id == vendor_id && e.product_id == product_id)
            .cloned()
            .collect())
    }

    fn open(&mut self, path: &str) -> Result<MockTransport> {
        if self.fail_open.get() {
            return Err(NoloError::Open {
                path: path.to_string(),
                reason: "permission denied".into(),
            });
        }
        self.live.set(self.live.get() + 1);
        Ok(MockTransport {
            backend: self.clone(),
        })
    }
}

pub struct MockTransport {
    backend: MockBackend,
}

impl Transport for MockTransport {
    fn set_nonblocking(&mut self) -> Result<()> {
        if self.backend.fail_nonblocking.get() {
            return Err(NoloError::NonBlocking("not supported".into()));
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.backend.reads.set(self.backend.reads.get() + 1);
        match self.backend.queue.borrow_mut().pop_front() {
            None => Ok(0),
            Some(Step::Report(data)) => {
                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            Some(Step::Fail) => Err(NoloError::Read("device unplugged".into())),
        }
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        // Echo the command and report a fixed status byte.
        buf[1] = 0x5A;
        Ok(buf.len())
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        self.backend.sent_features.borrow_mut().push(data.to_vec());
        Ok(())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.backend.live.set(self.backend.live.get() - 1);
        self.backend.closed.set(self.backend.closed.get() + 1);
    }
}

fn put_i16(buf: &mut [u8], at: usize, v: i16) {
    buf[at..at + 2].copy_from_slice(&v.to_be_bytes());
}

/// Write a version-tagged pose (position at +pos_at, quaternion right after).
fn put_pose(buf: &mut [u8], pos_at: usize, position: [i16; 3], orientation: [i16; 4]) {
    for (i, v) in position.iter().enumerate() {
        put_i16(buf, pos_at + i * 2, *v);
    }
    for (i, v) in orientation.iter().enumerate() {
        put_i16(buf, pos_at + 6 + i * 2, *v);
    }
}

pub const IDENTITY_WIRE: [i16; 4] = [0x4000, 0, 0, 0];

pub fn controller_report(positions: [[i16; 3]; 2], buttons: [u8; 2]) -> [u8; REPORT_SIZE] {
    let mut report = [0u8; REPORT_SIZE];
    report[0] = TAG_CONTROLLERS;
    for (i, &start) in CONTROLLER_OFFSETS.iter().enumerate() {
        report[start..start + 2].copy_from_slice(&RECORD_VERSION);
        put_pose(&mut report, start + 3, positions[i], IDENTITY_WIRE);
        report[start + 17] = buttons[i];
    }
    report
}

pub fn hmd_report(position: [i16; 3], orientation: [i16; 4], battery: u8) -> [u8; REPORT_SIZE] {
    let mut report = [0u8; REPORT_SIZE];
    report[0] = TAG_HMD;
    report[HMD_MARKER_OFFSET..HMD_MARKER_OFFSET + 2].copy_from_slice(&RECORD_VERSION);
    put_pose(&mut report, HMD_MARKER_OFFSET + 9, position, orientation);
    report[BASE_STATION_OFFSET..BASE_STATION_OFFSET + 2].copy_from_slice(&RECORD_VERSION);
    report[BASE_STATION_OFFSET + 2] = battery;
    report
}
