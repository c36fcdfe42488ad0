use crate::hid::Transport;
use crate::protocol::REPORT_SIZE;
use crate::Result;

/// Read every report currently queued on `transport`, handing each one to
/// `dispatch` as `&buf[..bytes_read]`.
///
/// Stops on the first zero-length read (queue empty) and returns the number
/// of reports dispatched. A read error stops the loop at once and is
/// returned without retrying; reports dispatched before it stay applied.
pub fn drain<T, F>(transport: &mut T, buf: &mut [u8; REPORT_SIZE], mut dispatch: F) -> Result<usize>
where
    T: Transport + ?Sized,
    F: FnMut(&[u8]),
{
    let mut count = 0;
    loop {
        let len = transport.read(buf)?;
        if len == 0 {
            return Ok(count);
        }
        dispatch(&buf[..len.min(REPORT_SIZE)]);
        count += 1;
    }
}
