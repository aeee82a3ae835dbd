use std::io::{self, Read};
use std::thread;
use std::time::Duration;

/// Settling time after opening the port, before the first read.
pub const LINK_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Time allowed for the rest of a burst to land before draining it.
pub const BURST_ACCUMULATE_DELAY: Duration = Duration::from_millis(500);

/// Port read timeout; the blocking single-byte read retries on this
/// granularity so cancellation stays responsive.
pub const READ_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Receive side of a serial link, as the poll loop sees it.
pub trait RxLink {
    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn bytes_to_read(&mut self) -> io::Result<u32>;
}

impl RxLink for Box<dyn serialport::SerialPort> {
    fn read_some(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.as_mut().read(buf)
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        serialport::SerialPort::bytes_to_read(self.as_ref()).map_err(io::Error::from)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Chunk(Vec<u8>),
    Cancelled,
}

/// One poll-loop iteration: block until a byte arrives, wait for the rest
/// of the burst, then drain whatever is buffered.
///
/// `cancelled` is checked before every read attempt; a pending shutdown
/// wins over pending data. Any I/O error other than a read timeout is
/// fatal for the link and the chunk of that iteration is lost.
pub fn next_chunk<L, F>(link: &mut L, accumulate: Duration, cancelled: F) -> io::Result<PollOutcome>
where
    L: RxLink + ?Sized,
    F: Fn() -> bool,
{
    let mut first = [0u8; 1];
    loop {
        if cancelled() {
            return Ok(PollOutcome::Cancelled);
        }
        match link.read_some(&mut first) {
            Ok(0) => continue,
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    thread::sleep(accumulate);

    let pending = link.bytes_to_read()? as usize;
    let mut chunk = Vec::with_capacity(1 + pending);
    chunk.push(first[0]);
    if pending > 0 {
        let mut rest = vec![0u8; pending];
        let mut filled = 0;
        // The driver reported these bytes as buffered, but tolerate short
        // reads: take what is actually there and stop.
        while filled < pending {
            match link.read_some(&mut rest[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        rest.truncate(filled);
        chunk.extend_from_slice(&rest);
    }

    Ok(PollOutcome::Chunk(chunk))
}
