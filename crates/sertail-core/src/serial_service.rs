use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::debug;
use parking_lot::Mutex;
use serialport::SerialPortInfo;
use std::io;
use std::sync::Arc;
use std::thread;
use thiserror::Error;

use crate::poller::{self, PollOutcome, BURST_ACCUMULATE_DELAY, LINK_SETTLE_DELAY, READ_POLL_TIMEOUT};

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid, product) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => (
                "USB".to_string(),
                Some(usb.vid),
                Some(usb.pid),
                usb.product.clone(),
            ),
            serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None, None),
            serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None, None, None),
            serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
            product,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: "/dev/ttyS0".to_string(),
            baud_rate: 9_600,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            flow_control: serialport::FlowControl::None,
        }
    }
}

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("device unavailable: {path}")]
    DeviceUnavailable {
        path: String,
        #[source]
        source: serialport::Error,
    },
    #[error("permission denied: {path}")]
    PermissionDenied {
        path: String,
        #[source]
        source: serialport::Error,
    },
    #[error("failed to open {path}")]
    Other {
        path: String,
        #[source]
        source: serialport::Error,
    },
}

fn classify_open_error(path: &str, source: serialport::Error) -> OpenError {
    let path = path.to_string();
    match source.kind() {
        serialport::ErrorKind::NoDevice => OpenError::DeviceUnavailable { path, source },
        serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
            OpenError::DeviceUnavailable { path, source }
        }
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            OpenError::PermissionDenied { path, source }
        }
        _ => OpenError::Other { path, source },
    }
}

#[derive(Debug, Clone)]
pub enum SerialEvent {
    Rx(Vec<u8>),
    Error(String),
    Closed,
}

enum Command {
    Shutdown,
}

/// Counters kept by the reader thread, readable from the app side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxStats {
    pub chunks: u64,
    pub bytes: u64,
}

/// An open serial endpoint plus the background thread polling it.
///
/// The port is opened synchronously so open-time failures surface as
/// [`OpenError`]; on success the reader thread owns the port exclusively
/// until a fatal I/O error or a [`close`](SerialService::close) request.
pub struct SerialService {
    cfg: SerialConfig,
    tx_cmd: Sender<Command>,
    rx_evt: Receiver<SerialEvent>,
    stats: Arc<Mutex<RxStats>>,
}

impl SerialService {
    pub fn list_ports() -> Vec<PortInfo> {
        serialport::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(PortInfo::from)
            .collect()
    }

    pub fn open(cfg: SerialConfig) -> Result<Self, OpenError> {
        let port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(cfg.data_bits)
            .parity(cfg.parity)
            .stop_bits(cfg.stop_bits)
            .flow_control(cfg.flow_control)
            .timeout(READ_POLL_TIMEOUT)
            .open()
            .map_err(|e| classify_open_error(&cfg.port_name, e))?;

        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<SerialEvent>();
        let stats = Arc::new(Mutex::new(RxStats::default()));

        let thread_stats = Arc::clone(&stats);
        thread::spawn(move || reader_loop(port, rx_cmd, tx_evt, thread_stats));

        Ok(Self {
            cfg,
            tx_cmd,
            rx_evt,
            stats,
        })
    }

    /// Request shutdown; the reader thread acknowledges with a final
    /// `Closed` event.
    pub fn close(&self) {
        let _ = self.tx_cmd.send(Command::Shutdown);
    }

    pub fn events(&self) -> &Receiver<SerialEvent> {
        &self.rx_evt
    }

    pub fn config(&self) -> &SerialConfig {
        &self.cfg
    }

    pub fn stats(&self) -> RxStats {
        *self.stats.lock()
    }
}

fn reader_loop(
    mut port: Box<dyn serialport::SerialPort>,
    rx_cmd: Receiver<Command>,
    tx_evt: Sender<SerialEvent>,
    stats: Arc<Mutex<RxStats>>,
) {
    // Let the hardware link settle before the first read.
    thread::sleep(LINK_SETTLE_DELAY);

    let cancelled = || match rx_cmd.try_recv() {
        Ok(Command::Shutdown) | Err(TryRecvError::Disconnected) => true,
        Err(TryRecvError::Empty) => false,
    };

    loop {
        debug!("waiting");
        match poller::next_chunk(&mut port, BURST_ACCUMULATE_DELAY, &cancelled) {
            Ok(PollOutcome::Chunk(chunk)) => {
                {
                    let mut s = stats.lock();
                    s.chunks += 1;
                    s.bytes += chunk.len() as u64;
                }
                if tx_evt.send(SerialEvent::Rx(chunk)).is_err() {
                    return;
                }
            }
            Ok(PollOutcome::Cancelled) => {
                let _ = tx_evt.send(SerialEvent::Closed);
                return;
            }
            Err(e) => {
                let _ = tx_evt.send(SerialEvent::Error(e.to_string()));
                let _ = tx_evt.send(SerialEvent::Closed);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_nonexistent_path_is_device_unavailable() {
        let cfg = SerialConfig {
            port_name: "/dev/sertail-test-no-such-port".to_string(),
            ..Default::default()
        };
        match SerialService::open(cfg) {
            Err(OpenError::DeviceUnavailable { path, .. }) => {
                assert_eq!(path, "/dev/sertail-test-no-such-port");
            }
            Err(other) => panic!("expected DeviceUnavailable, got {other:?}"),
            Ok(_) => panic!("open unexpectedly succeeded"),
        }
    }

    #[test]
    fn classifies_no_device_errors() {
        let err = serialport::Error::new(serialport::ErrorKind::NoDevice, "gone");
        assert!(matches!(
            classify_open_error("/dev/ttyS0", err),
            OpenError::DeviceUnavailable { .. }
        ));
    }

    #[test]
    fn classifies_missing_path_as_device_unavailable() {
        let err = serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::NotFound),
            "no such file",
        );
        assert!(matches!(
            classify_open_error("/dev/ttyS0", err),
            OpenError::DeviceUnavailable { .. }
        ));
    }

    #[test]
    fn classifies_permission_denied() {
        let err = serialport::Error::new(
            serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied),
            "denied",
        );
        assert!(matches!(
            classify_open_error("/dev/ttyS0", err),
            OpenError::PermissionDenied { .. }
        ));
    }

    #[test]
    fn other_open_failures_keep_their_source() {
        let err = serialport::Error::new(serialport::ErrorKind::Unknown, "weird");
        match classify_open_error("/dev/ttyS0", err) {
            OpenError::Other { path, source } => {
                assert_eq!(path, "/dev/ttyS0");
                assert_eq!(source.kind(), serialport::ErrorKind::Unknown);
            }
            other => panic!("expected Other, got {other:?}"),
        }
    }

    #[test]
    fn default_config_matches_link_settings() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.port_name, "/dev/ttyS0");
        assert_eq!(cfg.baud_rate, 9_600);
        assert_eq!(cfg.data_bits, serialport::DataBits::Eight);
        assert_eq!(cfg.parity, serialport::Parity::None);
        assert_eq!(cfg.stop_bits, serialport::StopBits::One);
    }
}
