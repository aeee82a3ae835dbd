//! Core functionalities: serial polling, text decoding, capture transcript.

pub mod encoding;
pub mod poller;
pub mod serial_service;
pub mod transcript;

pub use encoding::TextEncoding;
pub use poller::{PollOutcome, RxLink, BURST_ACCUMULATE_DELAY, LINK_SETTLE_DELAY};
pub use serial_service::{OpenError, PortInfo, RxStats, SerialConfig, SerialEvent, SerialService};
pub use transcript::{Entry, RenderOptions, Transcript};
