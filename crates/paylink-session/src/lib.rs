//! Protocol session for the paylink terminal protocol.
//!
//! A [`ProtocolSession`] owns a [`Transport`](paylink_transport::Transport)
//! and one background reader thread. Every decoded frame is classified as a
//! response to the single outstanding command or as an unsolicited device
//! notification, which is decoded and raised on the session's
//! [`DeviceEvents`] bus.
//!
//! At most one caller may be parked in [`ProtocolSession::send_and_wait`];
//! a second concurrent call fails with [`SessionError::ProtocolViolation`].
//! Writes go through their own lock, so a [`WriteHandle`] can reach the wire
//! while a caller is parked.

pub mod apdu;
pub mod config;
pub mod device;
pub mod error;
mod exchange;
pub mod notifications;
pub mod session;
pub mod state;

pub use apdu::{classify, Classified, ResponseApdu, StatusWord, UNSOLICITED_TEMPLATES};
pub use config::SessionConfig;
pub use device::{DeviceState, EntryMode, PrinterStatus};
pub use error::{Result, SessionError};
pub use notifications::{
    BarcodeScanned, CardStatusChanged, ConnectionEstablished, ConnectionLost,
    DeviceEvents, DeviceStatusChanged, DisconnectReason, EventDecodeError, KeyPressed,
    PrinterStatusChanged, SerialDataReceived, UnsolicitedEvent,
};
pub use session::{ProtocolSession, WriteHandle};
pub use state::SessionState;
