//! Checksummed wire framing for the terminal protocol.
//!
//! Every frame on the wire is:
//! - 1 byte address (which logical device on the link)
//! - 1 byte control (direction and reply flags)
//! - 2 byte big-endian payload length
//! - the payload
//! - 1 byte LRC, the XOR of every preceding byte
//!
//! Framing has no resynchronisation: any checksum or truncation failure is
//! fatal for the link.

pub mod address;
pub mod codec;
pub mod control;
pub mod error;
pub mod reader;
pub mod writer;

pub use address::{CASH_DRAWER, PRINTER, SCANNER, SERIAL_PORT, TERMINAL};
pub use codec::{
    decode_frame, encode_frame, lrc, Frame, FrameConfig, HEADER_SIZE, MAX_PAYLOAD, TRAILER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
