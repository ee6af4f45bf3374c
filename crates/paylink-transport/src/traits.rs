use std::fmt;
use std::io::{Read, Write};

use crate::error::Result;

/// A duplex byte link to a payment terminal.
///
/// Implementations own connection establishment. The session only reads,
/// writes and closes the streams handed out by [`Transport::open_streams`].
pub trait Transport: Send {
    /// Short diagnostic name ("tcp", "bluetooth", ...).
    fn name(&self) -> &'static str;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;

    /// Establish the link. Calling this while connected is a no-op.
    fn connect(&mut self) -> Result<()>;

    /// Tear the link down.
    ///
    /// `session` belongs to the closing session and may be used to write a
    /// final frame before the streams go away. Writes through it are
    /// best-effort.
    fn disconnect(&mut self, session: &mut dyn SessionContext) -> Result<()>;

    /// Hand out the read side, the write side and a closer for the live link.
    ///
    /// Only valid while connected.
    fn open_streams(&mut self) -> Result<TransportStreams>;
}

/// Closing hook usable from any thread.
///
/// Closing must unblock a thread parked in a read or write on the streams
/// produced alongside this closer.
pub trait StreamCloser: Send + Sync {
    fn close(&self) -> std::io::Result<()>;
}

/// Access to the closing session, passed to [`Transport::disconnect`].
pub trait SessionContext {
    /// Write one protocol frame addressed to `address`.
    fn write_frame(&mut self, address: u8, payload: &[u8]) -> std::io::Result<()>;
}

/// The split stream pair of a connected transport.
pub struct TransportStreams {
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
    pub closer: Box<dyn StreamCloser>,
}

impl fmt::Debug for TransportStreams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportStreams").finish_non_exhaustive()
    }
}
