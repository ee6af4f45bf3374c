//! Byte-stream transport boundary.
//!
//! The protocol engine never knows whether it is talking over a serial cable,
//! RFCOMM, a TCP socket or a USB bulk pipe. Everything it needs is captured by
//! the [`Transport`] trait: connect, disconnect, and a split pair of blocking
//! streams plus a [`StreamCloser`] that can unblock them from another thread.
//!
//! [`StreamTransport`] adapts any cloneable socket (`TcpStream`, `UnixStream`)
//! to that boundary.

pub mod error;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use stream::{DuplexStream, Farewell, StreamTransport};
pub use traits::{SessionContext, StreamCloser, Transport, TransportStreams};
