//! Typed command API for paylink terminals.
//!
//! [`CommandClient`] has one method per device command. Each encodes its
//! arguments as TLV, runs one exchange on a shared
//! [`ProtocolSession`](paylink_session::ProtocolSession) and decodes the
//! result. Device refusals come back as [`Outcome::Declined`]; only link,
//! decode and argument problems are errors.
//!
//! [`AbortableClient`] wraps a client with a separate write path so
//! `abort_current_operation` reaches the wire while another thread is parked
//! in a long-running command.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::net::TcpStream;
//!
//! use paylink_client::{AbortableClient, TransactionRequest};
//! use paylink_frame::TERMINAL;
//! use paylink_session::ProtocolSession;
//! use paylink_transport::StreamTransport;
//!
//! let transport = StreamTransport::new("tcp", || TcpStream::connect("10.0.0.5:4100"));
//! let session = Arc::new(ProtocolSession::new(transport));
//! session.open()?;
//!
//! let client = AbortableClient::new(Arc::clone(&session));
//! let outcome = client.start_transaction(&TransactionRequest::purchase(1250, 978))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod abort;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod status;
pub mod types;

pub use abort::AbortableClient;
pub use client::CommandClient;
pub use command::{ins, Command, CLA};
pub use config::ClientConfig;
pub use error::{CommandError, Result};
pub use status::{CommandStatus, Outcome};
pub use types::{
    CardStatus, DeviceInfo, DeviceStatus, TransactionRequest, TransactionResult, TransactionType,
};
