//! Client engine for the paylink payment-terminal protocol.
//!
//! paylink talks to payment terminals and their attached peripherals over any
//! byte-stream link: it frames and checksums commands, routes responses back
//! to the one waiting caller, dispatches unsolicited device notifications to
//! registered handlers, and lets a second thread abort a long-running command.
//!
//! # Crate Structure
//!
//! - [`transport`]: the link boundary and a socket adapter
//! - [`frame`]: checksummed wire frames
//! - [`tlv`]: nested tag-length-value codec
//! - [`events`]: single-slot event channels under a shared lock group
//! - [`session`]: reader thread, command/response hand-off, device events
//! - [`client`]: typed commands and the abort-capable client (`client` feature)

/// Re-export transport types.
pub mod transport {
    pub use paylink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use paylink_frame::*;
}

/// Re-export TLV codec types.
pub mod tlv {
    pub use paylink_tlv::*;
}

/// Re-export event bus types.
pub mod events {
    pub use paylink_events::*;
}

/// Re-export session types.
pub mod session {
    pub use paylink_session::*;
}

/// Re-export command client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use paylink_client::*;
}
