//! Single-slot event channels grouped under a shared lock.
//!
//! Each [`EventChannel`] holds at most one handler. Channels created with the
//! same [`LockGroup`] run their handlers one at a time, on the thread that
//! called [`EventChannel::notify`], and never nested: a `notify` issued from
//! inside a handler on the same group fails with
//! [`EventError::ReentrantNotification`].
//!
//! Registration never takes the group lock, so handlers may register or
//! deregister handlers on any channel.

pub mod channel;
pub mod error;
pub mod group;

pub use channel::{handler, EventChannel, Handler};
pub use error::{BoxError, EventError, Result};
pub use group::LockGroup;
