//! Abort-capable client.

use std::ops::Deref;
use std::sync::Arc;

use paylink_session::{ProtocolSession, WriteHandle};
use tracing::{info, warn};

use crate::client::CommandClient;
use crate::command::{ins, Command};
use crate::config::ClientConfig;
use crate::error::Result;

/// A [`CommandClient`] that can cancel the device's current operation from
/// any thread.
///
/// The abort frame goes out through a [`WriteHandle`], which takes only the
/// session's write lock. It never waits behind a caller parked in a command,
/// and it never waits for a reply: the device answers the *cancelled*
/// command instead, typically with `Declined(Cancelled)`.
///
/// All other commands are available through `Deref`.
#[derive(Debug, Clone)]
pub struct AbortableClient {
    client: CommandClient,
    writer: WriteHandle,
}

impl AbortableClient {
    pub fn new(session: Arc<ProtocolSession>) -> Self {
        Self::from_client(CommandClient::new(session))
    }

    pub fn with_config(session: Arc<ProtocolSession>, config: ClientConfig) -> Self {
        Self::from_client(CommandClient::with_config(session, config))
    }

    pub fn from_client(client: CommandClient) -> Self {
        let writer = client.session().write_handle();
        Self { client, writer }
    }

    pub fn client(&self) -> &CommandClient {
        &self.client
    }

    pub fn into_inner(self) -> CommandClient {
        self.client
    }

    /// Write an abort command to `address`.
    ///
    /// Returns once the frame is flushed. Whether anything was actually
    /// cancelled shows up in the result of the interrupted command.
    pub fn try_abort_current_operation(&self, address: u8) -> Result<()> {
        let payload = Command::new(ins::ABORT).encode();
        self.writer.send_no_reply(address, &payload)?;
        info!(address, busy = self.client.session().is_busy(), "abort written");
        Ok(())
    }

    /// [`try_abort_current_operation`](Self::try_abort_current_operation),
    /// reporting only whether the frame was written.
    pub fn abort_current_operation(&self, address: u8) -> bool {
        match self.try_abort_current_operation(address) {
            Ok(()) => true,
            Err(err) => {
                warn!(address, error = %err, "abort not written");
                false
            }
        }
    }
}

impl Deref for AbortableClient {
    type Target = CommandClient;

    fn deref(&self) -> &CommandClient {
        &self.client
    }
}
