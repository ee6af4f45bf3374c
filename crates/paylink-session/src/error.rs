use std::time::Duration;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error while connecting or disconnecting.
    #[error("transport error: {0}")]
    Transport(#[from] paylink_transport::TransportError),

    /// Frame-level error that did not take the link down (e.g. oversized payload).
    #[error("frame error: {0}")]
    Frame(#[from] paylink_frame::FrameError),

    /// No response arrived in time. The session stays usable.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The session is closed or the link failed.
    #[error("link lost")]
    LinkLost,

    /// A command was issued while another one is still outstanding.
    #[error("protocol violation: a command to address {outstanding:#04x} is still outstanding")]
    ProtocolViolation { outstanding: u8 },

    /// `open()` was called on a session that is not closed.
    #[error("session is already {0}")]
    AlreadyOpen(crate::state::SessionState),

    /// The reader thread could not be started.
    #[error("failed to spawn reader thread: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
