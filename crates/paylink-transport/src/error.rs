/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Establishing the underlying link failed.
    #[error("failed to connect {transport}: {source}")]
    Connect {
        transport: &'static str,
        source: std::io::Error,
    },

    /// The transport has no way to (re)establish the link.
    #[error("{0} cannot reconnect (no connector configured)")]
    NoConnector(&'static str),

    /// Streams were requested while the link is down.
    #[error("{0} is not connected")]
    NotConnected(&'static str),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
