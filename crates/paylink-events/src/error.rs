/// Error type returned by event handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`crate::EventChannel::notify`].
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// `notify` was called on a group already held by the calling thread.
    #[error("reentrant notification on channel '{channel}' (group '{group}' is held by this thread)")]
    ReentrantNotification {
        channel: &'static str,
        group: &'static str,
    },

    /// The registered handler returned an error.
    #[error("handler for channel '{channel}' failed: {source}")]
    Handler {
        channel: &'static str,
        #[source]
        source: BoxError,
    },
}

pub type Result<T> = std::result::Result<T, EventError>;
