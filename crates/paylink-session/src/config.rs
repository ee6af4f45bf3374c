use std::time::Duration;

use paylink_frame::FrameConfig;

/// Runtime knobs for a [`ProtocolSession`](crate::ProtocolSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Frame size limits for both directions.
    pub frame: FrameConfig,
    /// How long a timed-out exchange keeps waiting for its stray response
    /// before the next command may go out. Zero frees the slot immediately.
    pub late_response_grace: Duration,
    /// Upper bound on waiting for the write lock when sending a farewell
    /// frame during close.
    pub farewell_lock_timeout: Duration,
    /// Name given to the background reader thread.
    pub reader_thread_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            late_response_grace: Duration::from_millis(250),
            farewell_lock_timeout: Duration::from_millis(500),
            reader_thread_name: "paylink-reader".to_string(),
        }
    }
}
