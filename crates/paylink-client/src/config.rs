use std::time::Duration;

/// How long command methods wait for the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Wait for ordinary commands.
    pub command_timeout: Duration,
    /// Wait for `start_transaction`, which blocks on the cardholder.
    pub transaction_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(5),
            transaction_timeout: Duration::from_secs(120),
        }
    }
}
