use paylink_session::SessionError;
use paylink_tlv::{Tag, TlvError};

/// Errors returned by command methods.
///
/// A device declining a command is not an error; see
/// [`Outcome::Declined`](crate::Outcome::Declined).
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The exchange itself failed (timeout, link lost, concurrent command).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The response data is not valid TLV. The session stays usable.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] TlvError),

    /// A required field is absent from the response.
    #[error("response is missing {name} ({tag})")]
    MissingField { tag: Tag, name: &'static str },

    /// A response field is present but cannot be interpreted.
    #[error("invalid {name} ({tag}): {reason}")]
    InvalidField {
        tag: Tag,
        name: &'static str,
        reason: String,
    },

    /// An argument cannot be encoded into a command.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CommandError {
    pub(crate) fn missing(tag: Tag) -> Self {
        Self::MissingField {
            tag,
            name: tag.name(),
        }
    }

    pub(crate) fn invalid(tag: Tag, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            tag,
            name: tag.name(),
            reason: reason.into(),
        }
    }

    /// Whether the session is still usable after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Session(SessionError::LinkLost | SessionError::Transport(_)) => false,
            Self::Session(_) => true,
            Self::MalformedResponse(_)
            | Self::MissingField { .. }
            | Self::InvalidField { .. }
            | Self::InvalidArgument(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;
