//! Device status words as typed results.

use std::fmt;

use paylink_session::StatusWord;

/// Meaning of a response status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    Success,
    /// Cancelled by the host (abort).
    Cancelled,
    CancelledByUser,
    UserTimeout,
    CardNotPresent,
    Busy,
    PaperOut,
    WrongLength,
    ConditionsNotSatisfied,
    InvalidData,
    InvalidParameters,
    UnsupportedInstruction,
    UnsupportedClass,
    DeviceError,
    Other(u16),
}

impl CommandStatus {
    pub fn status_word(self) -> StatusWord {
        StatusWord::from_u16(match self {
            Self::Success => 0x9000,
            Self::Cancelled => 0x6400,
            Self::CancelledByUser => 0x6401,
            Self::UserTimeout => 0x6402,
            Self::CardNotPresent => 0x6403,
            Self::Busy => 0x6404,
            Self::PaperOut => 0x6405,
            Self::WrongLength => 0x6700,
            Self::ConditionsNotSatisfied => 0x6985,
            Self::InvalidData => 0x6A80,
            Self::InvalidParameters => 0x6A86,
            Self::UnsupportedInstruction => 0x6D00,
            Self::UnsupportedClass => 0x6E00,
            Self::DeviceError => 0x6F00,
            Self::Other(sw) => sw,
        })
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Whether the operation ended because someone cancelled it.
    pub fn is_cancellation(self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::CancelledByUser | Self::UserTimeout
        )
    }
}

impl From<StatusWord> for CommandStatus {
    fn from(sw: StatusWord) -> Self {
        match sw.value() {
            0x9000 => Self::Success,
            0x6400 => Self::Cancelled,
            0x6401 => Self::CancelledByUser,
            0x6402 => Self::UserTimeout,
            0x6403 => Self::CardNotPresent,
            0x6404 => Self::Busy,
            0x6405 => Self::PaperOut,
            0x6700 => Self::WrongLength,
            0x6985 => Self::ConditionsNotSatisfied,
            0x6A80 => Self::InvalidData,
            0x6A86 => Self::InvalidParameters,
            0x6D00 => Self::UnsupportedInstruction,
            0x6E00 => Self::UnsupportedClass,
            0x6F00 => Self::DeviceError,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "success",
            Self::Cancelled => "cancelled",
            Self::CancelledByUser => "cancelled by user",
            Self::UserTimeout => "user timeout",
            Self::CardNotPresent => "card not present",
            Self::Busy => "device busy",
            Self::PaperOut => "paper out",
            Self::WrongLength => "wrong length",
            Self::ConditionsNotSatisfied => "conditions not satisfied",
            Self::InvalidData => "invalid data",
            Self::InvalidParameters => "invalid parameters",
            Self::UnsupportedInstruction => "unsupported instruction",
            Self::UnsupportedClass => "unsupported class",
            Self::DeviceError => "device error",
            Self::Other(sw) => return write!(f, "status {sw:04X}"),
        };
        f.write_str(text)
    }
}

/// Result of a command the device processed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Outcome<T> {
    /// The device accepted the command.
    Done(T),
    /// The device refused or cancelled the command.
    Declined(CommandStatus),
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Declined(_) => None,
        }
    }

    pub fn declined(&self) -> Option<CommandStatus> {
        match self {
            Self::Done(_) => None,
            Self::Declined(status) => Some(*status),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done(value) => Outcome::Done(f(value)),
            Self::Declined(status) => Outcome::Declined(status),
        }
    }

    /// Convert a refusal into an error of the caller's choosing.
    pub fn or_declined<E>(self, f: impl FnOnce(CommandStatus) -> E) -> Result<T, E> {
        match self {
            Self::Done(value) => Ok(value),
            Self::Declined(status) => Err(f(status)),
        }
    }
}
