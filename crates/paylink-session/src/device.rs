//! Device-level value types shared by notifications and command results.

/// Operating state reported in `DF10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Idle,
    Busy,
    WaitingForCard,
    WaitingForPin,
    Processing,
    Error,
    Other(u8),
}

impl From<u8> for DeviceState {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Idle,
            0x01 => Self::Busy,
            0x02 => Self::WaitingForCard,
            0x03 => Self::WaitingForPin,
            0x04 => Self::Processing,
            0xFF => Self::Error,
            other => Self::Other(other),
        }
    }
}

/// How a card was presented, reported in `DF21`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Chip,
    Swipe,
    Contactless,
    Manual,
    Other(u8),
}

impl From<u8> for EntryMode {
    fn from(value: u8) -> Self {
        match value {
            0x01 => Self::Chip,
            0x02 => Self::Swipe,
            0x03 => Self::Contactless,
            0x04 => Self::Manual,
            other => Self::Other(other),
        }
    }
}

/// Printer condition flags from the `DF60` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrinterStatus {
    pub paper_out: bool,
    pub paper_low: bool,
    pub cover_open: bool,
    pub overheated: bool,
}

impl PrinterStatus {
    const PAPER_OUT: u8 = 0x01;
    const PAPER_LOW: u8 = 0x02;
    const COVER_OPEN: u8 = 0x04;
    const OVERHEATED: u8 = 0x08;

    pub fn from_bits(bits: u8) -> Self {
        Self {
            paper_out: bits & Self::PAPER_OUT != 0,
            paper_low: bits & Self::PAPER_LOW != 0,
            cover_open: bits & Self::COVER_OPEN != 0,
            overheated: bits & Self::OVERHEATED != 0,
        }
    }

    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.paper_out {
            bits |= Self::PAPER_OUT;
        }
        if self.paper_low {
            bits |= Self::PAPER_LOW;
        }
        if self.cover_open {
            bits |= Self::COVER_OPEN;
        }
        if self.overheated {
            bits |= Self::OVERHEATED;
        }
        bits
    }

    /// Whether the printer can print right now.
    pub fn is_ready(self) -> bool {
        !(self.paper_out || self.cover_open || self.overheated)
    }
}
