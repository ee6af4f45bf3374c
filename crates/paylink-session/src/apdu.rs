//! Response status words and frame classification.

use std::fmt;

use bytes::Bytes;
use paylink_tlv::{tags, Tag, TlvNode};

/// Leading template tags of unsolicited device messages.
pub const UNSOLICITED_TEMPLATES: [Tag; 6] = [
    tags::DEVICE_STATUS_TEMPLATE,
    tags::CARD_STATUS_TEMPLATE,
    tags::KEY_PRESS_TEMPLATE,
    tags::BARCODE_TEMPLATE,
    tags::SERIAL_DATA_TEMPLATE,
    tags::PRINTER_STATUS_TEMPLATE,
];

/// Two-byte status trailer of a command response (`SW1 SW2`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord(u16);

impl StatusWord {
    pub const SUCCESS: Self = Self(0x9000);
    pub const CANCELLED: Self = Self(0x6400);

    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self(((sw1 as u16) << 8) | sw2 as u16)
    }

    pub const fn from_u16(value: u16) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u16 {
        self.0
    }

    pub const fn sw1(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn sw2(self) -> u8 {
        self.0 as u8
    }

    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Whether `sw1` can start a status trailer: `61..=6F` or `90..=9F`.
    pub const fn is_recognizable(sw1: u8) -> bool {
        matches!(sw1, 0x61..=0x6F | 0x90..=0x9F)
    }
}

impl fmt::Debug for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusWord({self})")
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// A command response: TLV data plus the status word trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseApdu {
    pub status: StatusWord,
    pub data: Bytes,
}

impl ResponseApdu {
    pub fn new(status: StatusWord, data: impl Into<Bytes>) -> Self {
        Self {
            status,
            data: data.into(),
        }
    }

    /// Split a payload into data and status word if it ends in a recognizable trailer.
    pub fn parse(payload: &Bytes) -> Option<Self> {
        let split = payload.len().checked_sub(2)?;
        let (sw1, sw2) = (payload[split], payload[split + 1]);
        if !StatusWord::is_recognizable(sw1) {
            return None;
        }
        Some(Self {
            status: StatusWord::new(sw1, sw2),
            data: payload.slice(..split),
        })
    }

    /// Wire payload: data followed by `SW1 SW2`.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.data.len() + 2);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.status.value().to_be_bytes());
        out.into()
    }
}

/// What a device frame turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Answer to a host command.
    Response(ResponseApdu),
    /// Device-initiated notification template.
    Unsolicited(TlvNode),
    /// Neither; discarded by the reader.
    Unrecognized,
}

/// Classify a device frame payload.
///
/// A payload that decodes as exactly one known notification template is
/// unsolicited. Otherwise a recognizable status-word trailer makes it a
/// response. Anything else is unrecognized.
pub fn classify(payload: &Bytes) -> Classified {
    if let Some(template) = unsolicited_template(payload) {
        return Classified::Unsolicited(template);
    }
    match ResponseApdu::parse(payload) {
        Some(response) => Classified::Response(response),
        None => Classified::Unrecognized,
    }
}

fn unsolicited_template(payload: &[u8]) -> Option<TlvNode> {
    let first = *payload.first()?;
    if !UNSOLICITED_TEMPLATES
        .iter()
        .any(|tag| tag.first_byte() == first)
    {
        return None;
    }
    let mut nodes = paylink_tlv::decode(payload).ok()?;
    if nodes.len() != 1 || !nodes[0].is_constructed() {
        return None;
    }
    nodes.pop()
}
