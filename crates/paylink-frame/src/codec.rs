use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: address (1) + control (1) + length (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Frame trailer: LRC (1).
pub const TRAILER_SIZE: usize = 1;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// One validated wire frame.
///
/// Frames are immutable; the checksum is computed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    address: u8,
    control: u8,
    payload: Bytes,
    checksum: u8,
}

impl Frame {
    /// Create a new frame.
    ///
    /// Fails if the payload cannot be described by the length field.
    pub fn new(address: u8, control: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        let checksum = lrc_of(address, control, &payload);
        Ok(Self {
            address,
            control,
            payload,
            checksum,
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Consume the frame and return its payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// The total wire size of this frame (header + payload + trailer).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + TRAILER_SIZE
    }

    /// Encode this frame into `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_size());
        dst.put_u8(self.address);
        dst.put_u8(self.control);
        dst.put_u16(self.payload.len() as u16);
        dst.put_slice(&self.payload);
        dst.put_u8(self.checksum);
    }
}

/// Longitudinal redundancy check: XOR of all bytes.
pub fn lrc(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

fn lrc_of(address: u8, control: u8, payload: &[u8]) -> u8 {
    let len = (payload.len() as u16).to_be_bytes();
    address ^ control ^ len[0] ^ len[1] ^ lrc(payload)
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────┬─────────┬───────────┬──────────────┬─────┐
/// │ Address │ Control │ Length    │ Payload      │ LRC │
/// │ (1B)    │ (1B)    │ (2B BE)   │ (Length B)   │ (1B)│
/// └─────────┴─────────┴───────────┴──────────────┴─────┘
/// ```
pub fn encode_frame(address: u8, control: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    dst.put_u8(address);
    dst.put_u8(control);
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    dst.put_u8(lrc_of(address, control, payload));
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. On error the buffer
/// is left untouched.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let payload_len = u16::from_be_bytes([src[2], src[3]]) as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len + TRAILER_SIZE;
    if src.len() < total {
        return Ok(None);
    }

    let expected = lrc(&src[..total - TRAILER_SIZE]);
    let actual = src[total - 1];
    if expected != actual {
        return Err(FrameError::Checksum { expected, actual });
    }

    let address = src[0];
    let control = src[1];
    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();
    src.advance(TRAILER_SIZE);

    Ok(Some(Frame {
        address,
        control,
        payload,
        checksum: actual,
    }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: [`MAX_PAYLOAD`].
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}
