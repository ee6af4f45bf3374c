/// Errors raised while decoding TLV data.
///
/// Every variant means the input was malformed; offsets are relative to the
/// start of the buffer handed to [`crate::decode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TlvError {
    #[error("malformed TLV: truncated tag at offset {offset}")]
    TruncatedTag { offset: usize },

    #[error("malformed TLV: tag at offset {offset} is longer than 3 bytes")]
    TagTooLong { offset: usize },

    #[error("malformed TLV: truncated length at offset {offset}")]
    TruncatedLength { offset: usize },

    #[error("malformed TLV: indefinite length at offset {offset}")]
    IndefiniteLength { offset: usize },

    #[error("malformed TLV: {octets}-byte length field at offset {offset}")]
    LengthTooLarge { offset: usize, octets: u8 },

    #[error("malformed TLV: value at offset {offset} needs {needed} bytes, {available} available")]
    TruncatedValue {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("malformed TLV: nesting deeper than {max_depth} at offset {offset}")]
    TooDeep { offset: usize, max_depth: usize },
}

pub type Result<T> = std::result::Result<T, TlvError>;

/// Errors raised by the packed-BCD numeric helpers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BcdError {
    #[error("value {value} does not fit in {digits} BCD digits")]
    Overflow { value: u64, digits: usize },

    #[error("digit count {0} is not a positive even number")]
    OddDigits(usize),

    #[error("invalid BCD nibble 0x{nibble:X} at byte {index}")]
    InvalidNibble { index: usize, nibble: u8 },

    #[error("{0} BCD bytes exceed a 64-bit value")]
    TooLong(usize),
}
