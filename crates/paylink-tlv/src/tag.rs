use std::fmt;

use crate::tags;

/// Class bits of the first tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Universal,
    Application,
    ContextSpecific,
    Private,
}

/// A BER tag of 1 to 3 bytes, stored as its big-endian byte value.
///
/// `Tag::new(0x9F02)` is the two-byte tag `9F 02`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(u32);

impl Tag {
    /// Wrap a raw tag value without validating its structure.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Wrap a raw tag value, checking BER continuation rules and the 3-byte limit.
    pub fn try_new(raw: u32) -> Option<Self> {
        if raw > 0xFF_FFFF {
            return None;
        }
        let tag = Self(raw);
        let bytes = tag.bytes();
        let (first, rest) = bytes.split_first()?;
        let continues = first & 0x1F == 0x1F;
        if rest.is_empty() {
            return (!continues).then_some(tag);
        }
        if !continues {
            return None;
        }
        let (last, middle) = rest.split_last()?;
        if last & 0x80 != 0 || middle.iter().any(|b| b & 0x80 == 0) {
            return None;
        }
        Some(tag)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Number of bytes this tag occupies on the wire.
    pub const fn len(self) -> usize {
        if self.0 > 0xFFFF {
            3
        } else if self.0 > 0xFF {
            2
        } else {
            1
        }
    }

    /// Always false; present for clippy's `len_without_is_empty`.
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Wire bytes of this tag.
    pub fn bytes(self) -> Vec<u8> {
        let all = self.0.to_be_bytes();
        all[4 - self.len()..].to_vec()
    }

    /// First wire byte (carries class and form bits).
    pub const fn first_byte(self) -> u8 {
        (self.0 >> ((self.len() - 1) * 8)) as u8
    }

    pub const fn class(self) -> TagClass {
        match self.first_byte() >> 6 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Whether the form bit of the first byte marks this tag constructed.
    pub const fn has_constructed_bit(self) -> bool {
        self.first_byte() & 0x20 != 0
    }

    /// Whether values under this tag are nested TLV sequences.
    ///
    /// Known template tags from the [`tags`] table win over the form bit.
    pub fn is_constructed(self) -> bool {
        tags::lookup(self)
            .map(|info| info.constructed)
            .unwrap_or_else(|| self.has_constructed_bit())
    }

    /// Symbolic name from the tag table, or `"unknown"`.
    pub fn name(self) -> &'static str {
        tags::lookup(self).map(|info| info.name).unwrap_or("unknown")
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$X}", self.0, width = self.len() * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_and_bytes() {
        assert_eq!(Tag::new(0x5A).len(), 1);
        assert_eq!(Tag::new(0x9F02).len(), 2);
        assert_eq!(Tag::new(0x1F8101).len(), 3);
        assert_eq!(Tag::new(0x9F02).bytes(), vec![0x9F, 0x02]);
        assert_eq!(Tag::new(0x9F02).first_byte(), 0x9F);
    }

    #[test]
    fn try_new_checks_continuation() {
        assert!(Tag::try_new(0x5A).is_some());
        assert!(Tag::try_new(0x9F02).is_some());
        assert!(Tag::try_new(0xDF8101).is_some());
        // 1F alone announces a continuation byte that is missing.
        assert!(Tag::try_new(0x1F).is_none());
        // 5A does not announce a continuation.
        assert!(Tag::try_new(0x5A01).is_none());
        // Last byte still has the continuation bit set.
        assert!(Tag::try_new(0x9F82).is_none());
        // Middle byte lacks the continuation bit.
        assert!(Tag::try_new(0x9F0201).is_none());
        assert!(Tag::try_new(0x9F818101).is_none());
    }

    #[test]
    fn class_and_form() {
        assert_eq!(Tag::new(0x5A).class(), TagClass::Application);
        assert_eq!(Tag::new(0x9F02).class(), TagClass::ContextSpecific);
        assert_eq!(Tag::new(0xE1).class(), TagClass::Private);
        assert!(Tag::new(0xE1).has_constructed_bit());
        assert!(!Tag::new(0xDF10).has_constructed_bit());
        assert!(Tag::new(0x70).is_constructed());
        assert!(!Tag::new(0x9F02).is_constructed());
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Tag::new(0x5A).to_string(), "5A");
        assert_eq!(Tag::new(0x9F02).to_string(), "9F02");
        assert_eq!(format!("{:?}", Tag::new(0x0A)), "Tag(0A)");
    }
}
