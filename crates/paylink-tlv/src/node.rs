use bytes::Bytes;

use crate::tag::Tag;
use crate::tags::{self, TagInfo};

/// Value carried by a [`TlvNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    Primitive(Bytes),
    Constructed(Vec<TlvNode>),
}

/// One decoded tag-length-value element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvNode {
    tag: Tag,
    value: TlvValue,
}

impl TlvNode {
    /// Primitive node holding raw bytes.
    pub fn primitive(tag: Tag, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: TlvValue::Primitive(value.into()),
        }
    }

    /// Constructed node holding child nodes in order.
    pub fn constructed(tag: Tag, children: Vec<TlvNode>) -> Self {
        Self {
            tag,
            value: TlvValue::Constructed(children),
        }
    }

    /// Primitive node holding a single byte.
    pub fn byte(tag: Tag, value: u8) -> Self {
        Self::primitive(tag, vec![value])
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn value(&self) -> &TlvValue {
        &self.value
    }

    pub fn into_value(self) -> TlvValue {
        self.value
    }

    pub fn is_constructed(&self) -> bool {
        matches!(self.value, TlvValue::Constructed(_))
    }

    pub fn info(&self) -> Option<&'static TagInfo> {
        tags::lookup(self.tag)
    }

    pub fn name(&self) -> &'static str {
        self.tag.name()
    }

    /// Raw bytes of a primitive node.
    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.value {
            TlvValue::Primitive(bytes) => Some(bytes),
            TlvValue::Constructed(_) => None,
        }
    }

    /// Children of a constructed node; empty for primitives.
    pub fn children(&self) -> &[TlvNode] {
        match &self.value {
            TlvValue::Primitive(_) => &[],
            TlvValue::Constructed(children) => children,
        }
    }

    /// First direct child with `tag`.
    pub fn find(&self, tag: Tag) -> Option<&TlvNode> {
        find(self.children(), tag)
    }

    /// First node with `tag` in depth-first order, including `self`.
    pub fn find_recursive(&self, tag: Tag) -> Option<&TlvNode> {
        if self.tag == tag {
            return Some(self);
        }
        self.children()
            .iter()
            .find_map(|child| child.find_recursive(tag))
    }

    /// Value of a single-byte primitive node.
    pub fn as_u8(&self) -> Option<u8> {
        match self.bytes()?.as_ref() {
            [b] => Some(*b),
            _ => None,
        }
    }

    /// Big-endian unsigned value of a primitive node of 1 to 8 bytes.
    pub fn as_uint(&self) -> Option<u64> {
        let bytes = self.bytes()?;
        if bytes.is_empty() || bytes.len() > 8 {
            return None;
        }
        Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// UTF-8 text of a primitive node.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.bytes()?).ok()
    }

    /// Length of the value field in bytes.
    pub fn value_len(&self) -> usize {
        match &self.value {
            TlvValue::Primitive(bytes) => bytes.len(),
            TlvValue::Constructed(children) => children.iter().map(TlvNode::encoded_len).sum(),
        }
    }

    /// Number of constructed levels on the deepest path; 0 for a primitive.
    pub fn depth(&self) -> usize {
        match &self.value {
            TlvValue::Primitive(_) => 0,
            TlvValue::Constructed(children) => {
                1 + children.iter().map(TlvNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Total encoded size: tag, length field and value.
    pub fn encoded_len(&self) -> usize {
        let value_len = self.value_len();
        self.tag.len() + length_field_len(value_len) + value_len
    }
}

/// First node with `tag` in a sequence.
pub fn find(nodes: &[TlvNode], tag: Tag) -> Option<&TlvNode> {
    nodes.iter().find(|node| node.tag == tag)
}

pub(crate) fn length_field_len(len: usize) -> usize {
    match len {
        0..=0x7F => 1,
        0x80..=0xFF => 2,
        0x100..=0xFFFF => 3,
        0x1_0000..=0xFF_FFFF => 4,
        _ => 5,
    }
}
