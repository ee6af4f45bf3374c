use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, TlvError};
use crate::node::{length_field_len, TlvNode, TlvValue};
use crate::tag::Tag;

/// Maximum nesting of constructed nodes accepted by [`decode`].
///
/// A node whose [`TlvNode::depth`] exceeds this still encodes, but the
/// encoding is rejected on decode with [`TlvError::TooDeep`].
pub const MAX_DEPTH: usize = 16;

const MAX_TAG_BYTES: usize = 3;
const MAX_LENGTH_OCTETS: u8 = 4;

/// Decode a byte sequence into the nodes it contains.
///
/// Empty input decodes to an empty sequence. The whole input must be
/// consumed; trailing garbage shows up as a truncation error.
pub fn decode(input: &[u8]) -> Result<Vec<TlvNode>> {
    decode_level(input, 0, 0)
}

fn decode_level(input: &[u8], base: usize, depth: usize) -> Result<Vec<TlvNode>> {
    if depth > MAX_DEPTH {
        return Err(TlvError::TooDeep {
            offset: base,
            max_depth: MAX_DEPTH,
        });
    }

    let mut nodes = Vec::new();
    let mut pos = 0usize;
    while pos < input.len() {
        let (tag, tag_len) = read_tag(input, pos, base)?;
        pos += tag_len;

        let (len, len_len) = read_length(input, pos, base)?;
        pos += len_len;

        let available = input.len() - pos;
        if len > available {
            return Err(TlvError::TruncatedValue {
                offset: base + pos,
                needed: len,
                available,
            });
        }
        let value = &input[pos..pos + len];

        let node = if tag.is_constructed() {
            TlvNode::constructed(tag, decode_level(value, base + pos, depth + 1)?)
        } else {
            TlvNode::primitive(tag, Bytes::copy_from_slice(value))
        };
        nodes.push(node);
        pos += len;
    }
    Ok(nodes)
}

fn read_tag(input: &[u8], pos: usize, base: usize) -> Result<(Tag, usize)> {
    let first = *input
        .get(pos)
        .ok_or(TlvError::TruncatedTag { offset: base + pos })?;
    let mut raw = u32::from(first);
    let mut len = 1usize;

    if first & 0x1F == 0x1F {
        loop {
            if len == MAX_TAG_BYTES {
                return Err(TlvError::TagTooLong { offset: base + pos });
            }
            let next = *input
                .get(pos + len)
                .ok_or(TlvError::TruncatedTag { offset: base + pos })?;
            raw = (raw << 8) | u32::from(next);
            len += 1;
            if next & 0x80 == 0 {
                break;
            }
        }
    }
    Ok((Tag::new(raw), len))
}

fn read_length(input: &[u8], pos: usize, base: usize) -> Result<(usize, usize)> {
    let first = *input
        .get(pos)
        .ok_or(TlvError::TruncatedLength { offset: base + pos })?;
    if first < 0x80 {
        return Ok((usize::from(first), 1));
    }
    if first == 0x80 {
        return Err(TlvError::IndefiniteLength { offset: base + pos });
    }

    let octets = first & 0x7F;
    if octets > MAX_LENGTH_OCTETS {
        return Err(TlvError::LengthTooLarge {
            offset: base + pos,
            octets,
        });
    }
    let octets = usize::from(octets);
    let field = input
        .get(pos + 1..pos + 1 + octets)
        .ok_or(TlvError::TruncatedLength { offset: base + pos })?;
    let len = field
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
    Ok((len, 1 + octets))
}

/// Encode a node sequence into a fresh buffer.
pub fn encode(nodes: &[TlvNode]) -> Bytes {
    let size = nodes.iter().map(TlvNode::encoded_len).sum();
    let mut buf = BytesMut::with_capacity(size);
    encode_into(nodes, &mut buf);
    buf.freeze()
}

/// Append the encoding of a node sequence to `dst`.
pub fn encode_into(nodes: &[TlvNode], dst: &mut BytesMut) {
    for node in nodes {
        encode_node(node, dst);
    }
}

fn encode_node(node: &TlvNode, dst: &mut BytesMut) {
    let tag = node.tag();
    dst.extend_from_slice(&tag.bytes());
    write_length(node.value_len(), dst);
    match node.value() {
        TlvValue::Primitive(bytes) => dst.extend_from_slice(bytes),
        TlvValue::Constructed(children) => encode_into(children, dst),
    }
}

fn write_length(len: usize, dst: &mut BytesMut) {
    let field_len = length_field_len(len);
    if field_len == 1 {
        dst.put_u8(len as u8);
        return;
    }
    let octets = field_len - 1;
    dst.put_u8(0x80 | octets as u8);
    let be = (len as u64).to_be_bytes();
    dst.extend_from_slice(&be[8 - octets..]);
}
