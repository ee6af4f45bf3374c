//! Command APDUs: `CLA INS P1 P2` followed by TLV data.

use bytes::{BufMut, Bytes, BytesMut};
use paylink_tlv::TlvNode;

/// Class byte of every device command.
pub const CLA: u8 = 0xD0;

/// Instruction bytes.
pub mod ins {
    pub const GET_INFO: u8 = 0x10;
    pub const GET_STATUS: u8 = 0x11;
    pub const DISPLAY_TEXT: u8 = 0x20;
    pub const CLEAR_DISPLAY: u8 = 0x21;
    pub const BEEP: u8 = 0x22;
    pub const START_TRANSACTION: u8 = 0x30;
    pub const ABORT: u8 = 0x3F;
    pub const GET_CARD_STATUS: u8 = 0x40;
    pub const PRINT_TEXT: u8 = 0x50;
    pub const GET_PRINTER_STATUS: u8 = 0x51;
    pub const OPEN_CASH_DRAWER: u8 = 0x60;
    pub const ENABLE_SCANNER: u8 = 0x70;
    pub const DISABLE_SCANNER: u8 = 0x71;
    pub const SERIAL_WRITE: u8 = 0x80;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<TlvNode>,
}

impl Command {
    pub fn new(ins: u8) -> Self {
        Self {
            cla: CLA,
            ins,
            p1: 0,
            p2: 0,
            data: Vec::new(),
        }
    }

    pub fn with_params(mut self, p1: u8, p2: u8) -> Self {
        self.p1 = p1;
        self.p2 = p2;
        self
    }

    pub fn with_data(mut self, data: Vec<TlvNode>) -> Self {
        self.data = data;
        self
    }

    pub fn push(&mut self, node: TlvNode) {
        self.data.push(node);
    }

    pub fn encoded_len(&self) -> usize {
        4 + self.data.iter().map(TlvNode::encoded_len).sum::<usize>()
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_slice(&[self.cla, self.ins, self.p1, self.p2]);
        paylink_tlv::encode_into(&self.data, &mut buf);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use paylink_tlv::tags;

    use super::*;

    #[test]
    fn header_only() {
        let command = Command::new(ins::GET_INFO);
        assert_eq!(command.encode().as_ref(), &[0xD0, 0x10, 0x00, 0x00]);
        assert_eq!(command.encoded_len(), 4);
    }

    #[test]
    fn header_and_data() {
        let command = Command::new(ins::SERIAL_WRITE)
            .with_params(0x01, 0x02)
            .with_data(vec![
                TlvNode::byte(tags::SERIAL_PORT_NUMBER, 2),
                TlvNode::primitive(tags::SERIAL_DATA, &b"hi"[..]),
            ]);
        let encoded = command.encode();
        assert_eq!(
            encoded.as_ref(),
            &[0xD0, 0x80, 0x01, 0x02, 0xDF, 0x50, 0x01, 0x02, 0xDF, 0x51, 0x02, b'h', b'i']
        );
        assert_eq!(encoded.len(), command.encoded_len());
    }
}
