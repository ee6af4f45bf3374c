//! Typed device notifications and the per-session event bus.

use std::sync::Arc;

use bytes::Bytes;
use paylink_events::{EventChannel, LockGroup};
use paylink_tlv::{tags, Tag, TlvNode};

use crate::device::{DeviceState, EntryMode, PrinterStatus};

/// Raised after `open()` succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEstablished {
    pub generation: u64,
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `close()` was called.
    Closed,
    /// The link failed; carries the underlying error text.
    LinkError(String),
}

/// Raised when the reader thread of a session exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionLost {
    pub generation: u64,
    pub reason: DisconnectReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatusChanged {
    pub address: u8,
    pub state: DeviceState,
    pub battery_percent: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStatusChanged {
    pub address: u8,
    pub present: bool,
    pub entry_mode: Option<EntryMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPressed {
    pub address: u8,
    pub key: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeScanned {
    pub address: u8,
    pub symbology: Option<u8>,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialDataReceived {
    pub address: u8,
    pub port: u8,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterStatusChanged {
    pub address: u8,
    pub status: PrinterStatus,
}

/// Failure to turn a notification template into a typed event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventDecodeError {
    #[error("template {0} is not a device notification")]
    UnknownTemplate(Tag),

    #[error("template {template} is missing field {field}")]
    MissingField { template: Tag, field: Tag },

    #[error("field {field} is malformed: {reason}")]
    InvalidField { field: Tag, reason: &'static str },
}

/// A decoded unsolicited device message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsolicitedEvent {
    DeviceStatus(DeviceStatusChanged),
    CardStatus(CardStatusChanged),
    KeyPressed(KeyPressed),
    Barcode(BarcodeScanned),
    SerialData(SerialDataReceived),
    PrinterStatus(PrinterStatusChanged),
}

impl UnsolicitedEvent {
    /// Decode a notification template received from `address`.
    pub fn decode(address: u8, template: &TlvNode) -> Result<Self, EventDecodeError> {
        let fields = Fields { template };
        let event = match template.tag() {
            tags::DEVICE_STATUS_TEMPLATE => Self::DeviceStatus(DeviceStatusChanged {
                address,
                state: DeviceState::from(fields.byte(tags::DEVICE_STATE)?),
                battery_percent: fields.optional_byte(tags::BATTERY_LEVEL)?,
            }),
            tags::CARD_STATUS_TEMPLATE => Self::CardStatus(CardStatusChanged {
                address,
                present: fields.byte(tags::CARD_PRESENT)? != 0,
                entry_mode: fields.optional_byte(tags::CARD_ENTRY_MODE)?.map(EntryMode::from),
            }),
            tags::KEY_PRESS_TEMPLATE => Self::KeyPressed(KeyPressed {
                address,
                key: fields.byte(tags::KEY_CODE)?,
            }),
            tags::BARCODE_TEMPLATE => Self::Barcode(BarcodeScanned {
                address,
                symbology: fields.optional_byte(tags::BARCODE_SYMBOLOGY)?,
                data: fields.bytes(tags::BARCODE_DATA)?,
            }),
            tags::SERIAL_DATA_TEMPLATE => Self::SerialData(SerialDataReceived {
                address,
                port: fields.byte(tags::SERIAL_PORT_NUMBER)?,
                data: fields.bytes(tags::SERIAL_DATA)?,
            }),
            tags::PRINTER_STATUS_TEMPLATE => Self::PrinterStatus(PrinterStatusChanged {
                address,
                status: PrinterStatus::from_bits(fields.byte(tags::PRINTER_FLAGS)?),
            }),
            other => return Err(EventDecodeError::UnknownTemplate(other)),
        };
        Ok(event)
    }

    /// Name of the channel this event is raised on.
    pub fn channel_name(&self) -> &'static str {
        match self {
            Self::DeviceStatus(_) => "device_status",
            Self::CardStatus(_) => "card_status",
            Self::KeyPressed(_) => "key_pressed",
            Self::Barcode(_) => "barcode",
            Self::SerialData(_) => "serial_data",
            Self::PrinterStatus(_) => "printer_status",
        }
    }
}

struct Fields<'a> {
    template: &'a TlvNode,
}

impl Fields<'_> {
    fn optional_bytes(&self, field: Tag) -> Result<Option<Bytes>, EventDecodeError> {
        match self.template.find(field) {
            None => Ok(None),
            Some(node) => {
                let bytes = node.bytes().ok_or(EventDecodeError::InvalidField {
                    field,
                    reason: "expected a primitive value",
                })?;
                Ok(Some(bytes.clone()))
            }
        }
    }

    fn bytes(&self, field: Tag) -> Result<Bytes, EventDecodeError> {
        self.optional_bytes(field)?
            .ok_or(EventDecodeError::MissingField {
                template: self.template.tag(),
                field,
            })
    }

    fn optional_byte(&self, field: Tag) -> Result<Option<u8>, EventDecodeError> {
        match self.optional_bytes(field)? {
            None => Ok(None),
            Some(bytes) => match bytes.as_ref() {
                [b] => Ok(Some(*b)),
                _ => Err(EventDecodeError::InvalidField {
                    field,
                    reason: "expected exactly one byte",
                }),
            },
        }
    }

    fn byte(&self, field: Tag) -> Result<u8, EventDecodeError> {
        self.optional_byte(field)?
            .ok_or(EventDecodeError::MissingField {
                template: self.template.tag(),
                field,
            })
    }
}

/// The fixed set of event channels of a session, all in one lock group.
///
/// Outlives individual open/close cycles: handlers registered once keep
/// receiving events after a reopen.
#[derive(Debug)]
pub struct DeviceEvents {
    group: Arc<LockGroup>,
    pub connected: EventChannel<ConnectionEstablished>,
    pub disconnected: EventChannel<ConnectionLost>,
    pub device_status: EventChannel<DeviceStatusChanged>,
    pub card_status: EventChannel<CardStatusChanged>,
    pub key_pressed: EventChannel<KeyPressed>,
    pub barcode: EventChannel<BarcodeScanned>,
    pub serial_data: EventChannel<SerialDataReceived>,
    pub printer_status: EventChannel<PrinterStatusChanged>,
}

impl DeviceEvents {
    pub fn new() -> Self {
        Self::with_group(Arc::new(LockGroup::new("device-events")))
    }

    /// Build the channel set on an existing lock group.
    pub fn with_group(group: Arc<LockGroup>) -> Self {
        Self {
            connected: EventChannel::new("connected", Arc::clone(&group)),
            disconnected: EventChannel::new("disconnected", Arc::clone(&group)),
            device_status: EventChannel::new("device_status", Arc::clone(&group)),
            card_status: EventChannel::new("card_status", Arc::clone(&group)),
            key_pressed: EventChannel::new("key_pressed", Arc::clone(&group)),
            barcode: EventChannel::new("barcode", Arc::clone(&group)),
            serial_data: EventChannel::new("serial_data", Arc::clone(&group)),
            printer_status: EventChannel::new("printer_status", Arc::clone(&group)),
            group,
        }
    }

    pub fn group(&self) -> &Arc<LockGroup> {
        &self.group
    }

    /// Route a decoded notification to its channel.
    pub fn notify(&self, event: &UnsolicitedEvent) -> paylink_events::Result<bool> {
        match event {
            UnsolicitedEvent::DeviceStatus(e) => self.device_status.notify(e),
            UnsolicitedEvent::CardStatus(e) => self.card_status.notify(e),
            UnsolicitedEvent::KeyPressed(e) => self.key_pressed.notify(e),
            UnsolicitedEvent::Barcode(e) => self.barcode.notify(e),
            UnsolicitedEvent::SerialData(e) => self.serial_data.notify(e),
            UnsolicitedEvent::PrinterStatus(e) => self.printer_status.notify(e),
        }
    }

    /// Remove every registered handler.
    pub fn clear_all(&self) {
        self.connected.clear();
        self.disconnected.clear();
        self.device_status.clear();
        self.card_status.clear();
        self.key_pressed.clear();
        self.barcode.clear();
        self.serial_data.clear();
        self.printer_status.clear();
    }
}

impl Default for DeviceEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use paylink_events::handler;

    use super::*;

    fn decode(wire: &[u8]) -> Result<UnsolicitedEvent, EventDecodeError> {
        let nodes = paylink_tlv::decode(wire).unwrap();
        UnsolicitedEvent::decode(0x01, &nodes[0])
    }

    #[test]
    fn device_status() {
        let event = decode(&[0xE1, 0x08, 0xDF, 0x10, 0x01, 0x02, 0xDF, 0x11, 0x01, 0x55]).unwrap();
        assert_eq!(
            event,
            UnsolicitedEvent::DeviceStatus(DeviceStatusChanged {
                address: 0x01,
                state: DeviceState::WaitingForCard,
                battery_percent: Some(0x55),
            })
        );
    }

    #[test]
    fn card_status_without_entry_mode() {
        let event = decode(&[0xE2, 0x04, 0xDF, 0x20, 0x01, 0x00]).unwrap();
        assert_eq!(
            event,
            UnsolicitedEvent::CardStatus(CardStatusChanged {
                address: 0x01,
                present: false,
                entry_mode: None,
            })
        );
    }

    #[test]
    fn barcode_and_serial() {
        let event = decode(&[
            0xE4, 0x0A, 0xDF, 0x40, 0x01, 0x0D, 0xDF, 0x41, 0x03, b'1', b'2', b'3',
        ])
        .unwrap();
        let UnsolicitedEvent::Barcode(scan) = event else {
            panic!("expected barcode");
        };
        assert_eq!(scan.symbology, Some(0x0D));
        assert_eq!(scan.data.as_ref(), b"123");

        let event = decode(&[0xE5, 0x09, 0xDF, 0x50, 0x01, 0x02, 0xDF, 0x51, 0x02, 0xAA, 0xBB]).unwrap();
        assert_eq!(event.channel_name(), "serial_data");
    }

    #[test]
    fn missing_field_reported() {
        let err = decode(&[0xE3, 0x00]).unwrap_err();
        assert_eq!(
            err,
            EventDecodeError::MissingField {
                template: tags::KEY_PRESS_TEMPLATE,
                field: tags::KEY_CODE,
            }
        );
    }

    #[test]
    fn wide_byte_field_rejected() {
        let err = decode(&[0xE6, 0x05, 0xDF, 0x60, 0x02, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, EventDecodeError::InvalidField { .. }));
    }

    #[test]
    fn unknown_template_rejected() {
        let node = TlvNode::constructed(Tag::new(0x70), vec![]);
        assert_eq!(
            UnsolicitedEvent::decode(1, &node).unwrap_err(),
            EventDecodeError::UnknownTemplate(Tag::new(0x70))
        );
    }

    #[test]
    fn notify_routes_to_channel() {
        let events = DeviceEvents::new();
        let keys = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&keys);
        events.key_pressed.register(handler(move |e: &KeyPressed| {
            sink.store(e.key as usize, Ordering::SeqCst);
            Ok(())
        }));

        let key = UnsolicitedEvent::KeyPressed(KeyPressed { address: 1, key: 0x0D });
        assert!(events.notify(&key).unwrap());
        assert_eq!(keys.load(Ordering::SeqCst), 0x0D);

        let scan = UnsolicitedEvent::Barcode(BarcodeScanned {
            address: 3,
            symbology: None,
            data: Bytes::new(),
        });
        assert!(!events.notify(&scan).unwrap());
    }

    #[test]
    fn channels_share_one_group() {
        let events = DeviceEvents::new();
        assert!(Arc::ptr_eq(events.connected.group(), events.group()));
        assert!(Arc::ptr_eq(events.printer_status.group(), events.group()));
    }
}
