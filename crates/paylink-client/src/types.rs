//! Typed command arguments and results.

use std::time::Duration;

use bytes::Bytes;
use paylink_session::{DeviceState, EntryMode};
use paylink_tlv::bcd;
use paylink_tlv::{find, tags, Tag, TlvNode};

use crate::error::{CommandError, Result};

fn required(nodes: &[TlvNode], tag: Tag) -> Result<&TlvNode> {
    find(nodes, tag).ok_or_else(|| CommandError::missing(tag))
}

fn text(node: &TlvNode) -> Result<String> {
    node.as_str()
        .map(str::to_owned)
        .ok_or_else(|| CommandError::invalid(node.tag(), "not UTF-8 text"))
}

fn optional_text(nodes: &[TlvNode], tag: Tag) -> Result<Option<String>> {
    find(nodes, tag).map(text).transpose()
}

fn byte(node: &TlvNode) -> Result<u8> {
    node.as_u8()
        .ok_or_else(|| CommandError::invalid(node.tag(), "expected one byte"))
}

fn optional_bytes(nodes: &[TlvNode], tag: Tag) -> Result<Option<Bytes>> {
    match find(nodes, tag) {
        None => Ok(None),
        Some(node) => node
            .bytes()
            .cloned()
            .map(Some)
            .ok_or_else(|| CommandError::invalid(tag, "expected a primitive value")),
    }
}

/// Identity reported by `get_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub model: String,
    pub serial_number: String,
    pub firmware_version: String,
}

impl DeviceInfo {
    pub(crate) fn from_tlv(nodes: &[TlvNode]) -> Result<Self> {
        Ok(Self {
            model: text(required(nodes, tags::MODEL)?)?,
            serial_number: text(required(nodes, tags::SERIAL_NUMBER)?)?,
            firmware_version: text(required(nodes, tags::FIRMWARE_VERSION)?)?,
        })
    }
}

/// State reported by `get_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub state: DeviceState,
    pub battery_percent: Option<u8>,
}

impl DeviceStatus {
    pub(crate) fn from_tlv(nodes: &[TlvNode]) -> Result<Self> {
        let state = DeviceState::from(byte(required(nodes, tags::DEVICE_STATE)?)?);
        let battery_percent = find(nodes, tags::BATTERY_LEVEL).map(byte).transpose()?;
        Ok(Self {
            state,
            battery_percent,
        })
    }
}

/// Card reader state reported by `get_card_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardStatus {
    pub present: bool,
    pub entry_mode: Option<EntryMode>,
}

impl CardStatus {
    pub(crate) fn from_tlv(nodes: &[TlvNode]) -> Result<Self> {
        let present = byte(required(nodes, tags::CARD_PRESENT)?)? != 0;
        let entry_mode = find(nodes, tags::CARD_ENTRY_MODE)
            .map(byte)
            .transpose()?
            .map(EntryMode::from);
        Ok(Self {
            present,
            entry_mode,
        })
    }
}

/// EMV transaction type (`9C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionType {
    #[default]
    Purchase,
    CashAdvance,
    Refund,
    Other(u8),
}

impl TransactionType {
    pub fn code(self) -> u8 {
        match self {
            Self::Purchase => 0x00,
            Self::CashAdvance => 0x01,
            Self::Refund => 0x20,
            Self::Other(code) => code,
        }
    }
}

/// Arguments of `start_transaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Amount in minor units of `currency`.
    pub amount: u64,
    /// ISO 4217 numeric currency code.
    pub currency: u16,
    pub kind: TransactionType,
    /// How long the terminal waits for the cardholder.
    pub user_timeout: Duration,
}

impl TransactionRequest {
    /// Largest amount that fits the twelve-digit amount field.
    pub const MAX_AMOUNT: u64 = 999_999_999_999;

    pub fn purchase(amount: u64, currency: u16) -> Self {
        Self {
            amount,
            currency,
            kind: TransactionType::Purchase,
            user_timeout: Duration::from_secs(60),
        }
    }

    pub fn refund(amount: u64, currency: u16) -> Self {
        Self {
            kind: TransactionType::Refund,
            ..Self::purchase(amount, currency)
        }
    }

    /// Build the `E8` template.
    pub(crate) fn to_tlv(&self) -> Result<TlvNode> {
        if self.amount == 0 {
            return Err(CommandError::InvalidArgument(
                "transaction amount must be greater than zero".into(),
            ));
        }
        let amount = bcd::encode_numeric(self.amount, 12).map_err(|_| {
            CommandError::InvalidArgument(format!(
                "amount {} exceeds {}",
                self.amount,
                Self::MAX_AMOUNT
            ))
        })?;
        let currency = bcd::encode_numeric(u64::from(self.currency), 4).map_err(|_| {
            CommandError::InvalidArgument(format!("currency code {} is not numeric-3", self.currency))
        })?;
        let seconds = u16::try_from(self.user_timeout.as_secs()).map_err(|_| {
            CommandError::InvalidArgument(format!(
                "user timeout {:?} does not fit the terminal's field",
                self.user_timeout
            ))
        })?;

        Ok(TlvNode::constructed(
            tags::TRANSACTION_TEMPLATE,
            vec![
                TlvNode::primitive(tags::AMOUNT_AUTHORISED, amount),
                TlvNode::primitive(tags::CURRENCY_CODE, currency),
                TlvNode::byte(tags::TRANSACTION_TYPE, self.kind.code()),
                TlvNode::primitive(tags::TRANSACTION_TIMEOUT, seconds.to_be_bytes().to_vec()),
            ],
        ))
    }
}

/// Result of a completed transaction (`E9`).
///
/// Card data is carried as the terminal encrypted it; nothing here decrypts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub approved: bool,
    /// Two-character authorisation response code (`8A`); `"00"` is approval.
    pub response_code: String,
    pub auth_code: Option<String>,
    pub masked_pan: Option<String>,
    pub card_data: Option<Bytes>,
    pub key_serial_number: Option<Bytes>,
}

impl TransactionResult {
    pub(crate) fn from_tlv(nodes: &[TlvNode]) -> Result<Self> {
        let template = required(nodes, tags::TRANSACTION_RESULT_TEMPLATE)?;
        if !template.is_constructed() {
            return Err(CommandError::invalid(
                tags::TRANSACTION_RESULT_TEMPLATE,
                "expected a constructed template",
            ));
        }
        let fields = template.children();

        let response_code = text(required(fields, tags::AUTH_RESPONSE_CODE)?)?;
        if response_code.len() != 2 {
            return Err(CommandError::invalid(
                tags::AUTH_RESPONSE_CODE,
                format!("expected two characters, got {response_code:?}"),
            ));
        }

        Ok(Self {
            approved: response_code == "00",
            response_code,
            auth_code: optional_text(fields, tags::AUTH_CODE)?,
            masked_pan: optional_text(fields, tags::MASKED_PAN)?,
            card_data: optional_bytes(fields, tags::ENCRYPTED_CARD_DATA)?,
            key_serial_number: optional_bytes(fields, tags::KEY_SERIAL_NUMBER)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_requires_all_fields() {
        let nodes = vec![
            TlvNode::primitive(tags::MODEL, &b"T-400"[..]),
            TlvNode::primitive(tags::SERIAL_NUMBER, &b"0042"[..]),
        ];
        let err = DeviceInfo::from_tlv(&nodes).unwrap_err();
        assert!(matches!(
            err,
            CommandError::MissingField { tag, .. } if tag == tags::FIRMWARE_VERSION
        ));
    }

    #[test]
    fn status_with_and_without_battery() {
        let nodes = vec![TlvNode::byte(tags::DEVICE_STATE, 0x02)];
        let status = DeviceStatus::from_tlv(&nodes).unwrap();
        assert_eq!(status.state, DeviceState::WaitingForCard);
        assert_eq!(status.battery_percent, None);

        let nodes = vec![
            TlvNode::byte(tags::DEVICE_STATE, 0x00),
            TlvNode::byte(tags::BATTERY_LEVEL, 87),
        ];
        assert_eq!(DeviceStatus::from_tlv(&nodes).unwrap().battery_percent, Some(87));
    }

    #[test]
    fn wide_state_field_is_invalid() {
        let nodes = vec![TlvNode::primitive(tags::DEVICE_STATE, vec![0, 1])];
        assert!(matches!(
            DeviceStatus::from_tlv(&nodes),
            Err(CommandError::InvalidField { .. })
        ));
    }

    #[test]
    fn transaction_template_layout() {
        let request = TransactionRequest {
            amount: 1250,
            currency: 978,
            kind: TransactionType::Purchase,
            user_timeout: Duration::from_secs(90),
        };
        let encoded = paylink_tlv::encode(&[request.to_tlv().unwrap()]);
        assert_eq!(
            encoded.as_ref(),
            &[
                0xE8, 0x16, //
                0x9F, 0x02, 0x06, 0x00, 0x00, 0x00, 0x00, 0x12, 0x50, //
                0x5F, 0x2A, 0x02, 0x09, 0x78, //
                0x9C, 0x01, 0x00, //
                0xDF, 0x73, 0x02, 0x00, 0x5A,
            ]
        );
    }

    #[test]
    fn transaction_arguments_are_checked() {
        let zero = TransactionRequest::purchase(0, 978);
        assert!(matches!(zero.to_tlv(), Err(CommandError::InvalidArgument(_))));

        let huge = TransactionRequest::purchase(TransactionRequest::MAX_AMOUNT + 1, 978);
        assert!(matches!(huge.to_tlv(), Err(CommandError::InvalidArgument(_))));

        let currency = TransactionRequest::purchase(100, 10_000);
        assert!(matches!(currency.to_tlv(), Err(CommandError::InvalidArgument(_))));

        assert!(TransactionRequest::refund(TransactionRequest::MAX_AMOUNT, 840)
            .to_tlv()
            .is_ok());
    }

    #[test]
    fn transaction_result_decodes() {
        let nodes = vec![TlvNode::constructed(
            tags::TRANSACTION_RESULT_TEMPLATE,
            vec![
                TlvNode::primitive(tags::AUTH_RESPONSE_CODE, &b"00"[..]),
                TlvNode::primitive(tags::AUTH_CODE, &b"A1B2C3"[..]),
                TlvNode::primitive(tags::MASKED_PAN, &b"476173******0119"[..]),
                TlvNode::primitive(tags::ENCRYPTED_CARD_DATA, vec![0xAA; 16]),
            ],
        )];
        let result = TransactionResult::from_tlv(&nodes).unwrap();
        assert!(result.approved);
        assert_eq!(result.auth_code.as_deref(), Some("A1B2C3"));
        assert_eq!(result.masked_pan.as_deref(), Some("476173******0119"));
        assert_eq!(result.card_data.as_deref(), Some(&[0xAA; 16][..]));
        assert_eq!(result.key_serial_number, None);
    }

    #[test]
    fn declined_response_code_is_not_approved() {
        let nodes = vec![TlvNode::constructed(
            tags::TRANSACTION_RESULT_TEMPLATE,
            vec![TlvNode::primitive(tags::AUTH_RESPONSE_CODE, &b"05"[..])],
        )];
        let result = TransactionResult::from_tlv(&nodes).unwrap();
        assert!(!result.approved);
        assert_eq!(result.response_code, "05");
    }

    #[test]
    fn transaction_result_needs_template() {
        let nodes = vec![TlvNode::primitive(tags::AUTH_RESPONSE_CODE, &b"00"[..])];
        assert!(matches!(
            TransactionResult::from_tlv(&nodes),
            Err(CommandError::MissingField { tag, .. }) if tag == tags::TRANSACTION_RESULT_TEMPLATE
        ));
    }
}
