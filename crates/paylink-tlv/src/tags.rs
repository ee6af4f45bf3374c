//! Symbolic tag table.
//!
//! Covers the EMV data elements the terminal reports plus the private `Dxxx`
//! and `Ex` tags of the terminal command set. The table is sorted by tag.

use crate::tag::Tag;

/// Description of a known tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInfo {
    pub tag: Tag,
    pub name: &'static str,
    pub constructed: bool,
}

const fn prim(raw: u32, name: &'static str) -> TagInfo {
    TagInfo {
        tag: Tag::new(raw),
        name,
        constructed: false,
    }
}

const fn tmpl(raw: u32, name: &'static str) -> TagInfo {
    TagInfo {
        tag: Tag::new(raw),
        name,
        constructed: true,
    }
}

pub const APPLICATION_ID: Tag = Tag::new(0x4F);
pub const APPLICATION_LABEL: Tag = Tag::new(0x50);
pub const TRACK2_EQUIVALENT: Tag = Tag::new(0x57);
pub const PAN: Tag = Tag::new(0x5A);
pub const FCI_TEMPLATE: Tag = Tag::new(0x6F);
pub const RECORD_TEMPLATE: Tag = Tag::new(0x70);
pub const RESPONSE_TEMPLATE: Tag = Tag::new(0x77);
pub const AUTH_CODE: Tag = Tag::new(0x89);
pub const AUTH_RESPONSE_CODE: Tag = Tag::new(0x8A);
pub const TVR: Tag = Tag::new(0x95);
pub const TRANSACTION_DATE: Tag = Tag::new(0x9A);
pub const TRANSACTION_TYPE: Tag = Tag::new(0x9C);
pub const FCI_PROPRIETARY: Tag = Tag::new(0xA5);
pub const DEVICE_STATUS_TEMPLATE: Tag = Tag::new(0xE1);
pub const CARD_STATUS_TEMPLATE: Tag = Tag::new(0xE2);
pub const KEY_PRESS_TEMPLATE: Tag = Tag::new(0xE3);
pub const BARCODE_TEMPLATE: Tag = Tag::new(0xE4);
pub const SERIAL_DATA_TEMPLATE: Tag = Tag::new(0xE5);
pub const PRINTER_STATUS_TEMPLATE: Tag = Tag::new(0xE6);
pub const TRANSACTION_TEMPLATE: Tag = Tag::new(0xE8);
pub const TRANSACTION_RESULT_TEMPLATE: Tag = Tag::new(0xE9);
pub const CARDHOLDER_NAME: Tag = Tag::new(0x5F20);
pub const EXPIRY_DATE: Tag = Tag::new(0x5F24);
pub const CURRENCY_CODE: Tag = Tag::new(0x5F2A);
pub const PAN_SEQUENCE: Tag = Tag::new(0x5F34);
pub const AMOUNT_AUTHORISED: Tag = Tag::new(0x9F02);
pub const AMOUNT_OTHER: Tag = Tag::new(0x9F03);
pub const TERMINAL_COUNTRY_CODE: Tag = Tag::new(0x9F1A);
pub const TRANSACTION_TIME: Tag = Tag::new(0x9F21);
pub const APPLICATION_CRYPTOGRAM: Tag = Tag::new(0x9F26);
pub const CRYPTOGRAM_INFO: Tag = Tag::new(0x9F27);
pub const ATC: Tag = Tag::new(0x9F36);
pub const UNPREDICTABLE_NUMBER: Tag = Tag::new(0x9F37);
pub const MODEL: Tag = Tag::new(0xDF01);
pub const SERIAL_NUMBER: Tag = Tag::new(0xDF02);
pub const FIRMWARE_VERSION: Tag = Tag::new(0xDF03);
pub const DEVICE_STATE: Tag = Tag::new(0xDF10);
pub const BATTERY_LEVEL: Tag = Tag::new(0xDF11);
pub const CARD_PRESENT: Tag = Tag::new(0xDF20);
pub const CARD_ENTRY_MODE: Tag = Tag::new(0xDF21);
pub const KEY_CODE: Tag = Tag::new(0xDF30);
pub const BARCODE_SYMBOLOGY: Tag = Tag::new(0xDF40);
pub const BARCODE_DATA: Tag = Tag::new(0xDF41);
pub const SERIAL_PORT_NUMBER: Tag = Tag::new(0xDF50);
pub const SERIAL_DATA: Tag = Tag::new(0xDF51);
pub const PRINTER_FLAGS: Tag = Tag::new(0xDF60);
pub const DISPLAY_LINE: Tag = Tag::new(0xDF70);
pub const BEEP_TONE: Tag = Tag::new(0xDF71);
pub const BEEP_DURATION: Tag = Tag::new(0xDF72);
pub const TRANSACTION_TIMEOUT: Tag = Tag::new(0xDF73);
pub const PRINT_LINE: Tag = Tag::new(0xDF74);
pub const PAPER_CUT: Tag = Tag::new(0xDF75);
pub const MASKED_PAN: Tag = Tag::new(0xDF76);
pub const ENCRYPTED_CARD_DATA: Tag = Tag::new(0xDF77);
pub const KEY_SERIAL_NUMBER: Tag = Tag::new(0xDF78);

static TABLE: &[TagInfo] = &[
    prim(0x4F, "application_id"),
    prim(0x50, "application_label"),
    prim(0x57, "track2_equivalent"),
    prim(0x5A, "pan"),
    tmpl(0x6F, "fci_template"),
    tmpl(0x70, "record_template"),
    tmpl(0x77, "response_template"),
    prim(0x82, "application_interchange_profile"),
    prim(0x84, "df_name"),
    prim(0x89, "auth_code"),
    prim(0x8A, "auth_response_code"),
    prim(0x95, "terminal_verification_results"),
    prim(0x9A, "transaction_date"),
    prim(0x9C, "transaction_type"),
    tmpl(0xA5, "fci_proprietary"),
    tmpl(0xE1, "device_status_template"),
    tmpl(0xE2, "card_status_template"),
    tmpl(0xE3, "key_press_template"),
    tmpl(0xE4, "barcode_template"),
    tmpl(0xE5, "serial_data_template"),
    tmpl(0xE6, "printer_status_template"),
    tmpl(0xE8, "transaction_template"),
    tmpl(0xE9, "transaction_result_template"),
    prim(0x5F20, "cardholder_name"),
    prim(0x5F24, "expiry_date"),
    prim(0x5F2A, "currency_code"),
    prim(0x5F34, "pan_sequence_number"),
    prim(0x9F02, "amount_authorised"),
    prim(0x9F03, "amount_other"),
    prim(0x9F1A, "terminal_country_code"),
    prim(0x9F21, "transaction_time"),
    prim(0x9F26, "application_cryptogram"),
    prim(0x9F27, "cryptogram_information_data"),
    prim(0x9F36, "application_transaction_counter"),
    prim(0x9F37, "unpredictable_number"),
    prim(0xDF01, "model"),
    prim(0xDF02, "serial_number"),
    prim(0xDF03, "firmware_version"),
    prim(0xDF10, "device_state"),
    prim(0xDF11, "battery_level"),
    prim(0xDF20, "card_present"),
    prim(0xDF21, "card_entry_mode"),
    prim(0xDF30, "key_code"),
    prim(0xDF40, "barcode_symbology"),
    prim(0xDF41, "barcode_data"),
    prim(0xDF50, "serial_port"),
    prim(0xDF51, "serial_data"),
    prim(0xDF60, "printer_flags"),
    prim(0xDF70, "display_line"),
    prim(0xDF71, "beep_tone"),
    prim(0xDF72, "beep_duration"),
    prim(0xDF73, "transaction_timeout"),
    prim(0xDF74, "print_line"),
    prim(0xDF75, "paper_cut"),
    prim(0xDF76, "masked_pan"),
    prim(0xDF77, "encrypted_card_data"),
    prim(0xDF78, "key_serial_number"),
];

/// Look up a tag's symbolic description.
pub fn lookup(tag: Tag) -> Option<&'static TagInfo> {
    TABLE
        .binary_search_by_key(&tag, |info| info.tag)
        .ok()
        .map(|idx| &TABLE[idx])
}
