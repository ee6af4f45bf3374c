//! Well-known address ids.
//!
//! Several logical devices can share one transport; the address byte selects
//! which one a frame is for. The engine passes any byte through.

/// The payment terminal itself.
pub const TERMINAL: u8 = 0x01;

/// Receipt printer attached to the terminal.
pub const PRINTER: u8 = 0x02;

/// Barcode scanner.
pub const SCANNER: u8 = 0x03;

/// Cash drawer kick-out port.
pub const CASH_DRAWER: u8 = 0x04;

/// Serial pass-through port.
pub const SERIAL_PORT: u8 = 0x05;

/// Returns a human-readable name for an address id.
pub fn address_name(address: u8) -> &'static str {
    match address {
        TERMINAL => "TERMINAL",
        PRINTER => "PRINTER",
        SCANNER => "SCANNER",
        CASH_DRAWER => "CASH_DRAWER",
        SERIAL_PORT => "SERIAL_PORT",
        _ => "UNKNOWN",
    }
}
