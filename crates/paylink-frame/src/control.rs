//! Control byte flags.

/// Host to device frame, a reply is expected.
pub const HOST_COMMAND: u8 = 0x00;

/// Set on every frame sent by the device.
pub const FROM_DEVICE: u8 = 0x80;

/// The device must not answer this frame.
pub const NO_REPLY: u8 = 0x01;

/// Returns true if the control byte marks a device-originated frame.
pub fn is_from_device(control: u8) -> bool {
    control & FROM_DEVICE != 0
}

/// Returns true if the sender expects the frame to be answered.
pub fn expects_reply(control: u8) -> bool {
    control & NO_REPLY == 0
}
