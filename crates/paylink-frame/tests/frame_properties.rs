//! Property tests for frame integrity.

use bytes::BytesMut;
use paylink_frame::{decode_frame, encode_frame, FrameError, MAX_PAYLOAD};
use proptest::prelude::*;

fn encoded(address: u8, control: u8, payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::new();
    encode_frame(address, control, payload, &mut buf).expect("payload fits");
    buf
}

proptest! {
    /// Property: decoding an encoded frame yields the original address, control and payload.
    #[test]
    fn prop_frame_roundtrip(
        address in any::<u8>(),
        control in any::<u8>(),
        payload in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let mut wire = encoded(address, control, &payload);
        let frame = decode_frame(&mut wire, MAX_PAYLOAD).unwrap().unwrap();

        prop_assert_eq!(frame.address(), address);
        prop_assert_eq!(frame.control(), control);
        prop_assert_eq!(frame.payload().as_ref(), payload.as_slice());
        prop_assert!(wire.is_empty());
    }

    /// Property: any single corrupted byte outside the length field is caught by the LRC.
    #[test]
    fn prop_single_byte_corruption_detected(
        address in any::<u8>(),
        payload in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let original = encoded(address, 0x80, &payload);
        let idx = index.index(original.len());
        let mut wire = original.clone();
        wire[idx] ^= flip;

        let result = decode_frame(&mut wire, MAX_PAYLOAD);
        if idx == 2 || idx == 3 {
            // A corrupted length changes where the frame ends; it must never
            // decode back to the original frame.
            if let Ok(Some(frame)) = result {
                prop_assert!(frame.payload().as_ref() != payload.as_slice());
            }
        } else {
            let is_checksum_error = matches!(result, Err(FrameError::Checksum { .. }));
            prop_assert!(is_checksum_error);
        }
    }
}
