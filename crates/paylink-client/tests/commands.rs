#![cfg(unix)]

mod common;

use std::thread;
use std::time::Duration;

use paylink_client::{
    ins, CommandClient, CommandError, CommandStatus, DeviceInfo, Outcome, TransactionRequest,
    TransactionType,
};
use paylink_frame::{PRINTER, SCANNER, SERIAL_PORT, TERMINAL};
use paylink_session::{DeviceState, EntryMode, SessionError};
use paylink_tlv::{tags, TlvNode};

use common::{connect, short_timeouts};

#[test]
fn get_info_decodes_identity() {
    let (session, mut terminal) = connect();
    let client = CommandClient::new(session);

    let device = thread::spawn(move || {
        let command = terminal.next_command();
        assert_eq!(command.address(), TERMINAL);
        assert_eq!(command.payload().as_ref(), &[0xD0, ins::GET_INFO, 0x00, 0x00]);
        terminal.respond_tlv(
            TERMINAL,
            &[
                TlvNode::primitive(tags::MODEL, &b"T-400"[..]),
                TlvNode::primitive(tags::SERIAL_NUMBER, &b"0042-17"[..]),
                TlvNode::primitive(tags::FIRMWARE_VERSION, &b"4.2.1"[..]),
            ],
            0x9000,
        );
    });

    let outcome = client.get_info().unwrap();
    device.join().unwrap();
    assert_eq!(
        outcome,
        Outcome::Done(DeviceInfo {
            model: "T-400".into(),
            serial_number: "0042-17".into(),
            firmware_version: "4.2.1".into(),
        })
    );
}

#[test]
fn card_not_present_is_declined_not_an_error() {
    let (session, mut terminal) = connect();
    let client = CommandClient::new(session);

    let device = thread::spawn(move || {
        let command = terminal.next_command();
        assert_eq!(command.payload()[1], ins::GET_CARD_STATUS);
        terminal.respond(TERMINAL, &[], 0x6403);
    });

    let outcome = client.get_card_status().unwrap();
    device.join().unwrap();
    assert_eq!(outcome, Outcome::Declined(CommandStatus::CardNotPresent));
}

#[test]
fn card_status_decodes_entry_mode() {
    let (session, mut terminal) = connect();
    let client = CommandClient::new(session);

    let device = thread::spawn(move || {
        terminal.next_command();
        terminal.respond_tlv(
            TERMINAL,
            &[
                TlvNode::byte(tags::CARD_PRESENT, 1),
                TlvNode::byte(tags::CARD_ENTRY_MODE, 0x03),
            ],
            0x9000,
        );
    });

    let status = client.get_card_status().unwrap().done().unwrap();
    device.join().unwrap();
    assert!(status.present);
    assert_eq!(status.entry_mode, Some(EntryMode::Contactless));
}

#[test]
fn malformed_response_keeps_session_usable() {
    let (session, mut terminal) = connect();
    let client = CommandClient::new(session.clone());

    let device = thread::spawn(move || {
        terminal.next_command();
        // DF10 claims five value bytes but carries one.
        terminal.respond(TERMINAL, &[0xDF, 0x10, 0x05, 0x00], 0x9000);

        terminal.next_command();
        terminal.respond_tlv(TERMINAL, &[TlvNode::byte(tags::DEVICE_STATE, 0x01)], 0x9000);
    });

    let err = client.get_status(TERMINAL).unwrap_err();
    assert!(matches!(err, CommandError::MalformedResponse(_)), "{err:?}");
    assert!(err.is_recoverable());
    assert!(session.is_open());

    let status = client.get_status(TERMINAL).unwrap().done().unwrap();
    assert_eq!(status.state, DeviceState::Busy);
    device.join().unwrap();
}

#[test]
fn approved_transaction() {
    let (session, mut terminal) = connect();
    let client = CommandClient::new(session);

    let device = thread::spawn(move || {
        let command = terminal.next_command();
        assert_eq!(command.address(), TERMINAL);
        let payload = command.payload();
        assert_eq!(&payload[..4], &[0xD0, ins::START_TRANSACTION, 0x00, 0x00]);

        let nodes = paylink_tlv::decode(&payload[4..]).unwrap();
        let template = &nodes[0];
        assert_eq!(template.tag(), tags::TRANSACTION_TEMPLATE);
        let amount = template.find(tags::AMOUNT_AUTHORISED).unwrap();
        assert_eq!(
            amount.bytes().unwrap().as_ref(),
            &[0x00, 0x00, 0x00, 0x00, 0x42, 0x00]
        );
        assert_eq!(template.find(tags::TRANSACTION_TYPE).unwrap().as_u8(), Some(0x20));

        terminal.respond_tlv(
            TERMINAL,
            &[TlvNode::constructed(
                tags::TRANSACTION_RESULT_TEMPLATE,
                vec![
                    TlvNode::primitive(tags::AUTH_RESPONSE_CODE, &b"00"[..]),
                    TlvNode::primitive(tags::AUTH_CODE, &b"0A12FF"[..]),
                    TlvNode::primitive(tags::ENCRYPTED_CARD_DATA, vec![0x5A; 24]),
                    TlvNode::primitive(tags::KEY_SERIAL_NUMBER, vec![0xFF, 0xFF, 0x98, 0x76]),
                ],
            )],
            0x9000,
        );
    });

    let request = TransactionRequest::refund(4200, 840);
    assert_eq!(request.kind, TransactionType::Refund);
    let result = client.start_transaction(&request).unwrap().done().unwrap();
    device.join().unwrap();

    assert!(result.approved);
    assert_eq!(result.auth_code.as_deref(), Some("0A12FF"));
    assert_eq!(result.card_data.as_ref().map(|d| d.len()), Some(24));
    assert_eq!(
        result.key_serial_number.as_deref(),
        Some(&[0xFF, 0xFF, 0x98, 0x76][..])
    );
}

#[test]
fn peripheral_commands_target_their_interface() {
    let (session, mut terminal) = connect();
    let client = CommandClient::new(session);

    let device = thread::spawn(move || {
        let print = terminal.next_command();
        assert_eq!(print.address(), PRINTER);
        let nodes = paylink_tlv::decode(&print.payload()[4..]).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].as_str(), Some("TOTAL"));
        assert_eq!(nodes[1].as_str(), Some("12.50"));
        assert_eq!(nodes[2].tag(), tags::PAPER_CUT);
        assert_eq!(nodes[2].as_u8(), Some(1));
        terminal.respond(PRINTER, &[], 0x6405);

        let scanner = terminal.next_command();
        assert_eq!(scanner.address(), SCANNER);
        assert_eq!(scanner.payload()[1], ins::DISABLE_SCANNER);
        terminal.respond(SCANNER, &[], 0x9000);

        let serial = terminal.next_command();
        assert_eq!(serial.address(), SERIAL_PORT);
        assert_eq!(
            &serial.payload()[4..],
            &[0xDF, 0x50, 0x01, 0x02, 0xDF, 0x51, 0x03, 0x01, 0x02, 0x03]
        );
        terminal.respond(SERIAL_PORT, &[], 0x9000);

        let printer_status = terminal.next_command();
        assert_eq!(printer_status.payload()[1], ins::GET_PRINTER_STATUS);
        terminal.respond_tlv(PRINTER, &[TlvNode::byte(tags::PRINTER_FLAGS, 0x02)], 0x9000);
    });

    assert_eq!(
        client.print_text(&["TOTAL", "12.50"], true).unwrap(),
        Outcome::Declined(CommandStatus::PaperOut)
    );
    assert!(client.set_scanner_enabled(false).unwrap().is_done());
    assert!(client.serial_write(2, &[1, 2, 3]).unwrap().is_done());
    let printer = client.get_printer_status().unwrap().done().unwrap();
    assert!(printer.paper_low);
    assert!(printer.is_ready());

    device.join().unwrap();
}

#[test]
fn invalid_arguments_never_reach_the_wire() {
    let (session, mut terminal) = connect();
    let client = CommandClient::new(session);

    let no_lines: [&str; 0] = [];
    assert!(matches!(
        client.display_text(&no_lines),
        Err(CommandError::InvalidArgument(_))
    ));
    assert!(matches!(
        client.beep(1, Duration::from_secs(120)),
        Err(CommandError::InvalidArgument(_))
    ));
    assert!(matches!(
        client.serial_write(1, &[]),
        Err(CommandError::InvalidArgument(_))
    ));

    let device = thread::spawn(move || {
        // The first frame the terminal sees is the valid command.
        let command = terminal.next_command();
        assert_eq!(command.payload()[1], ins::CLEAR_DISPLAY);
        terminal.respond(TERMINAL, &[], 0x9000);
    });
    assert!(client.clear_display().unwrap().is_done());
    device.join().unwrap();
}

#[test]
fn silent_terminal_times_out_and_session_survives() {
    let (session, mut terminal) = connect();
    let client = CommandClient::with_config(session.clone(), short_timeouts());

    let err = client.get_status(TERMINAL).unwrap_err();
    assert!(matches!(
        err,
        CommandError::Session(SessionError::Timeout(_))
    ));
    assert!(err.is_recoverable());
    assert!(session.is_open());
    terminal.next_command();
}
