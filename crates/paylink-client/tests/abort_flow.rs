//! Aborting a command another thread is parked in.
#![cfg(unix)]

mod common;

use std::thread;
use std::time::{Duration, Instant};

use paylink_client::{
    ins, AbortableClient, CommandError, CommandStatus, Outcome, TransactionRequest,
};
use paylink_frame::{control, PRINTER, TERMINAL};
use paylink_session::SessionError;

use common::{connect, wait_until, WAIT};

#[test]
fn abort_unblocks_parked_transaction() {
    let (session, mut terminal) = connect();
    let client = AbortableClient::new(session.clone());

    let buyer = {
        let client = client.clone();
        thread::spawn(move || client.start_transaction(&TransactionRequest::purchase(1999, 978)))
    };

    let transaction = terminal.next_command();
    assert_eq!(transaction.payload()[1], ins::START_TRANSACTION);
    wait_until(|| session.is_busy());

    let started = Instant::now();
    assert!(client.abort_current_operation(TERMINAL));
    assert!(started.elapsed() < WAIT);

    let abort = terminal.next_command();
    assert_eq!(abort.address(), TERMINAL);
    assert_eq!(abort.control(), control::NO_REPLY);
    assert_eq!(abort.payload().as_ref(), &[0xD0, ins::ABORT, 0x00, 0x00]);

    // Still parked: the abort itself is never answered.
    assert!(session.is_busy());
    terminal.respond(TERMINAL, &[], 0x6400);

    let outcome = buyer.join().unwrap().unwrap();
    assert_eq!(outcome, Outcome::Declined(CommandStatus::Cancelled));
    assert!(!session.is_busy());
}

#[test]
fn abort_with_nothing_outstanding_is_still_written() {
    let (session, mut terminal) = connect();
    let client = AbortableClient::new(session.clone());

    client.try_abort_current_operation(PRINTER).unwrap();
    let abort = terminal.next_command();
    assert_eq!(abort.address(), PRINTER);
    assert_eq!(abort.payload()[1], ins::ABORT);
    assert!(!session.is_busy());

    // Ordinary commands still work afterwards.
    let device = thread::spawn(move || {
        let command = terminal.next_command();
        assert_eq!(command.payload()[1], ins::CLEAR_DISPLAY);
        terminal.respond(TERMINAL, &[], 0x9000);
    });
    assert!(client.clear_display().unwrap().is_done());
    device.join().unwrap();
}

#[test]
fn abort_on_closed_session_reports_failure() {
    let (session, _terminal) = connect();
    let client = AbortableClient::new(session.clone());
    session.close().unwrap();

    assert!(!client.abort_current_operation(TERMINAL));
    assert!(matches!(
        client.try_abort_current_operation(TERMINAL),
        Err(CommandError::Session(SessionError::LinkLost))
    ));
}

#[test]
fn close_wins_over_racing_aborts() {
    let (session, mut terminal) = connect();
    let client = AbortableClient::new(session.clone());

    let buyer = {
        let client = client.clone();
        thread::spawn(move || client.start_transaction(&TransactionRequest::purchase(500, 826)))
    };
    terminal.next_command();
    wait_until(|| session.is_busy());

    let aborter = {
        let client = client.clone();
        thread::spawn(move || {
            let mut written = 0usize;
            while client.abort_current_operation(TERMINAL) {
                written += 1;
                thread::sleep(Duration::from_millis(1));
            }
            written
        })
    };
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    session.close().unwrap();
    assert!(started.elapsed() < WAIT);

    assert!(matches!(
        buyer.join().unwrap(),
        Err(CommandError::Session(SessionError::LinkLost))
    ));
    // The loop ends once writes start failing.
    aborter.join().unwrap();
    drop(terminal);
}
