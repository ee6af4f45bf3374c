use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use paylink_events::{handler, EventChannel};
use paylink_session::{ConnectionLost, DeviceEvents, DisconnectReason};
use serde_json::json;

use crate::cmd::ListenArgs;
use crate::exit::{CliError, CliResult, INTERNAL, SUCCESS, TRANSPORT_ERROR};
use crate::output::{now_unix_seconds, print_event, EventOutput, OutputFormat};

const POLL: Duration = Duration::from_millis(100);

enum Message {
    Event(EventOutput),
    Lost(ConnectionLost),
}

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let session = args.endpoint.session();
    let (tx, rx) = unbounded();
    subscribe(session.events(), &tx);
    args.endpoint.open(&session)?;
    tracing::info!(endpoint = %args.endpoint, "listening for device events");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    let mut code = SUCCESS;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(POLL) {
            Ok(Message::Event(event)) => {
                print_event(&event, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Ok(Message::Lost(lost)) => {
                if let DisconnectReason::LinkError(reason) = lost.reason {
                    eprintln!("error: link lost: {reason}");
                    code = TRANSPORT_ERROR;
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if let Err(err) = session.close() {
        tracing::debug!(error = %err, "close failed");
    }
    session.events().clear_all();
    Ok(code)
}

fn forward<E: 'static>(
    channel: &EventChannel<E>,
    tx: &Sender<Message>,
    describe: impl Fn(&E) -> EventOutput + Send + Sync + 'static,
) {
    let tx = tx.clone();
    channel.register(handler(move |event: &E| {
        tx.send(Message::Event(describe(event)))
            .map_err(|_| "listener gone")?;
        Ok(())
    }));
}

fn event(name: &'static str, address: u8, details: serde_json::Value) -> EventOutput {
    EventOutput {
        event: name,
        address: Some(address),
        details,
        timestamp: now_unix_seconds(),
    }
}

fn subscribe(events: &DeviceEvents, tx: &Sender<Message>) {
    forward(&events.device_status, tx, |e| {
        event(
            "device_status",
            e.address,
            json!({ "state": format!("{:?}", e.state), "battery_percent": e.battery_percent }),
        )
    });
    forward(&events.card_status, tx, |e| {
        event(
            "card_status",
            e.address,
            json!({
                "present": e.present,
                "entry_mode": e.entry_mode.map(|m| format!("{m:?}")),
            }),
        )
    });
    forward(&events.key_pressed, tx, |e| {
        event("key_pressed", e.address, json!({ "key": e.key }))
    });
    forward(&events.barcode, tx, |e| {
        event(
            "barcode",
            e.address,
            json!({
                "symbology": e.symbology,
                "data": String::from_utf8_lossy(&e.data),
            }),
        )
    });
    forward(&events.serial_data, tx, |e| {
        event(
            "serial_data",
            e.address,
            json!({ "port": e.port, "data": hex::encode_upper(&e.data) }),
        )
    });
    forward(&events.printer_status, tx, |e| {
        event(
            "printer_status",
            e.address,
            json!({
                "paper_out": e.status.paper_out,
                "paper_low": e.status.paper_low,
                "cover_open": e.status.cover_open,
                "overheated": e.status.overheated,
            }),
        )
    });

    let tx = tx.clone();
    events.disconnected.register(handler(move |lost: &ConnectionLost| {
        tx.send(Message::Lost(lost.clone()))
            .map_err(|_| "listener gone")?;
        Ok(())
    }));
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
