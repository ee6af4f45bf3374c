//! A scripted terminal on the far end of a socket pair.
#![allow(dead_code)]

use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use paylink_client::ClientConfig;
use paylink_frame::{control, Frame, FrameReader, FrameWriter};
use paylink_session::ProtocolSession;
use paylink_tlv::TlvNode;
use paylink_transport::StreamTransport;

pub const WAIT: Duration = Duration::from_secs(5);

pub struct Terminal {
    reader: FrameReader<UnixStream>,
    writer: FrameWriter<UnixStream>,
    raw: UnixStream,
}

impl Terminal {
    pub fn next_command(&mut self) -> Frame {
        self.raw.set_read_timeout(Some(WAIT)).unwrap();
        self.reader.read_frame().unwrap()
    }

    pub fn respond(&mut self, address: u8, data: &[u8], status: u16) {
        let mut payload = data.to_vec();
        payload.extend_from_slice(&status.to_be_bytes());
        self.writer
            .send(address, control::FROM_DEVICE, &payload)
            .unwrap();
    }

    pub fn respond_tlv(&mut self, address: u8, nodes: &[TlvNode], status: u16) {
        self.respond(address, &paylink_tlv::encode(nodes), status);
    }
}

pub fn connect() -> (Arc<ProtocolSession>, Terminal) {
    let (local, remote) = UnixStream::pair().unwrap();
    let session = Arc::new(ProtocolSession::new(StreamTransport::from_connected(
        "unix", local,
    )));
    session.open().unwrap();
    let terminal = Terminal {
        reader: FrameReader::new(remote.try_clone().unwrap()),
        writer: FrameWriter::new(remote.try_clone().unwrap()),
        raw: remote,
    };
    (session, terminal)
}

pub fn short_timeouts() -> ClientConfig {
    ClientConfig {
        command_timeout: Duration::from_millis(100),
        transaction_timeout: Duration::from_millis(100),
    }
}

pub fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(2));
    }
}
