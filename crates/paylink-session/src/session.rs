use std::fmt;
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use parking_lot::Mutex;
use paylink_frame::{control, Frame, FrameError, FrameReader, FrameWriter};
use paylink_tlv::TlvNode;
use paylink_transport::{SessionContext, StreamCloser, Transport, TransportError};
use tracing::{debug, error, info, warn};

use crate::apdu::{classify, Classified, ResponseApdu};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::exchange::{Delivery, Exchange, Expired};
use crate::notifications::{
    ConnectionEstablished, ConnectionLost, DeviceEvents, DisconnectReason, UnsolicitedEvent,
};
use crate::state::SessionState;

type StreamReader = FrameReader<Box<dyn Read + Send>>;
type StreamWriter = FrameWriter<Box<dyn Write + Send>>;

/// A command/response session over one transport.
///
/// `open()` connects the transport and starts the reader thread; `close()`
/// stops it. A session can be reopened after it closes. The
/// [`DeviceEvents`] bus survives across cycles.
pub struct ProtocolSession {
    shared: Arc<Shared>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ProtocolSession {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    pub fn with_config(transport: impl Transport + 'static, config: SessionConfig) -> Self {
        Self::with_events(transport, config, Arc::new(DeviceEvents::new()))
    }

    /// Build a session that raises events on an existing bus.
    pub fn with_events(
        transport: impl Transport + 'static,
        config: SessionConfig,
        events: Arc<DeviceEvents>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(SessionState::Closed),
                transport: Mutex::new(Box::new(transport)),
                writer: Mutex::new(None),
                closer: Mutex::new(None),
                exchange: Exchange::new(),
                events,
                generation: AtomicU64::new(0),
            }),
            reader: Mutex::new(None),
        }
    }

    pub fn events(&self) -> &Arc<DeviceEvents> {
        &self.shared.events
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.lock()
    }

    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Number of successful opens so far; identifies the current link.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Whether a command is waiting for its response.
    pub fn is_busy(&self) -> bool {
        self.shared.exchange.is_waiting()
    }

    /// Connect the transport (if needed) and start the reader thread.
    ///
    /// Raises `connected` on success.
    pub fn open(&self) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            if *state != SessionState::Closed {
                return Err(SessionError::AlreadyOpen(*state));
            }
            *state = SessionState::Opening;
        }
        self.join_reader();

        match self.start() {
            Ok(generation) => {
                info!(
                    generation,
                    transport = self.shared.transport_name(),
                    "session open"
                );
                let established = ConnectionEstablished { generation };
                let channel = self.shared.events.connected.name();
                if let Some(Err(err)) =
                    contain_panic(channel, || self.shared.events.connected.notify(&established))
                {
                    warn!(generation, error = %err, "connected handler failed");
                }
                Ok(())
            }
            Err(err) => {
                *self.shared.state.lock() = SessionState::Closed;
                warn!(error = %err, "session open failed");
                Err(err)
            }
        }
    }

    fn start(&self) -> Result<u64> {
        let streams = {
            let mut transport = self.shared.transport.lock();
            transport.connect()?;
            transport.open_streams()?
        };

        let frame_config = self.shared.config.frame.clone();
        let reader = FrameReader::with_config(streams.reader, frame_config.clone());
        *self.shared.writer.lock() = Some(FrameWriter::with_config(streams.writer, frame_config));
        *self.shared.closer.lock() = Some(streams.closer);

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.exchange.reset();
        *self.shared.state.lock() = SessionState::Open;

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.shared.config.reader_thread_name.clone())
            .spawn(move || run_reader(shared, reader, generation));

        match spawned {
            Ok(handle) => {
                *self.reader.lock() = Some(handle);
                Ok(generation)
            }
            Err(err) => {
                *self.shared.state.lock() = SessionState::Closing;
                if let Err(disconnect_err) = self.shared.tear_down() {
                    debug!(error = %disconnect_err, "disconnect after failed spawn");
                }
                Err(SessionError::Spawn(err))
            }
        }
    }

    /// Close the session.
    ///
    /// Wakes any parked caller with [`SessionError::LinkLost`], offers the
    /// transport a farewell write, shuts the streams down and joins the
    /// reader thread (unless called from it). Closing a closed session is a
    /// no-op.
    pub fn close(&self) -> Result<()> {
        let closing = {
            let mut state = self.shared.state.lock();
            if *state == SessionState::Open {
                *state = SessionState::Closing;
                true
            } else {
                false
            }
        };

        let result = if closing {
            info!(generation = self.generation(), "closing session");
            self.shared.tear_down().map_err(SessionError::from)
        } else {
            Ok(())
        };
        self.join_reader();
        result
    }

    /// Send `payload` to `address` and wait for the response.
    ///
    /// Only one call may wait at a time; a concurrent call fails with
    /// [`SessionError::ProtocolViolation`]. After a timeout the session stays
    /// open; a response that arrives later is discarded.
    pub fn send_and_wait(
        &self,
        address: u8,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<ResponseApdu> {
        self.shared.send_and_wait(address, payload, timeout)
    }

    /// A handle that writes on this session without taking part in the
    /// exchange slot.
    pub fn write_handle(&self) -> WriteHandle {
        WriteHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn join_reader(&self) {
        let Some(handle) = self.reader.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Closed from a handler; the thread exits once the handler returns.
            *self.reader.lock() = Some(handle);
            return;
        }
        if handle.join().is_err() {
            error!("reader thread panicked");
        }
    }
}

impl Drop for ProtocolSession {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!(error = %err, "close on drop failed");
        }
    }
}

impl fmt::Debug for ProtocolSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolSession")
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("busy", &self.is_busy())
            .finish()
    }
}

/// Writes frames on a session without claiming the exchange slot.
///
/// Takes only the write lock, so it is never blocked behind a caller parked
/// in [`ProtocolSession::send_and_wait`].
#[derive(Clone)]
pub struct WriteHandle {
    shared: Arc<Shared>,
}

impl WriteHandle {
    /// Write one frame the device must not answer.
    pub fn send_no_reply(&self, address: u8, payload: &[u8]) -> Result<()> {
        if !self.shared.is_open() {
            return Err(SessionError::LinkLost);
        }
        self.shared.write(address, control::NO_REPLY, payload)?;
        debug!(address, len = payload.len(), "no-reply frame written");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }
}

impl fmt::Debug for WriteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteHandle")
            .field("open", &self.is_open())
            .finish()
    }
}

struct Shared {
    config: SessionConfig,
    state: Mutex<SessionState>,
    transport: Mutex<Box<dyn Transport>>,
    writer: Mutex<Option<StreamWriter>>,
    closer: Mutex<Option<Box<dyn StreamCloser>>>,
    exchange: Exchange,
    events: Arc<DeviceEvents>,
    generation: AtomicU64,
}

impl Shared {
    fn is_open(&self) -> bool {
        *self.state.lock() == SessionState::Open
    }

    fn transport_name(&self) -> &'static str {
        self.transport.lock().name()
    }

    fn send_and_wait(
        &self,
        address: u8,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<ResponseApdu> {
        if !self.is_open() {
            return Err(SessionError::LinkLost);
        }

        let ticket = self.exchange.begin(address)?;
        if let Err(err) = self.write(address, control::HOST_COMMAND, payload) {
            self.exchange.abandon(ticket.id);
            return Err(err);
        }
        debug!(address, len = payload.len(), "command sent");

        match ticket.rx.recv_timeout(timeout) {
            Ok(response) => Ok(response),
            Err(RecvTimeoutError::Disconnected) => Err(SessionError::LinkLost),
            Err(RecvTimeoutError::Timeout) => {
                match self.exchange.expire(&ticket, self.config.late_response_grace) {
                    Expired::TimedOut => {
                        warn!(address, ?timeout, "command timed out");
                        Err(SessionError::Timeout(timeout))
                    }
                    Expired::Answered(response) => Ok(response),
                    Expired::Closed => Err(SessionError::LinkLost),
                }
            }
        }
    }

    /// Write one frame under the write lock. A failed write takes the link down.
    fn write(&self, address: u8, control: u8, payload: &[u8]) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or(SessionError::LinkLost)?;
        match writer.send(address, control, payload) {
            Ok(()) => Ok(()),
            Err(err @ FrameError::PayloadTooLarge { .. }) => Err(SessionError::Frame(err)),
            Err(err) => {
                drop(guard);
                warn!(address, error = %err, "write failed; shutting link down");
                self.close_streams();
                Err(SessionError::LinkLost)
            }
        }
    }

    fn close_streams(&self) {
        if let Some(closer) = self.closer.lock().as_ref() {
            if let Err(err) = closer.close() {
                debug!(error = %err, "stream close failed");
            }
        }
    }

    /// Move `Open` to `Closing` on behalf of the reader of `generation`.
    fn fail_link(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if *state == SessionState::Open && self.generation.load(Ordering::SeqCst) == generation {
            *state = SessionState::Closing;
            true
        } else {
            false
        }
    }

    /// Release the link. The caller has already moved the state to `Closing`.
    fn tear_down(&self) -> std::result::Result<(), TransportError> {
        self.exchange.close();

        let disconnected = {
            let mut transport = self.transport.lock();
            let mut farewell = FarewellWriter { shared: self };
            transport.disconnect(&mut farewell)
        };

        if let Some(closer) = self.closer.lock().take() {
            if let Err(err) = closer.close() {
                debug!(error = %err, "stream close failed");
            }
        }
        match self.writer.try_lock_for(self.config.farewell_lock_timeout) {
            Some(mut writer) => *writer = None,
            None => debug!("writer still busy after close; leaving it to fail"),
        }

        *self.state.lock() = SessionState::Closed;
        info!(generation = self.generation.load(Ordering::SeqCst), "session closed");
        disconnected
    }

    fn dispatch(&self, frame: Frame) {
        let address = frame.address();
        if !control::is_from_device(frame.control()) {
            debug!(address, control = frame.control(), "device frame without direction bit");
        }

        match classify(frame.payload()) {
            Classified::Response(response) => {
                let status = response.status;
                match self.exchange.deliver(address, response) {
                    Delivery::Delivered => debug!(address, %status, "response delivered"),
                    Delivery::Late => warn!(address, %status, "discarded late response"),
                    Delivery::Unmatched => {
                        warn!(address, %status, "discarded response with no outstanding command")
                    }
                }
            }
            Classified::Unsolicited(template) => self.raise_unsolicited(address, &template),
            Classified::Unrecognized => {
                warn!(address, len = frame.payload().len(), "discarded unrecognized frame")
            }
        }
    }

    fn raise_unsolicited(&self, address: u8, template: &TlvNode) {
        let event = match UnsolicitedEvent::decode(address, template) {
            Ok(event) => event,
            Err(err) => {
                warn!(address, error = %err, "dropped malformed notification");
                return;
            }
        };

        let channel = event.channel_name();
        match contain_panic(channel, || self.events.notify(&event)) {
            Some(Ok(true)) => debug!(address, channel, "notification dispatched"),
            Some(Ok(false)) => debug!(address, channel, "no handler for notification"),
            Some(Err(err)) => warn!(address, channel, error = %err, "notification handler failed"),
            None => {}
        }
    }
}

fn run_reader(shared: Arc<Shared>, mut reader: StreamReader, generation: u64) {
    debug!(generation, "reader started");

    let failure = loop {
        match reader.read_frame() {
            Ok(frame) => shared.dispatch(frame),
            Err(err) => break err,
        }
    };

    let reason = if shared.fail_link(generation) {
        error!(generation, error = %failure, "link failed; closing session");
        if let Err(err) = shared.tear_down() {
            warn!(generation, error = %err, "transport disconnect failed");
        }
        DisconnectReason::LinkError(failure.to_string())
    } else {
        debug!(generation, "reader stopped by close");
        DisconnectReason::Closed
    };

    let lost = ConnectionLost { generation, reason };
    let channel = shared.events.disconnected.name();
    if let Some(Err(err)) = contain_panic(channel, || shared.events.disconnected.notify(&lost)) {
        warn!(generation, error = %err, "disconnected handler failed");
    }
}

/// Run a handler dispatch, stopping a panicking handler at this frame so the
/// reader thread keeps running. Returns `None` if the handler panicked.
fn contain_panic<T>(channel: &'static str, dispatch: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(dispatch)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            error!(channel, panic = %message, "event handler panicked");
            None
        }
    }
}

/// Farewell hook handed to [`Transport::disconnect`].
struct FarewellWriter<'a> {
    shared: &'a Shared,
}

impl SessionContext for FarewellWriter<'_> {
    fn write_frame(&mut self, address: u8, payload: &[u8]) -> io::Result<()> {
        let Some(mut guard) = self
            .shared
            .writer
            .try_lock_for(self.shared.config.farewell_lock_timeout)
        else {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "write lock busy"));
        };
        let writer = guard
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        writer
            .send(address, control::NO_REPLY, payload)
            .map_err(|err| match err {
                FrameError::Io(err) => err,
                other => io::Error::other(other),
            })
    }
}
