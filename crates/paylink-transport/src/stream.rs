use std::fmt;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{SessionContext, StreamCloser, Transport, TransportStreams};

/// A socket that can be cloned into independent read and write handles and
/// shut down from any of them.
pub trait DuplexStream: Read + Write + Send + Sync + Sized + 'static {
    fn try_clone_stream(&self) -> std::io::Result<Self>;
    fn shutdown_stream(&self) -> std::io::Result<()>;
}

impl DuplexStream for TcpStream {
    fn try_clone_stream(&self) -> std::io::Result<Self> {
        self.try_clone()
    }

    fn shutdown_stream(&self) -> std::io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

#[cfg(unix)]
impl DuplexStream for std::os::unix::net::UnixStream {
    fn try_clone_stream(&self) -> std::io::Result<Self> {
        self.try_clone()
    }

    fn shutdown_stream(&self) -> std::io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

type Connector<S> = Box<dyn FnMut() -> std::io::Result<S> + Send>;

/// A frame written to the device right before the link is torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Farewell {
    pub address: u8,
    pub payload: Vec<u8>,
}

/// [`Transport`] over a cloneable socket.
///
/// The connector is called once per `connect()`; there is no retry.
pub struct StreamTransport<S: DuplexStream> {
    name: &'static str,
    connector: Option<Connector<S>>,
    stream: Option<S>,
    farewell: Option<Farewell>,
}

impl<S: DuplexStream> StreamTransport<S> {
    /// Create a transport that dials with `connector` on every `connect()`.
    pub fn new(
        name: &'static str,
        connector: impl FnMut() -> std::io::Result<S> + Send + 'static,
    ) -> Self {
        Self {
            name,
            connector: Some(Box::new(connector)),
            stream: None,
            farewell: None,
        }
    }

    /// Wrap an already-connected stream. Once disconnected it cannot reconnect.
    pub fn from_connected(name: &'static str, stream: S) -> Self {
        Self {
            name,
            connector: None,
            stream: Some(stream),
            farewell: None,
        }
    }

    /// Send `farewell` through the closing session on every disconnect.
    pub fn with_farewell(mut self, farewell: Farewell) -> Self {
        self.farewell = Some(farewell);
        self
    }

    fn stream(&self) -> Result<&S> {
        self.stream
            .as_ref()
            .ok_or(TransportError::NotConnected(self.name))
    }
}

impl<S: DuplexStream> Transport for StreamTransport<S> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let connector = self
            .connector
            .as_mut()
            .ok_or(TransportError::NoConnector(self.name))?;
        let stream = connector().map_err(|source| TransportError::Connect {
            transport: self.name,
            source,
        })?;
        info!(transport = self.name, "transport connected");
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self, session: &mut dyn SessionContext) -> Result<()> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };

        if let Some(farewell) = &self.farewell {
            if let Err(err) = session.write_frame(farewell.address, &farewell.payload) {
                debug!(transport = self.name, %err, "farewell frame not sent");
            }
        }

        match stream.shutdown_stream() {
            Ok(()) => {}
            // Already shut down by the session closer.
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => {}
            Err(err) => return Err(err.into()),
        }
        info!(transport = self.name, "transport disconnected");
        Ok(())
    }

    fn open_streams(&mut self) -> Result<TransportStreams> {
        let stream = self.stream()?;
        let reader = stream.try_clone_stream()?;
        let writer = stream.try_clone_stream()?;
        let closer = stream.try_clone_stream()?;
        Ok(TransportStreams {
            reader: Box::new(reader),
            writer: Box::new(writer),
            closer: Box::new(SocketCloser(closer)),
        })
    }
}

impl<S: DuplexStream> fmt::Debug for StreamTransport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamTransport")
            .field("name", &self.name)
            .field("connected", &self.stream.is_some())
            .field("reconnectable", &self.connector.is_some())
            .finish()
    }
}

struct SocketCloser<S>(S);

impl<S: DuplexStream> StreamCloser for SocketCloser<S> {
    fn close(&self) -> std::io::Result<()> {
        match self.0.shutdown_stream() {
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
