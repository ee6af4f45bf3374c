use std::fmt;
use std::net::TcpStream;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use paylink_session::ProtocolSession;
use paylink_transport::StreamTransport;

use crate::exit::{session_error, CliError, CliResult, USAGE};

/// Where the terminal is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(String),
    #[cfg(unix)]
    Unix(PathBuf),
}

impl FromStr for Endpoint {
    type Err = CliError;

    fn from_str(input: &str) -> CliResult<Self> {
        if let Some(addr) = input.strip_prefix("tcp://") {
            if addr.is_empty() || !addr.contains(':') {
                return Err(CliError::new(
                    USAGE,
                    format!("tcp endpoint needs host:port: {input}"),
                ));
            }
            return Ok(Self::Tcp(addr.to_string()));
        }
        if let Some(path) = input.strip_prefix("unix://") {
            #[cfg(unix)]
            {
                if path.is_empty() {
                    return Err(CliError::new(USAGE, "unix endpoint needs a socket path"));
                }
                return Ok(Self::Unix(PathBuf::from(path)));
            }
            #[cfg(not(unix))]
            {
                let _ = path;
                return Err(CliError::new(
                    USAGE,
                    "unix endpoints are not supported on this platform",
                ));
            }
        }
        Err(CliError::new(
            USAGE,
            format!("unsupported endpoint {input:?} (expected tcp://host:port or unix:///path)"),
        ))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            #[cfg(unix)]
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

impl Endpoint {
    /// A closed session that dials this endpoint when opened.
    pub fn session(&self) -> ProtocolSession {
        match self {
            Self::Tcp(addr) => {
                let addr = addr.clone();
                ProtocolSession::new(StreamTransport::new("tcp", move || {
                    let stream = TcpStream::connect(&addr)?;
                    stream.set_nodelay(true)?;
                    Ok(stream)
                }))
            }
            #[cfg(unix)]
            Self::Unix(path) => {
                let path = path.clone();
                ProtocolSession::new(StreamTransport::new("unix", move || {
                    std::os::unix::net::UnixStream::connect(&path)
                }))
            }
        }
    }

    /// Open `session`. One connect attempt, no retry.
    pub fn open(&self, session: &ProtocolSession) -> CliResult<()> {
        session
            .open()
            .map_err(|err| session_error(&format!("connect to {self} failed"), err))
    }

    pub fn open_session(&self) -> CliResult<Arc<ProtocolSession>> {
        let session = self.session();
        self.open(&session)?;
        Ok(Arc::new(session))
    }
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };
    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
