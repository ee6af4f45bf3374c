use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_frame, Frame, FrameConfig, HEADER_SIZE, TRAILER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Reads exactly one frame per call and never pulls bytes belonging to the
/// next frame off the stream.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(HEADER_SIZE + 256),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF falls on a frame
    /// boundary and `Err(FrameError::Truncated)` when it falls inside one.
    pub fn read_frame(&mut self) -> Result<Frame> {
        self.buf.clear();
        self.buf.resize(HEADER_SIZE, 0);

        let got = fill(&mut self.inner, &mut self.buf[..])?;
        if got == 0 {
            return Err(FrameError::ConnectionClosed);
        }
        if got < HEADER_SIZE {
            return Err(FrameError::Truncated {
                expected: HEADER_SIZE,
                received: got,
            });
        }

        let payload_len = u16::from_be_bytes([self.buf[2], self.buf[3]]) as usize;
        if payload_len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload_len,
                max: self.config.max_payload_size,
            });
        }

        let total = HEADER_SIZE + payload_len + TRAILER_SIZE;
        self.buf.resize(total, 0);
        let got = fill(&mut self.inner, &mut self.buf[HEADER_SIZE..])?;
        if got < total - HEADER_SIZE {
            return Err(FrameError::Truncated {
                expected: total,
                received: HEADER_SIZE + got,
            });
        }

        trace!(
            address = self.buf[0],
            len = payload_len,
            "frame bytes received"
        );

        match decode_frame(&mut self.buf, self.config.max_payload_size)? {
            Some(frame) => Ok(frame),
            None => Err(FrameError::Truncated {
                expected: total,
                received: self.buf.len(),
            }),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }
}

/// Fill `buf` completely unless EOF is hit first. Returns the byte count read.
fn fill<T: Read>(inner: &mut T, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0usize;
    while filled < buf.len() {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(filled)
}
