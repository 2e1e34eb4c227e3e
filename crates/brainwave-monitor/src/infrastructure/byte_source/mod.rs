//! Concrete byte sources for the headset stream.
//!
//! All of them are [`StreamSource`]s: a small read buffer in front of any
//! `std::io::Read`.  [`open_source`] picks the reader from the config:
//!
//! - `device` – a serial or Bluetooth RFCOMM port such as `/dev/rfcomm0` or
//!   `COM3`, opened at `baud_rate` (9600 for the headset).  Reads time out
//!   after the idle interval.
//! - `file`   – a captured stream, replayed as fast as it can be decoded.
//! - `stdin`  – bytes piped in from another tool.
//! - `tcp`    – a serial-to-TCP bridge.  Reads time out after the idle
//!   interval so the loop can notice a shutdown request.
//!
//! # Availability semantics
//!
//! `bytes_available` reports what is buffered.  When the buffer is empty it
//! performs one `read`, which blocks on files and stdin, and waits at most
//! the read timeout on serial ports and TCP.  A timeout is reported as "no bytes
//! available", end-of-stream as [`SourceError::Closed`].

use std::fs::File;
use std::io::{self, Read};
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

use brainwave_core::{ByteSource, SourceError};
use thiserror::Error;
use tracing::info;

use crate::infrastructure::storage::config::{SourceConfig, SourceKind};

/// Size of the read-ahead buffer.  Large enough for several frames, small
/// enough that a slow link is not held back waiting to fill it.
const READ_BUFFER_LEN: usize = 256;

/// Errors raised while opening a byte source.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to open {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open serial port {path} at {baud_rate} baud: {source}")]
    Serial {
        path: PathBuf,
        baud_rate: u32,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// A buffered [`ByteSource`] over any reader.
pub struct StreamSource<R> {
    reader: R,
    buf: [u8; READ_BUFFER_LEN],
    pos: usize,
    len: usize,
    closed: bool,
}

impl<R: Read> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: [0; READ_BUFFER_LEN],
            pos: 0,
            len: 0,
            closed: false,
        }
    }

    fn buffered(&self) -> usize {
        self.len - self.pos
    }

    fn fill(&mut self) -> Result<usize, SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }
        match self.reader.read(&mut self.buf) {
            Ok(0) => {
                self.closed = true;
                Err(SourceError::Closed)
            }
            Ok(n) => {
                self.pos = 0;
                self.len = n;
                Ok(n)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn bytes_available(&mut self) -> Result<usize, SourceError> {
        match self.buffered() {
            0 => self.fill(),
            n => Ok(n),
        }
    }

    fn read_byte(&mut self) -> Result<u8, SourceError> {
        if self.buffered() == 0 && self.fill()? == 0 {
            return Err(SourceError::NoData);
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        Ok(byte)
    }
}

/// A boxed source that can be moved onto the blocking worker.
pub type BoxedSource = Box<dyn ByteSource + Send>;

/// Opens the byte source described by `config`.
///
/// `idle_interval` becomes the read timeout for serial and TCP sources.
///
/// # Errors
///
/// Returns [`OpenError`] if the path cannot be opened or the bridge cannot
/// be reached.
pub fn open_source(config: &SourceConfig, idle_interval: Duration) -> Result<BoxedSource, OpenError> {
    match config.kind {
        SourceKind::Device => {
            let port = tokio_serial::new(config.path.to_string_lossy(), config.baud_rate)
                .timeout(idle_interval)
                .open()
                .map_err(|source| OpenError::Serial {
                    path: config.path.clone(),
                    baud_rate: config.baud_rate,
                    source,
                })?;
            info!(path = %config.path.display(), baud_rate = config.baud_rate, "opened serial port");
            Ok(Box::new(StreamSource::new(port)))
        }
        SourceKind::File => {
            let file = File::open(&config.path).map_err(|source| OpenError::Path {
                path: config.path.clone(),
                source,
            })?;
            info!(path = %config.path.display(), "opened capture file");
            Ok(Box::new(StreamSource::new(file)))
        }
        SourceKind::Stdin => {
            info!("reading headset stream from stdin");
            Ok(Box::new(StreamSource::new(io::stdin())))
        }
        SourceKind::Tcp => {
            let connect_err = |source| OpenError::Connect {
                address: config.address.clone(),
                source,
            };
            let stream = TcpStream::connect(&config.address).map_err(connect_err)?;
            // A zero timeout is rejected by the OS; fall back to blocking reads.
            let timeout = (!idle_interval.is_zero()).then_some(idle_interval);
            stream.set_read_timeout(timeout).map_err(connect_err)?;
            info!(address = %config.address, "connected to TCP bridge");
            Ok(Box::new(StreamSource::new(stream)))
        }
    }
}
