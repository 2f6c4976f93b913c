use std::io;
use thiserror::Error;

/// Failures while reading or writing the length-prefixed record stream.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("stream ended {read} byte(s) into a length prefix")]
    TruncatedPrefix { read: usize },
    #[error("record declared {expected} bytes but the stream ended after {read}")]
    TruncatedPayload { expected: usize, read: usize },
    #[error("record of {len} bytes exceeds the {max} byte limit")]
    Oversized { len: usize, max: usize },
    #[error("framed stream I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to open port {port}: {source}")]
    TransportOpen {
        port: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error("transmit path still full after {attempts} attempt(s)")]
    Backpressure { attempts: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for errors the caller may ride out by dropping the frame in hand.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, Error::Backpressure { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
