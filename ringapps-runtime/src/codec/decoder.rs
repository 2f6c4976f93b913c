use super::PREFIX_LEN;
use crate::error::FramingError;
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, Read};

/// Largest record the decoder accepts unless told otherwise. Anything above it is taken as a
/// corrupt stream rather than a frame.
pub const DEFAULT_MAX_FRAME_LEN: usize = 65536;

/// Reads length-prefixed records back off a byte stream, one at a time.
pub struct FrameDecoder<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    max_len: usize,
    records: u64,
}

impl<R: Read> FrameDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_len(DEFAULT_MAX_FRAME_LEN, reader)
    }

    pub fn with_max_len(max_len: usize, reader: R) -> Self {
        FrameDecoder {
            reader,
            buffer: Vec::new(),
            max_len,
            records: 0,
        }
    }

    /// Returns the next record's payload, or `None` if the stream ended cleanly between
    /// records. The slice is valid until the next call.
    pub fn next_frame(&mut self) -> Result<Option<&[u8]>, FramingError> {
        let mut prefix = [0; PREFIX_LEN];
        match read_full(&mut self.reader, &mut prefix)? {
            0 => return Ok(None),
            PREFIX_LEN => {}
            read => return Err(FramingError::TruncatedPrefix { read }),
        }

        let len = BigEndian::read_u32(&prefix) as usize;
        if len > self.max_len {
            return Err(FramingError::Oversized {
                len,
                max: self.max_len,
            });
        }

        self.buffer.resize(len, 0);
        let read = read_full(&mut self.reader, &mut self.buffer)?;
        if read < len {
            return Err(FramingError::TruncatedPayload {
                expected: len,
                read,
            });
        }
        self.records += 1;
        Ok(Some(&self.buffer[..]))
    }

    /// Records decoded so far.
    pub fn records(&self) -> u64 {
        self.records
    }
}

/// Like `read_exact`, but reports how far it got when the stream ends early.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
