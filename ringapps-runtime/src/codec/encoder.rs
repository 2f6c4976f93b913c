use super::PREFIX_LEN;
use crate::error::FramingError;
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::convert::TryFrom;
use std::io::Write;

/// Capacity of the staging buffer when none is given.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Appends length-prefixed records to a staging buffer and writes them out in bulk.
///
/// The buffer is written when the next record would not fit, or on an explicit `flush`.
/// Nothing is written on drop; call `flush` or `into_inner` before letting go of the encoder.
pub struct FrameEncoder<W: Write> {
    writer: W,
    buffer: Vec<u8>,
    capacity: usize,
    records: u64,
}

impl<W: Write> FrameEncoder<W> {
    pub fn new(writer: W) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, writer)
    }

    pub fn with_capacity(capacity: usize, writer: W) -> Self {
        FrameEncoder {
            writer,
            buffer: Vec::with_capacity(capacity),
            capacity,
            records: 0,
        }
    }

    /// Stages one record. Flushes first if the record would overflow the buffer; a record
    /// bigger than the whole buffer is written straight through.
    pub fn push(&mut self, frame: &[u8]) -> Result<(), FramingError> {
        let len = u32::try_from(frame.len()).map_err(|_| FramingError::Oversized {
            len: frame.len(),
            max: u32::MAX as usize,
        })?;
        let record_len = PREFIX_LEN + frame.len();

        if self.buffer.len() + record_len > self.capacity {
            self.flush()?;
        }

        if record_len > self.capacity {
            let mut prefix = [0; PREFIX_LEN];
            BigEndian::write_u32(&mut prefix, len);
            self.writer.write_all(&prefix)?;
            self.writer.write_all(frame)?;
            self.writer.flush()?;
        } else {
            self.buffer.write_u32::<BigEndian>(len)?;
            self.buffer.extend_from_slice(frame);
        }
        self.records += 1;
        Ok(())
    }

    /// Writes out whatever is staged and flushes the writer. Does nothing when the buffer is
    /// empty.
    pub fn flush(&mut self) -> Result<(), FramingError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.writer.write_all(&self.buffer)?;
        self.writer.flush()?;
        self.buffer.clear();
        Ok(())
    }

    /// Bytes staged but not yet written.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Records accepted so far, staged or written.
    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Flushes and hands back the writer.
    pub fn into_inner(mut self) -> Result<W, FramingError> {
        self.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Remembers how each write arrived, so tests can see when the encoder flushed.
    #[derive(Default)]
    struct RecordingWriter {
        writes: Vec<Vec<u8>>,
        flushes: usize,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn record_layout() {
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder.push(&[0xde, 0xad]).unwrap();
        encoder.push(&[]).unwrap();
        assert_eq!(encoder.buffered(), 10);
        assert_eq!(
            encoder.into_inner().unwrap(),
            vec![0, 0, 0, 2, 0xde, 0xad, 0, 0, 0, 0]
        );
    }

    #[test]
    fn nothing_written_until_flush() {
        let mut encoder = FrameEncoder::new(RecordingWriter::default());
        encoder.push(&[1; 100]).unwrap();
        assert!(encoder.get_ref().writes.is_empty());

        encoder.flush().unwrap();
        assert_eq!(encoder.get_ref().writes.len(), 1);
        assert_eq!(encoder.get_ref().flushes, 1);
        assert_eq!(encoder.buffered(), 0);

        // An empty buffer is not flushed again.
        encoder.flush().unwrap();
        assert_eq!(encoder.get_ref().flushes, 1);
    }

    #[test]
    fn flushes_before_overflowing() {
        let mut encoder = FrameEncoder::with_capacity(64, RecordingWriter::default());
        encoder.push(&[1; 30]).unwrap();
        encoder.push(&[2; 26]).unwrap();
        assert_eq!(encoder.buffered(), 64);
        assert!(encoder.get_ref().writes.is_empty());

        encoder.push(&[3; 1]).unwrap();
        assert_eq!(encoder.get_ref().writes.len(), 1);
        assert_eq!(encoder.get_ref().writes[0].len(), 64);
        assert_eq!(encoder.buffered(), 5);
        assert_eq!(encoder.records(), 3);
    }

    #[test]
    fn oversize_record_goes_straight_through() {
        let mut encoder = FrameEncoder::with_capacity(16, RecordingWriter::default());
        encoder.push(&[1; 4]).unwrap();
        encoder.push(&[2; 100]).unwrap();
        assert_eq!(encoder.buffered(), 0);

        let written: Vec<u8> = encoder.get_ref().writes.concat();
        assert_eq!(written.len(), 8 + 104);
        assert_eq!(&written[8..12], &[0, 0, 0, 100]);
        assert!(written[12..].iter().all(|&b| b == 2));
    }

    #[test]
    fn write_errors_surface() {
        let mut encoder = FrameEncoder::with_capacity(8, BrokenPipe);
        encoder.push(&[1; 4]).unwrap();
        match encoder.push(&[1; 4]) {
            Err(FramingError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }
}
