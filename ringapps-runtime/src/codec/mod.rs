//! Each record on the stream is a 32-bit big-endian length followed by that many bytes of raw
//! frame. There is no header, trailer, or padding between records.

mod decoder;
mod encoder;

pub use decoder::{FrameDecoder, DEFAULT_MAX_FRAME_LEN};
pub use encoder::{FrameEncoder, DEFAULT_CAPACITY};

/// Size of the length prefix in front of every record.
pub const PREFIX_LEN: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};
    use std::io::Cursor;

    fn round_trip(frames: &[Vec<u8>], capacity: usize) {
        let mut encoder = FrameEncoder::with_capacity(capacity, Vec::new());
        for frame in frames {
            encoder.push(frame).unwrap();
        }
        let stream = encoder.into_inner().unwrap();
        let expected_len: usize = frames.iter().map(|f| PREFIX_LEN + f.len()).sum();
        assert_eq!(stream.len(), expected_len);

        let mut decoder = FrameDecoder::new(Cursor::new(stream));
        for frame in frames {
            assert_eq!(decoder.next_frame().unwrap(), Some(&frame[..]));
        }
        assert_eq!(decoder.next_frame().unwrap(), None);
        assert_eq!(decoder.records(), frames.len() as u64);
    }

    #[test]
    fn boundary_lengths() {
        let frames: Vec<Vec<u8>> = [0usize, 1, 59, 60, 1514, 4092, 4093, 65535, 65536]
            .iter()
            .map(|&len| vec![0xa5; len])
            .collect();
        round_trip(&frames, DEFAULT_CAPACITY);
    }

    #[test]
    fn sampled_lengths() {
        let mut rng = thread_rng();
        let frames: Vec<Vec<u8>> = (0..64)
            .map(|_| {
                let mut frame = vec![0; rng.gen_range(0, 65536)];
                rng.fill(&mut frame[..]);
                frame
            })
            .collect();
        round_trip(&frames, DEFAULT_CAPACITY);
        round_trip(&frames, 512);
    }

    #[test]
    fn file_backed_stream() {
        use std::io::{Seek, SeekFrom};

        let frames = vec![vec![1; 42], vec![2; 98], vec![]];
        let mut file = tempfile::tempfile().unwrap();
        {
            let mut encoder = FrameEncoder::new(&mut file);
            for frame in &frames {
                encoder.push(frame).unwrap();
            }
            encoder.flush().unwrap();
        }
        file.seek(SeekFrom::Start(0)).unwrap();

        let mut decoder = FrameDecoder::new(&mut file);
        let mut decoded = vec![];
        while let Some(frame) = decoder.next_frame().unwrap() {
            decoded.push(frame.to_vec());
        }
        assert_eq!(decoded, frames);
    }
}
