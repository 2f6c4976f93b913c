use std::fmt;

/// Formats a frame 16 bytes per line, each line prefixed with its offset:
///
/// ```text
///   0: ff ff ff ff ff ff 01 02 03 04 05 06 08 06 00 01
///  16: 08 00 06 04 00 01 ...
/// ```
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (line, chunk) in self.0.chunks(16).enumerate() {
            if line > 0 {
                writeln!(f)?;
            }
            write!(f, "{:3}:", line * 16)?;
            for byte in chunk {
                write!(f, " {:02x}", byte)?;
            }
        }
        Ok(())
    }
}

/// Shorthand for `HexDump(frame)`, meant for log statements.
pub fn hex_dump(frame: &[u8]) -> HexDump<'_> {
    HexDump(frame)
}
