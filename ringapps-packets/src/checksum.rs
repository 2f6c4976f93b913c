//! The Internet checksum (RFC 1071).
//!
//! `checksum` accumulates 16-bit big-endian words into a running sum, and can be chained by
//! passing the previous result as the `seed`. `finalize` turns a running sum into the value that
//! goes into a header's checksum field. Field setters write that value in network byte order.

/// Adds `data` to the running `seed`, folding the carry back in after every word. Any `u32`
/// seed is accepted; it is folded to 16 bits before the first word is added.
///
/// If `data` has an odd length, the last byte is treated as the high byte of a zero-padded word,
/// since network byte order is big-endian.
pub fn checksum(data: &[u8], seed: u32) -> u32 {
    let mut sum = fold(fold(seed));

    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum = fold(sum + u32::from(u16::from_be_bytes([word[0], word[1]])));
    }
    if let [last] = words.remainder() {
        sum = fold(sum + (u32::from(*last) << 8));
    }
    sum
}

/// One's complement of the folded sum, ready to be stored in a checksum field.
pub fn finalize(sum: u32) -> u16 {
    !(fold(fold(sum)) as u16)
}

/// Returns true if `data`, checksum field included, sums to all ones.
pub fn verify(data: &[u8]) -> bool {
    checksum(data, 0) == 0xFFFF
}

#[inline]
fn fold(sum: u32) -> u32 {
    (sum & 0xFFFF) + (sum >> 16)
}
