//! One's complement arithmetic for the Internet checksum (RFC 1071) and its
//! incremental update (RFC 1624).

/// Adds up `data` as big-endian 16-bit words. A trailing odd byte is padded with zero.
fn sum_words(data: &[u8]) -> u32 {
    let chunks = data.chunks_exact(2);
    let trailing = chunks.remainder().first().map_or(0, |b| u32::from(*b) << 8);
    chunks.fold(trailing, |acc, x| {
        acc + u32::from(u16::from_be_bytes([x[0], x[1]]))
    })
}

/// Folds the carries back into the low 16 bits.
fn fold(mut sum: u32) -> u16 {
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Internet checksum of `data`.
///
/// Run over a header that already carries its checksum, the result is 0 when the header is
/// intact. Run over a header whose checksum field is zeroed, the result is the value to store.
pub fn checksum(data: &[u8]) -> u16 {
    !fold(sum_words(data))
}

/// Updates `old_checksum` after one 16-bit word of the covered data changed from `old_word`
/// to `new_word`, without rescanning the data: `HC' = ~(~HC + ~m + m')`.
pub fn incremental_update(old_checksum: u16, old_word: u16, new_word: u16) -> u16 {
    let sum = u32::from(!old_checksum) + u32::from(!old_word) + u32::from(new_word);
    !fold(sum)
}
