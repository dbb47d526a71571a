//! CRC-32 over container byte ranges.
//!
//! The ICF format uses the conventional reflected CRC-32 (polynomial
//! 0xEDB88320, initial value all-ones, final complement), which is exactly
//! what `crc32fast` computes.  Its lookup tables are process-wide and
//! read-only, so concurrent decodes share them without coordination.

use crc32fast::Hasher;

/// Size in bytes of one entry block (and of the header block).
pub const BLOCK_SIZE: usize = 0x40;

/// Enabled-flag marker carried in the first two bytes of an entry block.
pub const ENABLED_MARKER: [u8; 2] = [2, 1];

pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn is_enabled(block: &[u8]) -> bool {
    block.len() >= 2 && block[..2] == ENABLED_MARKER
}

/// XOR of the CRC-32 of every enabled block in `entries`.
///
/// `entries` is the concatenation of entry blocks following the header;
/// a trailing partial block is ignored.  Disabled blocks contribute nothing.
pub fn sub_checksum(entries: &[u8]) -> u32 {
    entries
        .chunks_exact(BLOCK_SIZE)
        .filter(|block| is_enabled(block))
        .fold(0u32, |acc, block| acc ^ crc32(block))
}
