//! Container header: the first 64-byte block of a decrypted ICF.
//!
//! ```text
//! off  size  field
//! 0x00    4  main_checksum   CRC-32 of bytes[4..]
//! 0x04    4  declared_size   total container length
//! 0x08    8  padding         must be zero
//! 0x10    8  entry_count     number of 64-byte entry blocks that follow
//! 0x18    4  app_id
//! 0x1C    3  platform_id
//! 0x1F    1  platform_generation
//! 0x20    4  sub_checksum    XOR of CRC-32 over each enabled entry block
//! 0x24   28  padding         7 × u32, each must be zero
//! ```
//!
//! All integers are little-endian.

use std::io::{Cursor, Read, Write};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use tracing::warn;

use crate::checksum::{crc32, BLOCK_SIZE};
use crate::error::{IcfError, Result};
use crate::naming::serialize_identifier;

pub const HEADER_SIZE: usize = BLOCK_SIZE;
pub const HEADER_TAIL_WORDS: usize = 7;
pub const SUB_CHECKSUM_OFFSET: usize = 0x20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    pub main_checksum:       u32,
    pub declared_size:       u32,
    pub entry_count:         u64,
    #[serde(serialize_with = "serialize_identifier")]
    pub app_id:              [u8; 4],
    #[serde(serialize_with = "serialize_identifier")]
    pub platform_id:         [u8; 3],
    pub platform_generation: u8,
    pub sub_checksum:        u32,
}

pub fn expected_size(count: u64) -> Option<u64> {
    count.checked_add(1)?.checked_mul(BLOCK_SIZE as u64)
}

impl ContainerHeader {
    /// Checks run in wire order and stop at the first fault.  The
    /// sub-checksum is only read here; verifying it needs the entry blocks.
    pub fn parse(container: &[u8]) -> Result<Self> {
        let actual_len = container.len() as u64;
        let mut rd = Cursor::new(container);

        let main_checksum = rd.read_u32::<LittleEndian>()?;
        let computed = crc32(&container[4..]);
        if main_checksum != computed {
            warn!(stored = main_checksum, computed, "main checksum mismatch");
            return Err(IcfError::MainDataError);
        }

        let declared_size = rd.read_u32::<LittleEndian>()?;
        if u64::from(declared_size) != actual_len {
            warn!(declared_size, actual_len, "declared size mismatch");
            return Err(IcfError::DataSizeError);
        }

        if rd.read_u64::<LittleEndian>()? != 0 {
            return Err(IcfError::DataPaddingError);
        }

        let entry_count = rd.read_u64::<LittleEndian>()?;
        if expected_size(entry_count) != Some(actual_len) {
            warn!(entry_count, actual_len, "entry count disagrees with container length");
            return Err(IcfError::DataInfoError);
        }

        let mut app_id = [0u8; 4];
        rd.read_exact(&mut app_id)?;
        let mut platform_id = [0u8; 3];
        rd.read_exact(&mut platform_id)?;
        let platform_generation = rd.read_u8()?;

        let sub_checksum = rd.read_u32::<LittleEndian>()?;

        for _ in 0..HEADER_TAIL_WORDS {
            if rd.read_u32::<LittleEndian>()? != 0 {
                return Err(IcfError::DataPaddingError);
            }
        }

        Ok(Self {
            main_checksum,
            declared_size,
            entry_count,
            app_id,
            platform_id,
            platform_generation,
            sub_checksum,
        })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_u32::<LittleEndian>(self.main_checksum)?;
        writer.write_u32::<LittleEndian>(self.declared_size)?;
        writer.write_u64::<LittleEndian>(0)?;
        writer.write_u64::<LittleEndian>(self.entry_count)?;
        writer.write_all(&self.app_id)?;
        writer.write_all(&self.platform_id)?;
        writer.write_u8(self.platform_generation)?;
        writer.write_u32::<LittleEndian>(self.sub_checksum)?;
        for _ in 0..HEADER_TAIL_WORDS {
            writer.write_u32::<LittleEndian>(0)?;
        }
        Ok(())
    }
}
