//! Forging well-formed containers.
//!
//! [`ContainerBuilder`] is the inverse of [`crate::decoder::decode`]: it lays
//! out the header and entry blocks, fills in each entry's required system
//! version from the entries before it, and seals both checksums.  Raw blocks
//! can be appended as-is for fault injection.

use std::io::{self, Write};

use crate::checksum::{crc32, sub_checksum, BLOCK_SIZE};
use crate::entry::{Entry, RunningState, Version};
use crate::header::{ContainerHeader, HEADER_SIZE, SUB_CHECKSUM_OFFSET};

enum Block {
    Entry { entry: Entry, enabled: bool, required: Version },
    Raw([u8; BLOCK_SIZE]),
}

pub struct ContainerBuilder {
    app_id:              [u8; 4],
    platform_id:         [u8; 3],
    platform_generation: u8,
    blocks:              Vec<Block>,
    state:               RunningState,
}

impl ContainerBuilder {
    pub fn new(app_id: [u8; 4], platform_id: [u8; 3]) -> Self {
        Self {
            app_id,
            platform_id,
            platform_generation: 0,
            blocks: Vec::new(),
            state:  RunningState::default(),
        }
    }

    pub fn platform_generation(mut self, generation: u8) -> Self {
        self.platform_generation = generation;
        self
    }

    /// Append an enabled entry.
    pub fn push(&mut self, entry: Entry) -> &mut Self {
        self.push_entry(entry, true)
    }

    /// Append an entry outside the sub-checksum.
    pub fn push_disabled(&mut self, entry: Entry) -> &mut Self {
        self.push_entry(entry, false)
    }

    /// Append an entry whose required system version is given explicitly.
    pub fn push_requiring(&mut self, entry: Entry, enabled: bool, required: Version) -> &mut Self {
        self.state = self.state.advance(&entry);
        self.blocks.push(Block::Entry { entry, enabled, required });
        self
    }

    /// Append a block verbatim.
    pub fn push_raw(&mut self, block: [u8; BLOCK_SIZE]) -> &mut Self {
        self.blocks.push(Block::Raw(block));
        self
    }

    pub fn entry_count(&self) -> usize {
        self.blocks.len()
    }

    fn push_entry(&mut self, entry: Entry, enabled: bool) -> &mut Self {
        let required = self.state.system_version;
        self.push_requiring(entry, enabled, required)
    }

    /// Serialise the container with both checksums sealed.
    pub fn build(&self) -> io::Result<Vec<u8>> {
        let total = HEADER_SIZE + self.blocks.len() * BLOCK_SIZE;
        let declared_size = u32::try_from(total)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "container exceeds 4 GiB"))?;

        let mut body = Vec::with_capacity(total - HEADER_SIZE);
        for block in &self.blocks {
            match block {
                Block::Entry { entry, enabled, required } => entry.write(*enabled, *required, &mut body)?,
                Block::Raw(raw) => body.write_all(raw)?,
            }
        }

        let header = ContainerHeader {
            main_checksum:       0,
            declared_size,
            entry_count:         self.blocks.len() as u64,
            app_id:              self.app_id,
            platform_id:         self.platform_id,
            platform_generation: self.platform_generation,
            sub_checksum:        sub_checksum(&body),
        };

        let mut out = Vec::with_capacity(total);
        header.write(&mut out)?;
        out.extend_from_slice(&body);
        seal_main(&mut out);
        Ok(out)
    }
}

/// Recompute the sub-checksum and then the main checksum in place.
///
/// Used after editing a container so that only the intended fault remains.
pub fn seal(container: &mut [u8]) {
    if container.len() >= HEADER_SIZE {
        let sub = sub_checksum(&container[HEADER_SIZE..]);
        container[SUB_CHECKSUM_OFFSET..SUB_CHECKSUM_OFFSET + 4].copy_from_slice(&sub.to_le_bytes());
    }
    seal_main(container);
}

fn seal_main(container: &mut [u8]) {
    if container.len() >= 4 {
        let crc = crc32(&container[4..]);
        container[..4].copy_from_slice(&crc.to_le_bytes());
    }
}
