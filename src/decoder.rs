//! Container decoding: header, sub-checksum, then every entry in file order.
//!
//! ```no_run
//! use icfinfo::decoder::decode_file;
//! use icfinfo::source::PlainDecryptor;
//!
//! let info = decode_file("ICF1.bin", &PlainDecryptor)?;
//! for name in &info.filenames {
//!     println!("{name}");
//! }
//! # Ok::<(), icfinfo::IcfError>(())
//! ```

use std::path::Path;
use serde::Serialize;
use tracing::{debug, warn};

use crate::checksum::{sub_checksum, BLOCK_SIZE};
use crate::entry::{decode_entry, EntryRecord, RunningState};
use crate::error::{IcfError, Result};
use crate::header::{ContainerHeader, HEADER_SIZE};
use crate::naming::{filename, identifier_text};
use crate::source::{load_container, Decryptor};

/// Everything decoded from one container.
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub header:    ContainerHeader,
    /// Entries in file order, disabled ones included.
    pub entries:   Vec<EntryRecord>,
    /// Artifact filenames, sorted by byte-wise string order.
    pub filenames: Vec<String>,
}

impl StorageInfo {
    pub fn app_id(&self) -> String {
        identifier_text(&self.header.app_id)
    }

    pub fn platform_id(&self) -> String {
        identifier_text(&self.header.platform_id)
    }
}

/// Decode a decrypted container.
///
/// Stops at the first structural fault; no entry is decoded after it.
pub fn decode(container: &[u8]) -> Result<StorageInfo> {
    let header = ContainerHeader::parse(container)?;
    debug!(
        entries = header.entry_count,
        app_id = %identifier_text(&header.app_id),
        platform_id = %identifier_text(&header.platform_id),
        "header accepted"
    );

    let body = &container[HEADER_SIZE..];
    let computed = sub_checksum(body);
    if computed != header.sub_checksum {
        warn!(stored = header.sub_checksum, computed, "sub checksum mismatch");
        return Err(IcfError::SubDataError);
    }

    // Length was validated against entry_count, so this never truncates.
    let mut entries = Vec::with_capacity(body.len() / BLOCK_SIZE);
    let mut state = RunningState::default();
    for (index, block) in body.chunks_exact(BLOCK_SIZE).enumerate() {
        let (record, next) = decode_entry(block, state).map_err(|e| {
            warn!(index, error = %e, "entry rejected");
            e
        })?;
        state = next;
        entries.push(record);
    }

    let mut filenames: Vec<String> = entries
        .iter()
        .filter_map(|r| filename(&header, &r.entry))
        .collect();
    filenames.sort_unstable();

    Ok(StorageInfo { header, entries, filenames })
}

/// Sorted artifact filenames of a decrypted container.
pub fn decode_filenames(container: &[u8]) -> Result<Vec<String>> {
    decode(container).map(|info| info.filenames)
}

/// Load the container at `path` through `decryptor` and decode it.
pub fn decode_file<P: AsRef<Path>>(path: P, decryptor: &dyn Decryptor) -> Result<StorageInfo> {
    let data = load_container(path.as_ref(), decryptor)?;
    decode(&data)
}
