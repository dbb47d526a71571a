//! Where container bytes come from.
//!
//! ICF files on disk are encrypted.  Decryption is not part of this crate:
//! callers supply a [`Decryptor`] that turns a path into plaintext bytes, or
//! `None` when the file cannot be decrypted.

use std::path::Path;
use tracing::{debug, warn};

use crate::error::{IcfError, Result};

pub trait Decryptor: Sync {
    fn decrypt(&self, path: &Path) -> Option<Vec<u8>>;
}

/// Reads files that were decrypted ahead of time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDecryptor;

impl Decryptor for PlainDecryptor {
    fn decrypt(&self, path: &Path) -> Option<Vec<u8>> {
        std::fs::read(path).ok()
    }
}

impl<F> Decryptor for F
where
    F: Fn(&Path) -> Option<Vec<u8>> + Sync,
{
    fn decrypt(&self, path: &Path) -> Option<Vec<u8>> {
        self(path)
    }
}

/// Fetch the plaintext container at `path`.
pub fn load_container(path: &Path, decryptor: &dyn Decryptor) -> Result<Vec<u8>> {
    if !path.is_file() {
        warn!(path = %path.display(), "container file not found");
        return Err(IcfError::FileNotFound);
    }
    let data = decryptor.decrypt(path).ok_or_else(|| {
        warn!(path = %path.display(), "decryptor rejected container");
        IcfError::InvalidContainer
    })?;
    debug!(path = %path.display(), len = data.len(), "loaded container");
    Ok(data)
}
