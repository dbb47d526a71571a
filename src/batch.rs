//! Decoding many containers at once.
//!
//! Each container is decoded independently with its own running state; the
//! only shared resource is the checksum table.  With the `parallel` feature
//! the work is spread over Rayon's global pool, otherwise it runs in order
//! on the calling thread.  Results always come back in input order.

use std::path::Path;

use crate::decoder::{decode, decode_file, StorageInfo};
use crate::error::Result;
use crate::source::Decryptor;

pub fn decode_all<B>(containers: &[B]) -> Vec<Result<StorageInfo>>
where
    B: AsRef<[u8]> + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        containers.par_iter().map(|c| decode(c.as_ref())).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        containers.iter().map(|c| decode(c.as_ref())).collect()
    }
}

pub fn decode_paths<P>(paths: &[P], decryptor: &dyn Decryptor) -> Vec<Result<StorageInfo>>
where
    P: AsRef<Path> + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        paths.par_iter().map(|p| decode_file(p, decryptor)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        paths.iter().map(|p| decode_file(p, decryptor)).collect()
    }
}
