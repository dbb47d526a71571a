pub mod checksum;
pub mod header;
pub mod entry;
pub mod naming;
pub mod decoder;
pub mod source;
pub mod builder;
pub mod batch;
pub mod error;

pub use header::ContainerHeader;
pub use entry::{Entry, EntryRecord, RunningState, Timestamp, Version, decode_entry};
pub use decoder::{StorageInfo, decode, decode_file, decode_filenames};
pub use source::{Decryptor, PlainDecryptor};
pub use builder::ContainerBuilder;
pub use error::{ErrorKind, IcfError, Result};
