//! Error taxonomy for ICF decoding.
//!
//! Every check in the decoder is fail-fast: the first fault found is the one
//! reported, and no partial result is ever returned alongside it.  Display
//! strings are the diagnosis lines shown to operators.

use std::io;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IcfError {
    #[error("File Not Found")]
    FileNotFound,
    #[error("Invalid ICF file")]
    InvalidContainer,
    #[error("Main Data Error")]
    MainDataError,
    #[error("Data Size Error")]
    DataSizeError,
    #[error("Data Padding Error")]
    DataPaddingError,
    #[error("Data Info Error")]
    DataInfoError,
    #[error("Sub Data Error")]
    SubDataError,
    #[error("System Version Error")]
    SystemVersionError,
    #[error("Application Version Error")]
    ApplicationVersionError,
    #[error("Application Timestamp Error")]
    ApplicationTimestampError,
    #[error("Invalid Timestamp: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")]
    InvalidTimestamp {
        year:   u16,
        month:  u8,
        day:    u8,
        hour:   u8,
        minute: u8,
        second: u8,
    },
    #[error("Truncated container data")]
    Truncated,
    #[error("IO error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for IcfError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => IcfError::Truncated,
            _ => IcfError::Io(e),
        }
    }
}

/// Field-less discriminant of [`IcfError`], for matching and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    FileNotFound,
    InvalidContainer,
    MainDataError,
    DataSizeError,
    DataPaddingError,
    DataInfoError,
    SubDataError,
    SystemVersionError,
    ApplicationVersionError,
    ApplicationTimestampError,
    InvalidTimestamp,
    Truncated,
    Io,
}

impl IcfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IcfError::FileNotFound              => ErrorKind::FileNotFound,
            IcfError::InvalidContainer          => ErrorKind::InvalidContainer,
            IcfError::MainDataError             => ErrorKind::MainDataError,
            IcfError::DataSizeError             => ErrorKind::DataSizeError,
            IcfError::DataPaddingError          => ErrorKind::DataPaddingError,
            IcfError::DataInfoError             => ErrorKind::DataInfoError,
            IcfError::SubDataError              => ErrorKind::SubDataError,
            IcfError::SystemVersionError        => ErrorKind::SystemVersionError,
            IcfError::ApplicationVersionError   => ErrorKind::ApplicationVersionError,
            IcfError::ApplicationTimestampError => ErrorKind::ApplicationTimestampError,
            IcfError::InvalidTimestamp { .. }   => ErrorKind::InvalidTimestamp,
            IcfError::Truncated                 => ErrorKind::Truncated,
            IcfError::Io(_)                     => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, IcfError>;
