//! Entry blocks: the 64-byte records following the header.
//!
//! Every block starts with a 32-byte common prefix:
//!
//! ```text
//! off  size  field
//! 0x00    4  flags      bytes [2, 1, _, _] mark the entry as enabled
//! 0x04    4  type_tag   0x0000 system, 0x0001 app, 0x0101 patch, 0x0002 option
//! 0x08   24  padding    3 × u64, each must be zero
//! ```
//!
//! The remaining 32 bytes depend on `type_tag`.  System, application and
//! patch payloads are built from 16-byte triples of
//! `(version, timestamp, required_system_version)`; a version is stored as
//! `build: u8, minor: u8, major: u16` and a timestamp as
//! `year: u16, month, day, hour, minute, second, subsecond` (one byte each).
//! Unknown tags have their payload skipped without validation.

use std::fmt;
use std::io::{Cursor, Read, Write};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::checksum::{is_enabled, ENABLED_MARKER};
use crate::error::{IcfError, Result};
use crate::naming::serialize_identifier;

pub const TYPE_SYSTEM:      u32 = 0x0000;
pub const TYPE_APPLICATION: u32 = 0x0001;
pub const TYPE_PATCH:       u32 = 0x0101;
pub const TYPE_OPTION:      u32 = 0x0002;

pub const PAYLOAD_SIZE: usize = 32;
const PREFIX_PADDING_WORDS: usize = 3;
const TRIPLE_PADDING_WORDS: usize = 2;
const OPTION_PADDING_WORDS: usize = 5;

// ── Version ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Version {
    pub major: u16,
    pub minor: u8,
    pub build: u8,
}

impl Version {
    /// Wildcard accepted as a patch's required system version.
    pub const ZERO: Version = Version { major: 0, minor: 0, build: 0 };

    pub const fn new(major: u16, minor: u8, build: u8) -> Self {
        Self { major, minor, build }
    }

    pub fn read<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let build = reader.read_u8()?;
        let minor = reader.read_u8()?;
        let major = reader.read_u16::<LittleEndian>()?;
        Ok(Self { major, minor, build })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_u8(self.build)?;
        writer.write_u8(self.minor)?;
        writer.write_u16::<LittleEndian>(self.major)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}.{:02}", self.major, self.minor, self.build)
    }
}

// ── Timestamp ────────────────────────────────────────────────────────────────

/// A calendar-valid date and time, to the second.
///
/// The wire carries a trailing sub-second byte.  It is kept only so a block
/// can be re-encoded byte-for-byte and takes no part in equality.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    datetime:  NaiveDateTime,
    subsecond: u8,
}

impl Timestamp {
    pub const WIRE_SIZE: usize = 8;

    /// Years are limited to 1..=9999.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Result<Self> {
        let invalid = || IcfError::InvalidTimestamp { year, month, day, hour, minute, second };
        if !(1..=9999).contains(&year) {
            return Err(invalid());
        }
        let datetime = NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .and_then(|d| d.and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second)))
            .ok_or_else(invalid)?;
        Ok(Self { datetime, subsecond: 0 })
    }

    pub fn with_subsecond(mut self, subsecond: u8) -> Self {
        self.subsecond = subsecond;
        self
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let year   = reader.read_u16::<LittleEndian>()?;
        let month  = reader.read_u8()?;
        let day    = reader.read_u8()?;
        let hour   = reader.read_u8()?;
        let minute = reader.read_u8()?;
        let second = reader.read_u8()?;
        let subsecond = reader.read_u8()?;
        let ts = Self::new(year, month, day, hour, minute, second).map_err(|e| {
            warn!(year, month, day, hour, minute, second, "timestamp is not a calendar date");
            e
        })?;
        Ok(ts.with_subsecond(subsecond))
    }

    pub fn write<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        use chrono::{Datelike, Timelike};
        let dt = self.datetime;
        // Construction bounds the year to 1..=9999.
        writer.write_u16::<LittleEndian>(dt.year() as u16)?;
        writer.write_u8(dt.month() as u8)?;
        writer.write_u8(dt.day() as u8)?;
        writer.write_u8(dt.hour() as u8)?;
        writer.write_u8(dt.minute() as u8)?;
        writer.write_u8(dt.second() as u8)?;
        writer.write_u8(self.subsecond)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.datetime == other.datetime
    }
}

impl Eq for Timestamp {}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.datetime.format("%Y%m%d%H%M%S"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Entry ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    System {
        version:   Version,
        timestamp: Timestamp,
    },
    Application {
        version:   Version,
        timestamp: Timestamp,
    },
    Patch {
        from_version:   Version,
        from_timestamp: Timestamp,
        to_version:     Version,
        to_timestamp:   Timestamp,
    },
    Option {
        #[serde(serialize_with = "serialize_identifier")]
        option_id: [u8; 4],
        timestamp: Timestamp,
    },
    Unknown {
        type_tag: u32,
        #[serde(serialize_with = "hex::serde::serialize")]
        payload:  [u8; PAYLOAD_SIZE],
    },
}

impl Entry {
    pub fn type_tag(&self) -> u32 {
        match self {
            Entry::System { .. }           => TYPE_SYSTEM,
            Entry::Application { .. }      => TYPE_APPLICATION,
            Entry::Patch { .. }            => TYPE_PATCH,
            Entry::Option { .. }           => TYPE_OPTION,
            Entry::Unknown { type_tag, .. } => *type_tag,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Entry::System { .. }      => "system",
            Entry::Application { .. } => "application",
            Entry::Patch { .. }       => "patch",
            Entry::Option { .. }      => "option",
            Entry::Unknown { .. }     => "unknown",
        }
    }

    /// Encode as a 64-byte block.
    ///
    /// `required` is written as the required system version of application
    /// and patch triples.  A system entry always requires itself.
    pub fn write<W: Write>(&self, enabled: bool, required: Version, mut writer: W) -> std::io::Result<()> {
        if enabled {
            writer.write_all(&ENABLED_MARKER)?;
        } else {
            writer.write_all(&[0, 0])?;
        }
        writer.write_all(&[0, 0])?;
        writer.write_u32::<LittleEndian>(self.type_tag())?;
        for _ in 0..PREFIX_PADDING_WORDS {
            writer.write_u64::<LittleEndian>(0)?;
        }

        match self {
            Entry::System { version, timestamp } => {
                write_triple(&mut writer, *version, timestamp, *version)?;
                for _ in 0..TRIPLE_PADDING_WORDS {
                    writer.write_u64::<LittleEndian>(0)?;
                }
            }
            Entry::Application { version, timestamp } => {
                write_triple(&mut writer, *version, timestamp, required)?;
                for _ in 0..TRIPLE_PADDING_WORDS {
                    writer.write_u64::<LittleEndian>(0)?;
                }
            }
            Entry::Patch { from_version, from_timestamp, to_version, to_timestamp } => {
                write_triple(&mut writer, *from_version, from_timestamp, required)?;
                write_triple(&mut writer, *to_version, to_timestamp, required)?;
            }
            Entry::Option { option_id, timestamp } => {
                writer.write_all(option_id)?;
                timestamp.write(&mut writer)?;
                for _ in 0..OPTION_PADDING_WORDS {
                    writer.write_u32::<LittleEndian>(0)?;
                }
            }
            Entry::Unknown { payload, .. } => writer.write_all(payload)?,
        }
        Ok(())
    }
}

/// A decoded entry together with its enabled flag.
///
/// The flag only decides sub-checksum membership; disabled entries are
/// decoded, validated and named like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub enabled: bool,
    #[serde(flatten)]
    pub entry:   Entry,
}

// ── Running state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningState {
    /// Last system version seen; [`Version::ZERO`] before any system entry.
    pub system_version:        Version,
    pub application_version:   Option<Version>,
    pub application_timestamp: Option<Timestamp>,
}

impl RunningState {
    pub fn advance(self, entry: &Entry) -> Self {
        match entry {
            Entry::System { version, .. } => Self { system_version: *version, ..self },
            Entry::Application { version, timestamp } => Self {
                application_version:   Some(*version),
                application_timestamp: Some(*timestamp),
                ..self
            },
            _ => self,
        }
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Decode one 64-byte entry block against the running state.
///
/// Returns the record and the state to hand to the next block.  Bytes past
/// the first 64 are ignored; a shorter block is [`IcfError::Truncated`].
pub fn decode_entry(block: &[u8], state: RunningState) -> Result<(EntryRecord, RunningState)> {
    let mut rd = Cursor::new(block);

    let mut flags = [0u8; 4];
    rd.read_exact(&mut flags)?;
    let enabled = is_enabled(&flags);
    let type_tag = rd.read_u32::<LittleEndian>()?;
    for _ in 0..PREFIX_PADDING_WORDS {
        if rd.read_u64::<LittleEndian>()? != 0 {
            warn!(type_tag, "non-zero padding in entry prefix");
            return Err(IcfError::DataPaddingError);
        }
    }

    let entry = match type_tag {
        TYPE_SYSTEM => {
            let (version, timestamp, required) = read_triple(&mut rd)?;
            if required != version {
                warn!(%version, %required, "system entry does not require itself");
                return Err(IcfError::SystemVersionError);
            }
            expect_zero_u64(&mut rd, TRIPLE_PADDING_WORDS)?;
            Entry::System { version, timestamp }
        }
        TYPE_APPLICATION => {
            let (version, timestamp, required) = read_triple(&mut rd)?;
            if required != state.system_version {
                warn!(%required, system = %state.system_version, "application requires another system");
                return Err(IcfError::SystemVersionError);
            }
            expect_zero_u64(&mut rd, TRIPLE_PADDING_WORDS)?;
            Entry::Application { version, timestamp }
        }
        TYPE_PATCH => {
            let (from_version, from_timestamp) = read_patch_triple(&mut rd, &state)?;
            let (to_version, to_timestamp) = read_patch_triple(&mut rd, &state)?;
            if state.application_version != Some(to_version) {
                warn!(%to_version, "patch target is not the installed application version");
                return Err(IcfError::ApplicationVersionError);
            }
            if state.application_timestamp != Some(to_timestamp) {
                warn!(%to_timestamp, "patch target is not the installed application build");
                return Err(IcfError::ApplicationTimestampError);
            }
            Entry::Patch { from_version, from_timestamp, to_version, to_timestamp }
        }
        TYPE_OPTION => {
            let mut option_id = [0u8; 4];
            rd.read_exact(&mut option_id)?;
            let timestamp = Timestamp::read(&mut rd)?;
            for _ in 0..OPTION_PADDING_WORDS {
                if rd.read_u32::<LittleEndian>()? != 0 {
                    return Err(IcfError::DataPaddingError);
                }
            }
            Entry::Option { option_id, timestamp }
        }
        _ => {
            let mut payload = [0u8; PAYLOAD_SIZE];
            rd.read_exact(&mut payload)?;
            Entry::Unknown { type_tag, payload }
        }
    };

    debug!(type_tag, enabled, kind = entry.kind_name(), "decoded entry");
    let next = state.advance(&entry);
    Ok((EntryRecord { enabled, entry }, next))
}

fn read_triple<R: Read>(mut reader: R) -> Result<(Version, Timestamp, Version)> {
    let version   = Version::read(&mut reader)?;
    let timestamp = Timestamp::read(&mut reader)?;
    let required  = Version::read(&mut reader)?;
    Ok((version, timestamp, required))
}

/// Patch triples may require either the current system or no system at all.
fn read_patch_triple<R: Read>(reader: R, state: &RunningState) -> Result<(Version, Timestamp)> {
    let (version, timestamp, required) = read_triple(reader)?;
    if required != state.system_version && required != Version::ZERO {
        warn!(%required, system = %state.system_version, "patch requires another system");
        return Err(IcfError::SystemVersionError);
    }
    Ok((version, timestamp))
}

fn write_triple<W: Write>(mut writer: W, version: Version, timestamp: &Timestamp, required: Version) -> std::io::Result<()> {
    version.write(&mut writer)?;
    timestamp.write(&mut writer)?;
    required.write(&mut writer)
}

fn expect_zero_u64<R: Read>(mut reader: R, words: usize) -> Result<()> {
    for _ in 0..words {
        if reader.read_u64::<LittleEndian>()? != 0 {
            return Err(IcfError::DataPaddingError);
        }
    }
    Ok(())
}
