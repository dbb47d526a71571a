//! Canonical artifact filenames for decoded entries.
//!
//! | Entry       | Filename |
//! |-------------|----------|
//! | system      | `{platform}_{major:04}.{minor:02}.{build:02}_{ts}_0.pack` |
//! | application | `{app}_{major}.{minor:02}.{build:02}_{ts}_0.app` |
//! | patch       | `{app}_{from}_{from_ts}_1_{to}.app` |
//! | option      | `{app}_{option}_{ts}_0.opt` |
//!
//! `ts` is the 14-digit `YYYYMMDDhhmmss` timestamp.  Unknown entries have no
//! filename.

use serde::Serializer;

use crate::entry::Entry;
use crate::header::ContainerHeader;

/// Decode identifier bytes one byte per character (ISO-8859-1).
///
/// No validation: control and NUL bytes come through unchanged.
pub fn identifier_text(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

pub(crate) fn serialize_identifier<S: Serializer, const N: usize>(
    bytes: &[u8; N],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&identifier_text(bytes))
}

pub fn filename(header: &ContainerHeader, entry: &Entry) -> Option<String> {
    let name = match entry {
        Entry::System { version, timestamp } => format!(
            "{}_{:04}.{:02}.{:02}_{}_0.pack",
            identifier_text(&header.platform_id),
            version.major, version.minor, version.build,
            timestamp,
        ),
        Entry::Application { version, timestamp } => format!(
            "{}_{}_{}_0.app",
            identifier_text(&header.app_id),
            version,
            timestamp,
        ),
        Entry::Patch { from_version, from_timestamp, to_version, .. } => format!(
            "{}_{}_{}_1_{}.app",
            identifier_text(&header.app_id),
            from_version,
            from_timestamp,
            to_version,
        ),
        Entry::Option { option_id, timestamp } => format!(
            "{}_{}_{}_0.opt",
            identifier_text(&header.app_id),
            identifier_text(option_id),
            timestamp,
        ),
        Entry::Unknown { .. } => return None,
    };
    Some(name)
}
