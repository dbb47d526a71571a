use icfinfo::builder::{seal, ContainerBuilder};
use icfinfo::decoder::{decode, decode_file, decode_filenames};
use icfinfo::entry::{Entry, Timestamp, Version, PAYLOAD_SIZE};
use icfinfo::source::PlainDecryptor;
use icfinfo::ErrorKind;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn ts(y: u16, mo: u8, d: u8, h: u8, mi: u8, s: u8) -> Timestamp {
    Timestamp::new(y, mo, d, h, mi, s).unwrap()
}

/// System, application, patch and two options, as shipped on a typical unit.
fn full_inventory() -> ContainerBuilder {
    let sys = Version::new(80, 5, 1);
    let app = Version::new(1, 35, 0);
    let app_ts = ts(2023, 4, 12, 10, 30, 0);
    let mut b = ContainerBuilder::new(*b"SDHD", *b"AAV").platform_generation(2);
    b.push(Entry::System { version: sys, timestamp: ts(2022, 11, 30, 8, 0, 0) })
     .push(Entry::Application { version: app, timestamp: app_ts })
     .push(Entry::Patch {
         from_version:   Version::new(1, 30, 0),
         from_timestamp: ts(2022, 12, 1, 0, 0, 0),
         to_version:     app,
         to_timestamp:   app_ts,
     })
     .push(Entry::Option { option_id: *b"A042", timestamp: ts(2023, 5, 1, 0, 0, 0) })
     .push_disabled(Entry::Option { option_id: *b"A007", timestamp: ts(2023, 1, 1, 0, 0, 0) });
    b
}

#[test]
fn test_full_inventory_listing() {
    let data = full_inventory().build().unwrap();
    assert_eq!(decode_filenames(&data).unwrap(), vec![
        "AAV_0080.05.01_20221130080000_0.pack",
        "SDHD_1.30.00_20221201000000_1_1.35.00.app",
        "SDHD_1.35.00_20230412103000_0.app",
        "SDHD_A007_20230101000000_0.opt",
        "SDHD_A042_20230501000000_0.opt",
    ]);
}

#[test]
fn test_decode_from_file() {
    let data = full_inventory().build().unwrap();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();

    let info = decode_file(file.path(), &PlainDecryptor).unwrap();
    assert_eq!(info.app_id(), "SDHD");
    assert_eq!(info.platform_id(), "AAV");
    assert_eq!(info.header.platform_generation, 2);
    assert_eq!(info.entries.len(), 5);
    assert!(!info.entries[4].enabled);
}

#[test]
fn test_missing_and_undecryptable_files() {
    let err = decode_file("/does/not/exist.icf", &PlainDecryptor).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);

    let file = NamedTempFile::new().unwrap();
    let refuse = |_: &Path| -> Option<Vec<u8>> { None };
    assert_eq!(decode_file(file.path(), &refuse).unwrap_err().kind(), ErrorKind::InvalidContainer);
}

#[test]
fn test_disabling_changes_sub_checksum_not_output() {
    let sys = Entry::System { version: Version::new(1, 2, 3), timestamp: ts(2021, 5, 6, 12, 0, 0) };

    let mut on = ContainerBuilder::new(*b"SDEZ", *b"ABC");
    on.push(sys.clone());
    let on = on.build().unwrap();

    let mut off = ContainerBuilder::new(*b"SDEZ", *b"ABC");
    off.push_disabled(sys);
    let off = off.build().unwrap();

    assert_ne!(on[0x20..0x24], off[0x20..0x24]);
    assert_eq!(decode_filenames(&on).unwrap(), decode_filenames(&off).unwrap());
}

#[test]
fn test_unknown_entry_is_skipped_without_payload_checks() {
    let mut b = ContainerBuilder::new(*b"SDEZ", *b"ABC");
    b.push(Entry::Unknown { type_tag: 0x0201, payload: [0xFF; PAYLOAD_SIZE] })
     .push(Entry::System { version: Version::new(1, 2, 3), timestamp: ts(2021, 5, 6, 12, 0, 0) });
    let info = decode(&b.build().unwrap()).unwrap();
    assert_eq!(info.entries.len(), 2);
    assert_eq!(info.filenames, vec!["ABC_0001.02.03_20210506120000_0.pack"]);
}

#[test]
fn test_system_version_rules() {
    // Application before any system: required version must be zero.
    let mut b = ContainerBuilder::new(*b"SDEZ", *b"ABC");
    b.push(Entry::Application { version: Version::new(1, 0, 0), timestamp: ts(2021, 1, 1, 0, 0, 0) });
    assert!(decode(&b.build().unwrap()).is_ok());

    // Application pinned to a system other than the one installed.
    let mut b = ContainerBuilder::new(*b"SDEZ", *b"ABC");
    b.push(Entry::System { version: Version::new(1, 2, 3), timestamp: ts(2021, 5, 6, 12, 0, 0) })
     .push_requiring(
         Entry::Application { version: Version::new(1, 0, 0), timestamp: ts(2021, 1, 1, 0, 0, 0) },
         true,
         Version::new(1, 2, 2),
     );
    assert_eq!(decode(&b.build().unwrap()).unwrap_err().kind(), ErrorKind::SystemVersionError);
}

#[test]
fn test_patch_against_stale_application() {
    let app_ts = ts(2023, 4, 12, 10, 30, 0);
    let mut b = ContainerBuilder::new(*b"SDHD", *b"AAV");
    b.push(Entry::Application { version: Version::new(1, 35, 0), timestamp: app_ts })
     .push(Entry::Patch {
         from_version:   Version::new(1, 30, 0),
         from_timestamp: ts(2022, 12, 1, 0, 0, 0),
         to_version:     Version::new(1, 35, 0),
         to_timestamp:   ts(2023, 4, 12, 10, 30, 1),
     });
    assert_eq!(decode(&b.build().unwrap()).unwrap_err().kind(), ErrorKind::ApplicationTimestampError);
}

#[test]
fn test_header_faults_yield_named_errors() {
    let clean = full_inventory().build().unwrap();

    let mut main = clean.clone();
    main[2] ^= 0x10;
    assert_eq!(decode(&main).unwrap_err().kind(), ErrorKind::MainDataError);

    let mut pad = clean.clone();
    pad[0x0A] = 0x01;
    seal(&mut pad);
    assert_eq!(decode(&pad).unwrap_err().kind(), ErrorKind::DataPaddingError);

    let mut tail = clean.clone();
    tail[0x30] = 0x01;
    seal(&mut tail);
    assert_eq!(decode(&tail).unwrap_err().kind(), ErrorKind::DataPaddingError);

    let mut count = clean.clone();
    count[0x10] = 4;
    seal(&mut count);
    assert_eq!(decode(&count).unwrap_err().kind(), ErrorKind::DataInfoError);

    let mut truncated = clean;
    truncated.truncate(64 * 3);
    seal(&mut truncated);
    assert_eq!(decode(&truncated).unwrap_err().kind(), ErrorKind::DataSizeError);
}

#[test]
fn test_storage_info_serialises() {
    let info = decode(&full_inventory().build().unwrap()).unwrap();
    let v = serde_json::to_value(&info).unwrap();
    assert_eq!(v["header"]["app_id"], "SDHD");
    assert_eq!(v["entries"][0]["kind"], "system");
    assert_eq!(v["entries"][0]["timestamp"], "20221130080000");
    assert_eq!(v["entries"][3]["option_id"], "A042");
    assert_eq!(v["filenames"].as_array().unwrap().len(), 5);
}

#[test]
fn test_short_container_gets_named_header_error() {
    assert_eq!(decode(&vec![0xAB; 40]).unwrap_err().kind(), ErrorKind::MainDataError);

    let mut sealed = vec![0u8; 40];
    sealed[4..8].copy_from_slice(&40u32.to_le_bytes());
    seal(&mut sealed);
    assert_eq!(decode(&sealed).unwrap_err().kind(), ErrorKind::DataInfoError);
}
