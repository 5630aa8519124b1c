//! Loader operations over a flat cache fixture.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use js5_config::{ConfigError, ConfigLoader, FieldCodec, Instr, Schema, Slot, Value};
use js5_parser::Era;
use js5_store::{DirectoryProvider, FlatCacheProvider, flat_file_name};
use pretty_assertions::assert_eq;

fn schema() -> Schema {
    Schema::new(vec![("cost", Value::Int(1))])
        .with_opcode(2, vec![Instr::read(Slot::Field("name"), FieldCodec::Text)])
        .with_opcode(12, vec![Instr::read(Slot::Field("cost"), FieldCodec::I32)])
}

fn record_bytes(name: &str, cost: i32) -> Vec<u8> {
    let mut data = vec![2u8];
    data.extend_from_slice(name.as_bytes());
    data.push(0);
    data.push(12);
    data.extend_from_slice(&cost.to_be_bytes());
    data.push(0);
    data
}

fn store_container(payload: &[u8]) -> Vec<u8> {
    let mut data = vec![0u8];
    data.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    data.extend_from_slice(payload);
    data
}

/// Pack records into a one-chunk multi-file payload.
fn multi_file_payload(records: &[&[u8]]) -> Vec<u8> {
    let mut payload = Vec::new();
    for record in records {
        payload.extend_from_slice(record);
    }
    for record in records {
        payload.extend_from_slice(&(record.len() as i32).to_be_bytes());
    }
    payload.push(1);
    payload
}

fn write_fixture(dir: &std::path::Path) {
    let good = multi_file_payload(&[
        &record_bytes("Bronze dagger", 10),
        &record_bytes("Rune scimitar", 25_000),
    ]);
    let mut bad = record_bytes("Broken record", 1);
    bad[0] = 200; // unknown opcode

    let text = format!(
        "revision=9\n\
         id=4\n\
         file=0=0\n\
         file=5=0\n\
         contents={good}\n\
         id=6\n\
         contents={bad}\n",
        good = BASE64.encode(store_container(&good)),
        bad = BASE64.encode(store_container(&bad)),
    );
    std::fs::write(dir.join(flat_file_name(2)), text).unwrap();
}

#[tokio::test]
async fn load_group_decodes_every_file() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let provider = FlatCacheProvider::new(DirectoryProvider::new(dir.path()), Era::Osrs);

    let loader = ConfigLoader::new(2, schema());
    let records = loader.load_group(&provider, 4).await.unwrap().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[&0].string("name"), Some("Bronze dagger"));
    assert_eq!(records[&5].int("cost"), Some(25_000));
}

#[tokio::test]
async fn load_record_fetches_one_file() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let provider = FlatCacheProvider::new(DirectoryProvider::new(dir.path()), Era::Osrs);

    let loader = ConfigLoader::new(2, schema());
    let record = loader.load_record(&provider, 4, 5).await.unwrap().unwrap();
    assert_eq!(record.string("name"), Some("Rune scimitar"));
    assert!(loader.load_record(&provider, 4, 9).await.unwrap().is_none());
}

#[tokio::test]
async fn absent_archive_is_none() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let provider = FlatCacheProvider::new(DirectoryProvider::new(dir.path()), Era::Osrs);

    let loader = ConfigLoader::new(2, schema());
    assert!(loader.load_group(&provider, 99).await.unwrap().is_none());
}

#[tokio::test]
async fn bad_record_fails_the_batch_with_its_id() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let provider = FlatCacheProvider::new(DirectoryProvider::new(dir.path()), Era::Osrs);

    let loader = ConfigLoader::new(2, schema());
    match loader.load_group(&provider, 6).await {
        Err(ConfigError::Record { id, source }) => {
            assert_eq!(id, 0);
            assert!(matches!(*source, ConfigError::UnknownOpcode(200)));
        }
        other => panic!("expected Record error, got {other:?}"),
    }
}

#[tokio::test]
async fn load_groups_skips_absent_archives() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let provider = FlatCacheProvider::new(DirectoryProvider::new(dir.path()), Era::Osrs);

    let loader = ConfigLoader::new(2, schema());
    let groups = loader.load_groups(&provider, &[4, 99]).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[&4].len(), 2);
}
