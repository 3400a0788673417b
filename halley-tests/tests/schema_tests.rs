//! Key schema selection against stores on disk.

use halley_core::envfile::EnvFile;
use halley_core::schema::{KeySchema, SchemaVersion};
use halley_tests::TestStoreBuilder;
use tempfile::TempDir;

#[test]
fn test_v1_store_detected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".env");
    TestStoreBuilder::new()
        .entry("ETHEREUM_RPC_URL", "https://rpc.example")
        .entry("VALIDATOR_PRIVATE_KEY", "0xsecret")
        .write(&path);

    let store = EnvFile::load(&path).unwrap();
    assert_eq!(KeySchema::detect(&store), Some(SchemaVersion::V1));
}

#[test]
fn test_v2_store_detected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".env");
    TestStoreBuilder::new()
        .entry("ETHEREUM_HOSTS", "https://rpc.example,https://rpc2.example")
        .write(&path);

    let store = EnvFile::load(&path).unwrap();
    assert_eq!(KeySchema::detect(&store), Some(SchemaVersion::V2));
}

#[test]
fn test_shared_keys_alone_detect_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".env");
    TestStoreBuilder::new()
        .entry("LOG_LEVEL", "info")
        .entry("P2P_PORT", "40400")
        .write(&path);

    let store = EnvFile::load(&path).unwrap();
    assert_eq!(KeySchema::detect(&store), None);
}

#[test]
fn test_schema_keys_drive_upserts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".env");

    let schema = KeySchema::new(SchemaVersion::V2);
    let mut store = EnvFile::load(&path).unwrap();
    store
        .upsert(schema.ethereum_hosts(), "https://rpc.example")
        .unwrap();
    store.upsert(schema.validator_keys(), "0xsecret").unwrap();
    store.save().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("ETHEREUM_HOSTS=https://rpc.example"));
    assert!(content.contains("VALIDATOR_PRIVATE_KEYS=0xsecret"));
    assert!(!content.contains("ETHEREUM_RPC_URL"));
}

#[test]
fn test_detection_round_trips_after_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".env");

    let schema = KeySchema::new(SchemaVersion::V1);
    let mut store = EnvFile::load(&path).unwrap();
    for key in schema.managed_keys() {
        store.upsert(key, "placeholder").unwrap();
    }
    store.save().unwrap();

    let reloaded = EnvFile::load(&path).unwrap();
    assert_eq!(KeySchema::detect(&reloaded), Some(SchemaVersion::V1));
}
