//! Tests for client configuration loading.

use ledger_tictactoe::ClientConfig;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = ClientConfig::default();
    assert_eq!(config.node_url(), "https://fullnode.devnet.aptoslabs.com");
    assert_eq!(config.confirmation_timeout(), Duration::from_secs(30));
    assert_eq!(config.poll_interval(), Duration::from_millis(500));
}

#[test]
fn test_partial_file_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "node_url = \"http://localhost:8080\"").unwrap();
    writeln!(file, "module_address = \"0x42\"").unwrap();
    writeln!(file, "confirmation_timeout_secs = 5").unwrap();

    let config = ClientConfig::from_file(file.path()).unwrap();
    assert_eq!(config.node_url(), "http://localhost:8080");
    assert_eq!(config.module_address(), "0x42");
    assert_eq!(config.confirmation_timeout(), Duration::from_secs(5));
    assert_eq!(config.names_url(), ClientConfig::default().names_url());
}

#[test]
fn test_rejects_bad_module_address() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "module_address = \"tic_tac_toe\"").unwrap();

    let err = ClientConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("module_address"));
}

#[test]
fn test_rejects_zero_timeout() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "confirmation_timeout_secs = 0").unwrap();
    assert!(ClientConfig::from_file(file.path()).is_err());
}

#[test]
fn test_rejects_zero_poll_interval() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "poll_interval_ms = 0").unwrap();

    let err = ClientConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("poll_interval_ms"));
    assert!(ClientConfig::load(file.path()).is_err());
}

#[test]
fn test_rejects_empty_node_url() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "node_url = \"  \"").unwrap();
    assert!(ClientConfig::from_file(file.path()).is_err());
}

#[test]
fn test_rejects_invalid_toml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "node_url = ").unwrap();
    let err = ClientConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("parse"));
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.module_address(), ClientConfig::default().module_address());
}
