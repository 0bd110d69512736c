// tests/config_tests.rs
use bindaddr::config::{load_config, Config};
use std::fs;

#[tokio::test]
async fn test_load_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bindaddr.yaml");
    fs::write(&path, "listen: \"*:9000\"\nmode: \"0640\"\n").unwrap();

    let config = load_config(&path).await.unwrap();
    assert_eq!(config.listen, "*:9000");
    assert_eq!(config.mode, 0o640);
}

#[tokio::test]
async fn test_load_json_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bindaddr.json");
    fs::write(&path, r#"{"listen": "unix:/run/app.sock"}"#).unwrap();

    let config = load_config(&path).await.unwrap();
    assert_eq!(config.listen, "unix:/run/app.sock");
    assert_eq!(config.mode, Config::default().mode);
}

#[tokio::test]
async fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(dir.path().join("absent.yaml")).await.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yml");
    fs::write(&path, "listen: \"\"\n").unwrap();

    assert!(load_config(&path).await.is_err());
}
