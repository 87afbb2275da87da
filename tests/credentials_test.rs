use docsweep::config::credentials::{CredentialSource, Credentials, DEFAULT_DATABASE};
use docsweep::SweepError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn write_key(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

const VALID_KEY: &str = r#"{
    "project_id": "acme-dev",
    "mongodb_uri": "mongodb://localhost:27017",
    "database": "acme",
    "identity": { "api_key": "k-123" }
}"#;

#[test]
fn test_first_present_key_file_wins() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");
    let valid = write_key(&dir, "key.json", VALID_KEY);

    let (credentials, source) =
        Credentials::load_with(&[missing, valid.clone()], lookup(&[])).unwrap();

    assert_eq!(source, CredentialSource::File(valid));
    assert_eq!(credentials.project_id, "acme-dev");
    assert_eq!(credentials.database, "acme");
    let identity = credentials.identity.unwrap();
    assert_eq!(identity.api_key, "k-123");
    assert!(identity.base_url.starts_with("https://"));
}

#[test]
fn test_malformed_key_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let broken = write_key(&dir, "broken.json", "{ not json");
    let empty = write_key(&dir, "empty.json", r#"{ "project_id": "", "mongodb_uri": "" }"#);
    let valid = write_key(&dir, "key.json", VALID_KEY);

    let (_, source) = Credentials::load_with(&[broken, empty, valid.clone()], lookup(&[])).unwrap();

    assert_eq!(source, CredentialSource::File(valid));
}

#[test]
fn test_falls_back_to_environment() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");

    let (credentials, source) = Credentials::load_with(
        &[missing],
        lookup(&[
            ("MONGODB_URI", "mongodb://db:27017"),
            ("PROJECT_ID", "acme-staging"),
        ]),
    )
    .unwrap();

    assert_eq!(source, CredentialSource::Environment);
    assert_eq!(credentials.project_id, "acme-staging");
    assert_eq!(credentials.database, DEFAULT_DATABASE);
    assert!(credentials.identity.is_none());
}

#[test]
fn test_missing_credentials_are_a_connection_error() {
    let result = Credentials::load_with(&[], lookup(&[("PROJECT_ID", "acme")]));

    match result {
        Err(SweepError::Connection(message)) => assert!(message.contains("MONGODB_URI")),
        other => panic!("expected connection error, got {:?}", other),
    }
}

#[test]
fn test_debug_output_redacts_secrets() {
    let credentials = Credentials::from_lookup(lookup(&[
        ("MONGODB_URI", "mongodb://admin:hunter2@db:27017"),
        ("PROJECT_ID", "acme"),
        ("IDENTITY_API_KEY", "secret-key"),
    ]))
    .unwrap();

    let shown = format!("{:?}", credentials);

    assert!(!shown.contains("hunter2"));
    assert!(!shown.contains("secret-key"));
    assert!(shown.contains("acme"));
}
