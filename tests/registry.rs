use std::fs;
use std::path::PathBuf;

use team_stats_terminal::config::{AppConfig, Credential, SourceKind};
use team_stats_terminal::registry::{
    DEFAULT_RANGE, RegistryStore, SheetRef, SheetRegistry, load_registry, parse_registry_json,
    save_registry_file,
};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn registry_file_fills_default_range() {
    let registry = load_registry(&fixture_path("registry.json"), DEFAULT_RANGE)
        .expect("fixture should load");
    assert_eq!(
        registry.labels(),
        vec!["Statistics vs Moldova 4 - 3", "Friendly vs Malta"]
    );
    let malta = registry.lookup("Friendly vs Malta").expect("malta registered");
    assert_eq!(malta, &SheetRef::new("malta", DEFAULT_RANGE));
}

#[test]
fn missing_registry_file_is_empty() {
    let registry = load_registry(&fixture_path("no_such_registry.json"), DEFAULT_RANGE)
        .expect("absent file is fine");
    assert!(registry.is_empty());
}

#[test]
fn lookup_unknown_label_is_not_found() {
    let registry = SheetRegistry::new();
    let err = registry.lookup("Cup final").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn with_sheet_returns_new_snapshot() {
    let base = SheetRegistry::new().with_sheet("A", SheetRef::new("a", "Sheet1!A1:B2"));
    let next = base.with_sheet("B", SheetRef::new("b", "Sheet1!A1:B2"));
    assert_eq!(base.len(), 1);
    assert_eq!(next.len(), 2);

    let replaced = next.with_sheet("A", SheetRef::new("a2", "Sheet2!A1:C3"));
    assert_eq!(replaced.labels(), vec!["A", "B"]);
    assert_eq!(replaced.lookup("A").unwrap().id, "a2");
    assert_eq!(next.lookup("A").unwrap().id, "a");
}

#[test]
fn store_append_keeps_old_snapshots() {
    let mut store = RegistryStore::new(SheetRegistry::new(), DEFAULT_RANGE);
    let before = store.snapshot();
    let after = store.append(" Cup tie ", " xyz ", None);

    assert!(before.is_empty());
    assert_eq!(after.labels(), vec!["Cup tie"]);
    assert_eq!(after.lookup("Cup tie").unwrap(), &SheetRef::new("xyz", DEFAULT_RANGE));

    let custom = store.append("League", "lg", Some("Stats!A1:Z50"));
    assert_eq!(custom.lookup("League").unwrap().range, "Stats!A1:Z50");
    assert_eq!(store.snapshot().len(), 2);
}

#[test]
fn registry_round_trips_through_file() {
    let dir = std::env::temp_dir().join(format!("team_stats_registry_{}", std::process::id()));
    let path = dir.join("sheets.json");
    let registry = SheetRegistry::new().with_sheet("Derby", SheetRef::new("d1", "Sheet1!A1:P1000"));

    save_registry_file(&path, &registry).expect("save should work");
    let loaded = load_registry(&path, "Other!A1:B2").expect("load should work");
    assert_eq!(loaded, registry);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn blank_registry_json_is_empty() {
    assert!(parse_registry_json("").unwrap().sheets.is_empty());
    assert!(parse_registry_json("{}").unwrap().sheets.is_empty());
    assert!(parse_registry_json("{\"sheets\": 3}").is_err());
}

#[test]
fn config_reads_lookup_values() {
    let config = AppConfig::from_lookup(|key| match key {
        "GOOGLE_SHEETS_API_KEY" => Some("k-123".to_string()),
        "SHEETS_SOURCE" => Some("CSV".to_string()),
        "SHEETS_REQUEST_TIMEOUT_SECS" => Some("0".to_string()),
        "SHEETS_API_BASE" => Some("http://localhost:8080/".to_string()),
        "SHEETS_PERSIST_ADDED" => Some("true".to_string()),
        _ => None,
    });
    assert_eq!(config.credential, Some(Credential::ApiKey("k-123".to_string())));
    assert_eq!(config.source, SourceKind::Csv);
    assert_eq!(config.request_timeout.as_secs(), 1);
    assert_eq!(config.api_base, "http://localhost:8080");
    assert!(config.persist_added);
    assert_eq!(config.default_range, DEFAULT_RANGE);
}

#[test]
fn config_prefers_access_token_and_redacts() {
    let config = AppConfig::from_lookup(|key| match key {
        "GOOGLE_SHEETS_API_KEY" => Some("k".to_string()),
        "GOOGLE_SHEETS_ACCESS_TOKEN" => Some("secret-token".to_string()),
        _ => None,
    });
    let credential = config.credential.expect("credential set");
    assert_eq!(credential, Credential::AccessToken("secret-token".to_string()));
    assert!(!format!("{credential:?}").contains("secret-token"));

    let defaults = AppConfig::default();
    assert!(defaults.credential.is_none());
    assert_eq!(defaults.source, SourceKind::Google);
    assert_eq!(defaults.request_timeout.as_secs(), 10);
}
