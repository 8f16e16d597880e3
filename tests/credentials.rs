use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use reqwest::header::AUTHORIZATION;

use team_stats_terminal::config::{AppConfig, Credential};
use team_stats_terminal::service_account::{
    AssertionClaims, DEFAULT_TOKEN_URI, SHEETS_READONLY_SCOPE, ServiceAccountAuth,
    parse_service_account, signed_assertion,
};
use team_stats_terminal::sheets_fetch::{GoogleSheetsSource, RequestAuth};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn read_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name)).expect("fixture file should be readable")
}

#[test]
fn token_is_preferred_over_key_on_the_wire() {
    let config = AppConfig::from_lookup(|key| match key {
        "GOOGLE_SHEETS_API_KEY" => Some("k-123".to_string()),
        "GOOGLE_SHEETS_ACCESS_TOKEN" => Some("ya29.token".to_string()),
        _ => None,
    });
    let source = GoogleSheetsSource::from_config(&config).expect("source should build");
    assert_eq!(
        source.request_auth().unwrap(),
        RequestAuth::Bearer("ya29.token".to_string())
    );

    let req = source.build_request("abc", "Sheet1!A1:P1000").unwrap();
    assert_eq!(req.headers()[AUTHORIZATION], "Bearer ya29.token");
    assert_eq!(req.url().query(), None);
}

#[test]
fn api_key_only_config_sends_key_param() {
    let config = AppConfig::from_lookup(|key| match key {
        "GOOGLE_SHEETS_API_KEY" => Some("k-123".to_string()),
        _ => None,
    });
    let source = GoogleSheetsSource::from_config(&config).expect("source should build");
    let req = source.build_request("abc", "Sheet1!A1:P1000").unwrap();
    assert_eq!(req.url().query(), Some("key=k-123"));
    assert!(req.headers().get(AUTHORIZATION).is_none());
}

#[test]
fn service_account_key_file_is_read_from_env_path() {
    let path = fixture_path("service_account.json");
    let config = AppConfig::from_lookup(|key| match key {
        "GOOGLE_APPLICATION_CREDENTIALS" => Some(path.display().to_string()),
        "GOOGLE_SHEETS_API_KEY" => Some("k-123".to_string()),
        _ => None,
    });
    let credential = config.credential.clone().expect("credential set");
    assert!(matches!(credential, Credential::ServiceAccount(_)));
    assert_eq!(format!("{credential:?}"), "ServiceAccount(<redacted>)");

    assert!(GoogleSheetsSource::from_config(&config).is_ok());
}

#[test]
fn inline_service_account_wins_over_key_file() {
    let config = AppConfig::from_lookup(|key| match key {
        "GOOGLE_SHEETS_SERVICE_ACCOUNT" => Some("{\"client_email\":\"a@b\"}".to_string()),
        "GOOGLE_APPLICATION_CREDENTIALS" => Some("/no/such/key.json".to_string()),
        _ => None,
    });
    assert_eq!(
        config.credential,
        Some(Credential::ServiceAccount("{\"client_email\":\"a@b\"}".to_string()))
    );
    // The blob lacks a private key, so building the source fails up front.
    assert!(GoogleSheetsSource::from_config(&config).is_err());
}

#[test]
fn unreadable_key_file_falls_back_to_api_key() {
    let config = AppConfig::from_lookup(|key| match key {
        "GOOGLE_APPLICATION_CREDENTIALS" => Some("/no/such/key.json".to_string()),
        "GOOGLE_SHEETS_API_KEY" => Some("k-123".to_string()),
        _ => None,
    });
    assert_eq!(config.credential, Some(Credential::ApiKey("k-123".to_string())));
}

#[test]
fn assertion_is_signed_with_the_service_account_key() {
    let key = parse_service_account(&read_fixture("service_account.json")).expect("key parses");
    let now = Utc::now();
    let jwt = signed_assertion(&key, now).expect("assertion signs");

    let public = read_fixture("service_account_pub.pem");
    let decoding = DecodingKey::from_rsa_pem(public.as_bytes()).expect("public key parses");
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[DEFAULT_TOKEN_URI]);
    let claims = jsonwebtoken::decode::<AssertionClaims>(&jwt, &decoding, &validation)
        .expect("signature verifies")
        .claims;

    assert_eq!(claims.iss, "dashboard@team-stats-test.iam.gserviceaccount.com");
    assert_eq!(claims.scope, SHEETS_READONLY_SCOPE);
    assert_eq!(claims.aud, DEFAULT_TOKEN_URI);
    assert_eq!(claims.iat, now.timestamp());
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn service_account_auth_exposes_only_the_email() {
    let auth = ServiceAccountAuth::from_blob(&read_fixture("service_account.json")).unwrap();
    assert_eq!(
        auth.client_email(),
        "dashboard@team-stats-test.iam.gserviceaccount.com"
    );
}
