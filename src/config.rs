use std::path::PathBuf;
use std::time::Duration;

use crate::registry::DEFAULT_RANGE;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REGISTRY_FILE: &str = "sheets.json";
const DEFAULT_CSV_DIR: &str = "data";

/// Secret handed to the row source untouched.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Sent as the `key` query parameter.
    ApiKey(String),
    /// Sent as `Authorization: Bearer ...`.
    AccessToken(String),
    /// Service-account key JSON, traded for an access token before each fetch.
    ServiceAccount(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credential::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Credential::ServiceAccount(_) => f.write_str("ServiceAccount(<redacted>)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Google,
    Csv,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source: SourceKind,
    pub credential: Option<Credential>,
    pub api_base: String,
    pub request_timeout: Duration,
    pub csv_dir: PathBuf,
    pub registry_file: PathBuf,
    pub default_range: String,
    pub persist_added: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Loads `.env.local` / `.env` (if present) and reads the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credential = get("GOOGLE_SHEETS_ACCESS_TOKEN")
            .map(Credential::AccessToken)
            .or_else(|| service_account_blob(&get).map(Credential::ServiceAccount))
            .or_else(|| get("GOOGLE_SHEETS_API_KEY").map(Credential::ApiKey));

        let source = match get("SHEETS_SOURCE").map(|v| v.to_lowercase()).as_deref() {
            Some("csv") | Some("file") => SourceKind::Csv,
            _ => SourceKind::Google,
        };

        let timeout_secs = get("SHEETS_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);

        let persist_added = get("SHEETS_PERSIST_ADDED")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            source,
            credential,
            api_base: get("SHEETS_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            csv_dir: PathBuf::from(get("SHEETS_CSV_DIR").unwrap_or_else(|| DEFAULT_CSV_DIR.to_string())),
            registry_file: PathBuf::from(
                get("SHEETS_REGISTRY_FILE").unwrap_or_else(|| DEFAULT_REGISTRY_FILE.to_string()),
            ),
            default_range: get("SHEETS_DEFAULT_RANGE").unwrap_or_else(|| DEFAULT_RANGE.to_string()),
            persist_added,
        }
    }
}

/// Inline key JSON wins over a key file path.
fn service_account_blob(get: &impl Fn(&str) -> Option<String>) -> Option<String> {
    if let Some(blob) = get("GOOGLE_SHEETS_SERVICE_ACCOUNT") {
        return Some(blob);
    }
    let path = get("GOOGLE_APPLICATION_CREDENTIALS")?;
    match std::fs::read_to_string(&path) {
        Ok(blob) if !blob.trim().is_empty() => Some(blob),
        Ok(_) => {
            log::warn!("service account key file {path} is empty");
            None
        }
        Err(err) => {
            log::warn!("could not read service account key file {path}: {err}");
            None
        }
    }
}

/// Per-user cache directory for log output.
pub fn app_cache_dir() -> Option<PathBuf> {
    const CACHE_DIR: &str = "team_stats_terminal";
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}
