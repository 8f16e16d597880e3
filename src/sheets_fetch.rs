use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Request};
use reqwest::header::USER_AGENT;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{AppConfig, Credential, SourceKind};
use crate::error::FetchError;
use crate::http_client::http_client;
use crate::service_account::ServiceAccountAuth;

pub type Rows = Vec<Vec<String>>;

/// Anything that can hand back the raw rows of a sheet range.
pub trait RowSource {
    fn fetch(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn fetch(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        (**self).fetch(sheet_id, range)
    }
}

impl<S: RowSource + ?Sized> RowSource for &S {
    fn fetch(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        (**self).fetch(sheet_id, range)
    }
}

/// Builds the source selected by `SHEETS_SOURCE`.
pub fn source_from_config(config: &AppConfig) -> Result<Box<dyn RowSource>> {
    match config.source {
        SourceKind::Google => Ok(Box::new(GoogleSheetsSource::from_config(config)?)),
        SourceKind::Csv => Ok(Box::new(CsvDirSource::new(config.csv_dir.clone()))),
    }
}

/// How a values request proves who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    Anonymous,
    Key(String),
    Bearer(String),
}

enum SourceAuth {
    Anonymous,
    ApiKey(String),
    AccessToken(String),
    ServiceAccount(ServiceAccountAuth),
}

/// Google Sheets values API (`/v4/spreadsheets/{id}/values/{range}`).
pub struct GoogleSheetsSource {
    client: &'static Client,
    api_base: String,
    auth: SourceAuth,
}

impl GoogleSheetsSource {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        if config.credential.is_none() {
            log::warn!("no sheets credential configured; only public sheets will load");
        }
        let source = Self::new(
            http_client(config.request_timeout)?,
            &config.api_base,
            config.credential.clone(),
        )
        .context("invalid service account credential")?;
        Ok(source)
    }

    pub fn new(
        client: &'static Client,
        api_base: &str,
        credential: Option<Credential>,
    ) -> Result<Self, FetchError> {
        let auth = match credential {
            None => SourceAuth::Anonymous,
            Some(Credential::ApiKey(key)) => SourceAuth::ApiKey(key),
            Some(Credential::AccessToken(token)) => SourceAuth::AccessToken(token),
            Some(Credential::ServiceAccount(blob)) => {
                let sa = ServiceAccountAuth::from_blob(&blob)?;
                log::info!("using service account {}", sa.client_email());
                SourceAuth::ServiceAccount(sa)
            }
        };
        Ok(Self {
            client,
            api_base: api_base.to_string(),
            auth,
        })
    }

    /// Resolves the credential; a service account may hit the token endpoint here.
    pub fn request_auth(&self) -> Result<RequestAuth, FetchError> {
        Ok(match &self.auth {
            SourceAuth::Anonymous => RequestAuth::Anonymous,
            SourceAuth::ApiKey(key) => RequestAuth::Key(key.clone()),
            SourceAuth::AccessToken(token) => RequestAuth::Bearer(token.clone()),
            SourceAuth::ServiceAccount(sa) => RequestAuth::Bearer(sa.access_token(self.client)?),
        })
    }

    pub fn build_request(&self, sheet_id: &str, range: &str) -> Result<Request, FetchError> {
        let auth = self.request_auth()?;
        values_request(self.client, &self.api_base, sheet_id, range, &auth)
    }
}

impl RowSource for GoogleSheetsSource {
    fn fetch(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        let req = self.build_request(sheet_id, range)?;

        log::info!("fetching {range} from sheet {sheet_id}");
        let resp = self
            .client
            .execute(req)
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), sheet_id, range, &body));
        }

        let rows = parse_values_json(&body)?;
        log::debug!("sheet {sheet_id} returned {} row(s)", rows.len());
        Ok(rows)
    }
}

/// Builds the GET for one values range without sending it.
pub fn values_request(
    client: &Client,
    api_base: &str,
    sheet_id: &str,
    range: &str,
    auth: &RequestAuth,
) -> Result<Request, FetchError> {
    let mut url = values_url(api_base, sheet_id, range)?;
    if let RequestAuth::Key(key) = auth {
        url.query_pairs_mut().append_pair("key", key);
    }
    let mut req = client.get(url).header(USER_AGENT, "team_stats_terminal");
    if let RequestAuth::Bearer(token) = auth {
        req = req.bearer_auth(token);
    }
    req.build()
        .map_err(|e| FetchError::Transport(e.without_url().to_string()))
}

pub fn values_url(api_base: &str, sheet_id: &str, range: &str) -> Result<Url, FetchError> {
    if sheet_id.trim().is_empty() {
        return Err(FetchError::NotFound {
            sheet_id: sheet_id.to_string(),
        });
    }
    if range.trim().is_empty() {
        return Err(FetchError::BadRange {
            range: range.to_string(),
            message: "range is empty".to_string(),
        });
    }
    let mut url = Url::parse(api_base)
        .map_err(|e| FetchError::Transport(format!("invalid api base {api_base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| FetchError::Transport(format!("api base cannot hold a path: {api_base}")))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", sheet_id.trim(), "values", range.trim()]);
    Ok(url)
}

/// Maps a non-success response onto the fetch error kinds.
pub fn error_for_status(status: u16, sheet_id: &str, range: &str, body: &str) -> FetchError {
    let message = api_error_message(body).unwrap_or_else(|| body.trim().to_string());
    match status {
        401 | 403 => FetchError::Auth {
            sheet_id: sheet_id.to_string(),
            message,
        },
        404 => FetchError::NotFound {
            sheet_id: sheet_id.to_string(),
        },
        400 => FetchError::BadRange {
            range: range.to_string(),
            message,
        },
        _ => FetchError::Http { status, message },
    }
}

fn api_error_message(body: &str) -> Option<String> {
    let root: Value = serde_json::from_str(body).ok()?;
    root.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Decodes a `ValueRange` body. A missing `values` key is an empty range.
pub fn parse_values_json(raw: &str) -> Result<Rows, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let range: ValueRange =
        serde_json::from_str(trimmed).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(range
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

/// Reads `<dir>/<sheet_id>.csv`; the range is not applied.
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RowSource for CsvDirSource {
    fn fetch(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        let path = self.dir.join(format!("{}.csv", sheet_id.trim()));
        log::info!("reading {} (range {range} ignored)", path.display());
        let file = File::open(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound {
                sheet_id: sheet_id.to_string(),
            },
            _ => FetchError::Io {
                path: path.display().to_string(),
                source,
            },
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| FetchError::Decode(e.to_string()))?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(rows)
    }
}
