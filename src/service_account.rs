use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a Google service-account key file that the token grant needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

pub fn parse_service_account(blob: &str) -> Result<ServiceAccountKey, FetchError> {
    let key: ServiceAccountKey = serde_json::from_str(blob)
        .map_err(|e| FetchError::Credential(format!("unreadable service account key: {e}")))?;
    if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
        return Err(FetchError::Credential(
            "service account key lacks client_email or private_key".to_string(),
        ));
    }
    Ok(key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs the RS256 JWT exchanged at the token endpoint.
pub fn signed_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String, FetchError> {
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: SHEETS_READONLY_SCOPE.to_string(),
        aud: key.token_uri.clone(),
        iat: now.timestamp(),
        exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
    };
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| FetchError::Credential(format!("bad private key: {e}")))?;
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
        .map_err(|e| FetchError::Credential(format!("could not sign assertion: {e}")))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Reads the token endpoint's answer into `(token, expiry)`.
pub fn parse_token_response(
    body: &str,
    now: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>), FetchError> {
    let resp: TokenResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Credential(format!("unexpected token response: {e}")))?;
    let lifetime = resp.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS).clamp(0, 86_400);
    Ok((resp.access_token, now + Duration::seconds(lifetime)))
}

fn token_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|root| {
            root.get("error_description")
                .or_else(|| root.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Service-account login that trades a signed assertion for an access token
/// and reuses it until shortly before expiry.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn from_blob(blob: &str) -> Result<Self, FetchError> {
        Ok(Self {
            key: parse_service_account(blob)?,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn access_token(&self, client: &Client) -> Result<String, FetchError> {
        let now = Utc::now();
        let mut guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now {
                return Ok(cached.token.clone());
            }
        }

        log::info!("requesting access token for {}", self.key.client_email);
        let assertion = signed_assertion(&self.key, now)?;
        let resp = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
        if !status.is_success() {
            return Err(FetchError::Credential(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                token_error_message(&body)
            )));
        }

        let (token, expires_at) = parse_token_response(&body, now)?;
        *guard = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }
}
