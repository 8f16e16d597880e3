use thiserror::Error;

/// Failures reported by a row source. Never retried by the pipeline.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("not authorised to read sheet {sheet_id}: {message}")]
    Auth { sheet_id: String, message: String },

    #[error("credential rejected: {0}")]
    Credential(String),

    #[error("sheet {sheet_id} not found")]
    NotFound { sheet_id: String },

    #[error("malformed range {range:?}: {message}")]
    BadRange { range: String, message: String },

    #[error("http {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid values payload: {0}")]
    Decode(String),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A cell that could not be read as a number.
///
/// Only surfaces from [`crate::normalize::parse_numeric`]; the normalizer
/// recovers from it by substituting zero.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("not a number: {raw:?}")]
pub struct ParseError {
    pub raw: String,
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{kind} not found: {name}")]
    NotFound { kind: LookupKind, name: String },
}

impl StatsError {
    pub fn player(name: &str) -> Self {
        Self::NotFound {
            kind: LookupKind::Player,
            name: name.to_string(),
        }
    }

    pub fn column(name: &str) -> Self {
        Self::NotFound {
            kind: LookupKind::Column,
            name: name.to_string(),
        }
    }

    pub fn sheet(label: &str) -> Self {
        Self::NotFound {
            kind: LookupKind::Sheet,
            name: label.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Player,
    Column,
    Sheet,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LookupKind::Player => "player",
            LookupKind::Column => "column",
            LookupKind::Sheet => "sheet",
        };
        f.write_str(label)
    }
}
