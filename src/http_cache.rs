use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::sheets_fetch::{RowSource, Rows};

#[derive(Debug, Clone)]
struct CacheEntry {
    rows: Rows,
    fetched_at: DateTime<Utc>,
}

/// Row source wrapper that remembers results per `(sheet_id, range)`.
///
/// Entries never expire; `reload` is the only way to refresh one. Failed
/// fetches are not cached.
pub struct CachedRowSource<S> {
    inner: S,
    entries: Mutex<HashMap<(String, String), CacheEntry>>,
}

impl<S: RowSource> CachedRowSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches from the inner source and replaces any cached entry.
    pub fn reload(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        let rows = self.inner.fetch(sheet_id, range)?;
        let entry = CacheEntry {
            rows: rows.clone(),
            fetched_at: Utc::now(),
        };
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(cache_key(sheet_id, range), entry);
        Ok(rows)
    }

    pub fn cached_at(&self, sheet_id: &str, range: &str) -> Option<DateTime<Utc>> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(&cache_key(sheet_id, range)).map(|e| e.fetched_at)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RowSource> RowSource for CachedRowSource<S> {
    fn fetch(&self, sheet_id: &str, range: &str) -> Result<Rows, FetchError> {
        let cached = {
            let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            guard.get(&cache_key(sheet_id, range)).map(|e| e.rows.clone())
        };
        if let Some(rows) = cached {
            log::debug!("cache hit for {sheet_id} {range}");
            return Ok(rows);
        }
        self.reload(sheet_id, range)
    }
}

fn cache_key(sheet_id: &str, range: &str) -> (String, String) {
    (sheet_id.to_string(), range.to_string())
}
