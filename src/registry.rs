use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::StatsError;

pub const DEFAULT_RANGE: &str = "Sheet1!A1:P1000";

/// Where a sheet's rows live: spreadsheet id plus A1 range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRef {
    pub id: String,
    pub range: String,
}

impl SheetRef {
    pub fn new(id: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            range: range.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub label: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

/// Immutable, ordered label → sheet mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRegistry {
    entries: Vec<(String, SheetRef)>,
}

impl SheetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[SheetEntry], default_range: &str) -> Self {
        entries.iter().fold(Self::new(), |reg, entry| {
            let range = entry
                .range
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or(default_range);
            reg.with_sheet(&entry.label, SheetRef::new(entry.id.trim(), range))
        })
    }

    /// Returns a new registry with `label` added, or replaced in place.
    pub fn with_sheet(&self, label: &str, sheet: SheetRef) -> Self {
        let mut entries = self.entries.clone();
        match entries.iter_mut().find(|(l, _)| l == label) {
            Some(slot) => slot.1 = sheet,
            None => entries.push((label.to_string(), sheet)),
        }
        Self { entries }
    }

    pub fn lookup(&self, label: &str) -> Result<&SheetRef, StatsError> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, sheet)| sheet)
            .ok_or_else(|| StatsError::sheet(label))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn get(&self, idx: usize) -> Option<(&str, &SheetRef)> {
        self.entries.get(idx).map(|(l, s)| (l.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_file(&self) -> RegistryFile {
        RegistryFile {
            sheets: self
                .entries
                .iter()
                .map(|(label, sheet)| SheetEntry {
                    label: label.clone(),
                    id: sheet.id.clone(),
                    range: Some(sheet.range.clone()),
                })
                .collect(),
        }
    }
}

/// Holder of the current registry snapshot.
///
/// Readers take an `Arc` snapshot; `append` publishes a new one and leaves
/// earlier snapshots untouched.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    current: Arc<SheetRegistry>,
    default_range: String,
}

impl RegistryStore {
    pub fn new(registry: SheetRegistry, default_range: impl Into<String>) -> Self {
        Self {
            current: Arc::new(registry),
            default_range: default_range.into(),
        }
    }

    pub fn snapshot(&self) -> Arc<SheetRegistry> {
        Arc::clone(&self.current)
    }

    pub fn default_range(&self) -> &str {
        &self.default_range
    }

    /// Adds a sheet; blank `range` falls back to the store's default.
    pub fn append(&mut self, label: &str, id: &str, range: Option<&str>) -> Arc<SheetRegistry> {
        let range = range
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.default_range)
            .to_string();
        let next = self
            .current
            .with_sheet(label.trim(), SheetRef::new(id.trim(), range));
        self.current = Arc::new(next);
        self.snapshot()
    }
}

/// Registry from the JSON file at `path`; an absent file gives an empty registry.
pub fn load_registry(path: &Path, default_range: &str) -> Result<SheetRegistry> {
    if !path.exists() {
        log::info!("no sheet registry at {}", path.display());
        return Ok(SheetRegistry::new());
    }
    let file = load_registry_file(path)?;
    Ok(SheetRegistry::from_entries(&file.sheets, default_range))
}

pub fn load_registry_file(path: &Path) -> Result<RegistryFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read sheet registry {}", path.display()))?;
    parse_registry_json(&raw).with_context(|| format!("parse sheet registry {}", path.display()))
}

pub fn parse_registry_json(raw: &str) -> Result<RegistryFile> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(RegistryFile::default());
    }
    let file = serde_json::from_str::<RegistryFile>(trimmed).context("invalid registry json")?;
    Ok(file)
}

pub fn save_registry_file(path: &Path, registry: &SheetRegistry) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(&registry.to_file()).context("serialize registry")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write registry")?;
    fs::rename(&tmp, path).context("swap registry")?;
    Ok(())
}
