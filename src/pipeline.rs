use chrono::{DateTime, Utc};

use crate::error::StatsError;
use crate::normalize::{NormalizeReport, STAT_COLUMNS, normalize_numeric_with_report};
use crate::registry::{SheetRef, SheetRegistry};
use crate::sheets_fetch::RowSource;
use crate::table::{Table, build_table};

#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub label: String,
    pub sheet: SheetRef,
    pub table: Table,
    pub report: NormalizeReport,
    pub loaded_at: DateTime<Utc>,
}

/// Fetch, build and normalize one sheet range.
pub fn load_table(
    source: &dyn RowSource,
    sheet: &SheetRef,
    numeric_columns: &[&str],
) -> Result<(Table, NormalizeReport), StatsError> {
    let rows = source.fetch(&sheet.id, &sheet.range)?;
    let table = build_table(&rows);
    Ok(normalize_numeric_with_report(table, numeric_columns))
}

/// Resolves `label` in the registry and loads it with the stat columns.
pub fn load_sheet(
    source: &dyn RowSource,
    registry: &SheetRegistry,
    label: &str,
) -> Result<LoadedSheet, StatsError> {
    let sheet = registry.lookup(label)?.clone();
    let (table, report) = load_table(source, &sheet, STAT_COLUMNS)?;
    log::info!(
        "loaded {label}: {} player row(s), {} column(s)",
        table.row_count(),
        table.column_count()
    );
    Ok(LoadedSheet {
        label: label.to_string(),
        sheet,
        table,
        report,
        loaded_at: Utc::now(),
    })
}
