use crate::error::ParseError;
use crate::table::{ColumnData, Table};

/// Stat columns coerced to numbers on every load.
pub const STAT_COLUMNS: &[&str] = &[
    "Goals",
    "Assists",
    "Played",
    "Yellow C.",
    "Shots on target",
    "Shots off target",
    "Failed passes",
    "Ball lost",
    "Dribbles",
    "Clearances/Saves",
    "Fouls Committed",
    "Fouls Won",
    "Tackles Won",
    "Crosses to box",
    "Key Passes",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Columns converted from text during this pass.
    pub converted: Vec<String>,
    /// Requested columns the table does not have.
    pub missing: Vec<String>,
    /// Cells that failed to parse and were replaced with zero.
    pub zero_filled: usize,
}

pub fn parse_numeric(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError {
            raw: raw.to_string(),
        }),
    }
}

pub fn parse_numeric_or_zero(raw: &str) -> f64 {
    parse_numeric(raw).unwrap_or(0.0)
}

/// Coerces the listed columns to numbers, replacing unparseable cells with zero.
///
/// Columns that are already numeric are left as they are, so running this
/// twice gives the same table. Missing columns are skipped.
pub fn normalize_numeric(table: Table, columns: &[&str]) -> Table {
    normalize_numeric_with_report(table, columns).0
}

pub fn normalize_numeric_with_report(mut table: Table, columns: &[&str]) -> (Table, NormalizeReport) {
    let mut report = NormalizeReport::default();

    for name in columns {
        let Some(column) = table.columns_mut().iter_mut().find(|c| c.name == *name) else {
            report.missing.push((*name).to_string());
            continue;
        };
        let ColumnData::Text(values) = &column.data else {
            continue;
        };

        let mut numbers = Vec::with_capacity(values.len());
        for raw in values {
            match parse_numeric(raw) {
                Ok(v) => numbers.push(v),
                Err(_) => {
                    report.zero_filled += 1;
                    numbers.push(0.0);
                }
            }
        }
        column.data = ColumnData::Numeric(numbers);
        report.converted.push(column.name.clone());
    }

    if !report.missing.is_empty() {
        log::warn!("numeric columns not in sheet: {}", report.missing.join(", "));
    }
    if report.zero_filled > 0 {
        log::debug!("zero-filled {} unparseable cell(s)", report.zero_filled);
    }

    (table, report)
}

/// Requested columns that `table` does not have, in request order.
pub fn missing_columns(table: &Table, columns: &[&str]) -> Vec<String> {
    columns
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| (*name).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numeric_trims_and_rejects_junk() {
        assert_eq!(parse_numeric(" 3 ").unwrap(), 3.0);
        assert_eq!(parse_numeric("2.5").unwrap(), 2.5);
        assert_eq!(parse_numeric("-1").unwrap(), -1.0);
        assert!(parse_numeric("").is_err());
        assert!(parse_numeric("n/a").is_err());
        assert!(parse_numeric("NaN").is_err());
        assert!(parse_numeric("inf").is_err());
    }

    #[test]
    fn stat_columns_cover_both_views() {
        for name in ["Played", "Yellow C.", "Key Passes", "Clearances/Saves"] {
            assert!(STAT_COLUMNS.contains(&name));
        }
        assert_eq!(STAT_COLUMNS.len(), 15);
    }
}
