use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::metrics::{TeamSummary, team_summary};
use crate::table::{Cell, Table};

pub struct ExportReport {
    pub players: usize,
    pub columns: usize,
    pub totals: usize,
}

/// Writes the table to a `Players` sheet and the team view to `Team`.
pub fn export_stats(path: &Path, table: &Table) -> Result<ExportReport> {
    let summary = team_summary(table);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_table(sheet, table)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Team")?;
        write_summary(sheet, &summary)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        players: table.row_count(),
        columns: table.column_count(),
        totals: summary.totals.len(),
    })
}

fn write_table(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    for (col_idx, column) in table.columns().iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, &column.name)
            .with_context(|| format!("write header {col_idx}"))?;
        for row_idx in 0..table.row_count() {
            let row = row_idx as u32 + 1;
            let col = col_idx as u16;
            let written = match column.cell(row_idx) {
                Some(Cell::Number(v)) => worksheet.write_number(row, col, v),
                Some(Cell::Text(s)) => worksheet.write_string(row, col, &s),
                None => continue,
            };
            written.with_context(|| format!("write cell ({row},{col})"))?;
        }
    }
    Ok(())
}

fn write_summary(worksheet: &mut Worksheet, summary: &TeamSummary) -> Result<()> {
    worksheet.write_string(0, 0, "Stat")?;
    worksheet.write_string(0, 1, "Total")?;

    let mut row = 1u32;
    for (name, total) in summary.totals.iter() {
        worksheet.write_string(row, 0, name)?;
        worksheet.write_number(row, 1, total)?;
        row += 1;
    }
    worksheet.write_string(row, 0, "Total Shots")?;
    worksheet.write_number(row, 1, summary.shooting.total as f64)?;
    worksheet.write_string(row + 1, 0, "Shot Accuracy %")?;
    worksheet.write_number(row + 1, 1, summary.shooting.accuracy)?;
    Ok(())
}
