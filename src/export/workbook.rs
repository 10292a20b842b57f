//! Spreadsheet writing.
//!
//! Writes a tabular result to an `.xlsx` workbook: one sheet, a bold header
//! row, values in result-set order. Anything fancier than the header format
//! belongs to the spreadsheet-application collaborator, not here.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::db::{Table, Value};
use crate::error::{DatadeskError, Result};

/// Sheet name used for every export.
const SHEET_NAME: &str = "Data Export";

/// Writes `table` to an xlsx workbook at `path`.
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| DatadeskError::export(format!("Failed to name worksheet: {e}")))?;

    let header_format = Format::new().set_bold();

    for (col, column) in table.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, &column.name, &header_format)
            .map_err(|e| DatadeskError::export(format!("Failed to write header: {e}")))?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let row_index = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            write_value(worksheet, row_index, col as u16, value)?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| DatadeskError::export(format!("Failed to save {}: {e}", path.display())))?;

    debug!(file = %path.display(), rows = table.row_count, "workbook written");
    Ok(())
}

fn write_value(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    value: &Value,
) -> Result<()> {
    let outcome = match value {
        Value::Null => return Ok(()),
        Value::Bool(b) => worksheet.write_boolean(row, col, *b),
        Value::Int(i) => worksheet.write_number(row, col, *i as f64),
        Value::Float(f) => worksheet.write_number(row, col, *f),
        Value::String(s) => worksheet.write_string(row, col, s),
        Value::Bytes(_) => worksheet.write_string(row, col, &value.to_display_string()),
    };

    outcome
        .map(|_| ())
        .map_err(|e| DatadeskError::export(format!("Failed to write cell ({row}, {col}): {e}")))
}
