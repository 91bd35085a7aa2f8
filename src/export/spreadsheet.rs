//! Spreadsheet (xlsx) renderer

use rust_xlsxwriter::Workbook;

use super::projection::ExportRecord;
use super::value::ExportValue;
use super::ExportError;

const SHEET_NAME: &str = "Sheet1";

/// Write a single-sheet workbook: header row first, then one row per record.
///
/// Numbers are written as numeric cells, null as an empty cell.
pub fn write_workbook(headers: &[&str], records: &[ExportRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, column_index(col)?, *header)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = u32::try_from(index + 1)
            .map_err(|_| ExportError::TooLarge(format!("{} rows", records.len())))?;

        for (col, value) in record.values().enumerate() {
            let col = column_index(col)?;
            match value {
                ExportValue::Null => {}
                ExportValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b)?;
                }
                ExportValue::Integer(n) => {
                    worksheet.write_number(row, col, *n as f64)?;
                }
                ExportValue::Float(f) => {
                    worksheet.write_number(row, col, *f)?;
                }
                ExportValue::Text(s) => {
                    worksheet.write_string(row, col, s.as_str())?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column_index(col: usize) -> Result<u16, ExportError> {
    u16::try_from(col).map_err(|_| ExportError::TooLarge(format!("column {}", col)))
}
