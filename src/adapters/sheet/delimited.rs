//! Comma-separated sheets. The whole file is one sheet; every cell is text.

use crate::domain::sheet::{Cell, Sheet};
use crate::utils::error::{FormError, Result};

pub fn read_sheet(bytes: &[u8], sheet_name: &str) -> Result<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::text(field)
                    }
                })
                .collect(),
        );
    }

    Ok(Sheet::from_rows(sheet_name, (0, 0), rows))
}

pub fn write_sheet(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in sheet.rows() {
        writer.write_record(row.iter().map(Cell::display))?;
    }
    writer
        .into_inner()
        .map_err(|e| FormError::IoError(e.into_error()))
}
