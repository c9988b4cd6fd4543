// src/fetch/sheet.rs
//! Workbook decoding and the tabular text form the raw files are stored in.

use anyhow::{anyhow, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;

/// A converted sheet, ready to be written to disk.
#[derive(Debug)]
pub struct SheetCsv {
    pub bytes: Vec<u8>,
    /// Data rows written, excluding the header.
    pub rows: usize,
}

/// Open an in-memory workbook (xls, xlsx, xlsb or ods) and return its first sheet.
pub fn first_sheet(bytes: Vec<u8>) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| anyhow!("not a readable workbook: {}", e))?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no sheets"))?
        .map_err(|e| anyhow!("reading first sheet: {}", e))
}

/// Render a sheet as delimited text with a leading row-index column.
///
/// Fully blank rows are dropped. The first remaining row is the header; its
/// index cell is empty and blank header cells become `Unnamed: <col>`. Data
/// rows are numbered from zero.
pub fn sheet_to_csv(range: &Range<Data>) -> Result<SheetCsv> {
    let mut rows = range
        .rows()
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)));

    let header = rows.next().ok_or_else(|| anyhow!("sheet is empty"))?;

    let mut wtr = csv::Writer::from_writer(Vec::new());

    let mut record = Vec::with_capacity(header.len() + 1);
    record.push(String::new());
    for (col, cell) in header.iter().enumerate() {
        let name = render_cell(cell);
        record.push(if name.is_empty() {
            format!("Unnamed: {}", col)
        } else {
            name
        });
    }
    wtr.write_record(&record)?;

    let mut count = 0;
    for (idx, row) in rows.enumerate() {
        record.clear();
        record.push(idx.to_string());
        record.extend(row.iter().map(render_cell));
        wtr.write_record(&record)?;
        count += 1;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("flushing sheet text: {}", e))?;
    Ok(SheetCsv {
        bytes,
        rows: count,
    })
}

/// Text form of one cell. Whole-number floats drop their fractional part.
pub fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            (*f as i64).to_string()
        }
        Data::Float(f) => f.to_string(),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
