//! Source readers: spreadsheet workbooks and CSV files into a [`RawTable`]

use super::record::{Cell, RawTable};
use crate::error::LoadError;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Every extension [`read`] accepts
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"];

/// Read a dataset, picking the reader from the file extension
pub fn read<P: AsRef<Path>>(path: P) -> Result<RawTable, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound { path: path.to_path_buf() });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        e if WORKBOOK_EXTENSIONS.contains(&e) => read_workbook(path),
        _ => Err(LoadError::UnsupportedFormat { extension: ext }),
    }
}

/// First worksheet of a workbook; the first row is the header
pub fn read_workbook(path: &Path) -> Result<RawTable, LoadError> {
    let workbook_err = |reason: String| LoadError::Workbook {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet { path: path.to_path_buf() })?
        .map_err(|e| workbook_err(e.to_string()))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(header_text).collect(),
        None => return Err(LoadError::EmptySheet),
    };

    Ok(RawTable {
        headers,
        rows: rows.map(|r| r.iter().map(workbook_cell).collect()).collect(),
    })
}

/// CSV with a header row.
///
/// Bytes that aren't valid UTF-8 (Latin-1 exports, say) are replaced cell by
/// cell instead of failing the whole file.
pub fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let mut lossy = 0usize;
    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| decode(h, &mut lossy).trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptySheet);
    }

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(csv_err)?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    let text = decode(field, &mut lossy);
                    if text.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(text)
                    }
                })
                .collect(),
        );
    }

    if lossy > 0 {
        tracing::warn!(path = %path.display(), cells = lossy, "cells with invalid UTF-8 were decoded lossily");
    }

    Ok(RawTable { headers, rows })
}

fn decode(field: &[u8], lossy: &mut usize) -> String {
    match std::str::from_utf8(field) {
        Ok(text) => text.to_string(),
        Err(_) => {
            *lossy += 1;
            String::from_utf8_lossy(field).into_owned()
        }
    }
}

fn header_text(cell: &Data) -> String {
    workbook_cell(cell).as_text().unwrap_or_default()
}

fn workbook_cell(cell: &Data) -> Cell {
    match cell {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Empty => Cell::Empty,
        // Booleans, dates and error cells are not valid in any column we read
        other => Cell::Text(other.to_string()),
    }
}
