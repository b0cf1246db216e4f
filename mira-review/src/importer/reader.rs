//! Spreadsheet readers: first worksheet of an Excel workbook, or a CSV body

use super::ImportError;
use calamine::{open_workbook_from_rs, Data, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;

/// Uploaded spreadsheet format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SpreadsheetFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(SpreadsheetFormat::Xlsx),
            "xls" => Some(SpreadsheetFormat::Xls),
            "csv" => Some(SpreadsheetFormat::Csv),
            _ => None,
        }
    }
}

/// Header row plus data rows, all as text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read an uploaded spreadsheet into a table
pub fn read_table(format: SpreadsheetFormat, bytes: Vec<u8>) -> Result<SheetTable, ImportError> {
    let mut table = match format {
        SpreadsheetFormat::Xlsx => read_workbook::<Xlsx<_>>(bytes)?,
        SpreadsheetFormat::Xls => read_workbook::<Xls<_>>(bytes)?,
        SpreadsheetFormat::Csv => read_csv(&bytes)?,
    };

    if table.headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::EmptySheet);
    }

    // Pad short rows so column lookups never fall off the end
    let width = table.headers.len();
    for row in &mut table.rows {
        if row.len() < width {
            row.resize(width, String::new());
        }
    }

    Ok(table)
}

fn read_workbook<R>(bytes: Vec<u8>) -> Result<SheetTable, ImportError>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: std::fmt::Display,
{
    let mut workbook: R = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Unreadable(format!("Failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptySheet)?
        .map_err(|e| ImportError::Unreadable(format!("Failed to read worksheet: {}", e)))?;

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().ok_or(ImportError::EmptySheet)?;

    Ok(SheetTable {
        headers,
        rows: rows.collect(),
    })
}

/// Render a cell as the text a user would see in the sheet
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Whole floats print without a fractional part ("31", not "31.0")
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn read_csv(bytes: &[u8]) -> Result<SheetTable, ImportError> {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Unreadable(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Unreadable(format!("Failed to read CSV row: {}", e)))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(SheetTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(31.0), "31");
        assert_eq!(format_float(4.5), "4.5");
        assert_eq!(format_float(-2.0), "-2");
    }

    #[test]
    fn test_csv_with_bom_and_short_rows() {
        let body = "\u{feff}session_id,user_id,age\nS1,U1\n".as_bytes().to_vec();
        let table = read_table(SpreadsheetFormat::Csv, body).unwrap();
        assert_eq!(table.headers, vec!["session_id", "user_id", "age"]);
        assert_eq!(table.rows, vec![vec!["S1".to_string(), "U1".to_string(), String::new()]]);
    }

    #[test]
    fn test_csv_multiline_cells() {
        let body = b"session_id,chat\nS1,\"User: hi\nAstro: hello\"\n".to_vec();
        let table = read_table(SpreadsheetFormat::Csv, body).unwrap();
        assert_eq!(table.rows[0][1], "User: hi\nAstro: hello");
    }

    #[test]
    fn test_empty_csv_rejected() {
        let result = read_table(SpreadsheetFormat::Csv, Vec::new());
        assert!(matches!(result, Err(ImportError::EmptySheet)));
    }

    #[test]
    fn test_garbage_workbook_rejected() {
        let result = read_table(SpreadsheetFormat::Xlsx, b"not a zip archive".to_vec());
        assert!(matches!(result, Err(ImportError::Unreadable(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SpreadsheetFormat::from_extension("XLSX"), Some(SpreadsheetFormat::Xlsx));
        assert_eq!(SpreadsheetFormat::from_extension("ods"), None);
    }
}
