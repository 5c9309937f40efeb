//! Tabular loader: decodes an uploaded statement into an in-memory table
//!
//! CSV uploads are decoded as UTF-8 (BOM tolerant) with a single Latin-1
//! fallback attempt; spreadsheet uploads (.xlsx/.xls) go through calamine.
//! The loader only shapes the data - cleaning happens in the normalizers
//! once column roles are fixed.

use std::borrow::Cow;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use crate::error::{Error, Result};

/// A single raw cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    /// String form of the cell. Whole numbers render without a fraction so
    /// spreadsheet serials like 45321.0 round-trip as "45321".
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }

    /// Numeric form of the cell, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

/// Inferred primitive type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Numeric,
}

/// An in-memory table: ordered column names plus rows of optional cells.
///
/// Invariant: every row has exactly `headers.len()` cells. Constructed once
/// by [`load`], read-only thereafter.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<Cell>>>,
}

impl Table {
    /// Index of a column by its original (exact) name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Non-empty cells of one column, in row order
    pub fn column_values(&self, index: usize) -> Vec<&Cell> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index).and_then(|c| c.as_ref()))
            .collect()
    }

    /// Inferred type of a column: numeric when every non-empty cell parses
    /// as a number, text otherwise (and for all-empty columns).
    pub fn column_type(&self, index: usize) -> ColumnType {
        let values = self.column_values(index);
        if !values.is_empty() && values.iter().all(|c| c.as_number().is_some()) {
            ColumnType::Numeric
        } else {
            ColumnType::Text
        }
    }
}

/// Decode an uploaded byte stream into a [`Table`], using the filename
/// extension to pick the decoder.
pub fn load(data: &[u8], filename: &str) -> Result<Table> {
    let ext = filename
        .rsplit('.')
        .next()
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" => load_csv(data)?,
        "xlsx" | "xls" => load_spreadsheet(data)?,
        _ => {
            return Err(Error::UnsupportedOrEmptyInput(
                "Unsupported file format. Use CSV or a spreadsheet (.xlsx/.xls).".to_string(),
            ))
        }
    };

    if table.headers.is_empty() || table.rows.is_empty() {
        return Err(Error::UnsupportedOrEmptyInput(
            "Uploaded file is empty or unreadable.".to_string(),
        ));
    }

    debug!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        "Loaded table from {}",
        filename
    );

    Ok(table)
}

/// Decode CSV bytes to text: UTF-8 with BOM sniffing, then a byte-preserving
/// Latin-1 pass if the bytes are not valid UTF-8. No further attempts.
fn decode_text(data: &[u8]) -> Cow<'_, str> {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(data);
    if had_errors {
        encoding_rs::mem::decode_latin1(data)
    } else {
        text
    }
}

fn load_csv(data: &[u8]) -> Result<Table> {
    let text = decode_text(data);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut row: Vec<Option<Cell>> = record
            .iter()
            .take(headers.len())
            .map(|field| {
                if field.trim().is_empty() {
                    None
                } else {
                    Some(Cell::Text(field.to_string()))
                }
            })
            .collect();
        // Short records are padded so every row matches the header width
        row.resize(headers.len(), None);
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

fn load_spreadsheet(data: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::UnsupportedOrEmptyInput("Spreadsheet has no sheets.".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name)?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = match row_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| convert_cell(cell).map(|c| c.as_text()).unwrap_or_default())
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    for sheet_row in row_iter {
        let mut row: Vec<Option<Cell>> = sheet_row
            .iter()
            .take(headers.len())
            .map(convert_cell)
            .collect();
        row.resize(headers.len(), None);
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

fn convert_cell(data: &Data) -> Option<Cell> {
    match data {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            if s.trim().is_empty() {
                None
            } else {
                Some(Cell::Text(s.clone()))
            }
        }
        Data::Float(f) => Some(Cell::Number(*f)),
        Data::Int(i) => Some(Cell::Number(*i as f64)),
        Data::Bool(b) => Some(Cell::Text(b.to_string())),
        // Spreadsheet dates stay as serial numbers; the date normalizer
        // converts uniformly-numeric date columns from serials.
        Data::DateTime(dt) => Some(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Cell::Text(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_csv_basic() {
        let data = b"Date,Amount,Description\n2024-01-15,50.00,Uber ride\n2024-01-16,-1500.00,Salary\n";
        let table = load(data, "statement.csv").unwrap();
        assert_eq!(table.headers, vec!["Date", "Amount", "Description"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0][2],
            Some(Cell::Text("Uber ride".to_string()))
        );
    }

    #[test]
    fn test_load_csv_bom() {
        let data = b"\xef\xbb\xbfDate,Amount\n2024-01-15,50.00\n";
        let table = load(data, "export.csv").unwrap();
        assert_eq!(table.headers[0], "Date");
    }

    #[test]
    fn test_load_csv_latin1_fallback() {
        // 0xE9 is é in Latin-1 but invalid standalone UTF-8
        let data = b"Date,Amount,Description\n2024-01-15,50.00,Caf\xe9 du Parc\n";
        let table = load(data, "export.csv").unwrap();
        assert_eq!(
            table.rows[0][2],
            Some(Cell::Text("Café du Parc".to_string()))
        );
    }

    #[test]
    fn test_load_csv_short_rows_padded() {
        let data = b"Date,Amount,Description\n2024-01-15,50.00\n";
        let table = load(data, "export.csv").unwrap();
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.rows[0][2], None);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load(b"hello", "notes.txt");
        assert!(matches!(result, Err(Error::UnsupportedOrEmptyInput(_))));
    }

    #[test]
    fn test_empty_csv() {
        let result = load(b"Date,Amount,Description\n", "empty.csv");
        assert!(matches!(result, Err(Error::UnsupportedOrEmptyInput(_))));
    }

    #[test]
    fn test_column_type_inference() {
        let data = b"Date,Amount,Description\n2024-01-15,50.00,Uber\n2024-01-16,12.50,Lunch\n";
        let table = load(data, "export.csv").unwrap();
        assert_eq!(table.column_type(0), ColumnType::Text);
        assert_eq!(table.column_type(1), ColumnType::Numeric);
        assert_eq!(table.column_type(2), ColumnType::Text);
    }

    #[test]
    fn test_cell_as_text_whole_number() {
        assert_eq!(Cell::Number(45321.0).as_text(), "45321");
        assert_eq!(Cell::Number(12.5).as_text(), "12.5");
    }
}
