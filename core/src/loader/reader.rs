//! File bytes → header row + cell grid.
//!
//! CSV is decoded as UTF-8, falling back to Windows-1252 (the Latin-1 family
//! most POS exports use). Spreadsheets are read from their first worksheet.

use anyhow::{anyhow, Context};
use calamine::{Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::Cursor;

/// Date format used by every export this engine reads.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// Outcome of coercing one cell to a typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Missing,
    Value(T),
    Invalid,
}

impl<T> Coerced<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Coerced::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(t) => t.trim().is_empty(),
            _ => false,
        }
    }

    /// Render as text. Whole numbers lose their ".0" so ids and phones read back intact.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(t) => t.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.date().format(DATE_FORMAT).to_string(),
        }
    }

    pub fn to_number(&self) -> Coerced<f64> {
        match self {
            _ if self.is_blank() => Coerced::Missing,
            Cell::Number(n) if n.is_finite() => Coerced::Value(*n),
            Cell::Text(t) => match parse_decimal(t) {
                Some(n) => Coerced::Value(n),
                None => Coerced::Invalid,
            },
            _ => Coerced::Invalid,
        }
    }

    pub fn to_date(&self) -> Coerced<NaiveDate> {
        match self {
            _ if self.is_blank() => Coerced::Missing,
            Cell::DateTime(dt) => Coerced::Value(dt.date()),
            Cell::Text(t) => match parse_date(t) {
                Some(d) => Coerced::Value(d),
                None => Coerced::Invalid,
            },
            _ => Coerced::Invalid,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows:    Vec<Vec<Cell>>,
}

// ── Entry point ──────────────────────────────────────────────────────────────

/// Parse a file by extension. Fully blank rows are dropped; every other row is kept.
pub fn read_table(file_name: &str, bytes: &[u8]) -> anyhow::Result<RawTable> {
    let lower = file_name.to_lowercase();
    let extension = lower.rsplit('.').next().unwrap_or_default();

    let mut table = match extension {
        "csv" | "txt" => read_csv(bytes)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(bytes)?,
        other => return Err(anyhow!("unsupported file extension '.{other}'")),
    };

    table.rows.retain(|row| !row.iter().all(Cell::is_blank));
    for row in &mut table.rows {
        row.resize(table.headers.len().max(row.len()), Cell::Empty);
    }
    Ok(table)
}

// ── CSV ──────────────────────────────────────────────────────────────────────

fn read_csv(bytes: &[u8]) -> anyhow::Result<RawTable> {
    let text = decode_text(bytes);
    if text.trim().is_empty() {
        return Err(anyhow!("file is empty"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(sniff_delimiter(&text))
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("cannot read CSV header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at line {}", line_num + 2))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

/// UTF-8 first (BOM stripped), Windows-1252 otherwise.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            log::debug!("loader: input is not UTF-8, decoded as windows-1252");
            text.into_owned()
        }
    }
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let count = |c: char| header.matches(c).count();
    let candidates = [(b',', count(',')), (b';', count(';')), (b'\t', count('\t'))];
    candidates
        .iter()
        .max_by_key(|(_, n)| *n)
        .filter(|(_, n)| *n > 0)
        .map(|(d, _)| *d)
        .unwrap_or(b',')
}

// ── Spreadsheets ─────────────────────────────────────────────────────────────

fn read_spreadsheet(bytes: &[u8]) -> anyhow::Result<RawTable> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| anyhow!("cannot open workbook: {e}"))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no worksheets"))?
        .map_err(|e| anyhow!("cannot read first worksheet: {e}"))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or_else(|| anyhow!("first worksheet is empty"))?
        .iter()
        .map(|c| cell_from_data(c).to_text())
        .collect();

    let rows = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) => Cell::DateTime(dt),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ── Scalar parsing ───────────────────────────────────────────────────────────

/// Day/month/year date; a trailing time component is ignored.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let token = text.split_whitespace().next()?;
    NaiveDate::parse_from_str(token, DATE_FORMAT).ok()
}

/// Decimal in either "1.234,56" (pt-BR) or "1,234.56" form, currency prefix allowed.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let normalized = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
