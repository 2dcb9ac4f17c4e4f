//! Report writer: one `SegmentResult` → one CSV or spreadsheet file.
//!
//! RULES:
//!   - Column order is the row type's declared schema (`ReportRow::COLUMNS`).
//!   - An existing file with the same name is overwritten.
//!   - Money is written with two decimals, dates as dd/mm/yyyy.
//!   - The returned path is absolute.

use crate::{
    error::{ZapError, ZapResult},
    segment::{ReportRow, ReportValue, SegmentResult},
    types::ReportKind,
};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

const SPREADSHEET_DATE_FORMAT: &str = "dd/mm/yyyy";
const SPREADSHEET_MONEY_FORMAT: &str = "0.00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Csv,
    Spreadsheet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Spreadsheet => "xlsx",
        }
    }

    /// New customers go to CSV (contact-book import); everything else to a spreadsheet.
    pub fn default_for(kind: ReportKind) -> Self {
        match kind {
            ReportKind::NewCustomers => OutputFormat::Csv,
            _ => OutputFormat::Spreadsheet,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn write<T: ReportRow>(
        &self,
        result: &SegmentResult<T>,
        base_name: &str,
        format: OutputFormat,
    ) -> ZapResult<PathBuf> {
        write(result, &self.output_dir, base_name, format)
    }

    /// Writes under the kind's own name in its default format.
    pub fn write_default<T: ReportRow>(&self, result: &SegmentResult<T>) -> ZapResult<PathBuf> {
        self.write(result, result.kind.as_str(), OutputFormat::default_for(result.kind))
    }
}

pub fn write<T: ReportRow>(
    result: &SegmentResult<T>,
    output_dir: &Path,
    base_name: &str,
    format: OutputFormat,
) -> ZapResult<PathBuf> {
    validate_base_name(base_name)?;
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{base_name}.{}", format.extension()));

    match format {
        OutputFormat::Csv => write_csv(result, &path)?,
        OutputFormat::Spreadsheet => write_spreadsheet(result, &path)?,
    }

    let path = fs::canonicalize(&path)?;
    log::info!(
        "report: wrote {} ({} rows) to {}",
        result.kind,
        result.len(),
        path.display()
    );
    Ok(path)
}

fn validate_base_name(base_name: &str) -> ZapResult<()> {
    let reason = if base_name.trim().is_empty() {
        "must not be empty"
    } else if base_name.contains(['/', '\\']) || base_name == "." || base_name == ".." {
        "must be a plain file name"
    } else {
        return Ok(());
    };
    Err(ZapError::InvalidParameter {
        name: "base_name",
        value: base_name.to_string(),
        reason,
    })
}

// ── CSV ──────────────────────────────────────────────────────────────────────

fn write_csv<T: ReportRow>(result: &SegmentResult<T>, path: &Path) -> ZapResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(result.columns())?;
    for row in &result.rows {
        writer.write_record(row.values().iter().map(ReportValue::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

// ── Spreadsheet ──────────────────────────────────────────────────────────────

fn write_spreadsheet<T: ReportRow>(result: &SegmentResult<T>, path: &Path) -> ZapResult<()> {
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format(SPREADSHEET_DATE_FORMAT);
    let money = Format::new().set_num_format(SPREADSHEET_MONEY_FORMAT);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(result.kind.as_str())?;

    for (col, name) in result.columns().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (i, row) in result.rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, value) in row.values().iter().enumerate() {
            let c = col as u16;
            match value {
                ReportValue::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                ReportValue::Integer(n) => {
                    sheet.write_number(r, c, *n as f64)?;
                }
                ReportValue::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                ReportValue::Money(n) => {
                    sheet.write_number_with_format(r, c, *n, &money)?;
                }
                ReportValue::Date(d) => {
                    sheet.write_datetime_with_format(r, c, d, &date)?;
                }
                ReportValue::Empty => {}
            }
        }
    }

    sheet.autofit();
    workbook.save(path)?;
    Ok(())
}
