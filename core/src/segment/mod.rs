//! Segmentation engine.
//!
//! Every analysis is a pure function over derived tables plus explicit
//! parameters, returning a fresh `SegmentResult`. A missing or empty input
//! yields a result with `source_data_available = false` instead of an error,
//! so "no data" and "ran but found nothing" stay distinguishable.

pub mod customers;
pub mod geography;
pub mod products;

pub use customers::{
    find_high_ticket_customers, find_inactive_customers, find_new_customers, HighTicketCustomer,
    InactiveCustomer, NewCustomer,
};
pub use geography::{analyze_geography, GeographyReport, NeighborhoodStats};
pub use products::{analyze_product_preferences, CategoryPreference, ProductPopularity, ProductPreferences};

use crate::{loader::reader::DATE_FORMAT, records::CustomerRecord, types::ReportKind};
use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use std::{collections::HashMap, fmt};

// ── Result envelope ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SegmentResult<T> {
    pub kind:                  ReportKind,
    pub generated_at:          DateTime<Local>,
    pub parameters:            serde_json::Value,
    pub source_data_available: bool,
    pub rows:                  Vec<T>,
}

impl<T> SegmentResult<T> {
    pub fn new(kind: ReportKind, parameters: serde_json::Value, rows: Vec<T>) -> Self {
        log::debug!("segment: {kind} produced {} rows", rows.len());
        Self {
            kind,
            generated_at: Local::now(),
            parameters,
            source_data_available: true,
            rows,
        }
    }

    /// Explicitly empty: a required input was absent or had no usable rows.
    pub fn unavailable(kind: ReportKind, parameters: serde_json::Value) -> Self {
        log::info!("segment: {kind} skipped, source data unavailable");
        Self {
            kind,
            generated_at: Local::now(),
            parameters,
            source_data_available: false,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Tabular rendering ────────────────────────────────────────────────────────

/// A single output cell, typed so writers can format it properly.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Money(f64),
    Date(NaiveDate),
    Empty,
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Text(s) => f.write_str(s),
            ReportValue::Integer(n) => write!(f, "{n}"),
            ReportValue::Number(n) => write!(f, "{n}"),
            ReportValue::Money(n) => write!(f, "{n:.2}"),
            ReportValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            ReportValue::Empty => Ok(()),
        }
    }
}

impl From<Option<NaiveDate>> for ReportValue {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map(ReportValue::Date).unwrap_or(ReportValue::Empty)
    }
}

impl From<Option<i64>> for ReportValue {
    fn from(n: Option<i64>) -> Self {
        n.map(ReportValue::Integer).unwrap_or(ReportValue::Empty)
    }
}

/// Row types with a declared output schema. `values()` follows `COLUMNS` order.
pub trait ReportRow {
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<ReportValue>;
}

impl<T: ReportRow> SegmentResult<T> {
    pub fn columns(&self) -> &'static [&'static str] {
        T::COLUMNS
    }
}

// ── Shared helpers ───────────────────────────────────────────────────────────

/// Phone → first roster row with that phone.
fn customers_by_phone(customers: &[CustomerRecord]) -> HashMap<&str, &CustomerRecord> {
    let mut index = HashMap::with_capacity(customers.len());
    for c in customers {
        index.entry(c.phone_clean.as_str()).or_insert(c);
    }
    index
}

/// Quantities are usually whole; keep them as integers when they are.
fn quantity_value(q: f64) -> ReportValue {
    if q.fract() == 0.0 && q.abs() < 1e15 {
        ReportValue::Integer(q as i64)
    } else {
        ReportValue::Number(q)
    }
}
