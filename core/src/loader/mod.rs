//! Dataset loader: discover the four input roles and bind them to typed rows.
//!
//! RULES:
//!   - A role with no matching file is absent, not an error.
//!   - A file that cannot be parsed fails its own role only.
//!   - A cell that fails coercion becomes None and is recorded as a
//!     `RowCoercionWarning`; the row is kept.

pub mod reader;

use crate::{
    config::{ColumnAliases, EngineConfig},
    error::{ZapError, ZapResult},
    records::{LineItemRecord, RawContact, RawCustomer, RawOrder},
    types::DatasetRole,
};
use chrono::NaiveDate;
use glob::{MatchOptions, Pattern};
use reader::{Cell, Coerced, RawTable};
use serde::Serialize;
use std::path::Path;

// ── Public types ─────────────────────────────────────────────────────────────

/// One file handed to the loader, from disk or from an upload buffer.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name:  String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }
}

/// A single row-level conversion problem. Never raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowCoercionWarning {
    pub role:  DatasetRole,
    /// 1-based data row (the header is row 0).
    pub row:   usize,
    pub field: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Dataset<T> {
    pub role:           DatasetRole,
    pub source:         String,
    pub records:        Vec<T>,
    /// Logical fields none of whose header aliases were present.
    pub missing_fields: Vec<&'static str>,
    pub warnings:       Vec<RowCoercionWarning>,
}

impl<T> Dataset<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_missing(&self, field: &str) -> bool {
        self.missing_fields.iter().any(|f| *f == field)
    }
}

#[derive(Debug)]
pub struct RoleFailure {
    pub role:  DatasetRole,
    pub error: ZapError,
}

/// Everything one load produced. Roles may be absent or failed independently.
#[derive(Debug, Default)]
pub struct LoadedDatasets {
    pub contacts:   Option<Dataset<RawContact>>,
    pub customers:  Option<Dataset<RawCustomer>>,
    pub orders:     Option<Dataset<RawOrder>>,
    pub line_items: Option<Dataset<LineItemRecord>>,
    pub failures:   Vec<RoleFailure>,
}

impl LoadedDatasets {
    pub fn has(&self, role: DatasetRole) -> bool {
        match role {
            DatasetRole::Contacts  => self.contacts.is_some(),
            DatasetRole::Customers => self.customers.is_some(),
            DatasetRole::Orders    => self.orders.is_some(),
            DatasetRole::LineItems => self.line_items.is_some(),
        }
    }

    pub fn failure(&self, role: DatasetRole) -> Option<&ZapError> {
        self.failures.iter().find(|f| f.role == role).map(|f| &f.error)
    }

    /// Roles for which no file was found at all.
    pub fn missing_roles(&self) -> Vec<DatasetRole> {
        DatasetRole::ALL
            .into_iter()
            .filter(|r| !self.has(*r) && self.failure(*r).is_none())
            .collect()
    }

    /// `InputNotFound` for a role that was never located.
    pub fn require(&self, role: DatasetRole) -> ZapResult<()> {
        if self.has(role) {
            Ok(())
        } else {
            Err(ZapError::InputNotFound { role })
        }
    }

    pub fn warning_count(&self) -> usize {
        self.contacts.as_ref().map_or(0, |d| d.warnings.len())
            + self.customers.as_ref().map_or(0, |d| d.warnings.len())
            + self.orders.as_ref().map_or(0, |d| d.warnings.len())
            + self.line_items.as_ref().map_or(0, |d| d.warnings.len())
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

pub struct DatasetLoader<'a> {
    config: &'a EngineConfig,
}

impl<'a> DatasetLoader<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Load from a directory. Only an unreadable directory is an error.
    pub fn load(&self, input_dir: &Path) -> ZapResult<LoadedDatasets> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(input_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        let mut loaded = LoadedDatasets::default();
        for (role, name) in self.discover(&names) {
            match std::fs::read(input_dir.join(&name)) {
                Ok(bytes) => self.load_role(&mut loaded, role, &InputFile::new(name, bytes)),
                Err(e) => {
                    log::warn!("loader: cannot read {role} file '{name}': {e}");
                    loaded.failures.push(RoleFailure {
                        role,
                        error: ZapError::Parse { role, file: name, reason: e.to_string() },
                    });
                }
            }
        }
        self.log_missing(&loaded);
        Ok(loaded)
    }

    /// Load from in-memory buffers (uploads).
    pub fn load_files(&self, files: &[InputFile]) -> LoadedDatasets {
        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        let mut loaded = LoadedDatasets::default();
        for (role, name) in self.discover(&names) {
            if let Some(file) = files.iter().find(|f| f.name == name) {
                self.load_role(&mut loaded, role, file);
            }
        }
        self.log_missing(&loaded);
        loaded
    }

    /// Pick one file per role. Names are tried in sorted order; the first match wins.
    pub fn discover(&self, names: &[String]) -> Vec<(DatasetRole, String)> {
        let options = MatchOptions {
            case_sensitive:              false,
            require_literal_separator:   false,
            require_literal_leading_dot: false,
        };
        let mut sorted: Vec<&String> = names.iter().collect();
        sorted.sort();

        let mut found = Vec::new();
        for role in DatasetRole::ALL {
            let patterns: Vec<Pattern> = self
                .config
                .sources
                .for_role(role)
                .iter()
                .filter_map(|p| match Pattern::new(p) {
                    Ok(pattern) => Some(pattern),
                    Err(e) => {
                        log::warn!("loader: ignoring bad {role} pattern '{p}': {e}");
                        None
                    }
                })
                .collect();

            // Earlier patterns are more specific; try them first.
            let matched = patterns.iter().find_map(|pattern| {
                sorted
                    .iter()
                    .find(|name| pattern.matches_with(name, options))
                    .map(|name| name.to_string())
            });

            if let Some(name) = matched {
                log::debug!("loader: {role} ← {name}");
                found.push((role, name));
            }
        }
        found
    }

    fn load_role(&self, loaded: &mut LoadedDatasets, role: DatasetRole, file: &InputFile) {
        let table = match reader::read_table(&file.name, &file.bytes) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("loader: {role} file '{}' failed to parse: {e:#}", file.name);
                loaded.failures.push(RoleFailure {
                    role,
                    error: ZapError::Parse {
                        role,
                        file: file.name.clone(),
                        reason: format!("{e:#}"),
                    },
                });
                return;
            }
        };

        let columns = &self.config.columns;
        match role {
            DatasetRole::Contacts  => loaded.contacts   = Some(bind_contacts(&file.name, &table, columns)),
            DatasetRole::Customers => loaded.customers  = Some(bind_customers(&file.name, &table, columns)),
            DatasetRole::Orders    => loaded.orders     = Some(bind_orders(&file.name, &table, columns)),
            DatasetRole::LineItems => loaded.line_items = Some(bind_line_items(&file.name, &table, columns)),
        }
    }

    fn log_missing(&self, loaded: &LoadedDatasets) {
        for role in loaded.missing_roles() {
            log::warn!("loader: no {role} file found; reports needing it will be empty");
        }
    }
}

// ── Column binding ───────────────────────────────────────────────────────────

/// Resolves logical fields to header positions and coerces cells,
/// collecting what was missing or malformed along the way.
struct Binder<'t> {
    role:           DatasetRole,
    table:          &'t RawTable,
    missing_fields: Vec<&'static str>,
    warnings:       Vec<RowCoercionWarning>,
}

impl<'t> Binder<'t> {
    fn new(role: DatasetRole, table: &'t RawTable) -> Self {
        Self { role, table, missing_fields: Vec::new(), warnings: Vec::new() }
    }

    /// First alias present wins; exact match is tried before a case-insensitive one.
    fn column(&mut self, field: &'static str, aliases: &[String]) -> Option<usize> {
        let headers = &self.table.headers;
        let found = aliases
            .iter()
            .find_map(|alias| headers.iter().position(|h| h.trim() == alias.trim()))
            .or_else(|| {
                aliases.iter().find_map(|alias| {
                    headers
                        .iter()
                        .position(|h| h.trim().eq_ignore_ascii_case(alias.trim()))
                })
            });
        if found.is_none() {
            self.flag_missing(field);
        }
        found
    }

    /// Phone headers vary the most; fall back to a keyword scan.
    fn phone_column(&mut self, aliases: &[String], columns: &ColumnAliases) -> Option<usize> {
        let headers = &self.table.headers;
        let by_alias = aliases
            .iter()
            .find_map(|alias| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(alias.trim())));
        let found = by_alias.or_else(|| {
            headers.iter().position(|h| {
                let h = h.to_lowercase();
                columns.phone_keywords.0.iter().any(|k| h.contains(&k.to_lowercase()))
            })
        });
        if found.is_none() {
            self.flag_missing("phone");
        }
        found
    }

    fn flag_missing(&mut self, field: &'static str) {
        log::warn!(
            "loader: {} has no '{field}' column (headers: {:?})",
            self.role, self.table.headers
        );
        self.missing_fields.push(field);
    }

    fn text(&self, row: &[Cell], col: Option<usize>) -> String {
        col.and_then(|c| row.get(c)).map(Cell::to_text).unwrap_or_default()
    }

    fn number(&mut self, idx: usize, row: &[Cell], col: Option<usize>, field: &'static str) -> Option<f64> {
        let cell = col.and_then(|c| row.get(c))?;
        match cell.to_number() {
            Coerced::Invalid => {
                self.warn(idx, field, cell);
                None
            }
            other => other.value(),
        }
    }

    fn date(&mut self, idx: usize, row: &[Cell], col: Option<usize>, field: &'static str) -> Option<NaiveDate> {
        let cell = col.and_then(|c| row.get(c))?;
        match cell.to_date() {
            Coerced::Invalid => {
                self.warn(idx, field, cell);
                None
            }
            other => other.value(),
        }
    }

    fn warn(&mut self, idx: usize, field: &'static str, cell: &Cell) {
        let value = cell.to_text();
        log::debug!("loader: {} row {} field {field}: cannot coerce '{value}'", self.role, idx + 1);
        self.warnings.push(RowCoercionWarning {
            role: self.role,
            row: idx + 1,
            field,
            value,
        });
    }

    fn finish<T>(self, source: &str, records: Vec<T>) -> Dataset<T> {
        if !self.warnings.is_empty() {
            log::warn!(
                "loader: {} '{source}': {} cells could not be coerced and were left empty",
                self.role,
                self.warnings.len()
            );
        }
        log::info!("loader: {} '{source}' ({} rows)", self.role, records.len());
        Dataset {
            role:           self.role,
            source:         source.to_string(),
            records,
            missing_fields: self.missing_fields,
            warnings:       self.warnings,
        }
    }
}

fn bind_contacts(source: &str, table: &RawTable, columns: &ColumnAliases) -> Dataset<RawContact> {
    let aliases = &columns.contacts;
    let mut b = Binder::new(DatasetRole::Contacts, table);
    let name = b.column("name", &aliases.name);
    let phone = b.phone_column(&aliases.phone, columns);

    let records = table
        .rows
        .iter()
        .map(|row| RawContact {
            name:      b.text(row, name),
            phone_raw: b.text(row, phone),
        })
        .collect();
    b.finish(source, records)
}

fn bind_customers(source: &str, table: &RawTable, columns: &ColumnAliases) -> Dataset<RawCustomer> {
    let aliases = &columns.customers;
    let mut b = Binder::new(DatasetRole::Customers, table);
    let name = b.column("name", &aliases.name);
    let phone = b.phone_column(&aliases.phone, columns);
    let neighborhood = b.column("neighborhood", &aliases.neighborhood);
    let order_count = b.column("order_count", &aliases.order_count);

    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let count = b.number(idx, row, order_count, "order_count");
        records.push(RawCustomer {
            full_name:        b.text(row, name),
            phone_raw:        b.text(row, phone),
            neighborhood_raw: b.text(row, neighborhood),
            order_count:      count.map(|n| n.round() as i64),
        });
    }
    b.finish(source, records)
}

fn bind_orders(source: &str, table: &RawTable, columns: &ColumnAliases) -> Dataset<RawOrder> {
    let aliases = &columns.orders;
    let mut b = Binder::new(DatasetRole::Orders, table);
    let order_id = b.column("order_id", &aliases.order_id);
    let phone = b.phone_column(&aliases.phone, columns);
    let neighborhood = b.column("neighborhood", &aliases.neighborhood);
    let closed_at = b.column("closed_at", &aliases.closed_at);
    let subtotal = b.column("subtotal", &aliases.subtotal);
    let delivery_fee = b.column("delivery_fee", &aliases.delivery_fee);
    let origin = b.column("origin_channel", &aliases.origin_channel);

    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let closed = b.date(idx, row, closed_at, "closed_at");
        let sub = b.number(idx, row, subtotal, "subtotal");
        let fee = b.number(idx, row, delivery_fee, "delivery_fee");
        records.push(RawOrder {
            order_id:         b.text(row, order_id),
            phone_raw:        b.text(row, phone),
            neighborhood_raw: b.text(row, neighborhood),
            closed_at:        closed,
            subtotal:         sub,
            delivery_fee:     fee,
            origin_channel:   b.text(row, origin),
        });
    }
    b.finish(source, records)
}

fn bind_line_items(source: &str, table: &RawTable, columns: &ColumnAliases) -> Dataset<LineItemRecord> {
    let aliases = &columns.line_items;
    let mut b = Binder::new(DatasetRole::LineItems, table);
    let order_id = b.column("order_id", &aliases.order_id);
    let product = b.column("product_name", &aliases.product_name);
    let category = b.column("category", &aliases.category);
    let quantity = b.column("quantity", &aliases.quantity);
    let unit_value = b.column("unit_value", &aliases.unit_value);
    let line_total = b.column("line_total", &aliases.line_total);
    let closed_at = b.column("closed_at", &aliases.closed_at);

    let mut records = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let qty = b.number(idx, row, quantity, "quantity");
        let unit = b.number(idx, row, unit_value, "unit_value");
        let total = b.number(idx, row, line_total, "line_total");
        let closed = b.date(idx, row, closed_at, "closed_at");
        records.push(LineItemRecord {
            order_id:     b.text(row, order_id),
            product_name: b.text(row, product),
            category:     b.text(row, category),
            quantity:     qty,
            unit_value:   unit,
            line_total:   total,
            closed_at:    closed,
        });
    }
    b.finish(source, records)
}
