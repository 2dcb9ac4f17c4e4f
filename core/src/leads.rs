//! WhatsApp lead export: roster customers as click-to-chat links, with one
//! extra file per neighborhood.
//!
//! RULES:
//!   - One lead per phone; the first roster row wins.
//!   - Only phones of 12 to 15 digits (country code included) are reachable.
//!   - Segments are keyed by canonical neighborhood. Customers without one
//!     appear only in the full list.
//!   - Files: `whatsapp_leads.xlsx`, `whatsapp_leads_<segment>.xlsx` and
//!     `whatsapp_leads_summary.json`.

use crate::{
    error::ZapResult,
    normalizer::MAX_PHONE_DIGITS,
    records::CustomerRecord,
    report::{OutputFormat, ReportWriter},
    segment::{ReportRow, ReportValue, SegmentResult},
    types::ReportKind,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    collections::{BTreeMap, HashSet},
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
};

pub const WHATSAPP_LINK_PREFIX: &str = "https://wa.me/";
/// Country code plus area code plus an 8-digit landline.
pub const WHATSAPP_MIN_DIGITS: usize = 12;
pub const LEADS_BASE_NAME: &str = "whatsapp_leads";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub name:          String,
    pub first_name:    String,
    pub phone:         String,
    pub neighborhood:  String,
    pub whatsapp_link: String,
}

impl ReportRow for Lead {
    const COLUMNS: &'static [&'static str] =
        &["name", "first_name", "phone", "neighborhood", "whatsapp_link"];

    fn values(&self) -> Vec<ReportValue> {
        vec![
            ReportValue::Text(self.name.clone()),
            ReportValue::Text(self.first_name.clone()),
            ReportValue::Text(self.phone.clone()),
            ReportValue::Text(self.neighborhood.clone()),
            ReportValue::Text(self.whatsapp_link.clone()),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadSegment {
    /// File-name-safe form of the neighborhood.
    pub key:          String,
    pub neighborhood: String,
    pub leads:        SegmentResult<Lead>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadExport {
    pub all:      SegmentResult<Lead>,
    /// Ordered by key.
    pub segments: Vec<LeadSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentShare {
    pub key:          String,
    pub neighborhood: String,
    pub leads:        usize,
    /// Share of all leads, rounded to two decimals.
    pub percent:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadSummary {
    pub total_leads: usize,
    pub segments:    Vec<SegmentShare>,
}

impl LeadExport {
    pub fn summary(&self) -> LeadSummary {
        let total = self.all.len();
        let segments = self
            .segments
            .iter()
            .map(|s| SegmentShare {
                key:          s.key.clone(),
                neighborhood: s.neighborhood.clone(),
                leads:        s.leads.len(),
                percent:      if total > 0 {
                    (s.leads.len() as f64 * 10_000.0 / total as f64).round() / 100.0
                } else {
                    0.0
                },
            })
            .collect();
        LeadSummary { total_leads: total, segments }
    }
}

// ── Building ─────────────────────────────────────────────────────────────────

/// Click-to-chat link for a cleaned phone, or None when it cannot reach WhatsApp.
pub fn whatsapp_link(phone: &str) -> Option<String> {
    let reachable = (WHATSAPP_MIN_DIGITS..=MAX_PHONE_DIGITS).contains(&phone.len())
        && phone.chars().all(|c| c.is_ascii_digit());
    reachable.then(|| format!("{WHATSAPP_LINK_PREFIX}{phone}"))
}

/// "jardim mauá ii" → "jardim_mauá_ii". Anything that is not a letter or
/// digit becomes an underscore.
pub fn segment_key(neighborhood: &str) -> String {
    neighborhood
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

pub fn build_leads(customers: &[CustomerRecord]) -> LeadExport {
    let params = json!({
        "min_digits": WHATSAPP_MIN_DIGITS,
        "max_digits": MAX_PHONE_DIGITS,
    });
    if customers.is_empty() {
        return LeadExport {
            all:      SegmentResult::unavailable(ReportKind::WhatsappLeads, params),
            segments: Vec::new(),
        };
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut all = Vec::new();
    let mut grouped: BTreeMap<String, (String, Vec<Lead>)> = BTreeMap::new();
    let mut unreachable = 0usize;

    for customer in customers {
        let phone = customer.phone_clean.as_str();
        if phone.is_empty() || !seen.insert(phone) {
            continue;
        }
        let Some(link) = whatsapp_link(phone) else {
            unreachable += 1;
            continue;
        };
        let lead = Lead {
            name:          customer.full_name.trim().to_string(),
            first_name:    customer.first_name.clone(),
            phone:         phone.to_string(),
            neighborhood:  customer.neighborhood_canonical.clone(),
            whatsapp_link: link,
        };
        let key = segment_key(&lead.neighborhood);
        if !key.is_empty() {
            grouped
                .entry(key)
                .or_insert_with(|| (lead.neighborhood.clone(), Vec::new()))
                .1
                .push(lead.clone());
        }
        all.push(lead);
    }

    log::info!(
        "leads: {} reachable, {unreachable} unreachable, {} neighborhoods",
        all.len(),
        grouped.len()
    );

    let segments = grouped
        .into_iter()
        .map(|(key, (neighborhood, leads))| LeadSegment {
            leads: SegmentResult::new(
                ReportKind::WhatsappLeads,
                json!({ "neighborhood": neighborhood }),
                leads,
            ),
            key,
            neighborhood,
        })
        .collect();

    LeadExport {
        all: SegmentResult::new(ReportKind::WhatsappLeads, params, all),
        segments,
    }
}

// ── Writing ──────────────────────────────────────────────────────────────────

/// Writes the full list, one file per segment and a JSON summary.
/// Nothing is written when the roster is unavailable.
pub fn write_leads(export: &LeadExport, writer: &ReportWriter) -> ZapResult<Vec<PathBuf>> {
    if !export.all.source_data_available {
        log::info!("leads: no customer roster, nothing written");
        return Ok(Vec::new());
    }
    let format = OutputFormat::default_for(ReportKind::WhatsappLeads);

    let mut written = vec![writer.write(&export.all, LEADS_BASE_NAME, format)?];
    for segment in &export.segments {
        let base_name = format!("{LEADS_BASE_NAME}_{}", segment.key);
        written.push(writer.write(&segment.leads, &base_name, format)?);
    }

    let path = writer
        .output_dir()
        .join(format!("{LEADS_BASE_NAME}_summary.json"));
    let mut out = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut out, &export.summary())?;
    out.flush()?;
    written.push(fs::canonicalize(&path)?);

    log::info!("leads: wrote {} files", written.len());
    Ok(written)
}
