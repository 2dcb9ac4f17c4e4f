//! Customer-keyed segments: new, inactive and high-ticket customers.

use super::{customers_by_phone, ReportRow, ReportValue, SegmentResult};
use crate::{
    config::{validate_inactivity_days, validate_min_average_ticket},
    error::ZapResult,
    normalizer::{is_placeholder_name, CAMPAIGN_TAG},
    records::{ContactRecord, CustomerRecord, OrderRecord},
    types::{Phone, ReportKind},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};

/// Upper bound on the inactivity window; keeps date arithmetic in range.
const MAX_INACTIVITY_DAYS: i64 = 3_650_000;

// ── Row types ────────────────────────────────────────────────────────────────

/// Ready to import into the contacts book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub display_name: String,
    pub phone:        Phone,
}

impl ReportRow for NewCustomer {
    const COLUMNS: &'static [&'static str] = &["display_name", "phone"];

    fn values(&self) -> Vec<ReportValue> {
        vec![
            ReportValue::Text(self.display_name.clone()),
            ReportValue::Text(self.phone.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InactiveCustomer {
    pub phone:           Phone,
    pub first_name:      String,
    pub neighborhood:    String,
    /// Order count as reported by the customer roster.
    pub order_count:     Option<i64>,
    pub last_order_date: NaiveDate,
    pub days_inactive:   i64,
}

impl ReportRow for InactiveCustomer {
    const COLUMNS: &'static [&'static str] = &[
        "phone",
        "first_name",
        "neighborhood",
        "order_count",
        "last_order_date",
        "days_inactive",
    ];

    fn values(&self) -> Vec<ReportValue> {
        vec![
            ReportValue::Text(self.phone.clone()),
            ReportValue::Text(self.first_name.clone()),
            ReportValue::Text(self.neighborhood.clone()),
            self.order_count.into(),
            ReportValue::Date(self.last_order_date),
            ReportValue::Integer(self.days_inactive),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighTicketCustomer {
    pub phone:           Phone,
    pub first_name:      String,
    pub neighborhood:    String,
    pub mean_ticket:     f64,
    pub total_value:     f64,
    pub order_count:     usize,
    pub last_order_date: Option<NaiveDate>,
}

impl ReportRow for HighTicketCustomer {
    const COLUMNS: &'static [&'static str] = &[
        "phone",
        "first_name",
        "neighborhood",
        "mean_ticket",
        "total_value",
        "order_count",
        "last_order_date",
    ];

    fn values(&self) -> Vec<ReportValue> {
        vec![
            ReportValue::Text(self.phone.clone()),
            ReportValue::Text(self.first_name.clone()),
            ReportValue::Text(self.neighborhood.clone()),
            ReportValue::Money(self.mean_ticket),
            ReportValue::Money(self.total_value),
            ReportValue::Integer(self.order_count as i64),
            self.last_order_date.into(),
        ]
    }
}

// ── New customers ────────────────────────────────────────────────────────────

/// Roster customers whose phone is not in the contacts book.
///
/// Customers without a usable first name are left out, since the display
/// name is built from it. Input order is preserved; a phone appears once.
pub fn find_new_customers(
    contacts: &[ContactRecord],
    customers: &[CustomerRecord],
) -> SegmentResult<NewCustomer> {
    let params = json!({ "campaign_tag": CAMPAIGN_TAG });
    if contacts.is_empty() || customers.is_empty() {
        return SegmentResult::unavailable(ReportKind::NewCustomers, params);
    }

    let known: HashSet<&str> = contacts.iter().map(|c| c.phone_clean.as_str()).collect();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut rows = Vec::new();

    for customer in customers {
        let phone = customer.phone_clean.as_str();
        if phone.is_empty() || known.contains(phone) || emitted.contains(phone) {
            continue;
        }
        if is_placeholder_name(&customer.first_name) {
            continue;
        }
        emitted.insert(phone);
        rows.push(NewCustomer {
            display_name: format!("{CAMPAIGN_TAG} {}", customer.first_name),
            phone:        customer.phone_clean.clone(),
        });
    }

    log::info!(
        "segment: {} new customers out of {} roster rows",
        rows.len(),
        customers.len()
    );
    SegmentResult::new(ReportKind::NewCustomers, params, rows)
}

// ── Inactive customers ───────────────────────────────────────────────────────

/// Customers whose most recent order closed before `as_of - inactivity_days`.
///
/// Orders without a close date are ignored. Rows are ordered from the longest
/// inactivity down, ties by phone.
pub fn find_inactive_customers(
    orders: &[OrderRecord],
    customers: &[CustomerRecord],
    inactivity_days: i64,
    as_of: NaiveDate,
) -> ZapResult<SegmentResult<InactiveCustomer>> {
    validate_inactivity_days(inactivity_days)?;
    let params = json!({
        "inactivity_days": inactivity_days,
        "as_of": as_of,
    });
    if orders.is_empty() {
        return Ok(SegmentResult::unavailable(ReportKind::InactiveCustomers, params));
    }

    let mut last_order: BTreeMap<&str, NaiveDate> = BTreeMap::new();
    for order in orders {
        let Some(closed) = order.closed_at else { continue };
        if order.phone_clean.is_empty() {
            continue;
        }
        last_order
            .entry(order.phone_clean.as_str())
            .and_modify(|d| *d = (*d).max(closed))
            .or_insert(closed);
    }

    let window = Duration::days(inactivity_days.min(MAX_INACTIVITY_DAYS));
    let cutoff = as_of.checked_sub_signed(window).unwrap_or(NaiveDate::MIN);
    let roster = customers_by_phone(customers);

    let mut rows: Vec<InactiveCustomer> = last_order
        .into_iter()
        .filter(|(_, last)| *last < cutoff)
        .map(|(phone, last)| {
            let customer = roster.get(phone);
            InactiveCustomer {
                phone:           phone.to_string(),
                first_name:      customer.map(|c| c.first_name.clone()).unwrap_or_default(),
                neighborhood:    customer.map(|c| c.neighborhood_canonical.clone()).unwrap_or_default(),
                order_count:     customer.and_then(|c| c.order_count),
                last_order_date: last,
                days_inactive:   as_of.signed_duration_since(last).num_days(),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.days_inactive
            .cmp(&a.days_inactive)
            .then_with(|| a.phone.cmp(&b.phone))
    });

    log::info!(
        "segment: {} customers inactive for more than {inactivity_days} days",
        rows.len()
    );
    Ok(SegmentResult::new(ReportKind::InactiveCustomers, params, rows))
}

// ── High-ticket customers ────────────────────────────────────────────────────

#[derive(Default)]
struct TicketAcc {
    sum:   f64,
    count: usize,
    last:  Option<NaiveDate>,
}

/// Customers whose mean order value (delivery included) is at least `min_average_ticket`.
///
/// Orders with an unknown total are not counted. Rows are ordered by mean
/// ticket, highest first, ties by phone.
pub fn find_high_ticket_customers(
    orders: &[OrderRecord],
    customers: &[CustomerRecord],
    min_average_ticket: f64,
) -> ZapResult<SegmentResult<HighTicketCustomer>> {
    validate_min_average_ticket(min_average_ticket)?;
    let params = json!({ "min_average_ticket": min_average_ticket });
    if orders.is_empty() {
        return Ok(SegmentResult::unavailable(ReportKind::HighTicketCustomers, params));
    }

    let mut per_phone: BTreeMap<&str, TicketAcc> = BTreeMap::new();
    for order in orders {
        let Some(total) = order.total_with_delivery else { continue };
        if order.phone_clean.is_empty() {
            continue;
        }
        let acc = per_phone.entry(order.phone_clean.as_str()).or_default();
        acc.sum += total;
        acc.count += 1;
        acc.last = acc.last.max(order.closed_at);
    }

    let roster = customers_by_phone(customers);
    let mut rows: Vec<HighTicketCustomer> = per_phone
        .into_iter()
        .filter_map(|(phone, acc)| {
            let mean = acc.sum / acc.count as f64;
            if mean < min_average_ticket {
                return None;
            }
            let customer = roster.get(phone);
            Some(HighTicketCustomer {
                phone:           phone.to_string(),
                first_name:      customer.map(|c| c.first_name.clone()).unwrap_or_default(),
                neighborhood:    customer.map(|c| c.neighborhood_canonical.clone()).unwrap_or_default(),
                mean_ticket:     mean,
                total_value:     acc.sum,
                order_count:     acc.count,
                last_order_date: acc.last,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.mean_ticket
            .total_cmp(&a.mean_ticket)
            .then_with(|| a.phone.cmp(&b.phone))
    });

    log::info!(
        "segment: {} customers with mean ticket >= {min_average_ticket:.2}",
        rows.len()
    );
    Ok(SegmentResult::new(ReportKind::HighTicketCustomers, params, rows))
}
