//! Per-neighborhood order and revenue aggregates.

use super::{ReportRow, ReportValue, SegmentResult};
use crate::{
    records::OrderRecord,
    types::{Phone, ReportKind},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashSet},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodStats {
    pub neighborhood:       String,
    pub total_value:        f64,
    /// Mean over orders with a known total; 0 when none have one.
    pub mean_ticket:        f64,
    pub order_count:        usize,
    pub distinct_customers: usize,
}

impl ReportRow for NeighborhoodStats {
    const COLUMNS: &'static [&'static str] = &[
        "neighborhood",
        "total_value",
        "mean_ticket",
        "order_count",
        "distinct_customers",
    ];

    fn values(&self) -> Vec<ReportValue> {
        vec![
            ReportValue::Text(self.neighborhood.clone()),
            ReportValue::Money(self.total_value),
            ReportValue::Money(self.mean_ticket),
            ReportValue::Integer(self.order_count as i64),
            ReportValue::Integer(self.distinct_customers as i64),
        ]
    }
}

/// Main table (alphabetical) plus two ranked views of the same rows.
#[derive(Debug, Clone, Serialize)]
pub struct GeographyReport {
    pub table:          SegmentResult<NeighborhoodStats>,
    pub by_total_value: Vec<NeighborhoodStats>,
    pub by_order_count: Vec<NeighborhoodStats>,
}

#[derive(Default)]
struct NeighborhoodAcc<'a> {
    total:  f64,
    valued: usize,
    orders: usize,
    phones: HashSet<&'a Phone>,
}

pub fn analyze_geography(orders: &[OrderRecord]) -> GeographyReport {
    let params = json!({});
    if orders.is_empty() {
        return GeographyReport {
            table:          SegmentResult::unavailable(ReportKind::GeographicAnalysis, params),
            by_total_value: Vec::new(),
            by_order_count: Vec::new(),
        };
    }

    let mut groups: BTreeMap<&str, NeighborhoodAcc> = BTreeMap::new();
    for order in orders {
        let neighborhood = order.neighborhood_canonical.as_str();
        if neighborhood.is_empty() || order.phone_clean.is_empty() {
            continue;
        }
        let acc = groups.entry(neighborhood).or_default();
        acc.orders += 1;
        acc.phones.insert(&order.phone_clean);
        if let Some(total) = order.total_with_delivery {
            acc.total += total;
            acc.valued += 1;
        }
    }

    // BTreeMap iteration already yields neighborhoods in ascending order.
    let rows: Vec<NeighborhoodStats> = groups
        .into_iter()
        .map(|(name, acc)| NeighborhoodStats {
            neighborhood:       name.to_string(),
            total_value:        acc.total,
            mean_ticket:        if acc.valued > 0 { acc.total / acc.valued as f64 } else { 0.0 },
            order_count:        acc.orders,
            distinct_customers: acc.phones.len(),
        })
        .collect();

    let mut by_total_value = rows.clone();
    by_total_value.sort_by(|a, b| rank(b.total_value.total_cmp(&a.total_value), a, b));
    let mut by_order_count = rows.clone();
    by_order_count.sort_by(|a, b| rank(b.order_count.cmp(&a.order_count), a, b));

    log::info!("segment: {} neighborhoods with orders", rows.len());
    GeographyReport {
        table: SegmentResult::new(ReportKind::GeographicAnalysis, params, rows),
        by_total_value,
        by_order_count,
    }
}

fn rank(primary: Ordering, a: &NeighborhoodStats, b: &NeighborhoodStats) -> Ordering {
    primary.then_with(|| a.neighborhood.cmp(&b.neighborhood))
}
