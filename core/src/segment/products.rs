//! Product and category popularity, joined from orders to line items.
//!
//! RULES:
//!   - Only line items whose `order_id` matches a derived order take part, so
//!     walk-in orders without a phone are excluded like everywhere else.
//!   - A line's value is `line_total`, or `quantity * unit_value` when the
//!     total is absent. A missing quantity counts as zero.
//!   - Ranking ties keep first-appearance order (stable sort).

use super::{quantity_value, ReportRow, ReportValue, SegmentResult};
use crate::{
    records::{LineItemRecord, OrderRecord},
    types::{Phone, ReportKind},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};

// ── Row types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPopularity {
    pub product_name:  String,
    pub quantity_sold: f64,
    pub total_value:   f64,
}

impl ReportRow for ProductPopularity {
    const COLUMNS: &'static [&'static str] = &["product_name", "quantity_sold", "total_value"];

    fn values(&self) -> Vec<ReportValue> {
        vec![
            ReportValue::Text(self.product_name.clone()),
            quantity_value(self.quantity_sold),
            ReportValue::Money(self.total_value),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPreference {
    pub phone:       Phone,
    pub category:    String,
    pub quantity:    f64,
    pub total_value: f64,
}

impl ReportRow for CategoryPreference {
    const COLUMNS: &'static [&'static str] = &["phone", "category", "quantity", "total_value"];

    fn values(&self) -> Vec<ReportValue> {
        vec![
            ReportValue::Text(self.phone.clone()),
            ReportValue::Text(self.category.clone()),
            quantity_value(self.quantity),
            ReportValue::Money(self.total_value),
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPreferences {
    /// Global top-N products by quantity.
    pub popularity:           SegmentResult<ProductPopularity>,
    /// Every (customer, category) pair, ordered by phone then category.
    pub category_preferences: SegmentResult<CategoryPreference>,
    /// Each customer's leading categories by quantity, best first.
    pub top_categories:       SegmentResult<CategoryPreference>,
}

// ── Analysis ─────────────────────────────────────────────────────────────────

/// Insertion-ordered accumulator keyed by name.
#[derive(Default)]
struct Tally<'a> {
    index:   HashMap<&'a str, usize>,
    entries: Vec<(&'a str, f64, f64)>,
}

impl<'a> Tally<'a> {
    fn add(&mut self, key: &'a str, quantity: f64, value: f64) {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.entries.push((key, 0.0, 0.0));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[slot];
        entry.1 += quantity;
        entry.2 += value;
    }

    /// Stable sort by quantity, highest first.
    fn ranked(&self) -> Vec<(&'a str, f64, f64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

fn line_value(item: &LineItemRecord) -> f64 {
    item.line_total
        .or_else(|| Some(item.quantity? * item.unit_value?))
        .unwrap_or(0.0)
}

pub fn analyze_product_preferences(
    orders: &[OrderRecord],
    line_items: &[LineItemRecord],
    top_n: usize,
    top_categories: usize,
) -> ProductPreferences {
    let params = json!({ "top_products": top_n, "top_categories": top_categories });
    if orders.is_empty() || line_items.is_empty() {
        return ProductPreferences {
            popularity:           SegmentResult::unavailable(ReportKind::ProductPopularity, params.clone()),
            category_preferences: SegmentResult::unavailable(ReportKind::CategoryPreferences, params.clone()),
            top_categories:       SegmentResult::unavailable(ReportKind::TopCategories, params),
        };
    }

    let mut phone_by_order: HashMap<&str, &str> = HashMap::with_capacity(orders.len());
    for order in orders {
        if !order.order_id.is_empty() {
            phone_by_order
                .entry(order.order_id.as_str())
                .or_insert(order.phone_clean.as_str());
        }
    }

    let mut products = Tally::default();
    let mut categories: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut joined = 0usize;

    for item in line_items {
        let Some(&phone) = phone_by_order.get(item.order_id.as_str()) else { continue };
        joined += 1;
        let quantity = item.quantity.unwrap_or(0.0);
        let value = line_value(item);
        if !item.product_name.is_empty() {
            products.add(item.product_name.as_str(), quantity, value);
        }
        if !item.category.is_empty() {
            categories
                .entry(phone)
                .or_default()
                .add(item.category.as_str(), quantity, value);
        }
    }
    log::debug!(
        "segment: {joined} of {} line items matched an order",
        line_items.len()
    );

    let popularity: Vec<ProductPopularity> = products
        .ranked()
        .into_iter()
        .take(top_n)
        .map(|(name, quantity, value)| ProductPopularity {
            product_name:  name.to_string(),
            quantity_sold: quantity,
            total_value:   value,
        })
        .collect();

    let mut all_pairs = Vec::new();
    let mut leaders = Vec::new();
    for (phone, tally) in &categories {
        let row = |(category, quantity, value): (&str, f64, f64)| CategoryPreference {
            phone:       phone.to_string(),
            category:    category.to_string(),
            quantity,
            total_value: value,
        };
        let mut pairs: Vec<CategoryPreference> = tally.entries.iter().copied().map(row).collect();
        pairs.sort_by(|a, b| a.category.cmp(&b.category));
        all_pairs.extend(pairs);
        leaders.extend(tally.ranked().into_iter().take(top_categories).map(row));
    }

    log::info!(
        "segment: {} products ranked, {} customers with category preferences",
        popularity.len(),
        categories.len()
    );
    ProductPreferences {
        popularity:           SegmentResult::new(ReportKind::ProductPopularity, params.clone(), popularity),
        category_preferences: SegmentResult::new(ReportKind::CategoryPreferences, params.clone(), all_pairs),
        top_categories:       SegmentResult::new(ReportKind::TopCategories, params, leaders),
    }
}
