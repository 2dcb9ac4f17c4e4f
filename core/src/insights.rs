//! Executive summary and rule-based marketing suggestions.
//!
//! Both are deterministic functions of the segment results; nothing here
//! is predicted or learned.

use crate::{
    config::AnalysisParams,
    derive::PreparedData,
    error::ZapResult,
    segment::{
        analyze_geography, analyze_product_preferences, find_high_ticket_customers,
        find_inactive_customers, find_new_customers, NeighborhoodStats, ProductPopularity,
    },
};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// More inactive customers than this triggers a reactivation campaign.
pub const REACTIVATION_THRESHOLD: usize = 50;
pub const REACTIVATION_DISCOUNT_PCT: u32 = 20;
pub const TOP_NEIGHBORHOODS: usize = 3;
pub const TOP_PRODUCTS_IN_SUMMARY: usize = 5;

// ── Executive summary ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub as_of:                 NaiveDate,
    pub inactivity_days:       i64,
    pub min_average_ticket:    f64,
    pub contacts:              usize,
    pub customers:             usize,
    pub orders:                usize,
    pub line_items:            usize,
    pub new_customers:         usize,
    pub inactive_customers:    usize,
    pub high_ticket_customers: usize,
    pub active_neighborhoods:  usize,
    pub distinct_products:     usize,
    /// Sum of `total_with_delivery` over orders that have one.
    pub total_revenue:         f64,
    pub mean_ticket:           f64,
    /// Busiest neighborhoods by order count.
    pub top_neighborhoods:     Vec<NeighborhoodStats>,
    pub top_products:          Vec<ProductPopularity>,
}

impl ExecutiveSummary {
    pub fn compute(data: &PreparedData, params: &AnalysisParams) -> ZapResult<Self> {
        params.validate()?;

        let new_customers = find_new_customers(&data.contacts, &data.customers);
        let inactive = find_inactive_customers(
            &data.orders,
            &data.customers,
            params.inactivity_days,
            params.as_of,
        )?;
        let high_ticket =
            find_high_ticket_customers(&data.orders, &data.customers, params.min_average_ticket)?;
        let geography = analyze_geography(&data.orders);
        let products = analyze_product_preferences(
            &data.orders,
            &data.line_items,
            usize::MAX,
            params.top_categories,
        );

        let (revenue, valued) = data
            .orders
            .iter()
            .filter_map(|o| o.total_with_delivery)
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));

        Ok(Self {
            as_of:                 params.as_of,
            inactivity_days:       params.inactivity_days,
            min_average_ticket:    params.min_average_ticket,
            contacts:              data.contacts.len(),
            customers:             data.customers.len(),
            orders:                data.orders.len(),
            line_items:            data.line_items.len(),
            new_customers:         new_customers.len(),
            inactive_customers:    inactive.len(),
            high_ticket_customers: high_ticket.len(),
            active_neighborhoods:  geography.table.len(),
            distinct_products:     products.popularity.len(),
            total_revenue:         revenue,
            mean_ticket:           if valued > 0 { revenue / valued as f64 } else { 0.0 },
            top_neighborhoods:     geography.by_order_count.into_iter().take(TOP_NEIGHBORHOODS).collect(),
            top_products:          products
                .popularity
                .rows
                .into_iter()
                .take(TOP_PRODUCTS_IN_SUMMARY)
                .collect(),
        })
    }

    /// Next steps, in priority order.
    pub fn recommended_actions(&self) -> Vec<String> {
        let mut actions = Vec::new();
        if self.inactive_customers > 0 {
            actions.push(format!(
                "Run a reactivation campaign for {} inactive customers",
                self.inactive_customers
            ));
        }
        if self.high_ticket_customers > 0 {
            actions.push(format!(
                "Send exclusive offers to {} premium customers",
                self.high_ticket_customers
            ));
        }
        if !self.top_neighborhoods.is_empty() {
            actions.push(format!(
                "Target ads at the top {} neighborhoods",
                self.top_neighborhoods.len()
            ));
        }
        if self.new_customers > 0 {
            actions.push(format!(
                "Import {} new customers into the contact book",
                self.new_customers
            ));
        }
        actions
    }
}

impl fmt::Display for ExecutiveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Executive summary (as of {})", self.as_of.format("%d/%m/%Y"))?;
        writeln!(f, "  contacts:              {}", self.contacts)?;
        writeln!(f, "  customers:             {}", self.customers)?;
        writeln!(f, "  orders:                {}", self.orders)?;
        writeln!(f, "  revenue:               R$ {:.2}", self.total_revenue)?;
        writeln!(f, "  mean ticket:           R$ {:.2}", self.mean_ticket)?;
        writeln!(f, "  new customers:         {}", self.new_customers)?;
        writeln!(
            f,
            "  inactive (>{} days):   {}",
            self.inactivity_days, self.inactive_customers
        )?;
        writeln!(
            f,
            "  premium (>= R$ {:.2}): {}",
            self.min_average_ticket, self.high_ticket_customers
        )?;
        writeln!(f, "  active neighborhoods:  {}", self.active_neighborhoods)?;
        writeln!(f, "  distinct products:     {}", self.distinct_products)?;
        for (i, action) in self.recommended_actions().iter().enumerate() {
            writeln!(f, "  {}. {action}", i + 1)?;
        }
        Ok(())
    }
}

// ── Suggestions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Reactivation,
    Geographic,
    PersonalizedOffers,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub category: SuggestionCategory,
    pub message:  String,
}

impl Suggestion {
    fn new(category: SuggestionCategory, message: String) -> Self {
        Self { category, message }
    }
}

pub fn marketing_suggestions(summary: &ExecutiveSummary) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if summary.inactive_customers > REACTIVATION_THRESHOLD {
        out.push(Suggestion::new(
            SuggestionCategory::Reactivation,
            format!(
                "{} customers inactive for more than {} days: run a reactivation campaign with a {}% discount",
                summary.inactive_customers, summary.inactivity_days, REACTIVATION_DISCOUNT_PCT
            ),
        ));
    }

    for n in &summary.top_neighborhoods {
        out.push(Suggestion::new(
            SuggestionCategory::Geographic,
            format!(
                "{}: {} orders, target a local ad campaign at this neighborhood",
                n.neighborhood, n.order_count
            ),
        ));
    }

    if summary.high_ticket_customers > 0 {
        out.push(Suggestion::new(
            SuggestionCategory::PersonalizedOffers,
            format!(
                "{} customers with mean ticket of at least R$ {:.2}: offer exclusive premium deals",
                summary.high_ticket_customers, summary.min_average_ticket
            ),
        ));
    }

    if !summary.top_products.is_empty() {
        let names: Vec<&str> = summary
            .top_products
            .iter()
            .map(|p| p.product_name.as_str())
            .collect();
        out.push(Suggestion::new(
            SuggestionCategory::General,
            format!("Best sellers: {}. Promote combos built from these items", names.join(", ")),
        ));
    }

    log::debug!("insights: {} suggestions", out.len());
    out
}
