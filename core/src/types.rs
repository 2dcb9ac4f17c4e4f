//! Shared primitive types used across the whole engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cleaned phone number: empty, or 10–15 digits.
pub type Phone = String;

/// Key joining orders to their line items.
pub type OrderId = String;

/// One of the four logical input tables, independent of the physical filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRole {
    Contacts,
    Customers,
    Orders,
    LineItems,
}

impl DatasetRole {
    pub const ALL: [DatasetRole; 4] = [
        DatasetRole::Contacts,
        DatasetRole::Customers,
        DatasetRole::Orders,
        DatasetRole::LineItems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetRole::Contacts  => "contacts",
            DatasetRole::Customers => "customers",
            DatasetRole::Orders    => "orders",
            DatasetRole::LineItems => "line_items",
        }
    }
}

impl fmt::Display for DatasetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named report kinds produced by the segmentation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    NewCustomers,
    InactiveCustomers,
    HighTicketCustomers,
    GeographicAnalysis,
    ProductPopularity,
    CategoryPreferences,
    TopCategories,
    WhatsappLeads,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::NewCustomers        => "new_customers",
            ReportKind::InactiveCustomers   => "inactive_customers",
            ReportKind::HighTicketCustomers => "high_ticket_customers",
            ReportKind::GeographicAnalysis  => "geographic_analysis",
            ReportKind::ProductPopularity   => "product_popularity",
            ReportKind::CategoryPreferences => "category_preferences",
            ReportKind::TopCategories       => "top_categories",
            ReportKind::WhatsappLeads       => "whatsapp_leads",
        }
    }

    /// Input roles an analysis of this kind cannot run without.
    pub fn required_roles(&self) -> &'static [DatasetRole] {
        match self {
            ReportKind::NewCustomers => &[DatasetRole::Contacts, DatasetRole::Customers],
            ReportKind::InactiveCustomers | ReportKind::HighTicketCustomers => &[DatasetRole::Orders],
            ReportKind::GeographicAnalysis => &[DatasetRole::Orders],
            ReportKind::ProductPopularity
            | ReportKind::CategoryPreferences
            | ReportKind::TopCategories => &[DatasetRole::Orders, DatasetRole::LineItems],
            ReportKind::WhatsappLeads => &[DatasetRole::Customers],
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
