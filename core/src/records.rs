//! Row types for the four input roles.
//!
//! `Raw*` rows come straight out of the loader with only type coercion
//! applied. The derivation layer turns them into the `*Record` types that
//! carry normalized phone, name and neighborhood fields.

use crate::types::{OrderId, Phone};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Loader output ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContact {
    pub name:      String,
    pub phone_raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCustomer {
    pub full_name:        String,
    pub phone_raw:        String,
    pub neighborhood_raw: String,
    pub order_count:      Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOrder {
    pub order_id:         OrderId,
    pub phone_raw:        String,
    pub neighborhood_raw: String,
    pub closed_at:        Option<NaiveDate>,
    pub subtotal:         Option<f64>,
    pub delivery_fee:     Option<f64>,
    pub origin_channel:   String,
}

/// Line items need no derivation; the loader produces them in final form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub order_id:     OrderId,
    pub product_name: String,
    pub category:     String,
    pub quantity:     Option<f64>,
    pub unit_value:   Option<f64>,
    pub line_total:   Option<f64>,
    pub closed_at:    Option<NaiveDate>,
}

// ── Derived ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub name:             String,
    pub phone_raw:        String,
    pub phone_clean:      Phone,
    pub marketing_opt_in: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub full_name:              String,
    pub phone_raw:              String,
    pub phone_clean:            Phone,
    pub first_name:             String,
    pub neighborhood_raw:       String,
    pub neighborhood_canonical: String,
    pub order_count:            Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id:               OrderId,
    pub phone_raw:              String,
    pub phone_clean:            Phone,
    pub neighborhood_canonical: String,
    pub closed_at:              Option<NaiveDate>,
    pub subtotal:               Option<f64>,
    pub delivery_fee:           Option<f64>,
    /// `subtotal + delivery_fee`; None when the subtotal is unknown.
    pub total_with_delivery:    Option<f64>,
    pub origin_channel:         String,
}
