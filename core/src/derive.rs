//! Join & derivation layer.
//!
//! Attaches normalized fields to loaded rows and drops rows whose phone is
//! unusable. Inputs are never mutated; each call returns a new table.

use crate::{
    loader::LoadedDatasets,
    normalizer::{clean_phone, extract_first_name, has_campaign_tag, NeighborhoodTable},
    records::{
        ContactRecord, CustomerRecord, LineItemRecord, OrderRecord, RawContact, RawCustomer,
        RawOrder,
    },
};
use serde::Serialize;

pub fn attach_contact_fields(contacts: &[RawContact]) -> Vec<ContactRecord> {
    let out: Vec<ContactRecord> = contacts
        .iter()
        .filter_map(|c| {
            let phone_clean = clean_phone(&c.phone_raw);
            if phone_clean.is_empty() {
                return None;
            }
            Some(ContactRecord {
                name: c.name.clone(),
                phone_raw: c.phone_raw.clone(),
                phone_clean,
                marketing_opt_in: has_campaign_tag(&c.name),
            })
        })
        .collect();
    log_dropped("contacts", contacts.len(), out.len());
    out
}

pub fn attach_customer_fields(
    customers: &[RawCustomer],
    neighborhoods: &NeighborhoodTable,
) -> Vec<CustomerRecord> {
    let out: Vec<CustomerRecord> = customers
        .iter()
        .filter_map(|c| {
            let phone_clean = clean_phone(&c.phone_raw);
            if phone_clean.is_empty() {
                return None;
            }
            Some(CustomerRecord {
                full_name: c.full_name.clone(),
                phone_raw: c.phone_raw.clone(),
                phone_clean,
                first_name: extract_first_name(&c.full_name),
                neighborhood_raw: c.neighborhood_raw.clone(),
                neighborhood_canonical: neighborhoods.normalize(&c.neighborhood_raw),
                order_count: c.order_count,
            })
        })
        .collect();
    log_dropped("customers", customers.len(), out.len());
    out
}

/// Walk-in and table orders have no phone and are dropped here.
pub fn attach_order_fields(orders: &[RawOrder], neighborhoods: &NeighborhoodTable) -> Vec<OrderRecord> {
    let out: Vec<OrderRecord> = orders
        .iter()
        .filter_map(|o| {
            let phone_clean = clean_phone(&o.phone_raw);
            if phone_clean.is_empty() {
                return None;
            }
            let total_with_delivery = o
                .subtotal
                .map(|subtotal| subtotal + o.delivery_fee.unwrap_or(0.0));
            Some(OrderRecord {
                order_id: o.order_id.clone(),
                phone_raw: o.phone_raw.clone(),
                phone_clean,
                neighborhood_canonical: neighborhoods.normalize(&o.neighborhood_raw),
                closed_at: o.closed_at,
                subtotal: o.subtotal,
                delivery_fee: o.delivery_fee,
                total_with_delivery,
                origin_channel: o.origin_channel.clone(),
            })
        })
        .collect();
    log_dropped("orders", orders.len(), out.len());
    out
}

fn log_dropped(what: &str, before: usize, after: usize) {
    if before > after {
        log::debug!("derive: {what}: dropped {} rows without a usable phone", before - after);
    }
}

// ── Prepared data ────────────────────────────────────────────────────────────

/// The derived tables every analysis reads. An absent role is an empty table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreparedData {
    pub contacts:   Vec<ContactRecord>,
    pub customers:  Vec<CustomerRecord>,
    pub orders:     Vec<OrderRecord>,
    pub line_items: Vec<LineItemRecord>,
}

impl PreparedData {
    pub fn from_loaded(loaded: &LoadedDatasets, neighborhoods: &NeighborhoodTable) -> Self {
        let prepared = Self {
            contacts: loaded
                .contacts
                .as_ref()
                .map(|d| attach_contact_fields(&d.records))
                .unwrap_or_default(),
            customers: loaded
                .customers
                .as_ref()
                .map(|d| attach_customer_fields(&d.records, neighborhoods))
                .unwrap_or_default(),
            orders: loaded
                .orders
                .as_ref()
                .map(|d| attach_order_fields(&d.records, neighborhoods))
                .unwrap_or_default(),
            line_items: loaded
                .line_items
                .as_ref()
                .map(|d| d.records.clone())
                .unwrap_or_default(),
        };
        log::info!(
            "derive: {} contacts, {} customers, {} orders, {} line items",
            prepared.contacts.len(),
            prepared.customers.len(),
            prepared.orders.len(),
            prepared.line_items.len(),
        );
        prepared
    }
}
