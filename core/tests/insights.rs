use chrono::{Duration, NaiveDate};
use zapcampanhas_core::{
    config::AnalysisParams,
    derive::PreparedData,
    insights::{marketing_suggestions, ExecutiveSummary, SuggestionCategory, REACTIVATION_THRESHOLD},
    records::{ContactRecord, CustomerRecord, LineItemRecord, OrderRecord},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn order(id: usize, phone: &str, neighborhood: &str, age_days: i64, total: f64) -> OrderRecord {
    OrderRecord {
        order_id:               id.to_string(),
        phone_raw:              phone.into(),
        phone_clean:            phone.into(),
        neighborhood_canonical: neighborhood.into(),
        closed_at:              Some(as_of() - Duration::days(age_days)),
        subtotal:               Some(total),
        delivery_fee:           None,
        total_with_delivery:    Some(total),
        origin_channel:         String::new(),
    }
}

fn customer(phone: &str, name: &str) -> CustomerRecord {
    CustomerRecord {
        full_name:              name.into(),
        phone_raw:              phone.into(),
        phone_clean:            phone.into(),
        first_name:             name.into(),
        neighborhood_raw:       String::new(),
        neighborhood_canonical: String::new(),
        order_count:            None,
    }
}

fn phone(i: usize) -> String {
    format!("55119{:08}", i)
}

/// `inactive` customers ordered 90 days ago, plus a few recent big spenders.
fn dataset(inactive: usize) -> PreparedData {
    let neighborhoods = ["centro", "fontanella", "zambom", "triunfo"];
    let mut orders = Vec::new();
    for i in 0..inactive {
        orders.push(order(i, &phone(i), neighborhoods[i % 4], 90, 20.0));
    }
    for j in 0..3 {
        let i = 1000 + j;
        orders.push(order(i, &phone(i), "centro", 2, 120.0));
    }
    let line_items = vec![LineItemRecord {
        order_id:     "1000".into(),
        product_name: "Combo Família".into(),
        category:     "Combos".into(),
        quantity:     Some(2.0),
        unit_value:   None,
        line_total:   Some(120.0),
        closed_at:    None,
    }];
    PreparedData {
        contacts: vec![ContactRecord {
            name:             "LT_01 Zé".into(),
            phone_raw:        phone(0),
            phone_clean:      phone(0),
            marketing_opt_in: true,
        }],
        customers: vec![customer(&phone(0), "Zé"), customer(&phone(1), "Lia")],
        orders,
        line_items,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn summary_counts_come_from_the_segments() {
    let data = dataset(10);
    let summary = ExecutiveSummary::compute(&data, &AnalysisParams::as_of(as_of())).unwrap();

    assert_eq!(summary.orders, 13);
    assert_eq!(summary.inactive_customers, 10);
    assert_eq!(summary.high_ticket_customers, 3);
    assert_eq!(summary.new_customers, 1);
    assert_eq!(summary.active_neighborhoods, 4);
    assert_eq!(summary.distinct_products, 1);
    assert_eq!(summary.total_revenue, 10.0 * 20.0 + 3.0 * 120.0);
    assert_eq!(summary.top_neighborhoods.len(), 3);
    assert_eq!(summary.top_neighborhoods[0].neighborhood, "centro");
    assert!(!summary.recommended_actions().is_empty());
}

#[test]
fn reactivation_needs_more_than_threshold_inactive() {
    let params = AnalysisParams::as_of(as_of());

    let at_threshold = ExecutiveSummary::compute(&dataset(REACTIVATION_THRESHOLD), &params).unwrap();
    assert!(marketing_suggestions(&at_threshold)
        .iter()
        .all(|s| s.category != SuggestionCategory::Reactivation));

    let above = ExecutiveSummary::compute(&dataset(REACTIVATION_THRESHOLD + 1), &params).unwrap();
    let suggestions = marketing_suggestions(&above);
    let reactivation: Vec<_> = suggestions
        .iter()
        .filter(|s| s.category == SuggestionCategory::Reactivation)
        .collect();
    assert_eq!(reactivation.len(), 1);
    assert!(reactivation[0].message.contains("51 customers"));
}

#[test]
fn suggestions_cover_geography_offers_and_products() {
    let summary = ExecutiveSummary::compute(&dataset(8), &AnalysisParams::as_of(as_of())).unwrap();
    let suggestions = marketing_suggestions(&summary);

    let geographic = suggestions
        .iter()
        .filter(|s| s.category == SuggestionCategory::Geographic)
        .count();
    assert_eq!(geographic, 3);
    assert!(suggestions
        .iter()
        .any(|s| s.category == SuggestionCategory::PersonalizedOffers && s.message.starts_with("3 customers")));
    assert!(suggestions
        .iter()
        .any(|s| s.category == SuggestionCategory::General && s.message.contains("Combo Família")));
}

#[test]
fn empty_data_gives_no_suggestions() {
    let summary =
        ExecutiveSummary::compute(&PreparedData::default(), &AnalysisParams::as_of(as_of())).unwrap();
    assert_eq!(summary.orders, 0);
    assert_eq!(summary.mean_ticket, 0.0);
    assert!(marketing_suggestions(&summary).is_empty());
    assert!(summary.recommended_actions().is_empty());
}

#[test]
fn summary_rejects_invalid_parameters() {
    let mut params = AnalysisParams::as_of(as_of());
    params.inactivity_days = 0;
    assert!(ExecutiveSummary::compute(&dataset(1), &params).is_err());
}
