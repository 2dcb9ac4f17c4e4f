use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;
use zapcampanhas_core::{
    error::ZapError,
    report::{write, OutputFormat, ReportWriter},
    segment::{HighTicketCustomer, InactiveCustomer, NewCustomer, ProductPopularity, SegmentResult},
    types::ReportKind,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn new_customers() -> SegmentResult<NewCustomer> {
    SegmentResult::new(
        ReportKind::NewCustomers,
        json!({}),
        vec![
            NewCustomer { display_name: "LT_01 João".into(), phone: "5511999990002".into() },
            NewCustomer { display_name: "LT_01 Bia".into(), phone: "5511999990003".into() },
        ],
    )
}

fn inactive() -> SegmentResult<InactiveCustomer> {
    SegmentResult::new(
        ReportKind::InactiveCustomers,
        json!({ "inactivity_days": 30 }),
        vec![InactiveCustomer {
            phone:           "5511999990002".into(),
            first_name:      "João".into(),
            neighborhood:    "centro".into(),
            order_count:     None,
            last_order_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            days_inactive:   172,
        }],
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn csv_follows_declared_column_order() {
    let dir = TempDir::new().unwrap();
    let result = new_customers();
    assert_eq!(result.columns(), &["display_name", "phone"]);
    let path = write(&result, dir.path(), "new_customers", OutputFormat::Csv).unwrap();

    assert!(path.is_absolute());
    assert_eq!(path.file_name().unwrap(), "new_customers.csv");
    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec![
        "display_name,phone",
        "LT_01 João,5511999990002",
        "LT_01 Bia,5511999990003",
    ]);
}

#[test]
fn csv_formats_money_and_dates() {
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path());

    let path = writer.write(&inactive(), "inactive", OutputFormat::Csv).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.starts_with("phone,first_name,neighborhood,order_count,last_order_date,days_inactive\n"));
    assert!(text.contains("5511999990002,João,centro,,10/01/2024,172"));

    let ticket = SegmentResult::new(
        ReportKind::HighTicketCustomers,
        json!({}),
        vec![HighTicketCustomer {
            phone:           "5511999990001".into(),
            first_name:      "Ana".into(),
            neighborhood:    "".into(),
            mean_ticket:     85.0 / 3.0,
            total_value:     85.0,
            order_count:     3,
            last_order_date: None,
        }],
    );
    let path = writer.write(&ticket, "ticket", OutputFormat::Csv).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("5511999990001,Ana,,28.33,85.00,3,"));
}

#[test]
fn spreadsheet_is_readable_with_typed_cells() {
    let dir = TempDir::new().unwrap();
    let writer = ReportWriter::new(dir.path());
    let path = writer.write_default(&inactive()).unwrap();
    assert_eq!(path.file_name().unwrap(), "inactive_customers.xlsx");

    let mut workbook = open_workbook_auto(&path).unwrap();
    let range = workbook.worksheet_range_at(0).unwrap().unwrap();
    let rows: Vec<&[Data]> = range.rows().collect();

    let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
    assert_eq!(header, vec![
        "phone",
        "first_name",
        "neighborhood",
        "order_count",
        "last_order_date",
        "days_inactive",
    ]);
    assert_eq!(rows[1][0], Data::String("5511999990002".into()));
    assert_eq!(rows[1][5], Data::Float(172.0));
    match &rows[1][4] {
        Data::DateTime(dt) => {
            let date = dt.as_datetime().unwrap().date();
            assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        }
        other => panic!("expected a date cell, got {other:?}"),
    }
}

#[test]
fn empty_result_still_writes_headers() {
    let dir = TempDir::new().unwrap();
    let empty: SegmentResult<ProductPopularity> =
        SegmentResult::new(ReportKind::ProductPopularity, json!({}), Vec::new());
    let path = write(&empty, dir.path(), "products", OutputFormat::Csv).unwrap();
    assert_eq!(std::fs::read_to_string(path).unwrap(), "product_name,quantity_sold,total_value\n");
}

#[test]
fn existing_file_is_overwritten() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("new_customers.csv"), "stale content that is longer than the report\n".repeat(10)).unwrap();

    let path = ReportWriter::new(dir.path()).write_default(&new_customers()).unwrap();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(!text.contains("stale"));
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn output_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("out").join("june");
    let path = write(&new_customers(), &nested, "new_customers", OutputFormat::Csv).unwrap();
    assert!(path.starts_with(nested.canonicalize().unwrap()));
}

#[test]
fn base_name_must_be_a_plain_file_name() {
    let dir = TempDir::new().unwrap();
    for bad in ["", "  ", "../escape", "a/b", ".."] {
        match write(&new_customers(), dir.path(), bad, OutputFormat::Csv) {
            Err(ZapError::InvalidParameter { name, .. }) => assert_eq!(name, "base_name"),
            other => panic!("expected InvalidParameter for {bad:?}, got {other:?}"),
        }
    }
}

#[test]
fn default_formats_per_kind() {
    assert_eq!(OutputFormat::default_for(ReportKind::NewCustomers), OutputFormat::Csv);
    for kind in [
        ReportKind::InactiveCustomers,
        ReportKind::HighTicketCustomers,
        ReportKind::GeographicAnalysis,
        ReportKind::ProductPopularity,
    ] {
        assert_eq!(OutputFormat::default_for(kind), OutputFormat::Spreadsheet);
    }
}
