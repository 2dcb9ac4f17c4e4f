use anyhow::anyhow;
use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tempfile::TempDir;
use zapcampanhas_core::{
    config::{AnalysisParams, EngineConfig},
    derive::PreparedData,
    error::{ZapError, ZapResult},
    loader::DatasetLoader,
    pipeline::{JobOutcome, ReportJob, ReportPipeline},
    report::ReportWriter,
    types::ReportKind,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn write_xlsx(path: &Path, rows: &[&[&str]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            sheet.write_string(r as u32, c as u16, *value).unwrap();
        }
    }
    workbook.save(path).unwrap();
}

fn write_inputs(dir: &Path) {
    std::fs::write(dir.join("contacts.csv"), "Nome;Telefone\nLT_01 Maria;(11) 99999-0001\n").unwrap();
    write_xlsx(&dir.join("lista-clientes.xlsx"), &[
        &["Nome", "Fone Principal", "Bairro", "Qtd. Pedidos"],
        &["Maria Silva", "(11)99999-0001", "Fontanela", "12"],
        &["João Souza", "(11)99999-0002", "Centro", "1"],
    ]);
    write_xlsx(&dir.join("todos os pedidos.xlsx"), &[
        &["Código", "Telefone", "Bairro", "Data Fechamento", "Total", "Valor Entrega"],
        &["1", "(11)99999-0001", "Fontanela", "25/06/2024 20:10", "80,00", "5,00"],
        &["2", "(11)99999-0002", "Centro", "10/01/2024", "30,00", ""],
        &["3", "", "", "20/06/2024", "100,00", ""],
    ]);
    write_xlsx(&dir.join("historico_itens_vendidos.xlsx"), &[
        &["Cod. Ped.", "Nome Prod", "Cat. Prod.", "Qtd.", "Valor Tot. Item"],
        &["1", "Burger", "Lanches", "2", "60,00"],
        &["1", "Soda", "Bebidas", "1", "20,00"],
        &["3", "Burger", "Lanches", "5", "150,00"],
    ]);
}

fn prepare(dir: &Path) -> PreparedData {
    let config = EngineConfig::default();
    let loaded = DatasetLoader::new(&config).load(dir).unwrap();
    PreparedData::from_loaded(&loaded, &config.neighborhood_table())
}

fn params() -> AnalysisParams {
    AnalysisParams::as_of(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
}

struct FailingJob;

impl ReportJob for FailingJob {
    fn kind(&self) -> ReportKind {
        ReportKind::CategoryPreferences
    }

    fn run(&self, _: &PreparedData, _: &AnalysisParams, _: &ReportWriter) -> ZapResult<JobOutcome> {
        Err(ZapError::Other(anyhow!("boom")))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn standard_jobs_run_in_fixed_order() {
    assert_eq!(ReportPipeline::build().kinds(), vec![
        ReportKind::NewCustomers,
        ReportKind::InactiveCustomers,
        ReportKind::HighTicketCustomers,
        ReportKind::GeographicAnalysis,
        ReportKind::ProductPopularity,
    ]);
}

#[test]
fn full_run_writes_every_report() {
    let _ = env_logger::builder().is_test(true).try_init();
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_inputs(input.path());
    let data = prepare(input.path());

    // walk-in order 3 has no phone and is dropped
    assert_eq!(data.orders.len(), 2);
    assert_eq!(data.orders[0].total_with_delivery, Some(85.0));

    let writer = ReportWriter::new(output.path());
    let summary = ReportPipeline::build().run(&data, &params(), &writer).unwrap();

    assert!(summary.is_complete());
    assert!(summary.skipped.is_empty());
    let written: Vec<ReportKind> = summary.written.iter().map(|w| w.kind).collect();
    assert_eq!(written, ReportPipeline::build().kinds());

    let names: Vec<String> = summary
        .written
        .iter()
        .map(|w| w.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![
        "new_customers.csv",
        "inactive_customers.xlsx",
        "high_ticket_customers.xlsx",
        "geographic_analysis.xlsx",
        "product_popularity.xlsx",
    ]);
    for w in &summary.written {
        assert!(w.path.is_file());
    }

    let csv = std::fs::read_to_string(&summary.written[0].path).unwrap();
    assert_eq!(csv, "display_name,phone\nLT_01 João,5511999990002\n");
}

#[test]
fn written_spreadsheets_load_back() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_inputs(input.path());
    let data = prepare(input.path());
    let writer = ReportWriter::new(output.path());
    let summary = ReportPipeline::build().run(&data, &params(), &writer).unwrap();

    let inactive = summary
        .written
        .iter()
        .find(|w| w.kind == ReportKind::InactiveCustomers)
        .unwrap();
    let bytes = std::fs::read(&inactive.path).unwrap();
    let table = zapcampanhas_core::loader::reader::read_table("inactive_customers.xlsx", &bytes).unwrap();
    assert_eq!(table.headers[0], "phone");
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0][0].to_text(), "5511999990002");
    assert_eq!(table.rows[0][5].to_text(), "172");
}

#[test]
fn missing_inputs_are_skipped_not_failed() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::write(input.path().join("contacts.csv"), "Nome,Telefone\nAna,11999990001\n").unwrap();
    let data = prepare(input.path());

    let summary = ReportPipeline::build()
        .run(&data, &params(), &ReportWriter::new(output.path()))
        .unwrap();
    assert!(summary.written.is_empty());
    assert!(summary.failed.is_empty());
    assert_eq!(summary.skipped.len(), 5);
}

#[test]
fn invalid_parameters_stop_before_any_work() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_inputs(input.path());
    let data = prepare(input.path());
    let target = output.path().join("reports");

    let mut bad = params();
    bad.min_average_ticket = -1.0;
    let result = ReportPipeline::build().run(&data, &bad, &ReportWriter::new(&target));
    assert!(matches!(result, Err(ZapError::InvalidParameter { .. })));
    assert!(!target.exists());
}

#[test]
fn one_failing_job_does_not_stop_the_others() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_inputs(input.path());
    let data = prepare(input.path());

    let mut pipeline = ReportPipeline::new();
    pipeline.register(Box::new(FailingJob));
    pipeline.register(Box::new(zapcampanhas_core::pipeline::GeographyJob));

    let summary = pipeline
        .run(&data, &params(), &ReportWriter::new(output.path()))
        .unwrap();
    assert!(!summary.is_complete());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].kind, ReportKind::CategoryPreferences);
    assert!(summary.failed[0].error.contains("boom"));
    assert_eq!(summary.written.len(), 1);
    assert_eq!(summary.written[0].kind, ReportKind::GeographicAnalysis);
}
