//! Report pipeline: runs the standard analyses and writes one file each.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. New customers          → new_customers.csv
//!   2. Inactive customers     → inactive_customers.xlsx
//!   3. High-ticket customers  → high_ticket_customers.xlsx
//!   4. Geographic analysis    → geographic_analysis.xlsx
//!   5. Product popularity     → product_popularity.xlsx
//!
//! RULES:
//!   - Parameters are validated once, before any job runs.
//!   - Jobs read only the prepared data; no job calls another job.
//!   - A failing job is recorded and the remaining jobs still run.
//!   - A job whose source data is unavailable is skipped, not written.

use crate::{
    config::AnalysisParams,
    derive::PreparedData,
    error::ZapResult,
    report::ReportWriter,
    segment::{
        analyze_geography, analyze_product_preferences, find_high_ticket_customers,
        find_inactive_customers, find_new_customers, ReportRow, SegmentResult,
    },
    types::ReportKind,
};
use serde::Serialize;
use std::path::PathBuf;

// ── Job contract ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Written(PathBuf),
    Skipped,
}

/// The contract every report job fulfills.
pub trait ReportJob {
    /// Stable report kind, also the output file's base name.
    fn kind(&self) -> ReportKind;

    /// Runs the analysis and writes its result.
    fn run(
        &self,
        data: &PreparedData,
        params: &AnalysisParams,
        writer: &ReportWriter,
    ) -> ZapResult<JobOutcome>;
}

fn write_if_available<T: ReportRow>(
    result: &SegmentResult<T>,
    writer: &ReportWriter,
) -> ZapResult<JobOutcome> {
    if !result.source_data_available {
        return Ok(JobOutcome::Skipped);
    }
    writer.write_default(result).map(JobOutcome::Written)
}

// ── Standard jobs ────────────────────────────────────────────────────────────

pub struct NewCustomersJob;

impl ReportJob for NewCustomersJob {
    fn kind(&self) -> ReportKind {
        ReportKind::NewCustomers
    }

    fn run(&self, data: &PreparedData, _: &AnalysisParams, writer: &ReportWriter) -> ZapResult<JobOutcome> {
        write_if_available(&find_new_customers(&data.contacts, &data.customers), writer)
    }
}

pub struct InactiveCustomersJob;

impl ReportJob for InactiveCustomersJob {
    fn kind(&self) -> ReportKind {
        ReportKind::InactiveCustomers
    }

    fn run(&self, data: &PreparedData, params: &AnalysisParams, writer: &ReportWriter) -> ZapResult<JobOutcome> {
        let result = find_inactive_customers(
            &data.orders,
            &data.customers,
            params.inactivity_days,
            params.as_of,
        )?;
        write_if_available(&result, writer)
    }
}

pub struct HighTicketCustomersJob;

impl ReportJob for HighTicketCustomersJob {
    fn kind(&self) -> ReportKind {
        ReportKind::HighTicketCustomers
    }

    fn run(&self, data: &PreparedData, params: &AnalysisParams, writer: &ReportWriter) -> ZapResult<JobOutcome> {
        let result =
            find_high_ticket_customers(&data.orders, &data.customers, params.min_average_ticket)?;
        write_if_available(&result, writer)
    }
}

pub struct GeographyJob;

impl ReportJob for GeographyJob {
    fn kind(&self) -> ReportKind {
        ReportKind::GeographicAnalysis
    }

    fn run(&self, data: &PreparedData, _: &AnalysisParams, writer: &ReportWriter) -> ZapResult<JobOutcome> {
        write_if_available(&analyze_geography(&data.orders).table, writer)
    }
}

pub struct ProductPopularityJob;

impl ReportJob for ProductPopularityJob {
    fn kind(&self) -> ReportKind {
        ReportKind::ProductPopularity
    }

    fn run(&self, data: &PreparedData, params: &AnalysisParams, writer: &ReportWriter) -> ZapResult<JobOutcome> {
        let prefs = analyze_product_preferences(
            &data.orders,
            &data.line_items,
            params.top_products,
            params.top_categories,
        );
        write_if_available(&prefs.popularity, writer)
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct WrittenReport {
    pub kind: ReportKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedReport {
    pub kind:  ReportKind,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub written: Vec<WrittenReport>,
    pub skipped: Vec<ReportKind>,
    pub failed:  Vec<FailedReport>,
}

impl PipelineSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ReportPipeline {
    jobs: Vec<Box<dyn ReportJob>>,
}

impl ReportPipeline {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Pipeline with the five standard jobs registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build() -> Self {
        let mut pipeline = ReportPipeline::new();
        // EXECUTION ORDER: see module docs.
        pipeline.register(Box::new(NewCustomersJob));
        pipeline.register(Box::new(InactiveCustomersJob));
        pipeline.register(Box::new(HighTicketCustomersJob));
        pipeline.register(Box::new(GeographyJob));
        pipeline.register(Box::new(ProductPopularityJob));
        pipeline
    }

    /// Register a job. Call in the documented execution order.
    pub fn register(&mut self, job: Box<dyn ReportJob>) {
        self.jobs.push(job);
    }

    pub fn kinds(&self) -> Vec<ReportKind> {
        self.jobs.iter().map(|j| j.kind()).collect()
    }

    pub fn run(
        &self,
        data: &PreparedData,
        params: &AnalysisParams,
        writer: &ReportWriter,
    ) -> ZapResult<PipelineSummary> {
        params.validate()?;

        let mut summary = PipelineSummary::default();
        for job in &self.jobs {
            let kind = job.kind();
            match job.run(data, params, writer) {
                Ok(JobOutcome::Written(path)) => summary.written.push(WrittenReport { kind, path }),
                Ok(JobOutcome::Skipped) => {
                    log::info!("pipeline: {kind} skipped, source data unavailable");
                    summary.skipped.push(kind);
                }
                Err(e) => {
                    log::warn!("pipeline: {kind} failed: {e}");
                    summary.failed.push(FailedReport {
                        kind,
                        error: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "pipeline: {} written, {} skipped, {} failed",
            summary.written.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        Ok(summary)
    }
}

impl Default for ReportPipeline {
    fn default() -> Self {
        Self::new()
    }
}
