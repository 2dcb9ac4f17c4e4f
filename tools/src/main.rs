//! zap-runner: headless report runner for the ZapCampanhas engine.
//!
//! Usage:
//!   zap-runner --input ./input --output ./output
//!   zap-runner --input ./input --inactivity-days 60 --min-ticket 80 --as-of 01/06/2024
//!   zap-runner --input ./input --ask "clientes inativos"
//!   zap-runner --input ./input --config engine.json --json
//!   zap-runner --input ./input --leads

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::env;
use std::path::{Path, PathBuf};
use zapcampanhas_core::{
    config::{AnalysisParams, EngineConfig},
    derive::PreparedData,
    insights::{marketing_suggestions, ExecutiveSummary, Suggestion},
    leads::{build_leads, write_leads, LeadSummary},
    loader::{DatasetLoader, LoadedDatasets},
    pipeline::{PipelineSummary, ReportPipeline},
    query::answer,
    report::ReportWriter,
    types::DatasetRole,
};

#[derive(serde::Serialize)]
struct RunReport<'a> {
    params:      &'a AnalysisParams,
    pipeline:    &'a PipelineSummary,
    summary:     &'a ExecutiveSummary,
    suggestions: Vec<Suggestion>,
    leads:       Option<LeadSummary>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = arg_value(&args, "--input").unwrap_or("./input");
    let output = arg_value(&args, "--output").unwrap_or("./output");
    let json = args.iter().any(|a| a == "--json");
    let export_leads = args.iter().any(|a| a == "--leads");

    let config = match arg_value(&args, "--config") {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let mut params = match arg_value(&args, "--as-of") {
        Some(raw) => AnalysisParams::as_of(parse_as_of(raw)?),
        None => AnalysisParams::default(),
    };
    params.inactivity_days = parse_arg(&args, "--inactivity-days", params.inactivity_days)?;
    params.min_average_ticket = parse_arg(&args, "--min-ticket", params.min_average_ticket)?;
    params.validate()?;

    if !json {
        println!("ZapCampanhas: zap-runner");
        println!("  input:            {input}");
        println!("  output:           {output}");
        println!("  as of:            {}", params.as_of.format("%d/%m/%Y"));
        println!("  inactivity days:  {}", params.inactivity_days);
        println!("  min ticket:       {:.2}", params.min_average_ticket);
        println!();
    }

    let loaded = DatasetLoader::new(&config).load(Path::new(input))?;
    if !json {
        print_inputs(&loaded);
    }
    let data = PreparedData::from_loaded(&loaded, &config.neighborhood_table());
    let writer = ReportWriter::new(output);

    if let Some(question) = arg_value(&args, "--ask") {
        let reply = answer(question, &data, &params, &writer)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&reply)?);
        } else {
            println!("{}", reply.text);
        }
        return Ok(());
    }

    let pipeline = ReportPipeline::build().run(&data, &params, &writer)?;
    let summary = ExecutiveSummary::compute(&data, &params)?;
    let suggestions = marketing_suggestions(&summary);

    let mut lead_files = Vec::new();
    let lead_summary = if export_leads {
        let export = build_leads(&data.customers);
        lead_files = write_leads(&export, &writer)?;
        Some(export.summary())
    } else {
        None
    };

    if json {
        let report = RunReport {
            params: &params,
            pipeline: &pipeline,
            summary: &summary,
            suggestions,
            leads: lead_summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_pipeline(&pipeline);
        if let Some(leads) = &lead_summary {
            print_leads(leads, &lead_files);
        }
        println!();
        print!("{summary}");
        if !suggestions.is_empty() {
            println!();
            println!("=== SUGGESTIONS ===");
            for s in &suggestions {
                println!("  - {}", s.message);
            }
        }
    }

    if !pipeline.is_complete() {
        return Err(anyhow!("{} report(s) failed", pipeline.failed.len()));
    }
    Ok(())
}

fn print_inputs(loaded: &LoadedDatasets) {
    println!("=== INPUTS ===");
    for role in DatasetRole::ALL.into_iter().filter(|r| !loaded.has(*r)) {
        match loaded.failure(role) {
            Some(e) => println!("  {:<12} FAILED: {e}", role.as_str()),
            None => println!("  {:<12} not found (add this file to get its reports)", role.as_str()),
        }
    }
    let warnings = loaded.warning_count();
    if warnings > 0 {
        println!("  {warnings} cell(s) could not be read and were left empty");
    }
    println!();
}

fn print_pipeline(summary: &PipelineSummary) {
    println!("=== REPORTS ===");
    for w in &summary.written {
        println!("  {:<22} {}", w.kind.as_str(), w.path.display());
    }
    for kind in &summary.skipped {
        println!("  {:<22} skipped (no source data)", kind.as_str());
    }
    for f in &summary.failed {
        println!("  {:<22} FAILED: {}", f.kind.as_str(), f.error);
    }
}

fn print_leads(summary: &LeadSummary, files: &[PathBuf]) {
    println!();
    println!("=== WHATSAPP LEADS ===");
    println!("  total leads:      {}", summary.total_leads);
    for s in &summary.segments {
        println!("  {:<22} {:>5} ({:.2}%)", s.key, s.leads, s.percent);
    }
    for path in files {
        println!("  -> {}", path.display());
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T> {
    match arg_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow!("invalid value for {flag}: {raw}")),
        None => Ok(default),
    }
}

fn parse_as_of(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| anyhow!("invalid --as-of date: {raw} (expected dd/mm/yyyy)"))
}
