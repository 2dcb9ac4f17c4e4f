//! Keyword rules mapping a free-text question to an engine operation.
//!
//! RULES:
//!   - Matching is case-insensitive over a fixed keyword table, first rule
//!     wins. Keywords match as substrings, English verbs as whole words. Configuration rules come first so that
//!     "configure inactivity to 60" is not read as an inactivity report.
//!   - Settings intents never mutate shared state: `apply_intent` returns an
//!     updated copy of the caller's `AnalysisParams`.

use crate::{
    config::{validate_inactivity_days, validate_min_average_ticket, AnalysisParams},
    derive::PreparedData,
    error::ZapResult,
    insights::{marketing_suggestions, ExecutiveSummary},
    leads::build_leads,
    loader::reader::parse_decimal,
    pipeline::ReportPipeline,
    report::ReportWriter,
    segment::{
        analyze_geography, analyze_product_preferences, find_high_ticket_customers,
        find_inactive_customers, find_new_customers, ReportRow, SegmentResult,
    },
    types::ReportKind,
};
use regex::Regex;
use serde::Serialize;
use std::{fmt::Write, sync::OnceLock};

/// Rows shown inline in a reply; the full table goes to the report file.
pub const REPLY_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Report { kind: ReportKind },
    ExecutiveSummary,
    MarketingSuggestions,
    SaveReports,
    ShowSettings,
    SetInactivityDays { days: i64 },
    SetMinAverageTicket { amount: f64 },
    Unknown,
}

// ── Rule table ───────────────────────────────────────────────────────────────

enum Action {
    Fixed(Intent),
    Configure,
}

struct Rule {
    /// Substrings, so "inativ" covers "inativos" and "inatividade".
    keywords: &'static [&'static str],
    /// Whole words only; "set" must not fire on "reset".
    words:    &'static [&'static str],
    action:   Action,
}

const CONFIGURE_WORDS: &[&str] = &["configur", "ajust", "definir"];
const CONFIGURE_VERBS: &[&str] = &["set", "change"];
const INACTIVITY_WORDS: &[&str] = &["inativ", "inactiv"];
const TICKET_WORDS: &[&str] = &["ticket"];

static RULES: &[Rule] = &[
    Rule {
        keywords: CONFIGURE_WORDS,
        words:    CONFIGURE_VERBS,
        action:   Action::Configure,
    },
    Rule {
        keywords: &["settings", "parâmetros", "parametros"],
        words:    &[],
        action:   Action::Fixed(Intent::ShowSettings),
    },
    Rule {
        keywords: &["inativ", "inactiv", "não comprou", "nao comprou", "não pediu", "nao pediu"],
        words:    &[],
        action:   Action::Fixed(Intent::Report { kind: ReportKind::InactiveCustomers }),
    },
    Rule {
        keywords: &["ticket", "premium", "high value"],
        words:    &[],
        action:   Action::Fixed(Intent::Report { kind: ReportKind::HighTicketCustomers }),
    },
    Rule {
        keywords: &["bairro", "localização", "localizacao", "geográf", "geograf", "região", "regiao", "neighborhood"],
        words:    &[],
        action:   Action::Fixed(Intent::Report { kind: ReportKind::GeographicAnalysis }),
    },
    Rule {
        keywords: &["categoria", "category", "categories"],
        words:    &[],
        action:   Action::Fixed(Intent::Report { kind: ReportKind::TopCategories }),
    },
    Rule {
        keywords: &["venda", "faturamento", "produto", "item", "product", "sales", "best seller"],
        words:    &[],
        action:   Action::Fixed(Intent::Report { kind: ReportKind::ProductPopularity }),
    },
    Rule {
        keywords: &["lead", "whatsapp", "wa.me"],
        words:    &[],
        action:   Action::Fixed(Intent::Report { kind: ReportKind::WhatsappLeads }),
    },
    Rule {
        keywords: &["novos clientes", "novo cliente", "new customer", "contatos", "contacts"],
        words:    &[],
        action:   Action::Fixed(Intent::Report { kind: ReportKind::NewCustomers }),
    },
    Rule {
        keywords: &["sugest", "campanha", "marketing", "oferta", "suggest", "campaign"],
        words:    &[],
        action:   Action::Fixed(Intent::MarketingSuggestions),
    },
    Rule {
        keywords: &["resumo", "executivo", "overview", "summary"],
        words:    &[],
        action:   Action::Fixed(Intent::ExecutiveSummary),
    },
    Rule {
        keywords: &["relatório", "relatorio", "salvar", "gerar", "report", "save"],
        words:    &[],
        action:   Action::Fixed(Intent::SaveReports),
    },
];

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn has_word(text: &str, words: &[&str]) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

impl Rule {
    fn matches(&self, text: &str) -> bool {
        contains_any(text, self.keywords) || has_word(text, self.words)
    }
}

fn first_number(text: &str) -> Option<&str> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER.get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("number pattern is valid"));
    re.find(text).map(|m| m.as_str())
}

fn configure(question: &str) -> Intent {
    let number = first_number(question);
    if contains_any(question, INACTIVITY_WORDS) {
        // Days are whole; "60,5" reads as 60.
        let days = number.and_then(|n| {
            n.split(['.', ','])
                .next()
                .and_then(|d| d.parse::<i64>().ok())
        });
        if let Some(days) = days {
            return Intent::SetInactivityDays { days };
        }
    }
    if contains_any(question, TICKET_WORDS) {
        if let Some(amount) = number.and_then(parse_decimal) {
            return Intent::SetMinAverageTicket { amount };
        }
    }
    Intent::ShowSettings
}

/// Classify a question. Unmatched text yields `Intent::Unknown`.
pub fn interpret(question: &str) -> Intent {
    let lower = question.trim().to_lowercase();
    let intent = RULES
        .iter()
        .find(|rule| rule.matches(&lower))
        .map(|rule| match &rule.action {
            Action::Fixed(intent) => intent.clone(),
            Action::Configure => configure(&lower),
        })
        .unwrap_or(Intent::Unknown);
    log::debug!("query: {question:?} -> {intent:?}");
    intent
}

/// Apply a settings intent to a copy of `params`. Other intents return it unchanged.
pub fn apply_intent(intent: &Intent, params: &AnalysisParams) -> ZapResult<AnalysisParams> {
    let mut updated = params.clone();
    match intent {
        Intent::SetInactivityDays { days } => {
            validate_inactivity_days(*days)?;
            updated.inactivity_days = *days;
        }
        Intent::SetMinAverageTicket { amount } => {
            validate_min_average_ticket(*amount)?;
            updated.min_average_ticket = *amount;
        }
        _ => {}
    }
    Ok(updated)
}

// ── Replies ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub intent: Intent,
    /// Parameters in force after the question; differs from the input only
    /// for settings intents.
    pub params: AnalysisParams,
    pub text:   String,
}

pub fn answer(
    question: &str,
    data: &PreparedData,
    params: &AnalysisParams,
    writer: &ReportWriter,
) -> ZapResult<Reply> {
    let intent = interpret(question);
    let params = apply_intent(&intent, params)?;

    let text = match &intent {
        Intent::Report { kind } => render_report(*kind, data, &params)?,
        Intent::ExecutiveSummary => ExecutiveSummary::compute(data, &params)?.to_string(),
        Intent::MarketingSuggestions => {
            let summary = ExecutiveSummary::compute(data, &params)?;
            let suggestions = marketing_suggestions(&summary);
            if suggestions.is_empty() {
                "No suggestions: not enough data.".to_string()
            } else {
                suggestions
                    .iter()
                    .map(|s| format!("- {}", s.message))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Intent::SaveReports => {
            let summary = ReportPipeline::build().run(data, &params, writer)?;
            let mut text = format!(
                "{} reports saved to {}",
                summary.written.len(),
                writer.output_dir().display()
            );
            for w in &summary.written {
                let _ = write!(text, "\n- {}", w.path.display());
            }
            for f in &summary.failed {
                let _ = write!(text, "\n! {} failed: {}", f.kind, f.error);
            }
            text
        }
        Intent::ShowSettings | Intent::SetInactivityDays { .. } | Intent::SetMinAverageTicket { .. } => {
            format!(
                "inactivity_days = {}\nmin_average_ticket = {:.2}\nas_of = {}",
                params.inactivity_days,
                params.min_average_ticket,
                params.as_of.format("%d/%m/%Y")
            )
        }
        Intent::Unknown => "Try: \"inactive customers\", \"high ticket\", \"neighborhoods\", \
             \"best sellers\", \"whatsapp leads\", \"summary\", \"suggestions\", \"save reports\", \
             \"configure inactivity to 60\" or \"configure ticket to 100\"."
            .to_string(),
    };

    Ok(Reply { intent, params, text })
}

fn render_report(kind: ReportKind, data: &PreparedData, params: &AnalysisParams) -> ZapResult<String> {
    let text = match kind {
        ReportKind::NewCustomers => render(&find_new_customers(&data.contacts, &data.customers)),
        ReportKind::InactiveCustomers => render(&find_inactive_customers(
            &data.orders,
            &data.customers,
            params.inactivity_days,
            params.as_of,
        )?),
        ReportKind::HighTicketCustomers => render(&find_high_ticket_customers(
            &data.orders,
            &data.customers,
            params.min_average_ticket,
        )?),
        ReportKind::GeographicAnalysis => render(&analyze_geography(&data.orders).table),
        ReportKind::WhatsappLeads => render(&build_leads(&data.customers).all),
        ReportKind::ProductPopularity | ReportKind::CategoryPreferences | ReportKind::TopCategories => {
            let prefs = analyze_product_preferences(
                &data.orders,
                &data.line_items,
                params.top_products,
                params.top_categories,
            );
            match kind {
                ReportKind::ProductPopularity => render(&prefs.popularity),
                ReportKind::CategoryPreferences => render(&prefs.category_preferences),
                _ => render(&prefs.top_categories),
            }
        }
    };
    Ok(text)
}

fn render<T: ReportRow>(result: &SegmentResult<T>) -> String {
    if !result.source_data_available {
        let roles: Vec<&str> = result.kind.required_roles().iter().map(|r| r.as_str()).collect();
        return format!("{}: no data, add the {} files", result.kind, roles.join(" and "));
    }
    let mut text = format!("{}: {} rows\n{}", result.kind, result.len(), result.columns().join(" | "));
    for row in result.rows.iter().take(REPLY_PREVIEW_ROWS) {
        let cells: Vec<String> = row.values().iter().map(ToString::to_string).collect();
        let _ = write!(text, "\n{}", cells.join(" | "));
    }
    if result.len() > REPLY_PREVIEW_ROWS {
        let _ = write!(text, "\n... {} more", result.len() - REPLY_PREVIEW_ROWS);
    }
    text
}
