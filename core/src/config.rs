use crate::{
    error::{ZapError, ZapResult},
    normalizer::NeighborhoodTable,
    types::DatasetRole,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

// ── Source discovery ───────────────────────────────────────────────

/// Filename glob patterns per role, matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePatterns {
    pub contacts:   Vec<String>,
    pub customers:  Vec<String>,
    pub orders:     Vec<String>,
    pub line_items: Vec<String>,
}

impl SourcePatterns {
    pub fn for_role(&self, role: DatasetRole) -> &[String] {
        match role {
            DatasetRole::Contacts  => &self.contacts,
            DatasetRole::Customers => &self.customers,
            DatasetRole::Orders    => &self.orders,
            DatasetRole::LineItems => &self.line_items,
        }
    }
}

impl Default for SourcePatterns {
    fn default() -> Self {
        Self {
            contacts: strings(&["*contacts*.csv", "*contacts*.xls*", "*contatos*.csv"]),
            customers: strings(&["*lista-clientes*.xls*", "*lista_clientes*.xls*", "*lista clientes*.xls*"]),
            orders: strings(&["*todos os pedidos*.xls*", "*pedidos*.xls*"]),
            line_items: strings(&["*historico_itens_vendidos*.xls*", "*itens_vendidos*.xls*", "*itens*.xls*"]),
        }
    }
}

// ── Column aliases ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactColumns {
    pub name:  Vec<String>,
    pub phone: Vec<String>,
}

impl Default for ContactColumns {
    fn default() -> Self {
        Self {
            name:  strings(&["First Name", "Nome", "nome", "Name", "name"]),
            phone: strings(&["Phone 1 - Value", "Telefone", "telefone", "Phone", "phone", "Fone", "fone"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerColumns {
    pub name:         Vec<String>,
    pub phone:        Vec<String>,
    pub neighborhood: Vec<String>,
    pub order_count:  Vec<String>,
}

impl Default for CustomerColumns {
    fn default() -> Self {
        Self {
            name:         strings(&["Nome", "Cliente", "Name"]),
            phone:        strings(&["Fone Principal", "Telefone", "Fone", "Celular", "Phone"]),
            neighborhood: strings(&["Bairro", "Neighborhood"]),
            order_count:  strings(&["Qtd. Pedidos", "Qtd Pedidos", "Pedidos"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderColumns {
    pub order_id:       Vec<String>,
    pub phone:          Vec<String>,
    pub neighborhood:   Vec<String>,
    pub closed_at:      Vec<String>,
    pub subtotal:       Vec<String>,
    pub delivery_fee:   Vec<String>,
    pub origin_channel: Vec<String>,
}

impl Default for OrderColumns {
    fn default() -> Self {
        Self {
            order_id:       strings(&["Código", "Codigo", "Cod. Ped.", "Pedido"]),
            phone:          strings(&["Telefone", "Fone", "Celular", "Phone"]),
            neighborhood:   strings(&["Bairro", "Neighborhood"]),
            closed_at:      strings(&["Data Fechamento", "Data Fec.", "Data"]),
            subtotal:       strings(&["Total", "Subtotal", "Valor"]),
            delivery_fee:   strings(&["Valor Entrega", "Taxa Entrega", "Entrega"]),
            origin_channel: strings(&["Origem", "Canal", "Tipo"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemColumns {
    pub order_id:     Vec<String>,
    pub product_name: Vec<String>,
    pub category:     Vec<String>,
    pub quantity:     Vec<String>,
    pub unit_value:   Vec<String>,
    pub line_total:   Vec<String>,
    pub closed_at:    Vec<String>,
}

impl Default for LineItemColumns {
    fn default() -> Self {
        Self {
            order_id:     strings(&["Cod. Ped.", "Código Pedido", "Codigo Pedido", "Código"]),
            product_name: strings(&["Nome Prod", "Nome Prod.", "Produto"]),
            category:     strings(&["Cat. Prod.", "Cat. Prod", "Categoria"]),
            quantity:     strings(&["Qtd.", "Qtd", "Quantidade"]),
            unit_value:   strings(&["Valor Un. Item", "Valor Unit. Item", "Valor Unitário"]),
            line_total:   strings(&[
                "Valor Tot. Item",
                "Valor. Tot. Item",
                "Valor Tot Item",
                "Valor Total Item",
                "Valor",
            ]),
            closed_at:    strings(&["Data Fec. Ped.", "Data Fechamento"]),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub contacts:   ContactColumns,
    pub customers:  CustomerColumns,
    pub orders:     OrderColumns,
    pub line_items: LineItemColumns,
    /// Substrings tried on every header when no phone alias matches.
    pub phone_keywords: PhoneKeywords,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneKeywords(pub Vec<String>);

impl Default for PhoneKeywords {
    fn default() -> Self {
        Self(strings(&["telefone", "fone", "celular"]))
    }
}

// ── Neighborhoods ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborhoodEntry {
    pub canonical: String,
    #[serde(default)]
    pub variants:  Vec<String>,
}

// ── Engine config ──────────────────────────────────────────────────

/// Loader configuration: where to find inputs and how to read their headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sources: SourcePatterns,
    pub columns: ColumnAliases,
    /// Added on top of the built-in neighborhood table.
    pub extra_neighborhoods: Vec<NeighborhoodEntry>,
}

impl EngineConfig {
    /// Load from a JSON file. Missing sections fall back to the built-in tables.
    /// In tests, use EngineConfig::default().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::info!(
            "config: loaded {path} ({} extra neighborhoods)",
            config.extra_neighborhoods.len()
        );
        Ok(config)
    }

    pub fn neighborhood_table(&self) -> NeighborhoodTable {
        let mut table = NeighborhoodTable::builtin();
        for entry in &self.extra_neighborhoods {
            table.extend(&entry.canonical, entry.variants.iter().map(String::as_str));
        }
        table
    }
}

// ── Analysis parameters ────────────────────────────────────────────

pub const DEFAULT_INACTIVITY_DAYS: i64 = 30;
pub const DEFAULT_MIN_AVERAGE_TICKET: f64 = 50.0;
pub const DEFAULT_TOP_PRODUCTS: usize = 20;
pub const DEFAULT_TOP_CATEGORIES: usize = 3;

/// Caller-supplied knobs for one round of analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// "Today" for recency calculations.
    pub as_of:              NaiveDate,
    pub inactivity_days:    i64,
    pub min_average_ticket: f64,
    pub top_products:       usize,
    pub top_categories:     usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self::as_of(Local::now().date_naive())
    }
}

impl AnalysisParams {
    pub fn as_of(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            inactivity_days:    DEFAULT_INACTIVITY_DAYS,
            min_average_ticket: DEFAULT_MIN_AVERAGE_TICKET,
            top_products:       DEFAULT_TOP_PRODUCTS,
            top_categories:     DEFAULT_TOP_CATEGORIES,
        }
    }

    pub fn validate(&self) -> ZapResult<()> {
        validate_inactivity_days(self.inactivity_days)?;
        validate_min_average_ticket(self.min_average_ticket)?;
        Ok(())
    }
}

pub fn validate_inactivity_days(days: i64) -> ZapResult<()> {
    if days < 1 {
        return Err(ZapError::InvalidParameter {
            name:   "inactivity_days",
            value:  days.to_string(),
            reason: "must be a positive number of days",
        });
    }
    Ok(())
}

pub fn validate_min_average_ticket(min: f64) -> ZapResult<()> {
    if !min.is_finite() || min < 0.0 {
        return Err(ZapError::InvalidParameter {
            name:   "min_average_ticket",
            value:  min.to_string(),
            reason: "must be a non-negative amount",
        });
    }
    Ok(())
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
