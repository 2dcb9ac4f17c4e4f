//! Field normalizer: phone numbers, first names, neighborhood spellings.
//!
//! Every function here is pure. The neighborhood table is data, not code:
//! extend it through `NeighborhoodTable::extend` or the engine config.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Country code applied to trunk-prefixed and bare 11-digit numbers.
pub const COUNTRY_CODE: &str = "55";

/// Prefix used in the contacts book for customers imported by a campaign.
pub const CAMPAIGN_TAG: &str = "LT_01";

pub const MIN_PHONE_DIGITS: usize = 10;
pub const MAX_PHONE_DIGITS: usize = 15;

/// First-name values that mean "nobody typed a name".
const PLACEHOLDER_NAMES: &[&str] = &["-", "???????", "null", "none", "nan"];

/// Canonical neighborhood → known spelling variants.
pub const NEIGHBORHOOD_VARIANTS: &[(&str, &[&str])] = &[
    ("fontanella",              &["fontanela", "fortanella"]),
    ("jardim dona luiza",       &["jardim d. luiza", "dona luiza"]),
    ("nova jaguariuna",         &["nova jaguariúna"]),
    ("centro",                  &["centro da cidade"]),
    ("zambom",                  &["jardim zambom"]),
    ("capotuna",                &[]),
    ("triunfo",                 &["jardim triunfo"]),
    ("nassif",                  &["nucleo res. dr. joao a nassif"]),
    ("capela de santo antonio", &["capela santo antonio"]),
    ("chácara primavera",       &["chacara primavera", "primavera"]),
    ("jardim europa",           &["europa"]),
    ("jardim mauá ii",          &["jardim maua ii", "mauá ii"]),
    ("jardim santa cruz",       &["santa cruz"]),
    ("roseira de cima",         &["roseira"]),
    ("tamboré",                 &["tambore"]),
];

// ── Phones ───────────────────────────────────────────────────────────────────

/// Reduce a raw phone to digits in international form, or "" if unusable.
///
/// Rejected: all zeros, fewer than 10 digits, a `000` prefix, or more than
/// 15 digits after the country code is applied. A leading `0` trunk prefix is
/// replaced by the country code; bare 11-digit numbers get it prepended.
pub fn clean_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < MIN_PHONE_DIGITS
        || digits.chars().all(|c| c == '0')
        || digits.starts_with("000")
    {
        return String::new();
    }

    let international = if let Some(rest) = digits.strip_prefix('0') {
        format!("{COUNTRY_CODE}{rest}")
    } else if digits.len() == 11 && !digits.starts_with(COUNTRY_CODE) {
        format!("{COUNTRY_CODE}{digits}")
    } else {
        digits
    };

    if international.len() > MAX_PHONE_DIGITS {
        return String::new();
    }
    international
}

// ── Names ────────────────────────────────────────────────────────────────────

fn campaign_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^LT_\d+").expect("campaign tag pattern is valid"))
}

/// True when the name carries a campaign tag such as `LT_01`.
pub fn has_campaign_tag(name: &str) -> bool {
    campaign_tag_pattern().is_match(name.trim())
}

pub fn is_placeholder_name(token: &str) -> bool {
    let token = token.trim();
    token.is_empty()
        || PLACEHOLDER_NAMES
            .iter()
            .any(|p| p.eq_ignore_ascii_case(token))
}

/// Display first name from a noisy full-name field.
pub fn extract_first_name(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        return String::new();
    }

    let token = if has_campaign_tag(name) {
        // "LT_01 Maria Silva" → "Maria"; "LT_01Maria" has no name token.
        name.split_whitespace().nth(1)
    } else {
        name.split_whitespace().next()
    };

    match token {
        Some(t) if !is_placeholder_name(t) => t.to_string(),
        _ => String::new(),
    }
}

// ── Neighborhoods ────────────────────────────────────────────────────────────

/// Lookup from any known spelling (canonical included) to the canonical name.
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodTable {
    lookup: HashMap<String, String>,
}

impl NeighborhoodTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in delivery-area table.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (canonical, variants) in NEIGHBORHOOD_VARIANTS {
            table.extend(canonical, variants.iter().copied());
        }
        table
    }

    /// Register a canonical name and its variants.
    /// Spellings already mapped keep their first canonical.
    pub fn extend<'a>(&mut self, canonical: &str, variants: impl IntoIterator<Item = &'a str>) {
        let canonical = fold(canonical);
        if canonical.is_empty() {
            return;
        }
        let canonical = self
            .lookup
            .get(&canonical)
            .cloned()
            .unwrap_or(canonical);
        self.lookup
            .entry(canonical.clone())
            .or_insert_with(|| canonical.clone());

        for variant in variants {
            let variant = fold(variant);
            if variant.is_empty() {
                continue;
            }
            if let Some(existing) = self.lookup.get(&variant) {
                if *existing != canonical {
                    log::debug!("normalizer: '{variant}' already maps to '{existing}', keeping it");
                }
                continue;
            }
            self.lookup.insert(variant, canonical.clone());
        }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let folded = fold(raw);
        match self.lookup.get(&folded) {
            Some(canonical) => canonical.clone(),
            None => folded,
        }
    }

    /// Every (spelling, canonical) pair in the table.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lookup.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

fn fold(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Canonicalize against the built-in table.
pub fn normalize_neighborhood(raw: &str) -> String {
    static TABLE: OnceLock<NeighborhoodTable> = OnceLock::new();
    TABLE.get_or_init(NeighborhoodTable::builtin).normalize(raw)
}
