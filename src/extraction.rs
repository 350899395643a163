//! Heuristic extraction of [`FinancialFields`] from already-parsed documents:
//! spreadsheet rows, CSV, XBRL fact maps and plain text.
//!
//! The first value found for a field wins; later matches never overwrite it.

use crate::error::Result;
use crate::schema::{FieldName, FinancialFields};
use crate::utils::{normalize_value, parse_amount};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;

/// Keywords per field. Specific labels come before general ones so that
/// "total current assets" is not taken for "total assets".
pub const KEYWORD_MAP: &[(FieldName, &[&str])] = &[
    (
        FieldName::CurrentAssets,
        &["total current assets", "current assets"],
    ),
    (
        FieldName::CurrentLiabilities,
        &["total current liabilities", "current liabilities"],
    ),
    (
        FieldName::OperatingCashFlow,
        &[
            "cash from operations",
            "operating cash flow",
            "operating activities",
        ],
    ),
    (
        FieldName::InvestingCashFlow,
        &["cash from investing", "investing activities"],
    ),
    (
        FieldName::FinancingCashFlow,
        &["cash from financing", "financing activities"],
    ),
    (
        FieldName::OperatingExpenses,
        &["total operating expenses", "operating expenses"],
    ),
    (FieldName::GrossProfit, &["gross profit", "gross income"]),
    (
        FieldName::NetIncome,
        &["net income", "net profit", "profit after tax"],
    ),
    (FieldName::TotalAssets, &["total assets", "assets total"]),
    (
        FieldName::TotalLiabilities,
        &["total liabilities", "liabilities total"],
    ),
    (
        FieldName::Equity,
        &[
            "total equity",
            "shareholders equity",
            "shareholders' equity",
            "stockholders equity",
            "stockholders' equity",
        ],
    ),
    (FieldName::Cash, &["cash and cash equivalents", "cash"]),
    (FieldName::Inventory, &["inventories", "inventory"]),
    (
        FieldName::Revenue,
        &["total revenue", "net sales", "revenue", "sales"],
    ),
];

/// Column names that hold a row's line-item label.
pub const ROW_LABEL_KEYS: [&str; 7] = [
    "metric",
    "item",
    "description",
    "account",
    "name",
    "line",
    "category",
];

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(?-?\$?\d[\d,]*(?:\.\d+)?\)?").unwrap());

/// One spreadsheet row as `(column, cell)` pairs in column order.
pub type Row = Vec<(String, Value)>;

/// Maps a free-form label to a field using [`KEYWORD_MAP`].
pub fn match_keyword(label: &str) -> Option<FieldName> {
    let lowered = label.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    KEYWORD_MAP
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(field, _)| *field)
}

fn is_label_key(key: &str) -> bool {
    let key = key.trim().to_lowercase();
    ROW_LABEL_KEYS.contains(&key.as_str())
}

fn fill(fields: &mut FinancialFields, field: FieldName, value: Option<f64>) {
    if fields.get(field).is_none() && value.is_some() {
        fields.set(field, value);
    }
}

pub fn extract_from_rows(rows: &[Row]) -> FinancialFields {
    let mut fields = FinancialFields::default();

    for row in rows {
        // Column headers that are themselves line items.
        for (key, value) in row {
            if let Some(field) = match_keyword(key) {
                fill(&mut fields, field, normalize_value(value));
            }
        }

        // A cell holding a line-item label, valued by the first numeric sibling.
        for (key, value) in row {
            let Some(label) = value.as_str() else {
                continue;
            };
            let Some(field) = match_keyword(label) else {
                continue;
            };
            if fields.get(field).is_some() {
                continue;
            }
            let candidate = row
                .iter()
                .filter(|(other, _)| other != key)
                .find_map(|(_, v)| normalize_value(v));
            fill(&mut fields, field, candidate);
        }

        // Dedicated label column such as `Metric | FY2023 | FY2022`.
        let label = row
            .iter()
            .find(|(k, _)| is_label_key(k))
            .and_then(|(_, v)| v.as_str());
        if let Some(field) = label.and_then(match_keyword) {
            let candidate = row
                .iter()
                .filter(|(k, _)| !is_label_key(k))
                .find_map(|(_, v)| normalize_value(v));
            fill(&mut fields, field, candidate);
        }
    }

    debug!(
        "Extracted {} field(s) from {} row(s)",
        fields.known().count(),
        rows.len()
    );
    fields
}

/// Reads a CSV with a header row and extracts fields from its records.
pub fn extract_from_csv<R: Read>(reader: R) -> Result<FinancialFields> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(extract_from_rows(&rows))
}

/// How closely an XBRL tag's local name (`Revenues` in `us-gaap:Revenues`)
/// matches a compact keyword. Lower is better.
fn tag_rank(local_name: &str, keyword: &str) -> Option<u8> {
    if local_name == keyword {
        Some(0)
    } else if local_name.starts_with(keyword) {
        Some(1)
    } else if local_name.contains(keyword) {
        Some(2)
    } else {
        None
    }
}

/// Matches XBRL-style tags (`us-gaap:NetIncomeLoss`, `TotalAssets`) against the
/// keyword map with spaces removed. Exact local names beat prefixes, which
/// beat substrings, so `Revenues` wins over `CostOfRevenue`.
pub fn extract_from_xbrl_facts(facts: &BTreeMap<String, Value>) -> FinancialFields {
    let mut fields = FinancialFields::default();
    let normalized: Vec<(String, &Value)> = facts
        .iter()
        .map(|(k, v)| {
            let local = k.rsplit(':').next().unwrap_or(k);
            (local.to_lowercase().replace(' ', ""), v)
        })
        .collect();

    for (field, keywords) in KEYWORD_MAP {
        let compact: Vec<String> = keywords
            .iter()
            .map(|k| k.replace(' ', "").replace('\'', ""))
            .collect();

        let best = (0..=2u8).find_map(|rank| {
            compact.iter().find_map(|keyword| {
                normalized
                    .iter()
                    .filter(|(tag, _)| tag_rank(tag, keyword) == Some(rank))
                    .find_map(|(_, value)| normalize_value(value))
            })
        });
        fill(&mut fields, *field, best);
    }

    debug!(
        "Extracted {} field(s) from {} XBRL fact(s)",
        fields.known().count(),
        facts.len()
    );
    fields
}

/// Line-oriented heuristic over raw statement text: the first amount on the
/// first line mentioning a keyword.
pub fn extract_from_text(text: &str) -> FinancialFields {
    let mut fields = FinancialFields::default();

    for line in text.lines() {
        let Some(field) = match_keyword(line) else {
            continue;
        };
        if fields.get(field).is_some() {
            continue;
        }
        let amount = NUMBER
            .find_iter(line)
            .find_map(|m| parse_amount(balance_parens(m.as_str())));
        fill(&mut fields, field, amount);
    }

    fields
}

/// The number pattern may pick up one side of a parenthesised amount, e.g.
/// `(1,200` when the closing bracket is separated by spacing.
fn balance_parens(raw: &str) -> &str {
    match (raw.starts_with('('), raw.ends_with(')')) {
        (true, false) => &raw[1..],
        (false, true) => &raw[..raw.len() - 1],
        _ => raw,
    }
}
