//! Cross-document statistics computed from extracted fields.
//!
//! The model's `statistics` are claims. For every field that is numeric in
//! a strict majority of the analyzed documents, the aggregates are
//! recomputed here; a claim that disagrees is replaced by the computed
//! value and the disagreement is reported as an insight.

use formagent_core::document::Document;
use formagent_core::result::{AnalysisResult, Statistic, Statistics};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Relative tolerance for accepting a model's figure.
const RELATIVE_TOLERANCE: f64 = 1e-3;
const ABSOLUTE_TOLERANCE: f64 = 1e-2;

/// The aggregates checked, each with the names a model may use for it.
const AGGREGATES: &[(&str, &[&str])] = &[
    ("average", &["average", "avg", "mean"]),
    ("total", &["total", "sum"]),
    ("min", &["min", "minimum", "lowest"]),
    ("max", &["max", "maximum", "highest"]),
];

/// Parse a monetary or plain amount: "$75,000.00", "€ 1 200", "-3.5".
/// Text containing letters is not an amount.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_alphabetic) {
        return None;
    }
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    value
        .is_finite()
        .then_some(if negative { -value } else { value })
}

/// Lowercase, with runs of non-alphanumerics collapsed to `_`.
pub fn normalize_field_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Aggregates of one numeric field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAggregate {
    pub field: String,
    /// Documents in which the field was numeric.
    pub count: usize,
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl FieldAggregate {
    fn value(&self, kind: &str) -> f64 {
        match kind {
            "average" => self.average,
            "total" => self.total,
            "min" => self.min,
            _ => self.max,
        }
    }
}

/// Aggregate every field that is numeric in more than half of `documents`.
pub fn aggregate_fields(documents: &[Document]) -> Vec<FieldAggregate> {
    let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();

    for document in documents {
        let mut seen = BTreeMap::new();
        for (name, value) in document.extracted_fields() {
            let key = normalize_field_name(name);
            if key.is_empty() || seen.contains_key(&key) {
                continue;
            }
            if let Some(amount) = parse_amount(value) {
                seen.insert(key, amount);
            }
        }
        for (key, amount) in seen {
            values.entry(key).or_default().push(amount);
        }
    }

    values
        .into_iter()
        .filter(|(_, v)| v.len() * 2 > documents.len())
        .map(|(field, v)| {
            let total: f64 = v.iter().sum();
            FieldAggregate {
                count: v.len(),
                total,
                average: total / v.len() as f64,
                min: v.iter().copied().fold(f64::INFINITY, f64::min),
                max: v.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                field,
            }
        })
        .collect()
}

/// Check the model's statistics against computed aggregates.
///
/// Computed aggregates are stored as `<kind>_<field>` (e.g.
/// `average_salary`), or as `<kind>_<field>_computed` when the model used
/// that name for a breakdown. A model claim under any alias that disagrees is
/// overwritten and noted in `insights`. Returns the number of
/// disagreements.
pub fn cross_check(result: &mut AnalysisResult, documents: &[Document]) -> usize {
    let mut disagreements = 0;

    for aggregate in aggregate_fields(documents) {
        for (kind, aliases) in AGGREGATES {
            let computed = aggregate.value(kind);

            for (path, claimed) in find_claims(&result.statistics, aliases, &aggregate.field) {
                if agrees(claimed, computed) {
                    continue;
                }
                disagreements += 1;
                warn!(
                    statistic = %path.join("."),
                    claimed,
                    computed,
                    "Model statistic disagrees with extracted fields"
                );
                result.insights.push(format!(
                    "Cross-check: the reported {} of {} does not match {} computed from \
                     '{}' in {} of {} documents; the computed value is used.",
                    path.join("."),
                    format_number(claimed),
                    format_number(computed),
                    aggregate.field,
                    aggregate.count,
                    documents.len()
                ));
                set_at(&mut result.statistics, &path, computed);
            }

            let key = format!("{kind}_{}", aggregate.field);
            if let Some(Statistic::Group(_)) = result.statistics.get(&key) {
                let computed_key = format!("{key}_computed");
                warn!(
                    statistic = %key,
                    computed,
                    "Model reported a breakdown under an aggregate name"
                );
                result.insights.push(format!(
                    "Cross-check: '{key}' is reported as a breakdown; the overall {kind} of \
                     {} computed from '{}' in {} of {} documents is stored as '{computed_key}'.",
                    format_number(computed),
                    aggregate.field,
                    aggregate.count,
                    documents.len()
                ));
                result.statistics.insert(computed_key, Statistic::Number(computed));
            } else {
                result.statistics.insert(key, Statistic::Number(computed));
            }
        }
        debug!(field = %aggregate.field, count = aggregate.count, "Cross-checked field");
    }

    disagreements
}

/// Numeric claims about `field` under any alias, with their key paths.
///
/// Top-level keys may be `<alias>_<field>` or `<field>_<alias>`; groups
/// may be keyed by the alias (holding the field) or by the field
/// (holding the alias).
fn find_claims(stats: &Statistics, aliases: &[&str], field: &str) -> Vec<(Vec<String>, f64)> {
    let mut claims = Vec::new();
    for (key, stat) in stats {
        let norm = normalize_field_name(key);
        match stat {
            Statistic::Number(n) => {
                let named = aliases.iter().any(|a| {
                    norm == format!("{a}_{field}") || norm == format!("{field}_{a}")
                });
                if named {
                    claims.push((vec![key.clone()], *n));
                }
            }
            Statistic::Group(group) => {
                let inner_names: Vec<String> = if aliases.contains(&norm.as_str()) {
                    vec![field.to_string()]
                } else if norm == field {
                    aliases.iter().map(|a| a.to_string()).collect()
                } else {
                    continue;
                };
                for (inner_key, inner) in group {
                    if !inner_names.contains(&normalize_field_name(inner_key)) {
                        continue;
                    }
                    if let Some(n) = inner.as_number() {
                        claims.push((vec![key.clone(), inner_key.clone()], n));
                    }
                }
            }
        }
    }
    claims
}

fn set_at(stats: &mut Statistics, path: &[String], value: f64) {
    match path {
        [key] => {
            stats.insert(key.clone(), Statistic::Number(value));
        }
        [key, rest @ ..] => {
            if let Some(Statistic::Group(group)) = stats.get_mut(key) {
                set_at(group, rest, value);
            }
        }
        [] => {}
    }
}

fn agrees(claimed: f64, computed: f64) -> bool {
    (claimed - computed).abs() <= ABSOLUTE_TOLERANCE.max(computed.abs() * RELATIVE_TOLERANCE)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n:.2}")
    }
}
