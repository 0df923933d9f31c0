//! Response parsing: raw model text to validated result records.
//!
//! Parsing runs in two passes. A tolerant pass locates the JSON object in
//! the reply (fenced block, bare fence or the first balanced object in the
//! prose) and repairs trailing commas. A strict pass then checks every
//! required field of the expected schema and coerces known shapes. Missing
//! fields are never defaulted; they fail with `MalformedResponse` carrying
//! the raw text.

use crate::stats::parse_amount;
use formagent_config::ParserSettings;
use formagent_core::error::{Error, Result};
use formagent_core::operation::TaskKind;
use formagent_core::prompt::ResponseSchema;
use formagent_core::result::{
    AnalysisResult, ExtractionResult, QuestionResult, Statistic, Statistics, SummaryResult,
    TaskClassification, TypeDetection,
};
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Number, optional fraction, optional percent marker. Case and spacing
/// are ignored.
const CONFIDENCE_PATTERN: &str =
    r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*(%|percent|pct)?\s*$";

/// A parsed response, tagged by schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Extraction(ExtractionResult),
    TypeDetection(TypeDetection),
    Question(QuestionResult),
    Summary(SummaryResult),
    Analysis(AnalysisResult),
    TaskClassification(TaskClassification),
}

/// Validates model replies against a [`ResponseSchema`].
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    /// Fail on out-of-range confidences instead of clamping them.
    strict_confidence: bool,
}

impl ResponseParser {
    pub fn new(strict_confidence: bool) -> Self {
        Self { strict_confidence }
    }

    pub fn from_settings(settings: &ParserSettings) -> Self {
        Self::new(settings.strict_confidence)
    }

    /// Parse `raw` as `schema`.
    pub fn parse(&self, raw: &str, schema: ResponseSchema) -> Result<ParsedResponse> {
        Ok(match schema {
            ResponseSchema::Extraction => ParsedResponse::Extraction(self.parse_extraction(raw)?),
            ResponseSchema::TypeDetection => {
                ParsedResponse::TypeDetection(self.parse_type_detection(raw)?)
            }
            ResponseSchema::Question => ParsedResponse::Question(self.parse_question(raw)?),
            ResponseSchema::Summary => ParsedResponse::Summary(self.parse_summary(raw)?),
            ResponseSchema::Analysis => ParsedResponse::Analysis(self.parse_analysis(raw)?),
            ResponseSchema::TaskClassification => {
                ParsedResponse::TaskClassification(self.parse_task_classification(raw)?)
            }
        })
    }

    pub fn parse_extraction(&self, raw: &str) -> Result<ExtractionResult> {
        let obj = Reply::locate(raw, ResponseSchema::Extraction)?;

        let fields_value = obj.required("fields")?;
        let Value::Object(field_map) = fields_value else {
            return Err(obj.malformed("'fields' must be an object"));
        };

        let mut fields = BTreeMap::new();
        let mut field_confidences = BTreeMap::new();
        let mut groups = Vec::new();
        for (name, value) in field_map {
            match value {
                Value::Object(inner) if lookup(inner, "value").is_some() => {
                    let Some(text) = lookup(inner, "value").and_then(scalar_text) else {
                        continue;
                    };
                    if let Some(c) = lookup(inner, "confidence").filter(|v| !v.is_null()) {
                        let c = self.coerce_confidence(c, &format!("fields.{name}.confidence"), raw)?;
                        field_confidences.insert(name.clone(), c);
                    }
                    fields.insert(name.clone(), text);
                }
                Value::Object(inner) => groups.push((name, inner)),
                other => {
                    if let Some(text) = scalar_text(other) {
                        fields.insert(name.clone(), text);
                    }
                }
            }
        }
        // Literal keys win; flattened group members never replace them.
        for (name, inner) in groups {
            flatten_into(&mut fields, name, inner);
        }

        Ok(ExtractionResult {
            fields,
            field_confidences,
            confidence: self.coerce_confidence(obj.required("confidence")?, "confidence", raw)?,
            reasoning: obj.required_text("reasoning")?,
            form_type_hint: obj.optional_form_type("form_type"),
        })
    }

    pub fn parse_task_classification(&self, raw: &str) -> Result<TaskClassification> {
        let obj = Reply::locate(raw, ResponseSchema::TaskClassification)?;
        let label = obj.required_text("task_type")?;
        let task = label
            .parse::<TaskKind>()
            .map_err(|other| obj.malformed(&format!("unknown task_type {other:?}")))?;
        Ok(TaskClassification {
            task,
            reasoning: obj.optional("reasoning").and_then(scalar_text).unwrap_or_default(),
        })
    }

    pub fn parse_type_detection(&self, raw: &str) -> Result<TypeDetection> {
        let obj = Reply::locate(raw, ResponseSchema::TypeDetection)?;
        obj.required("form_type")?;
        Ok(TypeDetection {
            form_type: obj.optional_form_type("form_type"),
            confidence: self.coerce_confidence(obj.required("confidence")?, "confidence", raw)?,
            reasoning: obj.required_text("reasoning")?,
        })
    }

    pub fn parse_question(&self, raw: &str) -> Result<QuestionResult> {
        let obj = Reply::locate(raw, ResponseSchema::Question)?;
        Ok(QuestionResult {
            answer: obj.required_text("answer")?,
            confidence: self.coerce_confidence(obj.required("confidence")?, "confidence", raw)?,
            evidence: string_list(obj.required("evidence")?),
            reasoning: obj.required_text("reasoning")?,
        })
    }

    pub fn parse_summary(&self, raw: &str) -> Result<SummaryResult> {
        let obj = Reply::locate(raw, ResponseSchema::Summary)?;
        let important_values = match obj.required("important_values")? {
            Value::Object(map) => flat_values(map),
            _ => return Err(obj.malformed("'important_values' must be an object")),
        };

        Ok(SummaryResult {
            summary: obj.required_text("summary")?,
            key_points: string_list(obj.required("key_points")?),
            important_values,
            form_type: obj.optional_form_type("form_type"),
        })
    }

    pub fn parse_analysis(&self, raw: &str) -> Result<AnalysisResult> {
        let obj = Reply::locate(raw, ResponseSchema::Analysis)?;
        let statistics = match obj.required("statistics")? {
            Value::Object(map) => statistics_from(map),
            _ => return Err(obj.malformed("'statistics' must be an object")),
        };

        let comparisons = match obj.optional("comparisons") {
            Some(Value::Object(map)) => map.clone().into_iter().collect(),
            Some(other) => BTreeMap::from([("details".to_string(), other.clone())]),
            None => BTreeMap::new(),
        };

        Ok(AnalysisResult {
            answer: obj.required_text("answer")?,
            insights: string_list(obj.required("insights")?),
            statistics,
            comparisons,
        })
    }

    /// Coerce a confidence-like value into `[0, 1]`.
    ///
    /// Accepts numbers and numeric strings. A percent marker, or a bare
    /// whole number above 1 and at most 100, is read as a percentage.
    fn coerce_confidence(&self, value: &Value, field: &str, raw: &str) -> Result<f64> {
        let (number, percent) = match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) => (f, false),
                None => return Err(Error::malformed(format!("'{field}' is not a number"), raw)),
            },
            Value::String(s) => parse_confidence_text(s).ok_or_else(|| {
                Error::malformed(format!("'{field}' is not a confidence: {s:?}"), raw)
            })?,
            _ => return Err(Error::malformed(format!("'{field}' is not a number"), raw)),
        };

        if !number.is_finite() {
            return Err(Error::malformed(format!("'{field}' is not finite"), raw));
        }

        let whole_percent = number > 1.0 && number <= 100.0 && number.fract() == 0.0;
        let scaled = if percent || whole_percent {
            number / 100.0
        } else {
            number
        };

        if (0.0..=1.0).contains(&scaled) {
            return Ok(scaled);
        }
        if self.strict_confidence {
            return Err(Error::malformed(
                format!("'{field}' out of range: {number}"),
                raw,
            ));
        }
        debug!(field, value = number, "Clamping out-of-range confidence");
        Ok(scaled.clamp(0.0, 1.0))
    }
}

/// The located JSON object of one reply.
struct Reply<'a> {
    raw: &'a str,
    object: Map<String, Value>,
}

impl<'a> Reply<'a> {
    fn locate(raw: &'a str, schema: ResponseSchema) -> Result<Self> {
        let object = locate_object(raw).ok_or_else(|| {
            Error::malformed(
                format!("no JSON object found for the {} schema", schema.name()),
                raw,
            )
        })?;
        Ok(Self { raw, object })
    }

    fn malformed(&self, reason: &str) -> Error {
        Error::malformed(reason, self.raw)
    }

    fn optional(&self, key: &str) -> Option<&Value> {
        lookup(&self.object, key).filter(|v| !v.is_null())
    }

    fn required(&self, key: &str) -> Result<&Value> {
        self.optional(key)
            .ok_or_else(|| self.malformed(&format!("missing required field '{key}'")))
    }

    fn required_text(&self, key: &str) -> Result<String> {
        let value = self.required(key)?;
        Ok(scalar_text(value).unwrap_or_else(|| value.to_string()))
    }

    /// A form type, with blank and "unknown" read as absent.
    fn optional_form_type(&self, key: &str) -> Option<String> {
        self.optional(key)
            .and_then(scalar_text)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("unknown"))
    }
}

/// Find the reply's JSON object: a ```json fence, then any fence, then the
/// first balanced `{...}` in the text.
fn locate_object(raw: &str) -> Option<Map<String, Value>> {
    fenced_blocks(raw, true)
        .into_iter()
        .chain(fenced_blocks(raw, false))
        .chain(balanced_objects(raw))
        .find_map(parse_object)
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    let candidate = candidate.trim();
    if !candidate.starts_with('{') {
        return None;
    }
    let value = serde_json::from_str::<Value>(candidate)
        .ok()
        .or_else(|| serde_json::from_str::<Value>(&strip_trailing_commas(candidate)).ok())?;
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Contents of ``` fences: those tagged `json` when `json_only`, the
/// rest otherwise.
fn fenced_blocks(raw: &str, json_only: bool) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = raw;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let (tag, body) = match after.find('\n') {
            Some(nl) => (after[..nl].trim(), &after[nl + 1..]),
            None => ("", after),
        };
        let Some(close) = body.find("```") else {
            break;
        };
        if tag.eq_ignore_ascii_case("json") == json_only {
            blocks.push(&body[..close]);
        }
        rest = &body[close + 3..];
    }
    blocks
}

/// Every balanced `{...}` span in order of its opening brace, skipping
/// braces inside JSON strings.
fn balanced_objects(raw: &str) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    while let Some(offset) = raw[start..].find('{') {
        let open = start + offset;
        if let Some(end) = matching_brace(bytes, open) {
            spans.push(&raw[open..=end]);
        }
        start = open + 1;
    }
    spans
}

fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_trailing_commas(text: &str) -> String {
    match Regex::new(r",(\s*[}\]])") {
        Ok(re) => re.replace_all(text, "$1").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Parse "95%", "95 %", "0.95", "95 percent". Returns the number and
/// whether a percent marker was present.
fn parse_confidence_text(text: &str) -> Option<(f64, bool)> {
    let lower = text.to_ascii_lowercase();
    let caps = Regex::new(CONFIDENCE_PATTERN).ok()?.captures(&lower)?;
    let number: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some((number, caps.get(2).is_some()))
}

/// Exact key first, then a case-insensitive match.
fn lookup<'m>(map: &'m Map<String, Value>, key: &str) -> Option<&'m Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
            Some(parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// A sequence of strings; a lone string becomes one item.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| scalar_text(v).unwrap_or_else(|| v.to_string()))
            .collect(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => scalar_text(other).into_iter().collect(),
    }
}

/// Scalar entries keyed as given, then nested groups as `parent_child`.
fn flat_values(map: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut values: BTreeMap<String, String> = map
        .iter()
        .filter_map(|(name, value)| scalar_text(value).map(|text| (name.clone(), text)))
        .collect();
    for (name, value) in map {
        if let Value::Object(inner) = value {
            flatten_into(&mut values, name, inner);
        }
    }
    values
}

/// Nested objects become `parent_child` keys.
fn flatten_into(out: &mut BTreeMap<String, String>, prefix: &str, map: &Map<String, Value>) {
    for (name, value) in map {
        let key = format!("{prefix}_{name}");
        match value {
            Value::Object(inner) => flatten_into(out, &key, inner),
            other => {
                if let Some(text) = scalar_text(other) {
                    insert_unique(out, key, text);
                }
            }
        }
    }
}

/// Insert under `key`, or under the first free `key_N` when taken.
fn insert_unique(out: &mut BTreeMap<String, String>, key: String, value: String) {
    if !out.contains_key(&key) {
        out.insert(key, value);
        return;
    }
    let free = (2..)
        .map(|n| format!("{key}_{n}"))
        .find(|candidate| !out.contains_key(candidate))
        .unwrap_or_else(|| key.clone());
    debug!(field = %key, stored_as = %free, "Flattened field name already taken");
    out.insert(free, value);
}

fn statistics_from(map: &Map<String, Value>) -> Statistics {
    let mut stats = Statistics::new();
    for (name, value) in map {
        let stat = match value {
            Value::Number(n) => n.as_f64().map(Statistic::Number),
            Value::String(s) => parse_amount(s.trim_end_matches('%')).map(Statistic::Number),
            Value::Object(inner) => Some(Statistic::Group(statistics_from(inner))),
            _ => None,
        };
        match stat {
            Some(stat) => {
                stats.insert(name.clone(), stat);
            }
            None => debug!(statistic = %name, "Dropping non-numeric statistic"),
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ResponseParser {
        ResponseParser::default()
    }

    #[test]
    fn question_in_fenced_block_with_prose() {
        let raw = "Here is my answer:\n```json\n{\n  \"answer\": \"$75,000.00\",\n  \"confidence\": 0.97,\n  \"evidence\": [\"Box 1 - Wages: $75,000.00\"],\n  \"reasoning\": \"Box 1 reports wages.\"\n}\n```\nLet me know if you need more.";
        let result = parser().parse_question(raw).unwrap();
        assert_eq!(result.answer, "$75,000.00");
        assert_eq!(result.confidence, 0.97);
        assert_eq!(result.evidence, vec!["Box 1 - Wages: $75,000.00"]);
    }

    #[test]
    fn bare_object_in_prose() {
        let raw = r#"Sure. {"answer": "yes", "confidence": "80%", "evidence": [], "reasoning": "it says {so}"} Done."#;
        let result = parser().parse_question(raw).unwrap();
        assert_eq!(result.answer, "yes");
        assert_eq!(result.confidence, 0.8);
        assert!(result.evidence.is_empty());
        assert_eq!(result.reasoning, "it says {so}");
    }

    #[test]
    fn untagged_fence_and_trailing_commas() {
        let raw = "```\n{\"form_type\": \"W-2\", \"confidence\": 0.9, \"reasoning\": \"title\",}\n```";
        let result = parser().parse_type_detection(raw).unwrap();
        assert_eq!(result.form_type.as_deref(), Some("W-2"));
    }

    #[test]
    fn percentage_forms_agree() {
        let parser = parser();
        for text in ["95%", "95 %", "0.95", " 95 PERCENT ", "95"] {
            let raw = format!(
                r#"{{"answer": "a", "confidence": "{text}", "evidence": [], "reasoning": "r"}}"#
            );
            assert_eq!(parser.parse_question(&raw).unwrap().confidence, 0.95, "{text}");
        }
    }

    #[test]
    fn out_of_range_confidence_clamps_or_fails() {
        let raw = r#"{"answer": "a", "confidence": 250, "evidence": [], "reasoning": "r"}"#;
        assert_eq!(parser().parse_question(raw).unwrap().confidence, 1.0);

        let strict = ResponseParser::new(true);
        let err = strict.parse_question(raw).unwrap_err();
        assert_eq!(err.kind(), "MalformedResponseError");

        let negative = r#"{"answer": "a", "confidence": -0.2, "evidence": [], "reasoning": "r"}"#;
        assert_eq!(parser().parse_question(negative).unwrap().confidence, 0.0);
    }

    #[test]
    fn missing_confidence_is_malformed_not_defaulted() {
        let raw = r#"{"answer": "a", "evidence": ["x"], "reasoning": "r"}"#;
        let err = parser().parse_question(raw).unwrap_err();
        assert_eq!(err.kind(), "MalformedResponseError");
        assert!(err.to_string().contains("confidence"));
        assert!(err.to_string().contains("\"answer\""));
    }

    #[test]
    fn unparsable_confidence_is_malformed() {
        let raw = r#"{"answer": "a", "confidence": "high", "evidence": [], "reasoning": "r"}"#;
        assert!(parser().parse_question(raw).is_err());
    }

    #[test]
    fn no_json_at_all() {
        let err = parser()
            .parse(
                "I could not read the document.",
                ResponseSchema::Summary,
            )
            .unwrap_err();
        assert_eq!(err.kind(), "MalformedResponseError");
    }

    #[test]
    fn parse_is_deterministic() {
        let parser = parser();
        let raw = r#"{"summary": "s", "key_points": "only one", "important_values": {"total": 5}}"#;
        let first = parser.parse(raw, ResponseSchema::Summary).unwrap();
        let second = parser.parse(raw, ResponseSchema::Summary).unwrap();
        assert_eq!(first, second);
        let ParsedResponse::Summary(summary) = first else {
            panic!("wrong variant");
        };
        assert_eq!(summary.key_points, vec!["only one"]);
        assert_eq!(summary.important_values["total"], "5");
        assert!(summary.form_type.is_none());

        let bad = r#"{"summary": "s"}"#;
        let e1 = parser.parse(bad, ResponseSchema::Summary).unwrap_err();
        let e2 = parser.parse(bad, ResponseSchema::Summary).unwrap_err();
        assert_eq!(e1.to_string(), e2.to_string());
    }

    #[test]
    fn extraction_accepts_plain_and_annotated_fields() {
        let raw = r#"```json
{
  "fields": {
    "employee_name": "Jane Doe",
    "box_1_wages": {"value": "$75,000.00", "confidence": "99%"},
    "employer": {"name": "Acme", "ein": "12-3456789"},
    "tax_year": 2024,
    "blank": null
  },
  "form_type": "W-2",
  "confidence": 0.92,
  "reasoning": "Standard W-2 layout"
}
```"#;
        let result = parser().parse_extraction(raw).unwrap();
        assert_eq!(result.fields["employee_name"], "Jane Doe");
        assert_eq!(result.fields["box_1_wages"], "$75,000.00");
        assert_eq!(result.field_confidences["box_1_wages"], 0.99);
        assert_eq!(result.fields["employer_name"], "Acme");
        assert_eq!(result.fields["tax_year"], "2024");
        assert!(!result.fields.contains_key("blank"));
        assert_eq!(result.form_type_hint.as_deref(), Some("W-2"));
    }

    #[test]
    fn extraction_fields_must_be_an_object() {
        let raw = r#"{"fields": ["a"], "confidence": 0.5, "reasoning": "r"}"#;
        assert!(parser().parse_extraction(raw).is_err());
    }

    #[test]
    fn flattened_group_never_replaces_a_literal_field() {
        let raw = r#"{
  "fields": {
    "employer_name": "Acme Corp",
    "employer": {"name": "Globex", "ein": "1"}
  },
  "confidence": 0.8,
  "reasoning": "two employer entries"
}"#;
        let result = parser().parse_extraction(raw).unwrap();
        assert_eq!(result.fields["employer_name"], "Acme Corp");
        assert_eq!(result.fields["employer_name_2"], "Globex");
        assert_eq!(result.fields["employer_ein"], "1");
        assert_eq!(result.fields.len(), 3);
    }

    #[test]
    fn summary_values_keep_both_sides_of_a_clash() {
        let raw = r#"{"summary": "s", "key_points": [],
            "important_values": {"wages_total": "$10", "wages": {"total": "$12"}}}"#;
        let summary = parser().parse_summary(raw).unwrap();
        assert_eq!(summary.important_values["wages_total"], "$10");
        assert_eq!(summary.important_values["wages_total_2"], "$12");
    }

    #[test]
    fn fractional_confidence_above_one_is_out_of_range() {
        let raw = r#"{"answer": "a", "confidence": 1.5, "evidence": [], "reasoning": "r"}"#;
        assert_eq!(parser().parse_question(raw).unwrap().confidence, 1.0);

        let err = ResponseParser::new(true).parse_question(raw).unwrap_err();
        assert_eq!(err.kind(), "MalformedResponseError");
        assert!(err.to_string().contains("1.5"));

        let marked = r#"{"answer": "a", "confidence": "1.5%", "evidence": [], "reasoning": "r"}"#;
        assert_eq!(parser().parse_question(marked).unwrap().confidence, 0.015);
    }

    #[test]
    fn task_classification_maps_to_task_kind() {
        let raw = r#"Sure. {"task_type": "QA", "reasoning": "asks about wages"}"#;
        let parsed = parser().parse(raw, ResponseSchema::TaskClassification).unwrap();
        assert_eq!(
            parsed,
            ParsedResponse::TaskClassification(TaskClassification {
                task: TaskKind::Question,
                reasoning: "asks about wages".into(),
            })
        );

        let bare = parser()
            .parse_task_classification(r#"{"task_type": "summarize"}"#)
            .unwrap();
        assert_eq!(bare.task, TaskKind::Summarize);
        assert!(bare.reasoning.is_empty());
    }

    #[test]
    fn unknown_task_type_is_malformed() {
        let err = parser()
            .parse_task_classification(r#"{"task_type": "translate"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), "MalformedResponseError");
        assert!(err.to_string().contains("translate"));

        let missing = parser().parse_task_classification(r#"{"reasoning": "r"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn unknown_form_type_reads_as_absent() {
        let raw = r#"{"form_type": "Unknown", "confidence": 0.1, "reasoning": "unclear"}"#;
        assert!(parser().parse_type_detection(raw).unwrap().form_type.is_none());
    }

    #[test]
    fn keys_match_case_insensitively() {
        let raw = r#"{"Answer": "a", "Confidence": 0.5, "Evidence": [], "Reasoning": "r"}"#;
        assert_eq!(parser().parse_question(raw).unwrap().answer, "a");
    }

    #[test]
    fn analysis_statistics_and_optional_comparisons() {
        let raw = r#"{
  "answer": "The average salary is $85,000.",
  "insights": ["Salaries vary widely"],
  "statistics": {
    "average_salary": 85000,
    "total_salary": "$255,000",
    "by_department": {"engineering": 110000, "note": "n/a"},
    "label": "mixed"
  }
}"#;
        let result = parser().parse_analysis(raw).unwrap();
        assert_eq!(result.statistic("average_salary"), Some(85000.0));
        assert_eq!(result.statistic("total_salary"), Some(255000.0));
        let group = result.statistics["by_department"].as_group().unwrap();
        assert_eq!(group["engineering"].as_number(), Some(110000.0));
        assert!(!group.contains_key("note"));
        assert!(!result.statistics.contains_key("label"));
        assert!(result.comparisons.is_empty());
    }

    #[test]
    fn analysis_requires_statistics() {
        let raw = r#"{"answer": "a", "insights": []}"#;
        let err = parser().parse_analysis(raw).unwrap_err();
        assert!(err.to_string().contains("statistics"));
    }

    #[test]
    fn malformed_display_bounds_the_excerpt() {
        let raw = format!("no json here {}", "x".repeat(1_000));
        let err = parser().parse_question(&raw).unwrap_err();
        assert!(err.to_string().len() < 400);
    }
}
