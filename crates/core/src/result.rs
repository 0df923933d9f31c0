//! Structured result records.
//!
//! Each record is produced by the response parser from one model response.
//! Confidences are always within `[0, 1]`; sequences keep the model's order
//! and may be empty.

use crate::operation::TaskKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of an EXTRACT operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_confidences: BTreeMap<String, f64>,
    pub confidence: f64,
    pub reasoning: String,
    /// Form type the model volunteered during extraction, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_type_hint: Option<String>,
}

/// Output of a DETECT_TYPE operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDetection {
    pub form_type: Option<String>,
    pub confidence: f64,
    pub reasoning: String,
}

/// Answer to a single-document question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub answer: String,
    pub confidence: f64,
    /// Literal excerpts from the document, empty when none were found.
    pub evidence: Vec<String>,
    pub reasoning: String,
}

/// Summary of a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub key_points: Vec<String>,
    pub important_values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_type: Option<String>,
}

/// A statistic is either a number or a named group of statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Statistic {
    Number(f64),
    Group(BTreeMap<String, Statistic>),
}

impl Statistic {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Statistic::Number(n) => Some(*n),
            Statistic::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&BTreeMap<String, Statistic>> {
        match self {
            Statistic::Group(g) => Some(g),
            Statistic::Number(_) => None,
        }
    }
}

/// Named statistics, ordered by key.
pub type Statistics = BTreeMap<String, Statistic>;

/// Cross-document analysis output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub answer: String,
    pub insights: Vec<String>,
    pub statistics: Statistics,
    /// Free-form comparisons between documents, when the model gave any.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub comparisons: BTreeMap<String, serde_json::Value>,
}

impl AnalysisResult {
    /// A top-level numeric statistic.
    pub fn statistic(&self, name: &str) -> Option<f64> {
        self.statistics.get(name).and_then(Statistic::as_number)
    }
}

/// Which operation a workflow task calls for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskClassification {
    pub task: TaskKind,
    #[serde(default)]
    pub reasoning: String,
}
